use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use engine::fairness::{SelectionResult, verify_seeded_draw};
use engine::hash::{generate_identity_hash, generate_random_seed, generate_verification_token};
use engine::services::{RegistrationRequest, register_participant, rescore_fraud};
use engine::{
    Dataset, FairnessAlgorithm, InMemoryStore, Participant, ParticipantStage, SelectionOrchestrator,
    SelectionPolicy, SelectionRequest,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "draw")]
#[command(about = "Contest winner selection and fairness auditing", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw the winners of a contest and record them in the dataset
    Select {
        file: PathBuf,

        /// Overrides the contest's configured strategy
        #[arg(short, long)]
        algorithm: Option<String>,

        #[arg(short, long)]
        count: Option<u32>,

        /// Where to write the selection result; printed to stdout otherwise
        #[arg(long)]
        report: Option<PathBuf>,

        #[arg(long)]
        dry_run: bool,
    },
    /// Promote the best-ranked registered participants to qualified
    Qualify {
        file: PathBuf,

        #[arg(short, long)]
        count: Option<usize>,

        #[arg(long)]
        dry_run: bool,
    },
    /// Credit an engagement event to a participant
    Engage {
        file: PathBuf,

        #[arg(long)]
        participant: Uuid,

        #[arg(long)]
        value: u32,
    },
    /// Move a participant to another stage (registered, qualified, finalist, disqualified)
    Stage {
        file: PathBuf,

        #[arg(long)]
        participant: Uuid,

        #[arg(long)]
        stage: String,
    },
    /// Recompute fraud scores for every participant
    Fraud {
        file: PathBuf,

        #[arg(long)]
        write: bool,
    },
    /// Register a participant into an active contest
    Register {
        file: PathBuf,

        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long, default_value = "other")]
        platform: String,

        #[arg(long)]
        ip: Option<String>,

        #[arg(long)]
        user_agent: Option<String>,

        #[arg(long)]
        referred_by: Option<Uuid>,
    },
    /// Print the identity hash of an email/phone pair within a contest
    Hash {
        #[arg(long)]
        email: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        contest: String,
    },
    /// Print a fresh publishable seed for a contest
    Seed {
        #[arg(long)]
        contest: String,
    },
    /// Print a random verification token
    Token,
    /// Replay a seeded pure random draw and check it matches a saved result
    Verify {
        file: PathBuf,

        #[arg(long)]
        report: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("draw={},engine={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let policy = config.policy();

    match cli.command {
        Commands::Select {
            file,
            algorithm,
            count,
            report,
            dry_run,
        } => {
            let request = SelectionRequest { algorithm, count };
            handle_select(&file, request, report.as_deref(), dry_run, policy).await?;
        }
        Commands::Qualify {
            file,
            count,
            dry_run,
        } => {
            handle_qualify(&file, count, dry_run, policy).await?;
        }
        Commands::Engage {
            file,
            participant,
            value,
        } => {
            handle_engage(&file, participant, value, policy).await?;
        }
        Commands::Stage {
            file,
            participant,
            stage,
        } => {
            handle_stage(&file, participant, stage.parse()?, policy).await?;
        }
        Commands::Fraud { file, write } => {
            handle_fraud(&file, write, policy).await?;
        }
        Commands::Register {
            file,
            name,
            email,
            phone,
            platform,
            ip,
            user_agent,
            referred_by,
        } => {
            let request = RegistrationRequest {
                name,
                email,
                phone,
                platform: platform.parse()?,
                ip_address: ip,
                user_agent,
                referred_by,
            };
            let id = handle_register(&file, request).await?;
            println!("{}", id);
        }
        Commands::Hash {
            email,
            phone,
            contest,
        } => {
            println!("{}", generate_identity_hash(&email, phone.as_deref(), &contest, &[])?);
        }
        Commands::Seed { contest } => {
            println!("{}", generate_random_seed(&contest, Utc::now()));
        }
        Commands::Token => {
            println!("{}", generate_verification_token()?);
        }
        Commands::Verify { file, report } => {
            handle_verify(&file, &report, policy).await?;
        }
    }

    Ok(())
}

async fn load_dataset(path: &Path) -> anyhow::Result<Dataset> {
    tracing::debug!("Loading dataset from: {}", path.display());
    let json_content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let dataset: Dataset = serde_json::from_str(&json_content)
        .with_context(|| format!("{} is not a valid contest dataset", path.display()))?;

    tracing::info!(
        "Loaded contest: {} ({} participants)",
        dataset.contest.title,
        dataset.participants.len()
    );
    Ok(dataset)
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json_content = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json_content)
        .await
        .with_context(|| format!("Cannot write {}", path.display()))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

async fn handle_select(
    file: &Path,
    request: SelectionRequest,
    report: Option<&Path>,
    dry_run: bool,
    policy: SelectionPolicy,
) -> anyhow::Result<SelectionResult> {
    let dataset = load_dataset(file).await?;
    let contest_id = dataset.contest.id;
    let store = Arc::new(InMemoryStore::from_dataset(dataset));
    let orchestrator = SelectionOrchestrator::with_policy(store.clone(), policy);

    let result = orchestrator.select_winners(contest_id, request).await?;

    for (rank, winner) in result.winners.iter().enumerate() {
        tracing::info!("  {}. {} <{}> ({})", rank + 1, winner.name, winner.email, winner.id);
    }
    tracing::info!(
        "Fairness score: {}/100 ({})",
        result.fairness_score(),
        result.report.metrics.selection_criteria
    );

    match report {
        Some(path) => write_json(path, &result).await?,
        None => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    if dry_run || result.winners.is_empty() {
        return Ok(result);
    }

    write_json(file, &store.dataset(contest_id).await?).await?;
    tracing::info!("✓ Recorded {} winners in {}", result.winners.len(), file.display());

    Ok(result)
}

async fn handle_qualify(
    file: &Path,
    count: Option<usize>,
    dry_run: bool,
    policy: SelectionPolicy,
) -> anyhow::Result<Vec<Uuid>> {
    let dataset = load_dataset(file).await?;
    let contest_id = dataset.contest.id;
    let store = Arc::new(InMemoryStore::from_dataset(dataset));
    let orchestrator = SelectionOrchestrator::with_policy(store.clone(), policy);

    let qualified = orchestrator.bulk_qualify(contest_id, count).await?;

    if !dry_run && !qualified.is_empty() {
        write_json(file, &store.dataset(contest_id).await?).await?;
        tracing::info!("✓ Qualified {} participants", qualified.len());
    }

    Ok(qualified)
}

async fn handle_engage(
    file: &Path,
    participant_id: Uuid,
    value: u32,
    policy: SelectionPolicy,
) -> anyhow::Result<Participant> {
    let dataset = load_dataset(file).await?;
    let contest_id = dataset.contest.id;
    let store = Arc::new(InMemoryStore::from_dataset(dataset));
    let orchestrator = SelectionOrchestrator::with_policy(store.clone(), policy);

    let participant = orchestrator.record_engagement(participant_id, value).await?;

    write_json(file, &store.dataset(contest_id).await?).await?;
    Ok(participant)
}

async fn handle_stage(
    file: &Path,
    participant_id: Uuid,
    stage: ParticipantStage,
    policy: SelectionPolicy,
) -> anyhow::Result<Participant> {
    let dataset = load_dataset(file).await?;
    let contest_id = dataset.contest.id;
    let store = Arc::new(InMemoryStore::from_dataset(dataset));
    let orchestrator = SelectionOrchestrator::with_policy(store.clone(), policy);

    let participant = orchestrator.transition_stage(participant_id, stage).await?;

    write_json(file, &store.dataset(contest_id).await?).await?;
    tracing::info!("✓ {} is now {}", participant.name, participant.stage);
    Ok(participant)
}

async fn handle_fraud(file: &Path, write: bool, policy: SelectionPolicy) -> anyhow::Result<()> {
    let mut dataset = load_dataset(file).await?;

    let assessments = rescore_fraud(&mut dataset.participants, policy.fraud_threshold);
    let flagged = assessments.iter().filter(|a| a.flagged).count();
    let changed = assessments
        .iter()
        .filter(|a| a.previous_score != a.fraud_score)
        .count();

    println!("{}", serde_json::to_string_pretty(&assessments)?);
    tracing::info!(
        "Summary: {} flagged, {} changed, {} checked",
        flagged,
        changed,
        assessments.len()
    );

    if write {
        write_json(file, &dataset).await?;
    }

    Ok(())
}

async fn handle_register(file: &Path, request: RegistrationRequest) -> anyhow::Result<Uuid> {
    let mut dataset = load_dataset(file).await?;

    let participant = register_participant(
        &dataset.contest,
        &mut dataset.participants,
        request,
        Utc::now(),
    )?;

    write_json(file, &dataset).await?;
    Ok(participant.id)
}

/// Participants that could have been drawn: the current draw pool plus the recorded winners.
fn replay_pool(dataset: &Dataset, policy: &SelectionPolicy) -> Vec<Participant> {
    let mut pool: Vec<Participant> = dataset
        .participants
        .iter()
        .filter(|p| p.contest_id == dataset.contest.id)
        .filter(|p| p.stage == ParticipantStage::Winner || policy.can_be_drawn(p))
        .cloned()
        .collect();
    pool.sort_by(|a, b| {
        a.registration_date
            .cmp(&b.registration_date)
            .then_with(|| a.id.cmp(&b.id))
    });
    pool
}

async fn handle_verify(file: &Path, report: &Path, policy: SelectionPolicy) -> anyhow::Result<()> {
    let dataset = load_dataset(file).await?;
    let json_content = tokio::fs::read_to_string(report)
        .await
        .with_context(|| format!("Cannot read {}", report.display()))?;
    let result: SelectionResult = serde_json::from_str(&json_content)?;

    if result.contest_id != dataset.contest.id {
        bail!("Result belongs to contest {}, not {}", result.contest_id, dataset.contest.id);
    }
    if result.report.algorithm != FairnessAlgorithm::PureRandom {
        bail!("Only pure random draws can be replayed, got {}", result.report.algorithm);
    }
    let Some(seed) = result.seed.as_deref() else {
        bail!("Draw was not seeded and cannot be replayed");
    };

    let pool = replay_pool(&dataset, &policy);
    let winners = result.winner_ids();
    if !verify_seeded_draw(&pool, winners.len(), seed, &winners) {
        bail!("✗ Replaying seed {} over {} participants gave different winners", seed, pool.len());
    }

    tracing::info!("✓ Draw verified: seed {} reproduces all {} winners", seed, winners.len());
    Ok(())
}
