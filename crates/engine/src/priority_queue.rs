use std::cmp::Ordering;
use std::fmt;

/// Array-backed binary heap ordered by a caller-supplied comparator.
///
/// The element for which the comparator returns `Less` against every other
/// element sits at the root. Pass a reversed comparator to get a max-heap.
/// The heap is not stable: elements comparing `Equal` come out in unspecified
/// order, so any tie-break has to be part of the comparator.
pub struct PriorityQueue<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    heap: Vec<T>,
    compare: F,
}

impl<T, F> PriorityQueue<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    pub fn new(compare: F) -> Self {
        Self {
            heap: Vec::new(),
            compare,
        }
    }

    pub fn with_capacity(capacity: usize, compare: F) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            compare,
        }
    }

    pub fn enqueue(&mut self, item: T) {
        self.heap.push(item);
        self.sift_up(self.heap.len() - 1);
    }

    pub fn dequeue(&mut self) -> Option<T> {
        if self.heap.is_empty() {
            return None;
        }

        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let root = self.heap.pop();

        if !self.heap.is_empty() {
            self.sift_down(0);
        }

        root
    }

    pub fn peek(&self) -> Option<&T> {
        self.heap.first()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Current contents in heap order, which is not sorted order.
    pub fn as_slice(&self) -> &[T] {
        &self.heap
    }

    /// Drains the queue, returning elements in comparator order.
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        let mut sorted = Vec::with_capacity(self.heap.len());
        while let Some(item) = self.dequeue() {
            sorted.push(item);
        }
        sorted
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if (self.compare)(&self.heap[index], &self.heap[parent]) != Ordering::Less {
                break;
            }
            self.heap.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;

            if left < len && (self.compare)(&self.heap[left], &self.heap[smallest]) == Ordering::Less {
                smallest = left;
            }
            if right < len && (self.compare)(&self.heap[right], &self.heap[smallest]) == Ordering::Less {
                smallest = right;
            }
            if smallest == index {
                break;
            }

            self.heap.swap(index, smallest);
            index = smallest;
        }
    }
}

impl<T: Clone, F> PriorityQueue<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    /// Shallow copy of the current contents in heap order.
    pub fn to_vec(&self) -> Vec<T> {
        self.heap.clone()
    }
}

impl<T, F> Extend<T> for PriorityQueue<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.enqueue(item);
        }
    }
}

impl<T: fmt::Debug, F> fmt::Debug for PriorityQueue<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityQueue").field("heap", &self.heap).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Entry {
        name: &'static str,
        priority: i32,
    }

    fn entry(name: &'static str, priority: i32) -> Entry {
        Entry { name, priority }
    }

    #[test]
    fn test_min_heap_dequeues_in_priority_order() {
        let mut queue = PriorityQueue::new(|a: &Entry, b: &Entry| a.priority.cmp(&b.priority));
        queue.extend([
            entry("Alice", 50),
            entry("Bob", 30),
            entry("Charlie", 70),
            entry("Diana", 10),
            entry("Eve", 90),
        ]);

        assert_eq!(queue.len(), 5);
        assert_eq!(queue.peek().map(|e| e.name), Some("Diana"));

        let names: Vec<&str> = std::iter::from_fn(|| queue.dequeue()).map(|e| e.name).collect();
        assert_eq!(names, vec!["Diana", "Bob", "Alice", "Charlie", "Eve"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_reversed_comparator_gives_max_heap() {
        let mut queue = PriorityQueue::new(|a: &i32, b: &i32| b.cmp(a));
        queue.extend([3, 9, 1, 7]);
        assert_eq!(queue.into_sorted_vec(), vec![9, 7, 3, 1]);
    }

    #[test]
    fn test_empty_queue() {
        let mut queue = PriorityQueue::new(|a: &i32, b: &i32| a.cmp(b));
        assert!(queue.peek().is_none());
        assert!(queue.dequeue().is_none());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut queue = PriorityQueue::with_capacity(2, |a: &i32, b: &i32| a.cmp(b));
        queue.enqueue(2);
        queue.enqueue(1);
        assert_eq!(queue.peek(), Some(&1));
        assert_eq!(queue.peek(), Some(&1));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_snapshot_holds_every_element() {
        let mut queue = PriorityQueue::new(|a: &i32, b: &i32| a.cmp(b));
        queue.extend([5, 2, 8, 1]);

        let mut snapshot = queue.to_vec();
        assert_eq!(snapshot[0], 1);
        snapshot.sort();
        assert_eq!(snapshot, vec![1, 2, 5, 8]);
        assert_eq!(queue.as_slice().len(), 4);
    }

    #[test]
    fn test_interleaved_operations() {
        let mut queue = PriorityQueue::new(|a: &i32, b: &i32| a.cmp(b));
        queue.extend([4, 8, 6]);
        assert_eq!(queue.dequeue(), Some(4));
        queue.enqueue(1);
        queue.enqueue(7);
        assert_eq!(queue.dequeue(), Some(1));
        assert_eq!(queue.dequeue(), Some(6));
        queue.enqueue(2);
        assert_eq!(queue.into_sorted_vec(), vec![2, 7, 8]);
    }
}
