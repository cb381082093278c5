use std::collections::VecDeque;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::federation_model::order::order::OrderRef;

#[derive(Debug)]
struct QueueEntry {
    /// Append sequence number, strictly increasing along the queue.
    seq: u64,
    order: OrderRef,
}

#[derive(Debug, Default)]
struct QueueInner {
    entries: VecDeque<QueueEntry>,
    next_seq: u64,
}

/// Thread-safe ordered sequence of orders, one per order state.
///
/// Mutations (`append`, `remove_if_present`) take the write lock, reads and cursor steps take the
/// read lock, so several traversals can run side by side. Every entry is stamped with a sequence
/// number on append. A [`QueueCursor`] only remembers the sequence number it stands on, never a
/// reference into the queue, so removals cannot invalidate it.
#[derive(Debug, Clone, Default)]
pub struct SynchronizedOrderQueue {
    inner: Arc<RwLock<QueueInner>>,
}

impl SynchronizedOrderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, QueueInner> {
        self.inner.read().expect("Order queue lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, QueueInner> {
        self.inner.write().expect("Order queue lock poisoned")
    }

    /// Appends at the tail.
    pub fn append(&self, order: OrderRef) {
        let mut guard = self.write();
        let seq = guard.next_seq;
        guard.next_seq += 1;
        guard.entries.push_back(QueueEntry { seq, order });
    }

    /// Removes the entry holding this very order handle (pointer identity, not value equality).
    ///
    /// # Returns
    /// `false` if the order was not in the queue, which is a normal outcome.
    pub fn remove_if_present(&self, order: &OrderRef) -> bool {
        let mut guard = self.write();
        match guard.entries.iter().position(|entry| Arc::ptr_eq(&entry.order, order)) {
            Some(index) => {
                guard.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, order: &OrderRef) -> bool {
        self.read().entries.iter().any(|entry| Arc::ptr_eq(&entry.order, order))
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    /// Copy of the current content, in append order.
    pub fn snapshot(&self) -> Vec<OrderRef> {
        self.read().entries.iter().map(|entry| entry.order.clone()).collect()
    }

    /// Creates a new traversal positioned before the head.
    pub fn cursor(&self) -> QueueCursor {
        QueueCursor { queue: self.clone(), position: None }
    }
}

/// Position of one traversal over a [`SynchronizedOrderQueue`].
///
/// A cursor is owned by exactly one traversal and is not shared between threads. If the entry
/// under the cursor is removed, `current` returns `None` and `advance` continues with the first
/// surviving entry that was appended after the removed one. Entries appended while the
/// traversal is at the tail are picked up by later `advance` calls.
#[derive(Debug)]
pub struct QueueCursor {
    queue: SynchronizedOrderQueue,
    position: Option<u64>,
}

impl QueueCursor {
    /// Moves to the next entry and returns it, `None` if the cursor is at the tail.
    /// At the tail the cursor does not move.
    pub fn advance(&mut self) -> Option<OrderRef> {
        let guard = self.queue.read();
        let index = match self.position {
            None => 0,
            Some(seq) => guard.entries.partition_point(|entry| entry.seq <= seq),
        };

        let entry = guard.entries.get(index)?;
        self.position = Some(entry.seq);
        Some(entry.order.clone())
    }

    /// Order under the cursor, without moving. `None` before the head or if that entry was removed.
    pub fn current(&self) -> Option<OrderRef> {
        let seq = self.position?;
        let guard = self.queue.read();
        let index = guard.entries.binary_search_by_key(&seq, |entry| entry.seq).ok()?;
        Some(guard.entries[index].order.clone())
    }

    /// Rewinds to before the head.
    pub fn reset(&mut self) {
        self.position = None;
    }
}

impl Iterator for QueueCursor {
    type Item = OrderRef;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::federation_model::order::federation_user::FederationUser;
    use crate::domain::federation_model::order::order::{Order, OrderPayload, VolumeSpec};
    use crate::domain::federation_model::utils::id::{CloudName, MemberId};
    use std::thread;

    fn order(name: &str) -> OrderRef {
        let user = FederationUser::new("m1", "token", "user", "user");
        let payload = OrderPayload::Volume(VolumeSpec { name: name.to_string(), size_gb: 1 });
        Order::new(MemberId::new("m1"), MemberId::new("m1"), CloudName::new("default"), user, payload).into_ref()
    }

    fn name_of(order: &OrderRef) -> String {
        match &order.read().unwrap().payload {
            OrderPayload::Volume(spec) => spec.name.clone(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_cursor_visits_in_append_order() {
        let queue = SynchronizedOrderQueue::new();
        for name in ["a", "b", "c"] {
            queue.append(order(name));
        }

        let names: Vec<String> = queue.cursor().map(|o| name_of(&o)).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_is_by_identity() {
        let queue = SynchronizedOrderQueue::new();
        let first = order("same");
        let twin = Arc::new(RwLock::new(first.read().unwrap().clone()));
        queue.append(first.clone());

        assert!(!queue.remove_if_present(&twin));
        assert_eq!(queue.len(), 1);
        assert!(queue.remove_if_present(&first));
        assert!(queue.is_empty());
        assert!(!queue.remove_if_present(&first));
    }

    #[test]
    fn test_removing_cursored_entry_continues_with_successor() {
        let queue = SynchronizedOrderQueue::new();
        let (a, b, c) = (order("a"), order("b"), order("c"));
        queue.append(a.clone());
        queue.append(b.clone());
        queue.append(c.clone());

        let mut cursor = queue.cursor();
        assert!(Arc::ptr_eq(&cursor.advance().unwrap(), &a));
        assert!(Arc::ptr_eq(&cursor.advance().unwrap(), &b));

        queue.remove_if_present(&b);

        assert!(cursor.current().is_none());
        assert!(Arc::ptr_eq(&cursor.advance().unwrap(), &c));
        assert!(cursor.advance().is_none());
    }

    #[test]
    fn test_removing_successor_of_cursor_skips_it() {
        let queue = SynchronizedOrderQueue::new();
        let (a, b, c) = (order("a"), order("b"), order("c"));
        for o in [&a, &b, &c] {
            queue.append((*o).clone());
        }

        let mut cursor = queue.cursor();
        cursor.advance();
        queue.remove_if_present(&b);

        assert!(Arc::ptr_eq(&cursor.current().unwrap(), &a));
        assert!(Arc::ptr_eq(&cursor.advance().unwrap(), &c));
    }

    #[test]
    fn test_cursor_at_tail_sees_later_appends() {
        let queue = SynchronizedOrderQueue::new();
        let mut cursor = queue.cursor();
        assert!(cursor.advance().is_none());

        let late = order("late");
        queue.append(late.clone());

        assert!(Arc::ptr_eq(&cursor.advance().unwrap(), &late));
        cursor.reset();
        assert!(cursor.current().is_none());
        assert!(Arc::ptr_eq(&cursor.advance().unwrap(), &late));
    }

    #[test]
    fn test_independent_cursors() {
        let queue = SynchronizedOrderQueue::new();
        queue.append(order("a"));
        queue.append(order("b"));

        let mut first = queue.cursor();
        let mut second = queue.cursor();
        first.advance();
        first.advance();

        assert_eq!(name_of(&second.advance().unwrap()), "a");
        assert_eq!(name_of(&first.current().unwrap()), "b");
    }

    #[test]
    fn test_concurrent_appends_are_visited_exactly_once() {
        const N: usize = 500;
        let queue = SynchronizedOrderQueue::new();

        let producer_queue = queue.clone();
        let producer = thread::spawn(move || {
            for i in 0..N {
                producer_queue.append(order(&i.to_string()));
                if i % 50 == 0 {
                    thread::yield_now();
                }
            }
        });

        let mut cursor = queue.cursor();
        let mut seen = Vec::with_capacity(N);
        while seen.len() < N {
            match cursor.advance() {
                Some(o) => seen.push(name_of(&o)),
                None => thread::yield_now(),
            }
        }
        producer.join().unwrap();

        assert!(cursor.advance().is_none());
        let expected: Vec<String> = (0..N).map(|i| i.to_string()).collect();
        assert_eq!(seen, expected);
    }
}
