//! Bounded blocking FIFO connecting pipeline stages.
//!
//! A queue is a pair of endpoints over a `crossbeam_channel::bounded`
//! channel. `push` blocks while the queue is full, `pop` blocks while it is
//! empty. Either side closes by dropping (or calling `close` on) its
//! endpoints:
//!
//! - once every [`Producer`] is gone, consumers drain what is left and then
//!   `pop` returns `None`;
//! - once every [`Consumer`] is gone, `push` fails at once, which is how a
//!   dead downstream stage stops the stage feeding it.

use std::fmt;

use crossbeam_channel::{bounded as channel, Receiver, Sender};

/// Returned by `push` on a closed queue; carries the rejected item back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closed<T>(pub T);

impl<T> fmt::Display for Closed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue closed")
    }
}

/// A queue holding at most `capacity` items (minimum 1).
///
/// Split it into its endpoints before handing them to the stages.
pub struct BoundedQueue<T> {
    producer: Producer<T>,
    consumer: Consumer<T>,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = channel(capacity.max(1));
        Self {
            producer: Producer { tx },
            consumer: Consumer { rx },
        }
    }

    pub fn split(self) -> (Producer<T>, Consumer<T>) {
        (self.producer, self.consumer)
    }
}

/// Sending half. Clone it to add producers.
#[derive(Clone)]
pub struct Producer<T> {
    tx: Sender<T>,
}

impl<T> Producer<T> {
    /// Append an item, blocking while the queue is full.
    pub fn push(&self, item: T) -> Result<(), Closed<T>> {
        self.tx.send(item).map_err(|e| Closed(e.into_inner()))
    }

    /// Give up this producer. The queue ends once the last one is closed.
    pub fn close(self) {}

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(1)
    }
}

/// Receiving half. Clone it to add consumers.
#[derive(Clone)]
pub struct Consumer<T> {
    rx: Receiver<T>,
}

impl<T> Consumer<T> {
    /// Take the oldest item, blocking while the queue is empty and open.
    /// Returns `None` once every producer is gone and the queue is drained.
    pub fn pop(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Give up this consumer. Producers fail once the last one is closed.
    pub fn close(self) {}

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let (tx, rx) = BoundedQueue::new(4).split();
        for i in 0..4 {
            tx.push(i).unwrap();
        }
        tx.close();
        let drained: Vec<_> = std::iter::from_fn(|| rx.pop()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_push_blocks_when_full() {
        let (tx, rx) = BoundedQueue::new(2).split();
        tx.push(1).unwrap();
        tx.push(2).unwrap();

        let pushed = Arc::new(AtomicBool::new(false));
        let producer = {
            let tx = tx.clone();
            let pushed = pushed.clone();
            thread::spawn(move || {
                tx.push(3).unwrap();
                pushed.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!pushed.load(Ordering::SeqCst), "push must wait for space");
        assert_eq!(rx.len(), 2);

        assert_eq!(rx.pop(), Some(1));
        producer.join().unwrap();
        assert!(pushed.load(Ordering::SeqCst));
        assert_eq!(rx.pop(), Some(2));
        assert_eq!(rx.pop(), Some(3));
    }

    #[test]
    fn test_pop_blocks_until_push_or_close() {
        let (tx, rx) = BoundedQueue::<u32>::new(1).split();
        let consumer = thread::spawn(move || (rx.pop(), rx.pop()));

        thread::sleep(Duration::from_millis(20));
        tx.push(9).unwrap();
        tx.close();
        assert_eq!(consumer.join().unwrap(), (Some(9), None));
    }

    #[test]
    fn test_close_drains_then_ends() {
        let (tx, rx) = BoundedQueue::new(3).split();
        tx.push("a").unwrap();
        tx.push("b").unwrap();
        tx.close();

        assert_eq!(rx.pop(), Some("a"));
        assert_eq!(rx.pop(), Some("b"));
        assert_eq!(rx.pop(), None);
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn test_queue_stays_open_while_any_producer_remains() {
        let (tx, rx) = BoundedQueue::new(2).split();
        let other = tx.clone();
        tx.close();

        other.push(1).unwrap();
        assert_eq!(rx.pop(), Some(1));
        other.close();
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn test_consumer_close_unblocks_waiting_producer() {
        let (tx, rx) = BoundedQueue::new(1).split();
        tx.push(0).unwrap();

        let producer = thread::spawn(move || tx.push(1));

        thread::sleep(Duration::from_millis(20));
        rx.close();
        assert_eq!(producer.join().unwrap(), Err(Closed(1)));
    }

    #[test]
    fn test_last_consumer_closes_queue() {
        let (tx, rx) = BoundedQueue::new(4).split();
        let second = rx.clone();
        rx.close();
        tx.push(1).unwrap();
        second.close();
        assert_eq!(tx.push(2), Err(Closed(2)));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (tx, _rx) = BoundedQueue::<u8>::new(0).split();
        assert_eq!(tx.capacity(), 1);
    }

    #[test]
    fn test_many_producers_many_consumers() {
        let (tx, rx) = BoundedQueue::new(4).split();
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let tx = tx.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        tx.push(p * 1000 + i).unwrap();
                    }
                })
            })
            .collect();
        tx.close();
        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let rx = rx.clone();
                thread::spawn(move || std::iter::from_fn(|| rx.pop()).count())
            })
            .collect();
        rx.close();

        for p in producers {
            p.join().unwrap();
        }
        let total: usize = consumers.into_iter().map(|c| c.join().unwrap()).sum();
        assert_eq!(total, 1000);
    }
}
