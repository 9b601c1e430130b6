use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use crate::command::Command;

/// Single-producer / single-consumer FIFO of 32-bit command words.
///
/// Models the inter-core mailbox: a handful of slots, `push` spins while the
/// queue is full and `pop` spins while it is empty. Nothing is ever dropped.
/// Neither end is `Clone` and both operations take `&mut self`, so there is
/// exactly one producer and one consumer.
pub struct CommandSender {
    inner: Arc<Inner>,
}

pub struct CommandReceiver {
    inner: Arc<Inner>,
}

struct Inner {
    // One extra slot so head==tail is unambiguously empty.
    slots: Box<[AtomicU32]>,
    cap: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
    sender_alive: AtomicBool,
}

impl Inner {
    fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        if head >= tail {
            head - tail
        } else {
            (self.cap - tail) + head
        }
    }

    fn capacity(&self) -> usize {
        self.cap - 1
    }

    #[inline]
    fn next_index(&self, idx: usize) -> usize {
        let next = idx + 1;
        if next == self.cap { 0 } else { next }
    }
}

/// Creates a channel holding up to `capacity` words (at least one).
pub fn command_channel(capacity: usize) -> (CommandSender, CommandReceiver) {
    let cap = capacity.max(1) + 1;
    let slots: Vec<AtomicU32> = (0..cap).map(|_| AtomicU32::new(0)).collect();

    let inner = Arc::new(Inner {
        slots: slots.into_boxed_slice(),
        cap,
        head: AtomicUsize::new(0),
        tail: AtomicUsize::new(0),
        sender_alive: AtomicBool::new(true),
    });

    (
        CommandSender {
            inner: Arc::clone(&inner),
        },
        CommandReceiver { inner },
    )
}

impl CommandSender {
    /// Enqueues `cmd`, spinning until a slot is free.
    #[inline]
    pub fn push(&mut self, cmd: Command) {
        self.push_word(cmd.to_word());
    }

    /// Enqueues a raw word, spinning until a slot is free.
    pub fn push_word(&mut self, word: u32) {
        while !self.try_push_word(word) {
            std::hint::spin_loop();
        }
    }

    /// Enqueues a raw word if a slot is free. Returns `false` when full.
    pub fn try_push_word(&mut self, word: u32) -> bool {
        let head = self.inner.head.load(Ordering::Relaxed);
        let next = self.inner.next_index(head);
        let tail = self.inner.tail.load(Ordering::Acquire);
        if next == tail {
            return false;
        }

        self.inner.slots[head].store(word, Ordering::Relaxed);
        self.inner.head.store(next, Ordering::Release);
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

impl Drop for CommandSender {
    fn drop(&mut self) {
        self.inner.sender_alive.store(false, Ordering::Release);
    }
}

impl CommandReceiver {
    /// Dequeues the oldest word, spinning while the queue is empty.
    ///
    /// Returns `None` only once the sender has been dropped and every word it
    /// pushed has been taken.
    pub fn pop(&mut self) -> Option<u32> {
        loop {
            if let Some(word) = self.try_pop() {
                return Some(word);
            }
            if !self.inner.sender_alive.load(Ordering::Acquire) {
                // The sender may have pushed right before going away.
                return self.try_pop();
            }
            std::hint::spin_loop();
        }
    }

    /// Dequeues the oldest word if one is available.
    pub fn try_pop(&mut self) -> Option<u32> {
        let tail = self.inner.tail.load(Ordering::Relaxed);
        let head = self.inner.head.load(Ordering::Acquire);
        if tail == head {
            return None;
        }

        let word = self.inner.slots[tail].load(Ordering::Relaxed);
        let next = self.inner.next_index(tail);
        self.inner.tail.store(next, Ordering::Release);
        Some(word)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Returns whether the producing end still exists.
    pub fn is_connected(&self) -> bool {
        self.inner.sender_alive.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_usable_in_full() {
        let (mut tx, mut rx) = command_channel(4);
        for word in 0..4 {
            assert!(tx.try_push_word(word));
        }
        assert!(tx.is_full());
        assert!(!tx.try_push_word(99));
        assert_eq!(rx.try_pop(), Some(0));
        assert!(tx.try_push_word(4));
        assert_eq!(rx.len(), 4);
    }

    #[test]
    fn zero_capacity_is_promoted_to_one() {
        let (tx, _rx) = command_channel(0);
        assert_eq!(tx.capacity(), 1);
    }

    #[test]
    fn pop_drains_then_reports_disconnect() {
        let (mut tx, mut rx) = command_channel(2);
        tx.push_word(7);
        drop(tx);
        assert!(!rx.is_connected());
        assert_eq!(rx.pop(), Some(7));
        assert_eq!(rx.pop(), None);
    }
}
