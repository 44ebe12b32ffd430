//! Fixed-capacity word queues between foreground and interrupt context
//!
//! Each queue has exactly one producer and one consumer living in opposite
//! contexts. The port keeps every queue inside a critical-section mutex, so
//! the length can never be torn by a preempting handler; `push` and `pop`
//! are the only mutators.

use heapless::Deque;

/// FIFO of line words (data, parity and, for TX, stop bits)
#[derive(Debug, Clone)]
pub struct WordQueue<const N: usize> {
    words: Deque<u16, N>,
}

impl<const N: usize> Default for WordQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> WordQueue<N> {
    pub const fn new() -> Self {
        Self {
            words: Deque::new(),
        }
    }

    /// Append a word; hands it back if the queue is full
    pub fn push(&mut self, word: u16) -> Result<(), u16> {
        self.words.push_back(word)
    }

    /// Remove the oldest word
    pub fn pop(&mut self) -> Option<u16> {
        self.words.pop_front()
    }

    /// Oldest word without removing it
    pub fn peek(&self) -> Option<u16> {
        self.words.front().copied()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.words.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Free slots
    pub fn free(&self) -> usize {
        N - self.words.len()
    }

    /// Drop everything queued
    pub fn clear(&mut self) {
        self.words.clear();
    }
}
