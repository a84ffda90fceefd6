//! Bounded in-memory buffers. Nothing here grows past a fixed capacity.

use std::collections::VecDeque;

/// Sliding window that lets samples accumulate to twice the window size and
/// then trims back to the newest `window` samples, amortising the front drain.
#[derive(Clone, Debug)]
pub struct SlidingWindow<T> {
    buf: VecDeque<T>,
    window: usize,
}

impl<T> SlidingWindow<T> {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self { buf: VecDeque::with_capacity(window * 2 + 1), window }
    }

    pub fn push(&mut self, item: T) {
        self.buf.push_back(item);
        if self.buf.len() > self.window * 2 {
            let excess = self.buf.len() - self.window;
            self.buf.drain(..excess);
        }
    }

    pub fn window(&self) -> usize { self.window }
    pub fn len(&self) -> usize { self.buf.len() }
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }
    pub fn is_full(&self) -> bool { self.buf.len() >= self.window }
    pub fn last(&self) -> Option<&T> { self.buf.back() }
    pub fn clear(&mut self) { self.buf.clear() }

    /// The newest `window` samples (fewer if not yet full), oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &T> {
        let skip = self.buf.len().saturating_sub(self.window);
        self.buf.iter().skip(skip)
    }
}

/// FIFO history that drops its oldest entry at capacity.
#[derive(Clone, Debug)]
pub struct History<T> {
    buf: VecDeque<T>,
    cap: usize,
}

impl<T> History<T> {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self { buf: VecDeque::with_capacity(cap), cap }
    }

    pub fn push(&mut self, item: T) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(item);
    }

    pub fn len(&self) -> usize { self.buf.len() }
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }
    pub fn last(&self) -> Option<&T> { self.buf.back() }
    pub fn iter(&self) -> impl Iterator<Item = &T> { self.buf.iter() }
    pub fn clear(&mut self) { self.buf.clear() }

    /// Last two entries as (previous, latest).
    pub fn last_two(&self) -> Option<(&T, &T)> {
        let n = self.buf.len();
        if n < 2 {
            return None;
        }
        Some((&self.buf[n - 2], &self.buf[n - 1]))
    }
}

impl<T: Copy> History<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.buf.iter().copied().collect()
    }
}
