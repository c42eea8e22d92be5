//! Frontier queue
//!
//! A FIFO ring buffer with explicit capacity management. The backing storage
//! doubles when an insert finds it full and halves when occupancy drops below
//! a quarter of capacity after a removal, so both ends stay amortized O(1)
//! while memory tracks the live size.
//!
//! The queue is not synchronized. Callers that share it between tasks wrap it
//! together with the rest of their state behind a single lock.

use std::fmt;

/// Growable, shrinkable FIFO queue
pub struct FrontierQueue<T> {
    /// Backing slots; `slots.len()` is the capacity
    slots: Vec<Option<T>>,

    /// Index of the logical head
    head: usize,

    /// Number of occupied slots
    len: usize,
}

impl<T> FrontierQueue<T> {
    /// Creates an empty queue with zero capacity
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: 0,
            len: 0,
        }
    }

    /// Appends one element at the tail
    pub fn enqueue(&mut self, value: T) {
        if self.len == self.capacity() {
            let grown = std::cmp::max(self.capacity() * 2, 1);
            self.resize(grown);
        }

        let tail = (self.head + self.len) % self.capacity();
        self.slots[tail] = Some(value);
        self.len += 1;
    }

    /// Appends every element of `values` at the tail, preserving their order
    ///
    /// Returns the number of elements appended.
    pub fn enqueue_all<I>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut count = 0;
        for value in values {
            self.enqueue(value);
            count += 1;
        }
        count
    }

    /// Removes and returns the head, or `None` if the queue is empty
    pub fn dequeue(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        let value = self.slots[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;

        let capacity = self.capacity();
        if self.len < capacity / 4 {
            self.resize(capacity / 2);
        }

        value
    }

    /// Returns the head without removing it
    pub fn front(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        self.slots[self.head].as_ref()
    }

    /// Returns the tail without removing it
    pub fn back(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        let tail = (self.head + self.len - 1) % self.capacity();
        self.slots[tail].as_ref()
    }

    /// Number of queued elements
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots currently allocated
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterates from head to tail
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let capacity = self.capacity();
        (0..self.len).filter_map(move |offset| self.slots[(self.head + offset) % capacity].as_ref())
    }

    /// Moves the live elements into fresh storage of `new_capacity` slots,
    /// head first
    fn resize(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity >= self.len);

        let old_capacity = self.capacity();
        let mut slots = Vec::with_capacity(new_capacity);
        for offset in 0..self.len {
            slots.push(self.slots[(self.head + offset) % old_capacity].take());
        }
        slots.resize_with(new_capacity, || None);

        self.slots = slots;
        self.head = 0;
    }
}

impl<T> Default for FrontierQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Extend<T> for FrontierQueue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.enqueue_all(iter);
    }
}

impl<T: fmt::Debug> fmt::Debug for FrontierQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrontierQueue")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("items", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}
