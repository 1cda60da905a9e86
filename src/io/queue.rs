//! Fixed-capacity containers for byte and event streams.
//!
//! Both containers live entirely inline (no heap) and never fail loudly:
//! pushing into a full container drops the item, and reading from an empty
//! one yields the sentinel `T::default()` (zero for integers).

/// First-in first-out ring buffer.
#[derive(Debug, Clone)]
pub struct BoundedQueue<T, const N: usize> {
    items: [T; N],
    head: usize,
    len: usize,
}

impl<T: Copy + Default, const N: usize> Default for BoundedQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const N: usize> BoundedQueue<T, N> {
    pub fn new() -> Self {
        Self {
            items: [T::default(); N],
            head: 0,
            len: 0,
        }
    }

    /// Append an item. Returns false (and drops the item) when full.
    pub fn push(&mut self, item: T) -> bool {
        if self.is_full() {
            return false;
        }
        let tail = (self.head + self.len) % N;
        self.items[tail] = item;
        self.len += 1;
        true
    }

    /// Remove the oldest item, or the sentinel when empty.
    pub fn pop(&mut self) -> T {
        if self.is_empty() {
            return T::default();
        }
        let item = self.items[self.head];
        self.head = (self.head + 1) % N;
        self.len -= 1;
        item
    }

    /// The oldest item without removing it, or the sentinel when empty.
    pub fn peek(&self) -> T {
        if self.is_empty() {
            return T::default();
        }
        self.items[self.head]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

/// Last-in first-out stack.
#[derive(Debug, Clone)]
pub struct BoundedStack<T, const N: usize> {
    items: [T; N],
    len: usize,
}

impl<T: Copy + Default, const N: usize> Default for BoundedStack<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const N: usize> BoundedStack<T, N> {
    pub fn new() -> Self {
        Self {
            items: [T::default(); N],
            len: 0,
        }
    }

    /// Push an item. Returns false (and drops the item) when full.
    pub fn push(&mut self, item: T) -> bool {
        if self.is_full() {
            return false;
        }
        self.items[self.len] = item;
        self.len += 1;
        true
    }

    /// Remove the newest item, or the sentinel when empty.
    pub fn pop(&mut self) -> T {
        if self.is_empty() {
            return T::default();
        }
        self.len -= 1;
        self.items[self.len]
    }

    /// The newest item without removing it, or the sentinel when empty.
    pub fn peek(&self) -> T {
        if self.is_empty() {
            return T::default();
        }
        self.items[self.len - 1]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    pub fn capacity(&self) -> usize {
        N
    }
}
