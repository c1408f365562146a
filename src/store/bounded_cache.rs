use std::collections::{HashMap, VecDeque};

/// A bounded map with FIFO eviction.
/// When capacity is reached, the oldest entry is evicted.
pub struct BoundedCache<V> {
    /// Map from key to value
    entries: HashMap<String, V>,
    /// Insertion order for FIFO eviction
    order: VecDeque<String>,
    /// Maximum number of entries
    capacity: usize,
}

impl<V> BoundedCache<V> {
    /// Capacities below 1 are clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert a new key, returning the entries evicted to make room.
    ///
    /// An existing key is left untouched and `Err(value)` hands the rejected
    /// value back: entries are never overwritten.
    pub fn insert_new(&mut self, key: String, value: V) -> Result<Vec<(String, V)>, V> {
        if self.entries.contains_key(&key) {
            return Err(value);
        }

        let mut evicted = Vec::new();
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest_key) => {
                    if let Some(oldest) = self.entries.remove(&oldest_key) {
                        evicted.push((oldest_key, oldest));
                    }
                }
                None => break,
            }
        }

        self.entries.insert(key.clone(), value);
        self.order.push_back(key);
        Ok(evicted)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
