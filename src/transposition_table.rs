//! A fixed-size cache of search results for previously visited positions

/// Number of entries in the table, prime to spread out clustered keys
pub const TABLE_SIZE: usize = (1 << 23) + 9;

#[derive(Copy, Clone)]
struct Entry {
    key: u32,
    value: u8,
}
impl Entry {
    pub fn new() -> Self {
        Self { key: 0, value: 0 }
    }
}

/// A lossy hash table mapping position keys to score bounds
///
/// Keys index into the table modulo its size and colliding stores simply
/// overwrite the slot. The low 32 bits of the key are kept alongside the
/// value as an identity check, and a value of 0 marks an empty slot.
#[derive(Clone)]
pub struct TranspositionTable {
    entries: Vec<Entry>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self {
            entries: vec![Entry::new(); TABLE_SIZE],
        }
    }
    /// Stores `value` under `key`, evicting any previous occupant of the slot
    pub fn put(&mut self, key: u64, value: u8) {
        let len = self.entries.len();
        self.entries[key as usize % len] = Entry {
            key: key as u32,
            value,
        };
    }
    /// Returns the value stored under `key`, or 0 if the slot is empty or
    /// occupied by a different position
    pub fn get(&self, key: u64) -> u8 {
        let entry = self.entries[key as usize % self.entries.len()];
        if entry.key == key as u32 {
            entry.value
        } else {
            0
        }
    }
    /// Clears every entry, forgetting all cached results
    pub fn reset(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = Entry::new();
        }
    }
}
