use crate::heap::{fnv1a_hash, Handle, Heap};
use crate::value::Value;

const TABLE_MAX_LOAD: f64 = 0.75;
const MIN_CAPACITY: usize = 8;

/// One slot in the table. An empty bucket is `key: None, value: Nil`;
/// a tombstone (a deleted slot that must still keep probe sequences
/// alive) is `key: None, value: Bool(true)`.
#[derive(Clone, Copy)]
struct Entry {
    key: Option<Handle>,
    value: Value,
}

impl Entry {
    fn empty() -> Self {
        Entry { key: None, value: Value::Nil }
    }

    fn tombstone() -> Self {
        Entry { key: None, value: Value::Bool(true) }
    }

    fn is_tombstone(&self) -> bool {
        self.key.is_none() && matches!(self.value, Value::Bool(true))
    }

    fn is_empty_bucket(&self) -> bool {
        self.key.is_none() && !self.is_tombstone()
    }
}

/// Open-addressing hash table keyed by interned string handles. Serves
/// both the VM's globals map and the engine-wide string intern set
/// (see `find_string`).
pub struct Table {
    entries: Vec<Entry>,
    /// Number of occupied-or-tombstone slots; drives the load-factor
    /// growth check the same way the original does (a tombstone still
    /// counts so that a pathological delete/insert cycle can't grow the
    /// table forever without ever hitting the trigger).
    count: usize,
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    pub fn new() -> Self {
        Table { entries: Vec::new(), count: 0 }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn capacity(&self) -> usize {
        self.entries.len()
    }

    fn key_hash(heap: &Heap, key: Handle) -> u32 {
        heap.as_string(key).expect("table key must be a string handle").hash
    }

    /// Linear probe from `hash % capacity`, stopping at the first truly
    /// empty bucket and remembering the first tombstone seen along the
    /// way so inserts can reuse it.
    fn find_slot(entries: &[Entry], key: Handle, hash: u32) -> usize {
        let cap = entries.len();
        let mut index = (hash as usize) % cap;
        let mut tombstone: Option<usize> = None;

        loop {
            let entry = &entries[index];
            if entry.is_empty_bucket() {
                return tombstone.unwrap_or(index);
            } else if entry.is_tombstone() {
                if tombstone.is_none() {
                    tombstone = Some(index);
                }
            } else if entry.key == Some(key) {
                // Handle equality is sufficient here: string interning
                // guarantees equal content implies equal handle, so two
                // distinct handles are never the same key.
                return index;
            }

            index = (index + 1) % cap;
        }
    }

    fn grow_if_needed(&mut self, heap: &Heap) {
        if self.capacity() == 0 {
            self.adjust_capacity(heap, MIN_CAPACITY);
            return;
        }

        if (self.count + 1) as f64 > self.capacity() as f64 * TABLE_MAX_LOAD {
            self.adjust_capacity(heap, self.capacity() * 2);
        }
    }

    fn adjust_capacity(&mut self, heap: &Heap, new_capacity: usize) {
        let mut new_entries = vec![Entry::empty(); new_capacity];
        let mut new_count = 0;

        for entry in self.entries.iter() {
            if let Some(key) = entry.key {
                let hash = Self::key_hash(heap, key);
                let idx = Self::find_slot(&new_entries, key, hash);
                new_entries[idx] = Entry { key: Some(key), value: entry.value };
                new_count += 1;
            }
        }

        self.entries = new_entries;
        self.count = new_count;
    }

    /// Inserts or overwrites `key -> value`. Returns `true` if this was
    /// a new key (not previously present).
    pub fn set(&mut self, heap: &Heap, key: Handle, value: Value) -> bool {
        self.grow_if_needed(heap);

        let hash = Self::key_hash(heap, key);
        let idx = Self::find_slot(&self.entries, key, hash);
        let is_new = self.entries[idx].key.is_none();

        if is_new && self.entries[idx].is_empty_bucket() {
            self.count += 1;
        }

        self.entries[idx] = Entry { key: Some(key), value };
        is_new
    }

    pub fn get(&self, heap: &Heap, key: Handle) -> Option<Value> {
        if self.entries.is_empty() {
            return None;
        }

        let hash = Self::key_hash(heap, key);
        let idx = Self::find_slot(&self.entries, key, hash);
        self.entries[idx].key.map(|_| self.entries[idx].value)
    }

    /// Deletes `key`, leaving a tombstone so later probe sequences that
    /// passed through this slot still terminate correctly.
    pub fn delete(&mut self, heap: &Heap, key: Handle) -> bool {
        if self.entries.is_empty() {
            return false;
        }

        let hash = Self::key_hash(heap, key);
        let idx = Self::find_slot(&self.entries, key, hash);
        if self.entries[idx].key.is_none() {
            return false;
        }

        self.entries[idx] = Entry::tombstone();
        true
    }

    /// Bytewise probe used only by the intern set: finds an already
    /// interned string with these exact bytes and hash, without
    /// requiring a `Handle` to compare against up front.
    pub fn find_string(&self, heap: &Heap, bytes: &str, hash: u32) -> Option<Handle> {
        if self.entries.is_empty() {
            return None;
        }

        let cap = self.entries.len();
        let mut index = (hash as usize) % cap;

        loop {
            let entry = &self.entries[index];
            if entry.is_empty_bucket() {
                return None;
            } else if !entry.is_tombstone() {
                let candidate = entry.key.unwrap();
                let str_obj = heap.as_string(candidate).unwrap();
                if str_obj.hash == hash && str_obj.chars == bytes {
                    return Some(candidate);
                }
            }

            index = (index + 1) % cap;
        }
    }
}

pub fn hash_str(bytes: &str) -> u32 {
    fnv1a_hash(bytes.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::HeapObject;

    fn intern(heap: &mut Heap, s: &str) -> Handle {
        let hash = hash_str(s);
        heap.alloc(HeapObject::Str(crate::heap::StringObject {
            chars: s.to_string(),
            hash,
        }))
    }

    #[test]
    fn set_then_get_roundtrips() {
        let mut heap = Heap::new();
        let mut table = Table::new();
        let key = intern(&mut heap, "answer");

        assert!(table.set(&heap, key, Value::Number(42.0)));
        match table.get(&heap, key) {
            Some(Value::Number(n)) => assert_eq!(n, 42.0),
            other => panic!("expected Number(42), got {:?}", other.map(|v| v.to_string())),
        }
    }

    #[test]
    fn overwriting_existing_key_returns_false_for_is_new() {
        let mut heap = Heap::new();
        let mut table = Table::new();
        let key = intern(&mut heap, "x");

        assert!(table.set(&heap, key, Value::Number(1.0)));
        assert!(!table.set(&heap, key, Value::Number(2.0)));
        assert_eq!(table.get(&heap, key).unwrap().as_number(), Some(2.0));
    }

    #[test]
    fn delete_then_get_misses_but_probe_continues_past_tombstone() {
        let mut heap = Heap::new();
        let mut table = Table::new();
        let a = intern(&mut heap, "a");
        let b = intern(&mut heap, "b");

        table.set(&heap, a, Value::Number(1.0));
        table.set(&heap, b, Value::Number(2.0));
        assert!(table.delete(&heap, a));
        assert!(table.get(&heap, a).is_none());
        // b must still be reachable even if it probed past a's slot.
        assert_eq!(table.get(&heap, b).unwrap().as_number(), Some(2.0));
    }

    #[test]
    fn grows_past_load_factor() {
        let mut heap = Heap::new();
        let mut table = Table::new();
        for i in 0..100 {
            let key = intern(&mut heap, &format!("key{i}"));
            table.set(&heap, key, Value::Number(i as f64));
        }
        assert_eq!(table.len(), 100);
        for i in 0..100 {
            let key = intern(&mut heap, &format!("key{i}"));
            assert_eq!(table.get(&heap, key).unwrap().as_number(), Some(i as f64));
        }
    }

    #[test]
    fn find_string_locates_interned_bytes_by_hash() {
        let mut heap = Heap::new();
        let mut table = Table::new();
        let key = intern(&mut heap, "shared");
        table.set(&heap, key, Value::Nil);

        let found = table.find_string(&heap, "shared", hash_str("shared"));
        assert_eq!(found, Some(key));
        assert!(table.find_string(&heap, "different", hash_str("different")).is_none());
    }
}
