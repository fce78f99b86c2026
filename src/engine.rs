use crate::heap::{Handle, Heap, HeapObject, StringObject};
use crate::table::{hash_str, Table};
use crate::value::Value;

/// The host-owned state shared by the `Compiler` and the `VM`: the
/// object heap and the string intern set. Passed by mutable reference
/// into both rather than kept as process-wide mutable globals, so a
/// compile and a run never fight over `static mut` state and multiple
/// `Engine`s (e.g. in tests) stay fully isolated from one another.
#[derive(Default)]
pub struct Engine {
    pub heap: Heap,
    pub strings: Table,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle of the interned copy of `s`, allocating a new
    /// `StringObject` only if this exact sequence of bytes has never
    /// been seen before. Every string the Compiler or VM creates routes
    /// through here, which is what makes `Obj` equality sound as string
    /// equality.
    pub fn intern(&mut self, s: &str) -> Handle {
        let hash = hash_str(s);
        if let Some(handle) = self.strings.find_string(&self.heap, s, hash) {
            return handle;
        }

        let handle = self.heap.alloc(HeapObject::Str(StringObject { chars: s.to_string(), hash }));
        self.strings.set(&self.heap, handle, Value::Nil);
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_bytes_twice_returns_the_same_handle() {
        let mut engine = Engine::new();
        let a = engine.intern("hello");
        let b = engine.intern("hello");
        assert_eq!(a, b);
    }

    #[test]
    fn interning_different_bytes_returns_different_handles() {
        let mut engine = Engine::new();
        let a = engine.intern("hello");
        let b = engine.intern("world");
        assert_ne!(a, b);
    }
}
