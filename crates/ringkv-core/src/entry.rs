use std::sync::Arc;

/// An immutable key-value pair.
///
/// Allocated once by the inserting thread and then shared — never
/// copied — between the old and new backing arrays across a grow
/// (spec.md §3's "Entries are allocated when an insert publishes them and
/// live for the program's lifetime").
#[derive(Debug)]
pub struct Entry {
    pub key: u32,
    pub value: u32,
}

impl Entry {
    pub fn new(key: u32, value: u32) -> Arc<Self> {
        Arc::new(Self { key, value })
    }
}
