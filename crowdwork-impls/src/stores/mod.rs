mod file_guard_store;

pub use file_guard_store::*;
