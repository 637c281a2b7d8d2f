// In-memory storage backend for tree providers
// This crate keeps a forest in a shared map and evaluates queries directly

mod query;
mod storage;

pub use query::MemoryQuery;
pub use storage::MemoryStorage;
