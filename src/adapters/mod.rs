//! Adapters implementing the domain ports.

pub mod jsonl;
pub mod memory;
pub mod mock;
pub mod sqlite;
