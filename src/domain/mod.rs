//! Domain layer for the Helmsman decision core
//!
//! This module contains the data model, the error taxonomy and the port
//! traits that adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
