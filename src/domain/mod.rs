//! Domain layer for deploy failure memory
//!
//! This module contains the core models, ports, and errors. Nothing in here
//! touches the network, the filesystem, or the database directly.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
