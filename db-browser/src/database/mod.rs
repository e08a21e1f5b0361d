//! Database abstraction layer
//!
//! This module provides a database-agnostic interface for catalog lookups and
//! dynamic row access, plus the pieces every driver shares: identifier quoting,
//! the value codec, statement construction and the CSV export sink.

pub mod codec;
pub mod export;
pub mod identifier;
pub mod statement;
pub mod traits;

#[cfg(feature = "postgres")]
pub mod postgres;

use std::str::FromStr;

use crate::Error;

// Re-export the main trait
pub use identifier::{quote_identifier, TableRef};
pub use traits::{DatabaseError, DatabaseProvider};

/// Database engines with a driver implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    Postgres,
}

impl FromStr for DriverKind {
    type Err = Error;

    /// Resolve a configured engine name; anything without a driver is rejected
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            #[cfg(feature = "postgres")]
            "postgres" | "postgresql" => Ok(DriverKind::Postgres),
            _ => Err(Error::UnsupportedDriver(name.to_string())),
        }
    }
}

impl std::fmt::Display for DriverKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverKind::Postgres => formatter.write_str("postgres"),
        }
    }
}
