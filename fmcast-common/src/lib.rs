//! # fmcast Common Library
//!
//! Shared code for the fmcast workspace:
//! - Error types
//! - TOML configuration file schema and lookup
//! - External executable resolution

pub mod config;
pub mod error;
pub mod executable;

pub use error::{Error, Result};
