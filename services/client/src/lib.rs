//! services/client/src/lib.rs
//!
//! Everything outside the core: configuration, the HTTP adapter for the
//! backend, and the terminal presentation layer used by the `hub` binary.

pub mod adapters;
pub mod commands;
pub mod config;
pub mod error;
pub mod presenter;
pub mod protocol;
pub mod shell;
