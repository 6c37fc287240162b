//! `HookScan` - Locate hook call-sites across plugin and theme source trees.

#![deny(
    warnings,
    missing_debug_implementations,
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]

pub mod config;
pub mod crawler;
pub mod detail;
pub mod error;
pub mod matcher;
pub mod reference;
pub mod results;
pub mod roots;
pub mod scanner;
pub mod types;

pub use config::ScanConfig;
pub use error::{Error, Result};
pub use scanner::{Scanner, Scope, SearchOutcome, build_reference, describe, label_for};
