//! Typewire CLI library: configuration, schema loading and the export
//! commands behind the `typewire` binary.

pub mod colors;
pub mod commands;
pub mod config;
pub mod error_chain;
pub mod schema;
