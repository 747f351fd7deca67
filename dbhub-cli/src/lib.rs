//! dbhub CLI - check connection configurations from the command line.
//!
//! `dbhub check` opens every connection of a `dbhub.toml` and closes them
//! again; `dbhub parse` shows how a connection string is understood.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
