//! # souls
//!
//! The Souls application library: HTTP API, CLI and configuration over
//! `souls-core`. The `souls` binary is a thin wrapper around [`cli`].

pub mod api;
pub mod cli;
pub mod config;
