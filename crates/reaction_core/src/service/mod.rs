//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository reads and writes into atomic ledger operations.
//! - Keep HTTP/CLI layers decoupled from storage details.

pub mod ledger_service;
