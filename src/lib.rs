//! persona-sim: persona-tailored marketing copy generation
//!
//! Fans a base creative out to up to three personas, requesting tone-specific
//! variants from a generation endpoint one persona at a time. A persona whose
//! remote attempts fail gets deterministic local variants instead, so every
//! round completes with one result per persona.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod generation;
pub mod local;
pub mod logging;
pub mod proxy;
pub mod session;
pub mod types;
