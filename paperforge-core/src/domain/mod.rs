//! Core domain types
//!
//! These types describe a generation job and are shared between the server
//! (which persists and finalizes them) and the client/CLI (which poll them).

pub mod job;
pub mod settings;
