//! Paperforge Core
//!
//! Core types shared by the Paperforge server, client and CLI.
//!
//! This crate contains:
//! - Domain types: job records, kinds, statuses and per-kind settings
//! - DTOs: request/response bodies of the HTTP API

pub mod domain;
pub mod dto;
