//! Data Transfer Objects for the HTTP API
//!
//! Lightweight request/response bodies exchanged between the server and its
//! clients. The job record itself travels as `domain::job::JobRecord`.

pub mod health;
pub mod job;
