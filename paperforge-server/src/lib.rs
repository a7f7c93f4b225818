//! Paperforge server
//!
//! Turns uploaded PDFs into slide decks or podcasts by running an external
//! generator in the background and tracking each request as a job record.

pub mod api;
pub mod config;
pub mod db;
pub mod generator;
pub mod repository;
pub mod service;
pub mod state;
pub mod storage;

pub use api::create_router;
pub use config::Config;
pub use state::AppState;
