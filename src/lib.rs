//! Token Signal Library
//!
//! Parses token tracker status messages and scores them with a pre-trained
//! classifier behind a small HTTP API.

pub mod api;
pub mod config;
pub mod error;
pub mod ml_engine;
pub mod parser;
