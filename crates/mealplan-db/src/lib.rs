//! PostgreSQL storage for daily meal plans and the request transcript.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
