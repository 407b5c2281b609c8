pub mod config;
pub mod constants;
pub mod error;
pub mod executor;
pub mod metadata;
pub mod results;
pub mod statement;
