pub mod classify;
pub mod client;
pub mod retry;
pub mod stats;

pub use client::Neo4jClient;
