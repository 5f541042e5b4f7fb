pub mod config;
pub mod curation;
pub mod db;
pub mod llm;
pub mod mcp;
pub mod models;
pub mod scheduler;
pub mod sources;
