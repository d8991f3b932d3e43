// Artifact downloads: per-artifact task tracking and saving rendered PDFs.

pub mod export;
pub mod handlers;
pub mod manager;
