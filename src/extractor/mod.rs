pub mod client;
pub mod models;
pub mod progress;

pub use client::ExtractorClient;
pub use models::{ExtractorEvent, RawFormat, VideoInfo};
