pub mod client;
pub mod errors;

pub use client::PageFetcher;
pub use errors::NetworkError;
