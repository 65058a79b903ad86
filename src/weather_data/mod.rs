pub mod backend;
pub mod error;
pub mod fetcher;
pub mod granularity;
pub mod params;
