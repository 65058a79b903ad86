pub mod chat;
pub mod error;
pub mod extractor;
pub mod normalizer;
pub mod prompts;
