pub mod error;
pub mod nominatim;
pub mod resolver;
