pub mod core;
pub mod extractor;
pub mod loader;
pub mod resolver;
pub mod service;
