pub mod blueprint;
pub mod catalog;
pub mod compiler;
pub mod error;
