pub mod augment;
pub mod config;
pub mod error;
pub mod export;
pub mod genetic;
pub mod geometry;
pub mod lattice;
pub mod mask;
pub mod solver;
pub mod types;
pub mod validate;

pub use error::{Error, Result};
