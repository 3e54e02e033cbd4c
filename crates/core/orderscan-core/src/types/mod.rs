//! Core type definitions

pub mod model;

pub use model::*;
