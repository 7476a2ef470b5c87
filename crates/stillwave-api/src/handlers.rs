//! HTTP request handlers.

pub mod audio;
pub mod health;

pub use health::{health, ready};
