//! Dashboard routes

pub mod events;
pub mod stats;
pub mod stream;
