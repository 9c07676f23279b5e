//! REST API handlers

pub mod health;
pub mod load;

pub use health::health_check;
pub use load::load_handler;
