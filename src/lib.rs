//! Swipedeck library
//!
//! Swipe-to-reveal list rows for a client directory: per-row gesture
//! controllers, a registry keeping at most one row open, cancellable
//! auto-close timers, and the terminal demo built on top of them.

pub mod app;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod gesture;
pub mod records;
pub mod swipe;
pub mod timer;
pub mod ui;

pub use error::{Result, SwipeError};
