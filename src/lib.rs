pub mod calendar;
pub mod config;
pub mod context;
pub mod error;
pub mod notes;
pub mod render;
pub mod schedule;
pub mod shift;
pub mod swipe;
