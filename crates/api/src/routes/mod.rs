//! Route handlers

pub mod alerts;
pub mod battery;
pub mod events;
