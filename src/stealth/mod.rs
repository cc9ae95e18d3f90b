//! Anti-detection variance
//!
//! Deterministic tap coordinates and pixel-perfect swipes are an easy bot
//! signature. This module supplies the small random variance the actuator
//! applies to every touch event.

pub mod humanize;

pub use humanize::Humanizer;
