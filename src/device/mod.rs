//! Device channel
//!
//! The boundary to the physical (or emulated) device: frame capture and
//! synthetic touch input. The engine only ever talks to the [`Device`]
//! trait; [`adb::AdbDevice`] is the shipped implementation.

pub mod adb;

use image::DynamicImage;

pub use adb::AdbDevice;

/// Device channel errors
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("failed to run device command: {0}")]
    Io(#[from] std::io::Error),
    #[error("device command failed: {0}")]
    CommandFailed(String),
    #[error("failed to decode captured frame: {0}")]
    Decode(#[from] image::ImageError),
    #[error("device is not connected")]
    Disconnected,
}

/// A connected device that can capture its screen and receive touch input
///
/// Object-safe so fakes can stand in for a real device in tests.
pub trait Device {
    /// Whether the device channel is currently live.
    fn connected(&self) -> bool;

    /// (Re)establish the channel to a device at `host:port`.
    fn connect(&mut self, address: &str) -> Result<(), DeviceError>;

    /// Capture the current screen contents.
    fn capture(&mut self) -> Result<DynamicImage, DeviceError>;

    /// Tap at an absolute screen coordinate.
    fn tap(&mut self, x: i32, y: i32) -> Result<(), DeviceError>;

    /// Swipe from one point to another over `duration_ms` milliseconds.
    fn swipe(&mut self, from: (i32, i32), to: (i32, i32), duration_ms: u32)
        -> Result<(), DeviceError>;
}
