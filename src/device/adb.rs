//! adb-backed device channel
//!
//! Drives a device through the `adb` binary: `exec-out screencap -p` for
//! frames, `shell input tap`/`swipe` for touch. Slow compared to a
//! streaming capture service, but dependency-free and works on every device
//! adb can reach.

use std::process::Command;

use image::DynamicImage;

use super::{Device, DeviceError};

/// A device reached through the `adb` binary
pub struct AdbDevice {
    /// Serial passed to `adb -s`; `None` lets adb pick the only device.
    serial: Option<String>,
}

impl AdbDevice {
    /// Channel to the single device adb is attached to.
    pub fn new() -> Self {
        Self { serial: None }
    }

    /// Channel to a specific device serial (e.g. `127.0.0.1:5555`).
    pub fn with_serial(serial: impl Into<String>) -> Self {
        Self {
            serial: Some(serial.into()),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("adb");
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd
    }

    /// Run an adb invocation and return its stdout, surfacing non-zero
    /// exits as channel errors.
    fn run(&self, args: &[&str]) -> Result<Vec<u8>, DeviceError> {
        log::trace!("adb {}", args.join(" "));
        let output = self.command().args(args).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeviceError::CommandFailed(format!(
                "adb {}: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

impl Default for AdbDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for AdbDevice {
    fn connected(&self) -> bool {
        match self.run(&["get-state"]) {
            Ok(out) => String::from_utf8_lossy(&out).trim() == "device",
            Err(_) => false,
        }
    }

    fn connect(&mut self, address: &str) -> Result<(), DeviceError> {
        log::info!("connecting to device at {address}");
        let out = self.run(&["connect", address])?;
        let reply = String::from_utf8_lossy(&out);
        // `adb connect` exits zero even on failure; the verdict is in stdout.
        if reply.contains("connected") {
            self.serial = Some(address.to_string());
            Ok(())
        } else {
            Err(DeviceError::CommandFailed(reply.trim().to_string()))
        }
    }

    fn capture(&mut self) -> Result<DynamicImage, DeviceError> {
        let png = self.run(&["exec-out", "screencap", "-p"])?;
        Ok(image::load_from_memory(&png)?)
    }

    fn tap(&mut self, x: i32, y: i32) -> Result<(), DeviceError> {
        log::trace!("tap ({x}, {y})");
        self.run(&[
            "shell",
            "input",
            "tap",
            &x.to_string(),
            &y.to_string(),
        ])?;
        Ok(())
    }

    fn swipe(
        &mut self,
        from: (i32, i32),
        to: (i32, i32),
        duration_ms: u32,
    ) -> Result<(), DeviceError> {
        log::trace!("swipe {from:?} -> {to:?} over {duration_ms}ms");
        self.run(&[
            "shell",
            "input",
            "swipe",
            &from.0.to_string(),
            &from.1.to_string(),
            &to.0.to_string(),
            &to.1.to_string(),
            &duration_ms.to_string(),
        ])?;
        Ok(())
    }
}
