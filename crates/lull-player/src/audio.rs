//! Output device selection
//!
//! Uses the configured CPAL device. When that fails (or `--offline` is
//! given) the mixer still runs on an offline device driven in real time, so
//! volumes, links and positions behave the same without sound.

use std::sync::Arc;
use std::time::Duration;

use lull_core::audio::{drive_realtime, AudioConfig, CpalDevice, OfflineDevice, OutputDevice};

/// Render block of the silent fallback
const OFFLINE_BLOCK: Duration = Duration::from_millis(20);

/// An opened output plus the timer task that drives an offline device
pub struct Output {
    pub device: Arc<dyn OutputDevice>,
    driver: Option<tokio::task::JoinHandle<()>>,
}

impl Output {
    /// Open the output; must be called inside the tokio runtime
    pub fn open(config: &AudioConfig, offline: bool) -> Self {
        if !offline {
            match CpalDevice::open(config) {
                Ok(device) => {
                    return Self {
                        device: Arc::new(device),
                        driver: None,
                    }
                }
                Err(e) => {
                    log::error!("Could not open audio output: {}", e);
                    eprintln!("Warning: no audio output ({}), running silently", e);
                }
            }
        }

        let device = Arc::new(OfflineDevice::new(config.target_sample_rate()));
        let driver = drive_realtime(Arc::clone(&device), OFFLINE_BLOCK);
        Self {
            device,
            driver: Some(driver),
        }
    }
}

impl Drop for Output {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}
