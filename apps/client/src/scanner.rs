//! Camera/decoder capability contract. The decoding algorithm itself is a
//! third-party concern; this module fixes the contract the rest of the client
//! relies on: a session yields a lazy sequence of decoded strings and is
//! stopped either explicitly or as soon as one decode has been delivered,
//! whichever comes first.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScannerError {
    #[error("no camera found on this device")]
    NoDevice,

    #[error("camera access denied; allow camera permissions in settings")]
    PermissionDenied,

    #[error("camera is already in use by another application")]
    DeviceBusy,

    #[error("camera access requires a secure connection (HTTPS)")]
    InsecureContext,
}

#[derive(Debug, Clone)]
pub struct VideoDevice {
    pub device_id: String,
    pub label: String,
}

/// Prefers a rear-facing device when a label hint is available, falling back
/// to the first device.
pub fn pick_device(devices: &[VideoDevice]) -> Result<&VideoDevice, ScannerError> {
    devices
        .iter()
        .find(|d| {
            let label = d.label.to_lowercase();
            label.contains("back") || label.contains("rear")
        })
        .or_else(|| devices.first())
        .ok_or(ScannerError::NoDevice)
}

/// A live decoding session. Holds the camera until stopped.
pub struct ScanSession {
    rx: mpsc::Receiver<String>,
}

impl ScanSession {
    pub fn new(rx: mpsc::Receiver<String>) -> Self {
        ScanSession { rx }
    }

    /// Waits for the next decode. The session releases its resources as soon
    /// as a decode has been delivered.
    pub async fn next_decode(&mut self) -> Option<String> {
        let decoded = self.rx.recv().await;
        if decoded.is_some() {
            self.stop();
        }
        decoded
    }

    /// Releases the camera. Idempotent.
    pub fn stop(&mut self) {
        self.rx.close();
    }
}

#[async_trait]
pub trait BarcodeScanner: Send + Sync {
    async fn start_session(&self) -> Result<ScanSession, ScannerError>;
}

/// Development scanner that emits fixture barcodes instead of decoding camera
/// frames. Stands in wherever no real capture backend is wired up.
pub struct SimulatedScanner {
    codes: Vec<String>,
}

impl SimulatedScanner {
    pub fn new() -> Self {
        SimulatedScanner {
            codes: ["3017620422003", "7613035303493", "5449000000996"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn with_codes(codes: Vec<String>) -> Self {
        SimulatedScanner { codes }
    }
}

impl Default for SimulatedScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BarcodeScanner for SimulatedScanner {
    async fn start_session(&self) -> Result<ScanSession, ScannerError> {
        let (tx, rx) = mpsc::channel(1);
        let codes = self.codes.clone();
        tokio::spawn(async move {
            for code in codes {
                tokio::time::sleep(Duration::from_millis(50)).await;
                // a closed session means the consumer stopped listening
                if tx.send(code).await.is_err() {
                    break;
                }
            }
        });
        Ok(ScanSession::new(rx))
    }
}
