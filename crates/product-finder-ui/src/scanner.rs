//! Barcode scanner session: an `Idle` / `Scanning` state machine around an
//! external decoder.
//!
//! The decoder itself (camera access and symbol decoding) lives behind
//! [`BarcodeDecoder`]. The session owns the decoder and the state, toggles
//! the viewport on the page and hands decoded codes back to the caller,
//! which feeds them into a JAN-mode search.

use async_trait::async_trait;
use product_finder_core::{ErrorKind, jan};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::page::SharedPage;

/// 1D symbologies the decoder is asked to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Symbology {
    Ean13,
    Ean8,
}

impl Symbology {
    /// Reader name in the decoder library's configuration vocabulary.
    pub fn reader_name(&self) -> &'static str {
        match self {
            Self::Ean13 => "ean_reader",
            Self::Ean8 => "ean_8_reader",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FacingMode {
    /// Rear camera.
    Environment,
    User,
}

/// Live-stream decoder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecoderConfig {
    pub facing_mode: FacingMode,
    pub readers: Vec<Symbology>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            readers: vec![Symbology::Ean13, Symbology::Ean8],
        }
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("camera unavailable: {0}")]
    Camera(String),

    #[error("decoder failed to initialise: {0}")]
    Decoder(String),
}

impl DeviceError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::DeviceUnavailable
    }
}

/// An external live barcode decoder.
#[async_trait]
pub trait BarcodeDecoder: Send {
    /// Acquire the camera stream and configure readers.
    async fn init(&mut self, config: &DecoderConfig) -> Result<(), DeviceError>;

    /// Begin continuous decoding.
    fn start(&mut self);

    fn stop(&mut self);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScannerState {
    #[default]
    Idle,
    Scanning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started,
    Stopped,
    Failed(ErrorKind),
}

pub struct ScannerSession {
    state: ScannerState,
    config: DecoderConfig,
    decoder: Box<dyn BarcodeDecoder>,
}

impl ScannerSession {
    pub fn new(decoder: Box<dyn BarcodeDecoder>) -> Self {
        Self {
            state: ScannerState::Idle,
            config: DecoderConfig::default(),
            decoder,
        }
    }

    pub fn state(&self) -> ScannerState {
        self.state
    }

    /// Scan button press.
    pub async fn toggle(&mut self, page: &SharedPage) -> ToggleOutcome {
        match self.state {
            ScannerState::Scanning => {
                self.decoder.stop();
                self.state = ScannerState::Idle;
                page.lock().await.hide_scanner();
                info!("scanner stopped by user");
                ToggleOutcome::Stopped
            }
            ScannerState::Idle => {
                page.lock().await.show_scanner();
                match self.decoder.init(&self.config).await {
                    Ok(()) => {
                        self.decoder.start();
                        self.state = ScannerState::Scanning;
                        info!(
                            readers = ?self.config.readers,
                            facing = ?self.config.facing_mode,
                            "scanner started"
                        );
                        ToggleOutcome::Started
                    }
                    Err(e) => {
                        error!(error = %e, kind = %e.kind(), "scanner initialisation failed");
                        page.lock().await.hide_scanner();
                        ToggleOutcome::Failed(e.kind())
                    }
                }
            }
        }
    }

    /// Decoder detection callback.
    ///
    /// Returns the cleaned code to search for, after writing it into the
    /// query input and shutting the session down. Detections while idle
    /// are ignored.
    pub async fn on_detected(&mut self, raw_code: &str, page: &SharedPage) -> Option<String> {
        if self.state != ScannerState::Scanning {
            debug!(code = raw_code, "detection while idle, ignoring");
            return None;
        }
        let code = jan::clean(raw_code);
        if !jan::is_valid(&code) {
            warn!(code = %code, "decoded code failed JAN check digit");
        }

        self.decoder.stop();
        self.state = ScannerState::Idle;
        {
            let mut page = page.lock().await;
            page.query_input = code.clone();
            page.hide_scanner();
        }
        info!(code = %code, "barcode detected");
        Some(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Page, SCAN_LABEL, SCAN_STOP_LABEL};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        init: Vec<DecoderConfig>,
        started: usize,
        stopped: usize,
    }

    struct FakeDecoder {
        calls: Arc<Mutex<Calls>>,
        fail: bool,
    }

    #[async_trait]
    impl BarcodeDecoder for FakeDecoder {
        async fn init(&mut self, config: &DecoderConfig) -> Result<(), DeviceError> {
            self.calls.lock().unwrap().init.push(config.clone());
            if self.fail {
                Err(DeviceError::Camera("permission denied".into()))
            } else {
                Ok(())
            }
        }

        fn start(&mut self) {
            self.calls.lock().unwrap().started += 1;
        }

        fn stop(&mut self) {
            self.calls.lock().unwrap().stopped += 1;
        }
    }

    fn session(fail: bool) -> (ScannerSession, Arc<Mutex<Calls>>) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let decoder = FakeDecoder {
            calls: calls.clone(),
            fail,
        };
        (ScannerSession::new(Box::new(decoder)), calls)
    }

    #[tokio::test]
    async fn toggle_starts_with_rear_camera_and_ean_readers() {
        let (mut scanner, calls) = session(false);
        let page = Page::shared();

        assert_eq!(scanner.toggle(&page).await, ToggleOutcome::Started);
        assert_eq!(scanner.state(), ScannerState::Scanning);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.init[0].facing_mode, FacingMode::Environment);
        assert_eq!(calls.init[0].readers, vec![Symbology::Ean13, Symbology::Ean8]);
        assert_eq!(calls.started, 1);
        let page = page.lock().await;
        assert!(page.viewport_visible);
        assert_eq!(page.scan_button_label, SCAN_STOP_LABEL);
    }

    #[tokio::test]
    async fn double_toggle_returns_to_idle() {
        let (mut scanner, calls) = session(false);
        let page = Page::shared();

        scanner.toggle(&page).await;
        assert_eq!(scanner.toggle(&page).await, ToggleOutcome::Stopped);

        assert_eq!(scanner.state(), ScannerState::Idle);
        assert_eq!(calls.lock().unwrap().stopped, 1);
        let page = page.lock().await;
        assert!(!page.viewport_visible);
        assert_eq!(page.scan_button_label, SCAN_LABEL);
        assert!(page.query_input.is_empty());
    }

    #[tokio::test]
    async fn init_failure_stays_idle() {
        let (mut scanner, calls) = session(true);
        let page = Page::shared();

        let outcome = scanner.toggle(&page).await;

        assert_eq!(outcome, ToggleOutcome::Failed(ErrorKind::DeviceUnavailable));
        assert_eq!(scanner.state(), ScannerState::Idle);
        assert_eq!(calls.lock().unwrap().started, 0);
        let page = page.lock().await;
        assert!(!page.viewport_visible);
        assert_eq!(page.scan_button_label, SCAN_LABEL);
    }

    #[tokio::test]
    async fn detection_fills_input_and_stops() {
        let (mut scanner, calls) = session(false);
        let page = Page::shared();
        scanner.toggle(&page).await;

        let code = scanner.on_detected("4901234567894", &page).await;

        assert_eq!(code.as_deref(), Some("4901234567894"));
        assert_eq!(scanner.state(), ScannerState::Idle);
        assert_eq!(calls.lock().unwrap().stopped, 1);
        let page = page.lock().await;
        assert_eq!(page.query_input, "4901234567894");
        assert!(!page.viewport_visible);
        assert_eq!(page.scan_button_label, SCAN_LABEL);
    }

    #[tokio::test]
    async fn detection_while_idle_ignored() {
        let (mut scanner, calls) = session(false);
        let page = Page::shared();
        assert!(scanner.on_detected("4901234567894", &page).await.is_none());
        assert_eq!(calls.lock().unwrap().stopped, 0);
        assert!(page.lock().await.query_input.is_empty());
    }

    #[tokio::test]
    async fn only_first_detection_counts() {
        let (mut scanner, _calls) = session(false);
        let page = Page::shared();
        scanner.toggle(&page).await;
        assert!(scanner.on_detected("96385074", &page).await.is_some());
        assert!(scanner.on_detected("4901234567894", &page).await.is_none());
        assert_eq!(page.lock().await.query_input, "96385074");
    }

    #[test]
    fn reader_names() {
        assert_eq!(Symbology::Ean13.reader_name(), "ean_reader");
        assert_eq!(Symbology::Ean8.reader_name(), "ean_8_reader");
    }
}
