//! Barcode decoder fed by text lines, e.g. `zbarcam --raw` piped to stdin.
//!
//! Accepts raw codes (`4901234567894`) and zbar's typed form
//! (`EAN-13:4901234567894`). Typed lines whose symbology is not among the
//! configured readers are skipped.

use async_trait::async_trait;
use product_finder_ui::{BarcodeDecoder, DecoderConfig, DeviceError, Symbology};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

fn symbology_from_prefix(prefix: &str) -> Option<Symbology> {
    match prefix {
        "EAN-13" => Some(Symbology::Ean13),
        "EAN-8" => Some(Symbology::Ean8),
        _ => None,
    }
}

/// Extract a code from one line of decoder output.
pub fn parse_line(line: &str, readers: &[Symbology]) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.split_once(':') {
        Some((prefix, code)) => match symbology_from_prefix(prefix) {
            Some(sym) if readers.contains(&sym) => Some(code.trim().to_string()),
            _ => {
                debug!(line, "skipping symbology not enabled");
                None
            }
        },
        None => Some(line.to_string()),
    }
}

pub struct LineDecoder<R> {
    reader: Option<R>,
    readers: Vec<Symbology>,
    tx: mpsc::Sender<String>,
    task: Option<JoinHandle<()>>,
}

impl<R> LineDecoder<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    /// Returns the decoder and the channel detected codes arrive on.
    pub fn new(reader: R) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(16);
        let decoder = Self {
            reader: Some(reader),
            readers: Vec::new(),
            tx,
            task: None,
        };
        (decoder, rx)
    }
}

#[async_trait]
impl<R> BarcodeDecoder for LineDecoder<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn init(&mut self, config: &DecoderConfig) -> Result<(), DeviceError> {
        if self.reader.is_none() {
            return Err(DeviceError::Camera("input stream already consumed".into()));
        }
        if config.readers.is_empty() {
            return Err(DeviceError::Decoder("no readers configured".into()));
        }
        self.readers = config.readers.clone();
        Ok(())
    }

    fn start(&mut self) {
        let Some(reader) = self.reader.take() else {
            warn!("line decoder started without input");
            return;
        };
        let readers = self.readers.clone();
        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            let mut lines = reader.lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let Some(code) = parse_line(&line, &readers) else {
                            continue;
                        };
                        if tx.send(code).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "decoder input failed");
                        break;
                    }
                }
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
