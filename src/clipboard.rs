use clipboard_rs::common::{RustImage, RustImageData};
use clipboard_rs::{Clipboard, ClipboardContext};
use std::future::Future;
use tokio::sync::oneshot;

use crate::capture::ImageBlob;
use crate::error::ClipboardError;

/// Image handed to the clipboard: either encoded already, or promised by a
/// capture that has not happened yet.
#[derive(Debug)]
pub enum ImagePayload {
    Ready(ImageBlob),
    Pending(oneshot::Receiver<Result<ImageBlob, String>>),
}

impl ImagePayload {
    /// Creates a promise-valued payload and the sender that fulfils it.
    pub fn pending() -> (oneshot::Sender<Result<ImageBlob, String>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, ImagePayload::Pending(rx))
    }

    /// Waits for the image data. A dropped sender counts as a rejection.
    pub async fn resolve(self) -> Result<ImageBlob, ClipboardError> {
        match self {
            ImagePayload::Ready(blob) => Ok(blob),
            ImagePayload::Pending(rx) => match rx.await {
                Ok(Ok(blob)) => Ok(blob),
                Ok(Err(reason)) => Err(ClipboardError::PayloadRejected(reason)),
                Err(_) => Err(ClipboardError::PayloadRejected(
                    "Capture was cancelled".to_string(),
                )),
            },
        }
    }
}

/// System clipboard, as seen by the capture scheduler.
///
/// A write settles only once its payload has resolved.
pub trait ClipboardSink: Send + Sync + 'static {
    fn write_image(
        &self,
        payload: ImagePayload,
    ) -> impl Future<Output = Result<(), ClipboardError>> + Send;
}

/// The desktop clipboard via `clipboard-rs`.
///
/// The platform write runs on a blocking thread. Cancelling the job aborts the
/// write only until that thread has started; after that the image still lands
/// on the clipboard, although the job reports `Superseded`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    async fn write_image(&self, payload: ImagePayload) -> Result<(), ClipboardError> {
        let blob = payload.resolve().await?;
        let (width, height) = (blob.width, blob.height);

        tokio::task::spawn_blocking(move || set_clipboard_image(&blob.bytes))
            .await
            .map_err(|e| ClipboardError::Platform(e.to_string()))??;

        tracing::info!(target: "capture", "Image copied to clipboard: {}x{}", width, height);
        Ok(())
    }
}

fn set_clipboard_image(png: &[u8]) -> Result<(), ClipboardError> {
    let ctx = ClipboardContext::new().map_err(|e| ClipboardError::Platform(e.to_string()))?;

    let image = RustImageData::from_bytes(png)
        .map_err(|e| ClipboardError::Platform(format!("Invalid image data: {}", e)))?;

    ctx.set_image(image)
        .map_err(|e| ClipboardError::Platform(e.to_string()))
}
