//! Camera device list and the single active stream.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

use crate::capture::VideoSurface;
use crate::error::{CameraError, ViewerError};

pub const MSG_LIST_FAILED: &str = "Could not list camera devices.";
pub const MSG_ACCESS_FAILED: &str =
    "Could not access camera. Please grant permission and ensure a camera is connected.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraDevice {
    pub id: String,
    pub label: String,
}

/// A live capture stream. Holding one holds the camera.
pub trait CameraStream: Send + Sync {
    /// Surface the stream renders into. Reports native size once metadata is known.
    fn surface(&self) -> Arc<dyn VideoSurface>;

    /// Stops every track. Called before a replacement stream is requested.
    fn stop(&self);
}

/// Platform camera access.
pub trait CameraBackend: Send + Sync {
    type Stream: CameraStream + 'static;

    fn enumerate_cameras(&self) -> impl Future<Output = Result<Vec<CameraDevice>, CameraError>> + Send;

    /// `None` lets the platform pick a default camera.
    fn acquire_stream(
        &self,
        device_id: Option<&str>,
    ) -> impl Future<Output = Result<Self::Stream, CameraError>> + Send;
}

/// Owns at most one stream; switching tears the old one down first.
pub struct CameraSession<S: CameraStream> {
    stream: Option<S>,
    devices: Vec<CameraDevice>,
    current_device_id: Option<String>,
    error: Option<ViewerError>,
}

impl<S: CameraStream> Default for CameraSession<S> {
    fn default() -> Self {
        Self {
            stream: None,
            devices: Vec::new(),
            current_device_id: None,
            error: None,
        }
    }
}

impl<S: CameraStream + 'static> CameraSession<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    pub fn current_device_id(&self) -> Option<&str> {
        self.current_device_id.as_deref()
    }

    /// Persistent camera-level error, shown instead of the video.
    pub fn error(&self) -> Option<&ViewerError> {
        self.error.as_ref()
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    pub fn surface(&self) -> Option<Arc<dyn VideoSurface>> {
        self.stream.as_ref().map(|s| s.surface())
    }

    /// Opens `device_id` (or the default camera), stopping the current stream first.
    ///
    /// Returns the new surface. On failure the error is also kept as the banner.
    pub async fn open<B>(
        &mut self,
        backend: &B,
        device_id: Option<&str>,
    ) -> Result<Arc<dyn VideoSurface>, ViewerError>
    where
        B: CameraBackend<Stream = S>,
    {
        self.stop();

        match backend.acquire_stream(device_id).await {
            Ok(stream) => {
                let surface = stream.surface();
                self.stream = Some(stream);
                self.error = None;

                match device_id {
                    Some(id) => self.current_device_id = Some(id.to_string()),
                    None => {
                        // Labels are only exposed once permission has been granted
                        self.refresh_devices(backend).await;
                    }
                }

                tracing::info!(
                    target: "camera",
                    "Stream opened: device={}",
                    self.current_device_id.as_deref().unwrap_or("default")
                );
                Ok(surface)
            }
            Err(e) => {
                tracing::error!(target: "camera", "Error accessing camera: {}", e);
                let err = ViewerError::CameraUnavailable(MSG_ACCESS_FAILED.to_string());
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Re-reads the device list; also the handler for device-change notifications.
    ///
    /// The first device becomes current when none is selected yet.
    pub async fn refresh_devices<B>(&mut self, backend: &B)
    where
        B: CameraBackend<Stream = S>,
    {
        match backend.enumerate_cameras().await {
            Ok(devices) => {
                tracing::debug!(target: "camera", "Found {} camera(s)", devices.len());
                if self.current_device_id.is_none() {
                    self.current_device_id = devices.first().map(|d| d.id.clone());
                }
                self.devices = devices;
            }
            Err(e) => {
                tracing::error!(target: "camera", "Error enumerating devices: {}", e);
                self.error = Some(ViewerError::CameraUnavailable(MSG_LIST_FAILED.to_string()));
            }
        }
    }

    /// Stops and releases the current stream, if any.
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop();
            tracing::debug!(target: "camera", "Stream stopped");
        }
    }
}

impl<S: CameraStream> Drop for CameraSession<S> {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop();
        }
    }
}
