//! Camera capture session.
//!
//! Models the capture dialog as a state machine over a [`CameraDevice`]:
//!
//! ```text
//! Idle --start--> Starting --ok--> Live --capture--> Captured --accept--> Idle
//!                    |                                   |
//!                    +--fail--> Error      retake -------+--> Starting
//! ```
//!
//! Opening walks [`ConstraintProfile::LADDER`] until a profile succeeds or an
//! error says a narrower profile will not help. The media stream is stopped on
//! capture, accept, close, failure, and drop.

pub mod constraints;
pub mod frame;

pub use constraints::{CameraError, ConstraintProfile, FacingMode};
pub use frame::{load_image_file, CapturedImage, Frame, CAPTURE_JPEG_QUALITY};

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

/// A live video stream. Stopping releases the hardware and must be idempotent.
pub trait MediaStream: Send {
    fn grab_frame(&mut self) -> Result<Frame>;
    fn stop(&mut self);
}

/// Something that can open a camera stream.
pub trait CameraDevice: Send {
    /// `false` when the platform has no camera API at all.
    fn is_supported(&self) -> bool {
        true
    }

    fn open(&mut self, profile: &ConstraintProfile) -> Result<Box<dyn MediaStream>, CameraError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Starting,
    Live,
    Captured,
    Error,
}

pub struct CaptureSession<D: CameraDevice> {
    device: D,
    state: CaptureState,
    stream: Option<Box<dyn MediaStream>>,
    profile: Option<ConstraintProfile>,
    captured: Option<CapturedImage>,
    error: Option<String>,
}

impl<D: CameraDevice> CaptureSession<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            state: CaptureState::Idle,
            stream: None,
            profile: None,
            captured: None,
            error: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Profile the live stream was opened with.
    pub fn active_profile(&self) -> Option<&ConstraintProfile> {
        self.profile.as_ref()
    }

    /// Frozen preview while in `Captured`.
    pub fn captured(&self) -> Option<&CapturedImage> {
        self.captured.as_ref()
    }

    /// Human-readable message while in `Error`.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Open the camera, falling back through the constraint ladder.
    ///
    /// Also used as "retry" from `Error`. A no-op when already live.
    pub fn start(&mut self) -> CaptureState {
        if self.state == CaptureState::Live {
            return self.state;
        }
        self.release_stream();
        self.captured = None;
        self.error = None;
        self.state = CaptureState::Starting;

        if !self.device.is_supported() {
            return self.fail(CameraError::NotSupported.user_message());
        }

        let mut first_error: Option<CameraError> = None;
        for profile in ConstraintProfile::LADDER.iter() {
            debug!("Requesting camera with {} constraints", profile.name);
            match self.device.open(profile) {
                Ok(stream) => {
                    info!("Camera started with {} constraints", profile.name);
                    self.stream = Some(stream);
                    self.profile = Some(*profile);
                    self.state = CaptureState::Live;
                    return self.state;
                }
                Err(e) => {
                    warn!("Camera open with {} constraints failed: {:?}", profile.name, e);
                    let retryable = e.is_retryable();
                    let first = first_error.get_or_insert(e);
                    if !retryable {
                        let message = first.user_message();
                        return self.fail(message);
                    }
                }
            }
        }

        let message = first_error
            .map(|e| e.user_message())
            .unwrap_or_else(|| CameraError::NotFound.user_message());
        self.fail(message)
    }

    /// Freeze the current frame as a JPEG and release the camera.
    pub fn capture(&mut self) -> Result<&CapturedImage> {
        if self.state != CaptureState::Live {
            bail!("Cannot capture in state {:?}", self.state);
        }
        let Some(stream) = self.stream.as_mut() else {
            bail!("Live session has no stream");
        };

        let encoded = stream
            .grab_frame()
            .and_then(|frame| CapturedImage::encode_frame(&frame, CAPTURE_JPEG_QUALITY));
        self.release_stream();

        match encoded {
            Ok(image) => {
                self.state = CaptureState::Captured;
                Ok(self.captured.insert(image))
            }
            Err(e) => {
                self.fail(format!("Failed to capture image: {}", e));
                Err(e)
            }
        }
    }

    /// Discard the capture and reopen the camera.
    pub fn retake(&mut self) -> CaptureState {
        self.captured = None;
        self.start()
    }

    /// Hand the captured image to the caller and return to `Idle`.
    pub fn accept(&mut self) -> Option<CapturedImage> {
        if self.state != CaptureState::Captured {
            return None;
        }
        let image = self.captured.take();
        self.close();
        image
    }

    /// Close the dialog: stop the stream and clear all state.
    pub fn close(&mut self) {
        self.release_stream();
        self.captured = None;
        self.error = None;
        self.state = CaptureState::Idle;
    }

    fn fail(&mut self, message: String) -> CaptureState {
        self.release_stream();
        self.error = Some(message);
        self.state = CaptureState::Error;
        self.state
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            debug!("Camera stream stopped");
        }
        self.profile = None;
    }
}

impl<D: CameraDevice> Drop for CaptureSession<D> {
    fn drop(&mut self) {
        self.release_stream();
    }
}
