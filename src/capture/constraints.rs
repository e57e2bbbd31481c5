//! Camera constraint profiles and device error classification.

use std::fmt;

/// Which way the camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// Rear camera on phones; what you want for documents.
    Environment,
}

/// An ideal/max dimension pair, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimension {
    pub ideal: u32,
    pub max: Option<u32>,
}

/// A set of constraints to request a video stream with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintProfile {
    pub name: &'static str,
    pub facing: Option<FacingMode>,
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
}

impl ConstraintProfile {
    pub const PREFERRED: ConstraintProfile = ConstraintProfile {
        name: "preferred",
        facing: Some(FacingMode::Environment),
        width: Some(Dimension { ideal: 1280, max: Some(1920) }),
        height: Some(Dimension { ideal: 720, max: Some(1080) }),
    };

    pub const BASIC: ConstraintProfile = ConstraintProfile {
        name: "basic",
        facing: None,
        width: Some(Dimension { ideal: 640, max: None }),
        height: Some(Dimension { ideal: 480, max: None }),
    };

    pub const UNCONSTRAINED: ConstraintProfile = ConstraintProfile {
        name: "unconstrained",
        facing: None,
        width: None,
        height: None,
    };

    /// Profiles in the order they are tried.
    pub const LADDER: [ConstraintProfile; 3] = [Self::PREFERRED, Self::BASIC, Self::UNCONSTRAINED];
}

/// Device failure, classified from the name the platform reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    NotAllowed,
    NotFound,
    NotSupported,
    NotReadable,
    Overconstrained,
    Other(String),
}

impl CameraError {
    /// Classify a platform error name (`NotAllowedError`, ...) plus its message.
    pub fn classify(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => CameraError::NotAllowed,
            "NotFoundError" | "DevicesNotFoundError" => CameraError::NotFound,
            "NotSupportedError" => CameraError::NotSupported,
            "NotReadableError" | "TrackStartError" | "AbortError" => CameraError::NotReadable,
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => CameraError::Overconstrained,
            _ if message.is_empty() => CameraError::Other("Unknown camera error".to_string()),
            _ => CameraError::Other(message.to_string()),
        }
    }

    /// Whether a narrower profile might succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CameraError::NotReadable | CameraError::Overconstrained)
    }

    pub fn user_message(&self) -> String {
        let detail = match self {
            CameraError::NotAllowed => "Please allow camera permissions and try again.",
            CameraError::NotFound => "No camera found on this device.",
            CameraError::NotSupported => "Camera not supported in this browser.",
            CameraError::NotReadable => {
                "Camera is already in use or unavailable. Please close other apps using the camera and try again."
            }
            CameraError::Overconstrained => "Camera constraints not supported by this device.",
            CameraError::Other(msg) => return format!("Unable to access camera. Error: {}", msg),
        };
        format!("Unable to access camera. {}", detail)
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

impl std::error::Error for CameraError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_narrows() {
        let ladder = ConstraintProfile::LADDER;
        assert_eq!(ladder[0].facing, Some(FacingMode::Environment));
        assert_eq!(ladder[0].width.unwrap().ideal, 1280);
        assert_eq!(ladder[1].width.unwrap().ideal, 640);
        assert!(ladder[2].width.is_none() && ladder[2].facing.is_none());
    }

    #[test]
    fn test_classify() {
        assert_eq!(CameraError::classify("NotAllowedError", ""), CameraError::NotAllowed);
        assert_eq!(CameraError::classify("OverconstrainedError", "width"), CameraError::Overconstrained);
        assert_eq!(
            CameraError::classify("WeirdError", "it broke"),
            CameraError::Other("it broke".to_string())
        );
        assert!(CameraError::NotReadable.is_retryable());
        assert!(!CameraError::NotAllowed.is_retryable());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            CameraError::NotFound.user_message(),
            "Unable to access camera. No camera found on this device."
        );
        assert_eq!(
            CameraError::classify("X", "").user_message(),
            "Unable to access camera. Error: Unknown camera error"
        );
    }
}
