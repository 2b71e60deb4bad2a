use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
    Cancel,
    Leave,
}

impl PointerEventKind {
    /// Up, cancel and leave all end a gesture the same way.
    pub const fn ends_gesture(self) -> bool {
        matches!(self, Self::Up | Self::Cancel | Self::Leave)
    }
}

/// One press/move/release sample in surface-relative CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(default)]
    pub pointer_id: u32,
}

impl PointerEvent {
    pub const fn new(kind: PointerEventKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            x,
            y,
            pressure: None,
            pointer_id: 0,
        }
    }

    pub const fn down(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Down, x, y)
    }

    pub const fn moved(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Move, x, y)
    }

    pub const fn up(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Up, x, y)
    }

    pub const fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerTargetError {
    #[error("pointer capture unavailable for pointer {pointer_id}")]
    CaptureUnavailable { pointer_id: u32 },
    #[error("failed to detach input listeners: {message}")]
    Detach { message: String },
}

/// The host surface that delivers pointer events to the editor.
pub trait PointerTarget {
    /// Routes the rest of this pointer's gesture to the editor even outside the
    /// surface bounds. Released by the host when the gesture ends.
    fn set_pointer_capture(&mut self, pointer_id: u32) -> Result<(), PointerTargetError>;

    /// Stops delivering events to the editor.
    fn detach_listeners(&mut self) -> Result<(), PointerTargetError>;
}

/// Target for hosts without capture support (scripted replays, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPointerTarget;

impl PointerTarget for NullPointerTarget {
    fn set_pointer_capture(&mut self, pointer_id: u32) -> Result<(), PointerTargetError> {
        Err(PointerTargetError::CaptureUnavailable { pointer_id })
    }

    fn detach_listeners(&mut self) -> Result<(), PointerTargetError> {
        Ok(())
    }
}
