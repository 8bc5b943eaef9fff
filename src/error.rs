//! Error types for panel layout computation.

use thiserror::Error;

use crate::geometry::Rect;
use crate::types::Side;

/// Result type alias for panel layout operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Orientation string outside `auto|portrait|landscape`.
    #[error("invalid orientation '{0}', expected: auto, portrait, or landscape")]
    InvalidOrientation(String),

    /// Border or obstacles leave no legal candidate position.
    #[error("[{side}] no valid slot found, check border/obstacles")]
    NoSlots { side: Side },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A produced layout broke a geometric post-condition.
    #[error("invalid layout: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("panel out of border: {rect}")]
    BorderViolation { rect: Rect },

    #[error("degenerate panel: {rect}")]
    DegeneratePanel { rect: Rect },

    #[error("collision with obstacle at {obstacle} by {panel}")]
    Collision { panel: Rect, obstacle: Rect },
}
