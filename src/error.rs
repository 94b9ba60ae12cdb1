use thiserror::Error;

use crate::draw::DrawId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("draw index {target} has {available} prior draws, window needs {required}")]
    InsufficientHistory {
        target: usize,
        available: usize,
        required: usize,
    },

    #[error("draw {draw_id} has no valid main numbers")]
    NoValidNumbers { draw_id: DrawId },

    #[error("need at least 2 feature rows for sample statistics, got {rows}")]
    InsufficientSamples { rows: usize },

    #[error("feature `{feature}` has zero standard deviation")]
    DivisionByZeroVariance { feature: &'static str },

    #[error("draw {draw_id} is invalid: {reason}")]
    InvalidDraw { draw_id: DrawId, reason: String },

    #[error("draw id {draw_id} appears more than once")]
    DuplicateDrawId { draw_id: DrawId },

    #[error("target index {target} is past the end of a history of {len} draws")]
    TargetOutOfRange { target: usize, len: usize },

    #[error("invalid feature config: {0}")]
    InvalidConfig(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
