use thiserror::Error;

use crate::peripheral::PwmOp;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BuzzerError {
    /// Rejected before any hardware access (zero frequency, zero tempo, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The PWM peripheral reported a failure for the given call.
    #[error("PWM peripheral failed to {0}")]
    Peripheral(PwmOp),
}

pub type Result<T> = core::result::Result<T, BuzzerError>;
