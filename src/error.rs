use thiserror::Error;

use crate::params::Field;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("{field}: {value:?} is not a number")]
    NotANumber { field: Field, value: String },
    #[error("{field}: {value:?} is not a known PSF (expected one of NIRCAM 300FM, NIRCAM 360FM, NONE)")]
    UnknownPsf { field: Field, value: String },
    #[error("unknown parameter {0:?}")]
    UnknownField(String),
}

/// Failure of one generate request. Carries strings rather than the source
/// errors so it can travel inside GUI messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server answered {code}")]
    Status { code: u16 },
    #[error("reading response body: {0}")]
    Body(String),
}
