//! Error types for OrgPress

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PressError {
    #[error("Validation error: {0}")]
    Validation(String),
}
