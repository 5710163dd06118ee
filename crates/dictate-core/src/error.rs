use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid time zone: {0}")]
    InvalidTimeZone(String),
}
