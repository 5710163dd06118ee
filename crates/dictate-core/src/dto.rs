use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeRequest {
    #[serde(default)]
    pub raw_email: Option<String>,
    #[serde(default)]
    pub time_phrase: Option<String>,
    #[serde(default)]
    pub fallback_tz: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    EmailValidationError,
    TimeParseError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::EmailValidationError => "email_validation_error",
            ErrorCode::TimeParseError => "time_parse_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeResponse {
    pub normalized_email: Option<String>,
    pub start_iso: Option<String>,
    pub time_zone: String,
    pub error: Option<ErrorCode>,
}
