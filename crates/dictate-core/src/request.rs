use chrono::{DateTime, Utc};
use tracing::debug;

use crate::dto::{ErrorCode, NormalizeRequest, NormalizeResponse};
use crate::email::normalize_spoken_email;
use crate::error::CoreError;
use crate::time::parse_time_phrase_at;

pub const DEFAULT_FALLBACK_TZ: &str = "America/New_York";

/// Accepts every request when no token is configured, otherwise requires an
/// exact `Bearer <token>` authorization value.
pub fn authorize(
    expected_token: Option<&str>,
    authorization: Option<&str>,
) -> Result<(), CoreError> {
    let Some(token) = expected_token else {
        return Ok(());
    };
    let expected = format!("Bearer {}", token);
    if authorization.unwrap_or_default() == expected {
        Ok(())
    } else {
        Err(CoreError::Unauthorized)
    }
}

pub fn handle_request(request: &NormalizeRequest, default_tz: &str) -> NormalizeResponse {
    handle_request_at(request, default_tz, Utc::now())
}

/// Runs both normalizers. The email outcome never short-circuits the time
/// phrase; when both fail the email error is the one reported.
pub fn handle_request_at(
    request: &NormalizeRequest,
    default_tz: &str,
    now: DateTime<Utc>,
) -> NormalizeResponse {
    let fallback_tz = request.fallback_tz.as_deref().unwrap_or(default_tz);

    let raw_email = request.raw_email.as_deref().unwrap_or_default();
    let normalized_email = normalize_spoken_email(raw_email);
    let resolved = parse_time_phrase_at(
        request.time_phrase.as_deref().unwrap_or_default(),
        fallback_tz,
        now,
    );

    let time_zone = resolved
        .as_ref()
        .map(|value| value.zone.clone())
        .unwrap_or_else(|| fallback_tz.to_string());

    let error = if normalized_email.is_none() {
        Some(ErrorCode::EmailValidationError)
    } else if resolved.is_none() {
        Some(ErrorCode::TimeParseError)
    } else {
        None
    };

    if let Some(code) = error {
        debug!(error = code.as_str(), "request normalized with error");
    }

    NormalizeResponse {
        normalized_email,
        start_iso: resolved.map(|value| value.iso),
        time_zone,
        error,
    }
}
