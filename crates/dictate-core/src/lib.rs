pub mod dto;
pub mod email;
pub mod error;
pub mod request;
pub mod time;

pub use dto::*;
pub use email::{is_valid_email, normalize_spoken_email, EMAIL_PATTERN};
pub use error::CoreError;
pub use request::{authorize, handle_request, handle_request_at, DEFAULT_FALLBACK_TZ};
pub use time::{
    parse_time_phrase, parse_time_phrase_at, parse_time_zone, strip_ordinals, ResolvedTimestamp,
    TimeTemplate, ISO_TEMPLATE, TEMPLATES,
};
