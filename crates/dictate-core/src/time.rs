use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime,
    SecondsFormat, TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

use crate::error::CoreError;

/// A positional date/time layout tried against a phrase.
///
/// Fields are separated by single spaces in both `pattern` and `format`; a
/// phrase must carry the same number of space-separated tokens to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeTemplate {
    /// Human readable descriptor, e.g. `"MMM d h a"`.
    pub pattern: &'static str,
    /// Equivalent chrono layout.
    pub format: &'static str,
    pub has_year: bool,
}

/// Tried in order; the first template that parses wins.
pub const TEMPLATES: [TimeTemplate; 8] = [
    TimeTemplate {
        pattern: "MMM d h a",
        format: "%b %d %I %p",
        has_year: false,
    },
    TimeTemplate {
        pattern: "MMMM d h a",
        format: "%B %d %I %p",
        has_year: false,
    },
    TimeTemplate {
        pattern: "MMM d ha",
        format: "%b %d %I%p",
        has_year: false,
    },
    TimeTemplate {
        pattern: "MMMM d ha",
        format: "%B %d %I%p",
        has_year: false,
    },
    TimeTemplate {
        pattern: "M/d h a",
        format: "%m/%d %I %p",
        has_year: false,
    },
    TimeTemplate {
        pattern: "M/d/yyyy h a",
        format: "%m/%d/%Y %I %p",
        has_year: true,
    },
    TimeTemplate {
        pattern: "MMM d yyyy h a",
        format: "%b %d %Y %I %p",
        has_year: true,
    },
    TimeTemplate {
        pattern: "MMMM d yyyy h a",
        format: "%B %d %Y %I %p",
        has_year: true,
    },
];

/// Label reported when the phrase only parsed as ISO-8601.
pub const ISO_TEMPLATE: &str = "iso";

// Calendar, week and ordinal dates with optional time and offset. The
// extended form uses `-`/`:` separators; the basic form omits them.
const ISO_EXTENDED_PATTERN: &str = concat!(
    r"(?i)^(?P<year>[0-9]{4})",
    r"(?:-(?P<month>[0-9]{2})(?:-(?P<day>[0-9]{2}))?",
    r"|-W(?P<week>[0-9]{2})(?:-(?P<weekday>[1-7]))?",
    r"|-(?P<ordinal>[0-9]{3}))?",
    r"(?:T(?P<hour>[0-9]{2})",
    r"(?::(?P<minute>[0-9]{2})(?::(?P<second>[0-9]{2})(?:[.,](?P<fraction>[0-9]{1,9}))?)?)?",
    r"(?P<offset>Z|[+-][0-9]{2}(?::?[0-9]{2})?)?)?$",
);

const ISO_BASIC_PATTERN: &str = concat!(
    r"(?i)^(?P<year>[0-9]{4})",
    r"(?:(?P<month>[0-9]{2})(?P<day>[0-9]{2})",
    r"|W(?P<week>[0-9]{2})(?P<weekday>[1-7])?",
    r"|(?P<ordinal>[0-9]{3}))",
    r"(?:T(?P<hour>[0-9]{2})",
    r"(?:(?P<minute>[0-9]{2})(?:(?P<second>[0-9]{2})(?:[.,](?P<fraction>[0-9]{1,9}))?)?)?",
    r"(?P<offset>Z|[+-][0-9]{2}(?:[0-9]{2})?)?)?$",
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTimestamp {
    /// RFC 3339 with an explicit numeric offset, e.g. `2025-08-19T15:00:00-04:00`.
    /// Sub-second digits appear only when the instant has them.
    pub iso: String,
    /// IANA zone the phrase was interpreted in.
    pub zone: String,
    /// Template descriptor that matched, or [`ISO_TEMPLATE`].
    pub template: String,
}

impl ResolvedTimestamp {
    fn new(instant: DateTime<Tz>, template: &str) -> Self {
        Self {
            iso: instant.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            zone: instant.timezone().name().to_string(),
            template: template.to_string(),
        }
    }

    pub fn instant(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.iso).ok()
    }
}

pub fn parse_time_zone(raw: &str) -> Result<Tz, CoreError> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|_| CoreError::InvalidTimeZone(raw.to_string()))
}

/// Resolves a spoken date/time phrase in `tz`, defaulting a missing year to
/// the current year in that zone.
pub fn parse_time_phrase(phrase: &str, tz: &str) -> Option<ResolvedTimestamp> {
    parse_time_phrase_at(phrase, tz, Utc::now())
}

pub fn parse_time_phrase_at(
    phrase: &str,
    tz: &str,
    now: DateTime<Utc>,
) -> Option<ResolvedTimestamp> {
    let zone = match parse_time_zone(tz) {
        Ok(zone) => zone,
        Err(err) => {
            debug!(error = %err, "time zone rejected");
            return None;
        }
    };

    let cleaned = clean_phrase(phrase);
    if cleaned.is_empty() {
        return None;
    }

    let default_year = now.with_timezone(&zone).year();
    for template in TEMPLATES {
        if let Some(naive) = parse_template(&cleaned, &template, default_year) {
            if let Some(instant) = localize(&zone, naive) {
                debug!(template = template.pattern, "time phrase matched template");
                return Some(ResolvedTimestamp::new(instant, template.pattern));
            }
        }
    }

    let resolved =
        parse_iso(&cleaned, &zone).map(|instant| ResolvedTimestamp::new(instant, ISO_TEMPLATE));
    if resolved.is_none() {
        debug!("time phrase matched no template");
    }
    resolved
}

/// Drops ordinal suffixes from day numbers: `"Aug 19th"` becomes `"Aug 19"`.
pub fn strip_ordinals(phrase: &str) -> String {
    ordinal_re().replace_all(phrase, "$1").into_owned()
}

fn ordinal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("ordinal pattern is valid")
    })
}

fn clean_phrase(phrase: &str) -> String {
    strip_ordinals(phrase)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_template(
    input: &str,
    template: &TimeTemplate,
    default_year: i32,
) -> Option<NaiveDateTime> {
    // chrono skips whitespace before numeric fields, so "Aug19" would pass as
    // "Aug 19" if the phrase were handed over whole.
    let tokens: Vec<&str> = input.split(' ').collect();
    let fields: Vec<&str> = template.format.split(' ').collect();
    if tokens.len() != fields.len() {
        return None;
    }

    let mut parsed = Parsed::new();
    for (token, field) in tokens.iter().zip(&fields) {
        parse(&mut parsed, token, StrftimeItems::new(field)).ok()?;
    }
    if !template.has_year {
        parsed.set_year(i64::from(default_year)).ok()?;
    }
    parsed.set_minute(0).ok()?;
    let date = parsed.to_naive_date().ok()?;
    let time = parsed.to_naive_time().ok()?;
    Some(date.and_time(time))
}

fn iso_extended_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ISO_EXTENDED_PATTERN).expect("iso extended pattern is valid"))
}

fn iso_basic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ISO_BASIC_PATTERN).expect("iso basic pattern is valid"))
}

/// Parses ISO-8601 date, week-date and ordinal-date forms at any precision.
/// Inputs with an offset are moved into `zone`; the rest are local to it.
fn parse_iso(input: &str, zone: &Tz) -> Option<DateTime<Tz>> {
    let caps = iso_extended_re()
        .captures(input)
        .or_else(|| iso_basic_re().captures(input))?;
    let naive = iso_date(&caps)?.and_time(iso_time(&caps)?);

    match caps.name("offset") {
        Some(raw) => {
            let offset = iso_offset(raw.as_str())?;
            let fixed = offset.from_local_datetime(&naive).single()?;
            Some(fixed.with_timezone(zone))
        }
        None => localize(zone, naive),
    }
}

fn iso_field(caps: &Captures<'_>, name: &str) -> Option<u32> {
    caps.name(name)?.as_str().parse().ok()
}

fn iso_date(caps: &Captures<'_>) -> Option<NaiveDate> {
    let year: i32 = caps.name("year")?.as_str().parse().ok()?;

    if let Some(week) = iso_field(caps, "week") {
        let weekday = match iso_field(caps, "weekday").unwrap_or(1) {
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            6 => Weekday::Sat,
            7 => Weekday::Sun,
            _ => return None,
        };
        return NaiveDate::from_isoywd_opt(year, week, weekday);
    }
    if let Some(ordinal) = iso_field(caps, "ordinal") {
        return NaiveDate::from_yo_opt(year, ordinal);
    }

    let month = iso_field(caps, "month").unwrap_or(1);
    let day = iso_field(caps, "day").unwrap_or(1);
    NaiveDate::from_ymd_opt(year, month, day)
}

fn iso_time(caps: &Captures<'_>) -> Option<NaiveTime> {
    let hour = iso_field(caps, "hour").unwrap_or(0);
    let minute = iso_field(caps, "minute").unwrap_or(0);
    let second = iso_field(caps, "second").unwrap_or(0);
    let nanos = match caps.name("fraction") {
        Some(raw) => {
            let digits = raw.as_str();
            let value: u32 = digits.parse().ok()?;
            value * 10u32.pow(9 - digits.len() as u32)
        }
        None => 0,
    };
    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
}

// `Z`, `+hh`, `+hhmm` or `+hh:mm`.
fn iso_offset(raw: &str) -> Option<FixedOffset> {
    if raw.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = raw.split_at(1);
    let digits = rest.replace(':', "");
    let hours: i32 = digits.get(..2)?.parse().ok()?;
    let minutes: i32 = match digits.get(2..) {
        Some("") | None => 0,
        Some(raw_minutes) => raw_minutes.parse().ok()?,
    };
    if minutes >= 60 {
        return None;
    }
    let seconds = hours * 3600 + minutes * 60;
    FixedOffset::east_opt(if sign == "-" { -seconds } else { seconds })
}

// Ambiguous wall-clock times take the earlier instant; times inside a
// spring-forward gap move one hour later.
fn localize(zone: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => zone
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        parse_time_phrase, parse_time_phrase_at, parse_time_zone, strip_ordinals, ISO_TEMPLATE,
    };
    use chrono::{DateTime, TimeZone, Utc};
    use chrono_tz::America::New_York;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn resolves_ordinal_phrase_in_daylight_time() {
        let resolved = parse_time_phrase_at("Aug 19th 3 PM", "America/New_York", reference())
            .expect("resolved");
        assert_eq!(resolved.iso, "2025-08-19T15:00:00-04:00");
        assert_eq!(resolved.zone, "America/New_York");
        assert_eq!(resolved.template, "MMM d h a");

        let expected = New_York.with_ymd_and_hms(2025, 8, 19, 15, 0, 0).unwrap();
        assert_eq!(resolved.instant().expect("instant"), expected);
    }

    #[test]
    fn ordinal_and_plain_day_agree() {
        let with_suffix = parse_time_phrase_at("Aug 19th 3 PM", "America/New_York", reference());
        let plain = parse_time_phrase_at("Aug 19 3 PM", "America/New_York", reference());
        assert!(with_suffix.is_some());
        assert_eq!(with_suffix, plain);
    }

    #[test]
    fn standard_time_uses_winter_offset() {
        let resolved =
            parse_time_phrase_at("December 2nd 9 am", "America/New_York", reference())
                .expect("resolved");
        assert_eq!(resolved.iso, "2025-12-02T09:00:00-05:00");
        assert_eq!(resolved.template, "MMMM d h a");
    }

    #[test]
    fn compact_meridiem_matches() {
        let resolved =
            parse_time_phrase_at("Aug 19 3PM", "America/New_York", reference()).expect("resolved");
        assert_eq!(resolved.iso, "2025-08-19T15:00:00-04:00");
        assert_eq!(resolved.template, "MMM d ha");
    }

    #[test]
    fn run_together_fields_are_rejected() {
        for phrase in ["Aug19 3 PM", "Aug 193 PM", "August19 3PM", "8/19 3PM"] {
            assert!(
                parse_time_phrase_at(phrase, "America/New_York", reference()).is_none(),
                "{phrase} should not match"
            );
        }
    }

    #[test]
    fn numeric_month_day_with_and_without_year() {
        let without = parse_time_phrase_at("8/19 3 PM", "America/New_York", reference())
            .expect("resolved");
        assert_eq!(without.iso, "2025-08-19T15:00:00-04:00");
        assert_eq!(without.template, "M/d h a");

        let with = parse_time_phrase_at("1/5/2027 11 AM", "Europe/London", reference())
            .expect("resolved");
        assert_eq!(with.iso, "2027-01-05T11:00:00+00:00");
        assert_eq!(with.template, "M/d/yyyy h a");
    }

    #[test]
    fn explicit_year_overrides_default() {
        let resolved =
            parse_time_phrase_at("September 1st 2030 12 PM", "Asia/Tokyo", reference())
                .expect("resolved");
        assert_eq!(resolved.iso, "2030-09-01T12:00:00+09:00");
    }

    #[test]
    fn missing_year_follows_reference_in_target_zone() {
        let new_years_eve = Utc.with_ymd_and_hms(2026, 12, 31, 20, 0, 0).unwrap();
        let resolved = parse_time_phrase_at("Jan 2 10 AM", "Asia/Tokyo", new_years_eve)
            .expect("resolved");
        assert_eq!(resolved.iso, "2027-01-02T10:00:00+09:00");
    }

    #[test]
    fn template_priority_is_stable() {
        let first = parse_time_phrase_at("Aug 19 3 PM", "America/New_York", reference())
            .expect("resolved");
        for _ in 0..5 {
            let again = parse_time_phrase_at("Aug 19 3 PM", "America/New_York", reference())
                .expect("resolved");
            assert_eq!(again.template, first.template);
        }
    }

    #[test]
    fn falls_back_to_iso_with_and_without_offset() {
        let local = parse_time_phrase_at("2025-08-19T15:00", "America/New_York", reference())
            .expect("resolved");
        assert_eq!(local.iso, "2025-08-19T15:00:00-04:00");
        assert_eq!(local.template, ISO_TEMPLATE);

        let offset = parse_time_phrase_at("2025-08-19T19:00:00Z", "America/New_York", reference())
            .expect("resolved");
        assert_eq!(offset.iso, "2025-08-19T15:00:00-04:00");

        let date_only =
            parse_time_phrase_at("2025-01-10", "America/New_York", reference()).expect("resolved");
        assert_eq!(date_only.iso, "2025-01-10T00:00:00-05:00");
    }

    #[test]
    fn iso_fallback_accepts_extended_basic_and_reduced_forms() {
        let cases = [
            ("2025-08-19T19:00Z", "2025-08-19T15:00:00-04:00"),
            ("2025-08-19T15:00:00+0000", "2025-08-19T11:00:00-04:00"),
            ("2025-08-19T17:00+02", "2025-08-19T11:00:00-04:00"),
            ("2025-08-19T15", "2025-08-19T15:00:00-04:00"),
            ("2025-08-19T15:30:45", "2025-08-19T15:30:45-04:00"),
            ("20250819T150000", "2025-08-19T15:00:00-04:00"),
            ("20250819T1900Z", "2025-08-19T15:00:00-04:00"),
            ("20250819", "2025-08-19T00:00:00-04:00"),
            ("2025-08", "2025-08-01T00:00:00-04:00"),
            ("2025", "2025-01-01T00:00:00-05:00"),
            ("2025-W34-2", "2025-08-19T00:00:00-04:00"),
            ("2025-W34", "2025-08-18T00:00:00-04:00"),
            ("2025W342T15", "2025-08-19T15:00:00-04:00"),
            ("2025-231", "2025-08-19T00:00:00-04:00"),
            ("2025231T1500", "2025-08-19T15:00:00-04:00"),
        ];
        for (phrase, expected) in cases {
            let resolved = parse_time_phrase_at(phrase, "America/New_York", reference())
                .unwrap_or_else(|| panic!("{phrase} should resolve"));
            assert_eq!(resolved.iso, expected, "{phrase}");
            assert_eq!(resolved.template, ISO_TEMPLATE, "{phrase}");
        }
    }

    #[test]
    fn iso_fallback_rejects_out_of_range_fields() {
        for phrase in [
            "2025-13",
            "2025-02-30",
            "2025-W54-1",
            "2025-366",
            "2025-08-19T25",
            "2025-08-19T15:00+05:99",
            "2025-08-19 T15",
            "202508",
        ] {
            assert!(
                parse_time_phrase_at(phrase, "America/New_York", reference()).is_none(),
                "{phrase} should not resolve"
            );
        }
    }

    #[test]
    fn fractional_seconds_survive() {
        let millis = parse_time_phrase_at(
            "2025-08-19T15:00:00.500-04:00",
            "America/New_York",
            reference(),
        )
        .expect("resolved");
        assert_eq!(millis.iso, "2025-08-19T15:00:00.500-04:00");

        let nanos =
            parse_time_phrase_at("2025-08-19T15:00:00.123456789", "America/New_York", reference())
                .expect("resolved");
        assert_eq!(nanos.iso, "2025-08-19T15:00:00.123456789-04:00");

        let expected = New_York
            .with_ymd_and_hms(2025, 8, 19, 15, 0, 0)
            .unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        assert_eq!(nanos.instant().expect("instant"), expected);
    }

    #[test]
    fn spring_forward_gap_moves_later() {
        let resolved = parse_time_phrase_at("Mar 9 2025 2 AM", "America/New_York", reference())
            .expect("resolved");
        assert_eq!(resolved.iso, "2025-03-09T03:00:00-04:00");
    }

    #[test]
    fn fall_back_overlap_takes_earlier_instant() {
        let resolved = parse_time_phrase_at("Nov 2 2025 1 AM", "America/New_York", reference())
            .expect("resolved");
        assert_eq!(resolved.iso, "2025-11-02T01:00:00-04:00");
    }

    #[test]
    fn round_trips_through_iso_parse() {
        for phrase in [
            "Aug 19th 3 PM",
            "July 4 2026 8 pm",
            "2/28 7 AM",
            "2025-08-19T15:00:00.25Z",
        ] {
            let resolved =
                parse_time_phrase_at(phrase, "America/Chicago", reference()).expect(phrase);
            let instant = resolved.instant().expect("instant");
            assert_eq!(
                instant.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, false),
                resolved.iso
            );
        }
    }

    #[test]
    fn gibberish_is_rejected() {
        assert!(parse_time_phrase("gibberish", "America/New_York").is_none());
        assert!(parse_time_phrase("", "America/New_York").is_none());
        assert!(parse_time_phrase("Aug 32 3 PM", "America/New_York").is_none());
        assert!(parse_time_phrase("Aug 19 13 PM", "America/New_York").is_none());
    }

    #[test]
    fn unknown_zone_is_rejected() {
        assert!(parse_time_phrase("Aug 19 3 PM", "Mars/Olympus_Mons").is_none());
        assert!(parse_time_zone("Mars/Olympus_Mons").is_err());
        assert!(parse_time_zone("Europe/Berlin").is_ok());
    }

    #[test]
    fn strip_ordinals_only_touches_day_numbers() {
        assert_eq!(strip_ordinals("Aug 19th 3 PM"), "Aug 19 3 PM");
        assert_eq!(strip_ordinals("June 1ST 9 am"), "June 1 9 am");
        assert_eq!(strip_ordinals("the 4th"), "the 4");
        assert_eq!(strip_ordinals("100th birthday"), "100th birthday");
        assert_eq!(strip_ordinals("north"), "north");
    }
}
