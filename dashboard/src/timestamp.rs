use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Day-first pattern used by the sensor gateway when it does not send ISO strings.
const DAY_FIRST_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// ISO-like shapes without an offset, tried in order.
const ISO_LOCAL_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Offset-bearing shapes that RFC 3339 rejects because the seconds are missing.
const ISO_OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z"];

const TIME_LABEL_FORMAT: &str = "%H:%M:%S";
const INVALID_LABEL: &str = "--";

/// A reading timestamp resolved to local wall-clock time.
///
/// `Invalid` orders below every valid instant, so a descending sort puts
/// unparseable timestamps last and a "greater than" fold never picks one
/// over a valid candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NormalizedInstant {
    Invalid,
    Valid(NaiveDateTime),
}

impl NormalizedInstant {
    pub fn is_valid(&self) -> bool {
        matches!(self, NormalizedInstant::Valid(_))
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            NormalizedInstant::Valid(dt) => Some(*dt),
            NormalizedInstant::Invalid => None,
        }
    }

    /// Short `HH:MM:SS` label used on the chart axis.
    pub fn time_label(&self) -> String {
        self.format_or_placeholder(TIME_LABEL_FORMAT)
    }

    /// Full `DD/MM/YYYY HH:MM:SS` label used in the history list.
    pub fn display_label(&self) -> String {
        self.format_or_placeholder(DAY_FIRST_FORMAT)
    }

    fn format_or_placeholder(&self, format: &str) -> String {
        match self {
            NormalizedInstant::Valid(dt) => dt.format(format).to_string(),
            NormalizedInstant::Invalid => INVALID_LABEL.to_string(),
        }
    }
}

/// Normalizes a raw reading timestamp.
///
/// Tries a direct ISO parse first and falls back to `DD/MM/YYYY HH:MM:SS`.
/// Anything else, including an absent value, is `Invalid`.
pub fn normalize(raw: Option<&str>) -> NormalizedInstant {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return NormalizedInstant::Invalid;
    };

    parse_direct(raw)
        .or_else(|| parse_day_first(raw))
        .map(NormalizedInstant::Valid)
        .unwrap_or(NormalizedInstant::Invalid)
}

fn parse_direct(raw: &str) -> Option<NaiveDateTime> {
    if let Some(dt) = parse_with_offset(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    // A bare `Z` on any local shape means UTC
    if let Some(utc) = raw.strip_suffix(['Z', 'z']) {
        return parse_iso_local(utc)
            .map(|naive| Utc.from_utc_datetime(&naive).with_timezone(&Local).naive_local());
    }

    parse_iso_local(raw)
}

fn parse_with_offset(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok().or_else(|| {
        ISO_OFFSET_FORMATS
            .iter()
            .find_map(|format| DateTime::parse_from_str(raw, format).ok())
    })
}

fn parse_iso_local(raw: &str) -> Option<NaiveDateTime> {
    ISO_LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn parse_day_first(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DAY_FIRST_FORMAT).ok()
}
