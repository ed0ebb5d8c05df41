use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::payload::{DecodeError, Payload};

/// A duration, in milliseconds
pub type Millis = embedded_time::duration::Milliseconds<u64>;

/// Layout of every date-time the API sends: `DD-MM-YYYY-HH-mm-ss`
pub const DATE_TIME_FORMAT: &str = "%d-%m-%Y-%H-%M-%S";

/// Parse a positional `DD-MM-YYYY-HH-mm-ss` date-time.
///
/// ```
/// use chrono::{NaiveDate, NaiveDateTime};
///
/// let parsed = coapworks::time::parse_date_time("05-04-2024-13-45-02").unwrap();
/// let expected = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap()
///                                                   .and_hms_opt(13, 45, 2)
///                                                   .unwrap();
/// assert_eq!(parsed, expected);
/// ```
pub fn parse_date_time(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
  NaiveDateTime::parse_from_str(s.trim(), DATE_TIME_FORMAT)
}

/// The value [`Machine::utc_time`](crate::machine::Machine::utc_time)
/// yields when the service reports a failure: 1970-01-01T00:00:00Z
pub fn epoch() -> DateTime<Utc> {
  Utc.from_utc_datetime(&NaiveDateTime::default())
}

/// Local time at a machine's location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTimeInfo {
  /// Whether daylight saving time is in effect
  pub in_dst: bool,
  /// IANA time zone name (e.g. `Asia/Kolkata`)
  pub time_zone: String,
  /// Wall-clock time in `time_zone`
  pub local: NaiveDateTime,
}

impl LocalTimeInfo {
  /// Read the `dst`, `tmz` and `lot` fields of a successful response
  pub fn from_payload(payload: &Payload) -> Result<Self, DecodeError> {
    let dst = payload.require("dst")?;
    let in_dst = match dst.trim().parse::<i64>() {
      | Ok(n) => n == 1,
      | Err(_) => return Err(invalid("dst", dst)),
    };

    let time_zone = payload.require("tmz")?.to_string();
    let local = date_time_field(payload, "lot")?;

    Ok(Self { in_dst,
              time_zone,
              local })
  }
}

/// Read and parse a `DD-MM-YYYY-HH-mm-ss` field
pub(crate) fn date_time_field(payload: &Payload,
                              key: &'static str)
                              -> Result<NaiveDateTime, DecodeError> {
  let raw = payload.require(key)?;
  parse_date_time(raw).map_err(|_| invalid(key, raw))
}

fn invalid(key: &'static str, value: &str) -> DecodeError {
  DecodeError::InvalidField { key,
                              value: value.to_string() }
}

#[cfg(test)]
mod tests {
  use chrono::{Datelike, Timelike};

  use super::*;

  #[test]
  fn parses_positional_fields() {
    let t = parse_date_time("31-12-1999-23-59-58").unwrap();
    assert_eq!((t.day(), t.month(), t.year()), (31, 12, 1999));
    assert_eq!((t.hour(), t.minute(), t.second()), (23, 59, 58));
  }

  #[test]
  fn rejects_other_layouts() {
    assert!(parse_date_time("2024-04-05T13:45:02").is_err());
    assert!(parse_date_time("05-04-2024").is_err());
    assert!(parse_date_time("32-01-2024-00-00-00").is_err());
  }

  fn payload(pairs: &[(&str, &str)]) -> Payload {
    Payload::Text(pairs.iter()
                       .map(|(k, v)| (k.to_string(), v.to_string()))
                       .collect())
  }

  #[test]
  fn local_time_info() {
    let p = payload(&[("ec", "0"),
                      ("dst", "1"),
                      ("tmz", "America/Los_Angeles"),
                      ("lot", "05-04-2024-06-45-02")]);
    let info = LocalTimeInfo::from_payload(&p).unwrap();
    assert!(info.in_dst);
    assert_eq!(info.time_zone, "America/Los_Angeles");
    assert_eq!(info.local, parse_date_time("05-04-2024-06-45-02").unwrap());
  }

  #[test]
  fn dst_other_than_one_is_false() {
    let p = payload(&[("dst", "0"), ("tmz", "UTC"), ("lot", "01-01-2024-00-00-00")]);
    assert!(!LocalTimeInfo::from_payload(&p).unwrap().in_dst);
  }

  #[test]
  fn local_time_info_missing_field() {
    let p = payload(&[("dst", "0"), ("lot", "01-01-2024-00-00-00")]);
    assert!(matches!(LocalTimeInfo::from_payload(&p),
                     Err(DecodeError::MissingField("tmz"))));
  }

  #[test]
  fn local_time_info_bad_fields() {
    let p = payload(&[("dst", "yes"), ("tmz", "UTC"), ("lot", "01-01-2024-00-00-00")]);
    assert!(matches!(LocalTimeInfo::from_payload(&p),
                     Err(DecodeError::InvalidField { key: "dst", .. })));

    let p = payload(&[("dst", "0"), ("tmz", "UTC"), ("lot", "tomorrow")]);
    assert!(matches!(LocalTimeInfo::from_payload(&p),
                     Err(DecodeError::InvalidField { key: "lot", .. })));
  }

  #[test]
  fn epoch_is_unix_zero() {
    assert_eq!(epoch().timestamp(), 0);
  }
}
