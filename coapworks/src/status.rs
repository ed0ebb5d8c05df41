use crate::payload::Map;

/// The key every CoAPWorks response carries its error code in
pub const ERROR_CODE_KEY: &str = "ec";

/// Why a response was not a success
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
  /// The service reported a non-zero error code
  Remote(i64),
  /// There was no error code at all
  Missing,
  /// The error code was not an integer
  Unparseable(String),
}

/// Outcome reported by the service in the `ec` field.
///
/// A failure is a normal outcome; operations turn it into
/// an absence value rather than an error.
///
/// ```
/// use coapworks::payload::Map;
/// use coapworks::status::{Failure, Status};
///
/// let mut map = Map::new();
/// assert_eq!(Status::of(&map), Status::Failure(Failure::Missing));
///
/// map.insert("ec".into(), "0".into());
/// assert!(Status::of(&map).is_success());
///
/// map.insert("ec".into(), "12".into());
/// assert_eq!(Status::of(&map), Status::Failure(Failure::Remote(12)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
  /// `ec` was present and zero
  Success,
  /// See [`Failure`]
  Failure(Failure),
}

impl Status {
  /// Evaluate a decoded response body
  pub fn of(map: &Map) -> Self {
    match map.get(ERROR_CODE_KEY).map(|ec| (ec, ec.trim().parse::<i64>())) {
      | None => Status::Failure(Failure::Missing),
      | Some((_, Ok(0))) => Status::Success,
      | Some((_, Ok(code))) => Status::Failure(Failure::Remote(code)),
      | Some((ec, Err(_))) => Status::Failure(Failure::Unparseable(ec.clone())),
    }
  }

  /// Is this [`Status::Success`]?
  pub fn is_success(&self) -> bool {
    matches!(self, Status::Success)
  }
}
