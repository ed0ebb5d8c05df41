use std::collections::BTreeMap;

use crate::resp::Resp;
use crate::ContentFormat;

/// Key/value pairs decoded from a response body
pub type Map = BTreeMap<String, String>;

/// Errors encounterable while decoding a response body
#[derive(Debug)]
pub enum DecodeError {
  /// The body was not valid utf8
  Utf8(core::str::Utf8Error),
  /// The response declared a Content-Format we do not decode
  UnsupportedContentFormat(u32),
  /// A plain text entry was not a `key=value` pair
  MalformedPair(String),
  /// The body was not valid JSON
  Json(serde_json::Error),
  /// The body was JSON, but not an object
  NotAnObject,
  /// A field the operation needs is absent from a successful response
  MissingField(&'static str),
  /// A field is present but its value could not be interpreted
  InvalidField {
    /// The key
    key: &'static str,
    /// The value as it was received
    value: String,
  },
}

impl core::fmt::Display for DecodeError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      | Self::Utf8(e) => write!(f, "payload is not utf8: {}", e),
      | Self::UnsupportedContentFormat(n) => write!(f, "unsupported content format {}", n),
      | Self::MalformedPair(entry) => write!(f, "expected key=value, got {:?}", entry),
      | Self::Json(e) => write!(f, "payload is not json: {}", e),
      | Self::NotAnObject => f.write_str("json payload is not an object"),
      | Self::MissingField(key) => write!(f, "response has no {:?} field", key),
      | Self::InvalidField { key, value } => write!(f, "invalid {:?} field: {:?}", key, value),
    }
  }
}

impl std::error::Error for DecodeError {}

/// A decoded response body.
///
/// The variant records which wire format the pairs came from;
/// both carry the same flat string map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
  /// Decoded from `key1=value1;key2=value2`
  Text(Map),
  /// Decoded from a flat JSON object
  Json(Map),
}

impl Payload {
  /// Decode a response body, picking the parser from the
  /// response's Content-Format (text when absent).
  ///
  /// ```
  /// use coapworks::payload::Payload;
  /// use coapworks::req::ReqBuilder;
  /// use coapworks::resp::Resp;
  ///
  /// let req = ReqBuilder::get("time/utc").build().unwrap();
  /// let resp = Resp::for_request(&req).payload("ec=0;utc=05-04-2024-13-45-02");
  ///
  /// let payload = Payload::decode(&resp).unwrap();
  /// assert_eq!(payload.get("utc"), Some("05-04-2024-13-45-02"));
  /// ```
  pub fn decode(resp: &Resp) -> Result<Self, DecodeError> {
    let format = resp.content_format_option().unwrap_or_default();
    let body = resp.payload_str().map_err(DecodeError::Utf8)?;

    match format {
      | ContentFormat::Text => decode_text(body).map(Payload::Text),
      | ContentFormat::Json => decode_json(body).map(Payload::Json),
      | ContentFormat::Other(n) => Err(DecodeError::UnsupportedContentFormat(n)),
    }
  }

  /// Borrow the decoded pairs
  pub fn map(&self) -> &Map {
    match self {
      | Payload::Text(m) | Payload::Json(m) => m,
    }
  }

  /// Take the decoded pairs
  pub fn into_map(self) -> Map {
    match self {
      | Payload::Text(m) | Payload::Json(m) => m,
    }
  }

  /// Get the value of a key
  pub fn get(&self, key: &str) -> Option<&str> {
    self.map().get(key).map(String::as_str)
  }

  /// Get the value of a key, failing if it is absent
  pub fn require(&self, key: &'static str) -> Result<&str, DecodeError> {
    self.get(key).ok_or(DecodeError::MissingField(key))
  }
}

/// Parse `key1=value1;key2=value2;...`
///
/// Whitespace around entries, keys and values is dropped,
/// as are empty entries (`a=1;;b=2;`).
pub fn decode_text(body: &str) -> Result<Map, DecodeError> {
  body.split(';')
      .map(str::trim)
      .filter(|entry| !entry.is_empty())
      .map(|entry| match entry.split_once('=') {
        | Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.trim().to_string())),
        | _ => Err(DecodeError::MalformedPair(entry.to_string())),
      })
      .collect()
}

/// Parse a flat JSON object.
///
/// Strings are kept verbatim, other scalars become their JSON text,
/// `null` becomes an empty string and nested values keep their compact
/// JSON text.
pub fn decode_json(body: &str) -> Result<Map, DecodeError> {
  if body.trim().is_empty() {
    return Ok(Map::new());
  }

  match serde_json::from_str::<serde_json::Value>(body).map_err(DecodeError::Json)? {
    | serde_json::Value::Object(obj) => Ok(obj.into_iter()
                                              .map(|(k, v)| (k, json_to_string(v)))
                                              .collect()),
    | _ => Err(DecodeError::NotAnObject),
  }
}

fn json_to_string(v: serde_json::Value) -> String {
  match v {
    | serde_json::Value::String(s) => s,
    | serde_json::Value::Null => String::new(),
    | other => other.to_string(),
  }
}
