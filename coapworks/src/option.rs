/// Content-Format option number
pub const CONTENT_FORMAT: u32 = 12;

/// Uri-Host option number
pub const URI_HOST: u32 = 3;

/// Uri-Port option number
pub const URI_PORT: u32 = 7;

/// Uri-Path option number
pub const URI_PATH: u32 = 11;

/// Uri-Query option number
pub const URI_QUERY: u32 = 15;

/// Largest value (in bytes) the Uri-Path and Uri-Query options may carry
pub const MAX_URI_OPTION_LEN: usize = 255;

/// Content-Format
///
/// The CoAPWorks API only speaks plain text (`k=v;k=v`) and JSON,
/// every other registered format is carried as [`ContentFormat::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentFormat {
  /// `text/plain; charset=utf-8`
  Text,
  /// `application/json`
  Json,
  /// Another content format
  Other(u32),
}

impl Default for ContentFormat {
  fn default() -> Self {
    ContentFormat::Text
  }
}

impl ContentFormat {
  /// Pick a format for an outbound payload by looking at it.
  ///
  /// ```
  /// use coapworks::ContentFormat;
  ///
  /// assert_eq!(ContentFormat::sniff(r#"  {"t": 21.5}"#), ContentFormat::Json);
  /// assert_eq!(ContentFormat::sniff("t=21.5"), ContentFormat::Text);
  /// ```
  pub fn sniff(payload: &str) -> Self {
    if payload.trim().starts_with('{') {
      ContentFormat::Json
    } else {
      ContentFormat::Text
    }
  }

  /// Convert this content format to the CoAP option value.
  ///
  /// CoAP uints are sent in as few bytes as possible,
  /// so `text/plain` (0) is the empty value.
  pub fn bytes(&self) -> Vec<u8> {
    uint_bytes(u32::from(self))
  }

  /// Read a content format from a CoAP option value.
  ///
  /// Registered formats fit in 2 bytes; anything wider is
  /// never mistaken for one of them.
  ///
  /// ```
  /// use coapworks::ContentFormat;
  ///
  /// assert_eq!(ContentFormat::from_bytes(&[50]), ContentFormat::Json);
  /// assert_eq!(ContentFormat::from_bytes(&[1, 0, 50]), ContentFormat::Other(65586));
  /// ```
  pub fn from_bytes(bytes: &[u8]) -> Self {
    let n = bytes.iter()
                 .try_fold(0u32, |n, b| n.checked_mul(256)?.checked_add(*b as u32))
                 .unwrap_or(u32::MAX);
    ContentFormat::from(n)
  }
}

impl<'a> From<&'a ContentFormat> for u32 {
  fn from(f: &'a ContentFormat) -> Self {
    match *f {
      | ContentFormat::Text => 0,
      | ContentFormat::Json => 50,
      | ContentFormat::Other(n) => n,
    }
  }
}

impl From<u32> for ContentFormat {
  fn from(n: u32) -> Self {
    match n {
      | 0 => ContentFormat::Text,
      | 50 => ContentFormat::Json,
      | n => ContentFormat::Other(n),
    }
  }
}

/// Encode an unsigned integer the way CoAP options expect:
/// big-endian with leading zero bytes dropped.
pub(crate) fn uint_bytes(n: u32) -> Vec<u8> {
  n.to_be_bytes().into_iter().skip_while(|b| *b == 0).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn text_is_the_empty_option_value() {
    assert_eq!(ContentFormat::Text.bytes(), Vec::<u8>::new());
    assert_eq!(ContentFormat::Json.bytes(), vec![50]);
  }

  #[test]
  fn from_bytes_reads_big_endian() {
    assert_eq!(ContentFormat::from_bytes(&[]), ContentFormat::Text);
    assert_eq!(ContentFormat::from_bytes(&[0, 50]), ContentFormat::Json);
    assert_eq!(ContentFormat::from_bytes(&[0x2d, 0x16]),
               ContentFormat::Other(11542));
  }

  #[test]
  fn from_bytes_keeps_wide_values_apart() {
    assert_eq!(ContentFormat::from_bytes(&[0, 0, 50]), ContentFormat::Json);
    assert_eq!(ContentFormat::from_bytes(&[1, 0, 50]),
               ContentFormat::Other(0x01_00_32));
    assert_eq!(ContentFormat::from_bytes(&[1, 0, 0, 0, 50]),
               ContentFormat::Other(u32::MAX));
  }

  #[test]
  fn sniff_looks_past_whitespace() {
    assert_eq!(ContentFormat::sniff("\n {'d':1}"), ContentFormat::Json);
    assert_eq!(ContentFormat::sniff("d=1"), ContentFormat::Text);
    assert_eq!(ContentFormat::sniff(""), ContentFormat::Text);
  }

  #[test]
  fn port_encodes_without_leading_zeroes() {
    assert_eq!(uint_bytes(5683), vec![0x16, 0x33]);
    assert_eq!(uint_bytes(0), Vec::<u8>::new());
  }
}
