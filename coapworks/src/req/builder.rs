use toad_msg::{Id, Type};

use super::{Method, Req};
use crate::option::{MAX_URI_OPTION_LEN, URI_PATH, URI_QUERY};
use crate::ContentFormat;

/// Errors encounterable while using ReqBuilder
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
  /// A path segment or `k=v` query would not fit in a CoAP option
  OptionTooLong {
    /// Option number (11 for Uri-Path, 15 for Uri-Query)
    number: u32,
    /// Length of the value, in bytes
    len: usize,
  },
}

/// Build a request
///
/// ```
/// use coapworks::req::{Method, ReqBuilder};
/// use coapworks::ContentFormat;
///
/// let req = ReqBuilder::post("machine/hbt").query("mid", "m-01")
///                                          .content_format(ContentFormat::Json)
///                                          .payload(r#"{"d":1}"#)
///                                          .build()
///                                          .unwrap();
///
/// assert_eq!(req.method(), Method::Post);
/// assert_eq!(req.path(), ["machine", "hbt"]);
/// assert_eq!(req.payload_str().unwrap(), r#"{"d":1}"#);
/// ```
#[derive(Clone, Debug)]
pub struct ReqBuilder {
  inner: Result<Req, Error>,
}

impl ReqBuilder {
  fn new(method: Method, path: impl AsRef<str>) -> Self {
    let req = Req { ty: Type::Con,
                    method,
                    id: Id(0),
                    path: Vec::new(),
                    query: Vec::new(),
                    content_format: None,
                    payload: Vec::new() };

    let inner = path.as_ref()
                    .split('/')
                    .filter(|seg| !seg.is_empty())
                    .try_fold(req, |mut req, seg| {
                      check_len(URI_PATH, seg.len())?;
                      req.path.push(seg.to_string());
                      Ok(req)
                    });

    Self { inner }
  }

  /// Creates a GET request
  pub fn get(path: impl AsRef<str>) -> Self {
    Self::new(Method::Get, path)
  }

  /// Creates a POST request
  pub fn post(path: impl AsRef<str>) -> Self {
    Self::new(Method::Post, path)
  }

  /// Make the request non-confirmable
  ///
  /// Non-confirmable requests are sent once and never acknowledged,
  /// useful for fire-and-forget messages like alerts.
  pub fn non(mut self) -> Self {
    if let Ok(req) = self.inner.as_mut() {
      req.ty = Type::Non;
    }
    self
  }

  /// Set the message id
  pub fn id(mut self, id: Id) -> Self {
    if let Ok(req) = self.inner.as_mut() {
      req.id = id;
    }
    self
  }

  /// Add a query parameter (`key=value`)
  ///
  /// # Errors
  /// Causes the builder to error if `key=value` exceeds 255 bytes.
  pub fn query(mut self, key: impl AsRef<str>, value: impl ToString) -> Self {
    let key = key.as_ref();
    let value = value.to_string();

    self.inner = self.inner.and_then(|mut req| {
                             check_len(URI_QUERY, key.len() + 1 + value.len())?;
                             req.query.push((key.to_string(), value));
                             Ok(req)
                           });
    self
  }

  /// Set the Content-Format option
  pub fn content_format(mut self, format: ContentFormat) -> Self {
    if let Ok(req) = self.inner.as_mut() {
      req.content_format = Some(format);
    }
    self
  }

  /// Set the payload of the request
  pub fn payload(mut self, value: impl AsRef<[u8]>) -> Self {
    if let Ok(req) = self.inner.as_mut() {
      req.payload = value.as_ref().to_vec();
    }
    self
  }

  /// Unwrap the builder into the built request
  pub fn build(self) -> Result<Req, Error> {
    self.inner
  }
}

fn check_len(number: u32, len: usize) -> Result<(), Error> {
  if len > MAX_URI_OPTION_LEN {
    Err(Error::OptionTooLong { number, len })
  } else {
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_to_con_with_no_options() {
    let req = ReqBuilder::get("/time/utc/").build().unwrap();
    assert_eq!(req.msg_type(), Type::Con);
    assert_eq!(req.path(), ["time", "utc"]);
    assert_eq!(req.content_format(), None);
    assert!(req.payload().is_empty());
  }

  #[test]
  fn non_and_id() {
    let req = ReqBuilder::post("alerts/eml").non().id(Id(77)).build().unwrap();
    assert_eq!(req.msg_type(), Type::Non);
    assert_eq!(req.msg_id(), Id(77));
  }

  #[test]
  fn oversized_query_poisons_builder() {
    let long = "x".repeat(252);
    let err = ReqBuilder::get("machine/set").query("mid", long)
                                            .content_format(ContentFormat::Json)
                                            .build()
                                            .unwrap_err();
    assert_eq!(err,
               Error::OptionTooLong { number: URI_QUERY,
                                      len: 256 });
  }

  #[test]
  fn query_at_the_limit_is_fine() {
    let value = "x".repeat(251);
    let req = ReqBuilder::get("machine/set").query("mid", value)
                                            .build()
                                            .unwrap();
    assert_eq!(req.query_options().next().unwrap().len(), 255);
  }

  #[test]
  fn oversized_path_segment() {
    let path = format!("machine/{}", "p".repeat(300));
    assert_eq!(ReqBuilder::get(path).build().unwrap_err(),
               Error::OptionTooLong { number: URI_PATH,
                                      len: 300 });
  }
}
