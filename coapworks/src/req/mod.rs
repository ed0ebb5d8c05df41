use toad_msg::{Code, Id, Type};

use crate::config::Config;
use crate::ContentFormat;

/// Request builder
pub mod builder;

#[doc(inline)]
pub use builder::*;

/// Request method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  /// GET (0.01)
  Get,
  /// POST (0.02)
  Post,
}

impl Method {
  /// The CoAP code for this method
  pub fn code(&self) -> Code {
    match self {
      | Method::Get => Code::new(0, 1),
      | Method::Post => Code::new(0, 2),
    }
  }
}

impl core::fmt::Display for Method {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      | Method::Get => f.write_str("GET"),
      | Method::Post => f.write_str("POST"),
    }
  }
}

/// A request to the CoAPWorks API
///
/// The path is every Uri-Path segment, base path included;
/// host and port come from [`Config`].
///
/// ```
/// use coapworks::config::Config;
/// use coapworks::req::ReqBuilder;
///
/// let req = ReqBuilder::get("v1/time/utc").query("mid", "m-01")
///                                         .build()
///                                         .unwrap();
///
/// assert_eq!(req.url(&Config::default()),
///            "coap://capi.coapworks.com:5683/v1/time/utc?mid=m-01");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Req {
  pub(crate) ty: Type,
  pub(crate) method: Method,
  pub(crate) id: Id,
  pub(crate) path: Vec<String>,
  pub(crate) query: Vec<(String, String)>,
  pub(crate) content_format: Option<ContentFormat>,
  pub(crate) payload: Vec<u8>,
}

impl Req {
  /// Get the request type (confirmable, non-confirmable)
  pub fn msg_type(&self) -> Type {
    self.ty
  }

  /// Get the request method
  pub fn method(&self) -> Method {
    self.method
  }

  /// Get a copy of the message id for this request
  pub fn msg_id(&self) -> Id {
    self.id
  }

  /// Path segments
  pub fn path(&self) -> &[String] {
    &self.path
  }

  /// Path segments joined with `/`
  pub fn path_string(&self) -> String {
    self.path.join("/")
  }

  /// Query parameters, in the order they were added
  pub fn query(&self) -> &[(String, String)] {
    &self.query
  }

  /// Get the value of a query parameter
  pub fn query_value(&self, key: &str) -> Option<&str> {
    self.query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
  }

  /// Query parameters as they appear in Uri-Query options (`k=v`)
  pub fn query_options(&self) -> impl Iterator<Item = String> + '_ {
    self.query.iter().map(|(k, v)| format!("{}={}", k, v))
  }

  /// The Content-Format option, if the request has one
  pub fn content_format(&self) -> Option<ContentFormat> {
    self.content_format
  }

  /// Get the payload's raw bytes
  pub fn payload(&self) -> &[u8] {
    &self.payload
  }

  /// Get the payload as a utf8 string
  pub fn payload_str(&self) -> Result<&str, core::str::Utf8Error> {
    core::str::from_utf8(&self.payload)
  }

  /// The full URL of this request
  pub fn url(&self, config: &Config) -> String {
    let mut url = format!("coap://{}:{}/{}", config.host, config.port, self.path_string());
    let query = self.query_options().collect::<Vec<_>>();
    if !query.is_empty() {
      url.push('?');
      url.push_str(&query.join("&"));
    }
    url
  }
}
