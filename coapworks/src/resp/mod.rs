use toad_msg::{Code, Id, Type};

use crate::req::Req;
use crate::ContentFormat;

/// Response codes
pub mod code;

/// A response from the CoAPWorks API
///
/// ```
/// use coapworks::req::ReqBuilder;
/// use coapworks::resp::{code, Resp};
/// use coapworks::ContentFormat;
///
/// let req = ReqBuilder::get("time/utc").build().unwrap();
/// let resp = Resp::for_request(&req).content_format(ContentFormat::Text)
///                                   .payload("ec=0;utc=05-04-2024-13-45-02");
///
/// assert_eq!(resp.code(), code::CONTENT);
/// assert_eq!(resp.payload_str().unwrap(), "ec=0;utc=05-04-2024-13-45-02");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Resp {
  pub(crate) ty: Type,
  pub(crate) code: Code,
  pub(crate) id: Id,
  pub(crate) content_format: Option<ContentFormat>,
  pub(crate) payload: Vec<u8>,
}

impl Resp {
  /// Create a response
  pub fn new(ty: Type, code: Code, id: Id) -> Self {
    Self { ty,
           code,
           id,
           content_format: None,
           payload: Vec::new() }
  }

  /// Create a piggybacked `2.05 Content` response for a given request.
  ///
  /// CON requests get an ACK (sharing the request's id), NON requests get a NON.
  pub fn for_request(req: &Req) -> Self {
    let ty = match req.msg_type() {
      | Type::Con => Type::Ack,
      | _ => Type::Non,
    };
    Self::new(ty, code::CONTENT, req.msg_id())
  }

  /// Set the Content-Format option
  pub fn content_format(mut self, format: ContentFormat) -> Self {
    self.content_format = Some(format);
    self
  }

  /// Set the payload
  pub fn payload(mut self, payload: impl AsRef<[u8]>) -> Self {
    self.payload = payload.as_ref().to_vec();
    self
  }

  /// Get the message type
  pub fn msg_type(&self) -> Type {
    self.ty
  }

  /// Get the response code
  pub fn code(&self) -> Code {
    self.code
  }

  /// Get the message id
  pub fn msg_id(&self) -> Id {
    self.id
  }

  /// The Content-Format option, if the response has one
  pub fn content_format_option(&self) -> Option<ContentFormat> {
    self.content_format
  }

  /// Get the payload's raw bytes
  pub fn payload_bytes(&self) -> &[u8] {
    &self.payload
  }

  /// Get the payload as a utf8 string
  pub fn payload_str(&self) -> Result<&str, core::str::Utf8Error> {
    core::str::from_utf8(&self.payload)
  }
}
