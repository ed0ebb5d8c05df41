use serde_json::Value;

use crate::{sign, Error};

/// Check that `signature` is `base64(HMAC-SHA256(secret, body))`.
///
/// The comparison takes the same time wherever the first
/// differing byte is.
///
/// ```
/// use coapworks_auth::webhook::verify;
///
/// let sig = "GTc+8OjGbyBuSdJR5EAikWFbvObvAJIulKR6IT+3buE=";
/// assert!(verify(b"whsec", br#"{"a":1}"#, sig).unwrap());
/// assert!(!verify(b"whsec", br#"{"a":2}"#, sig).unwrap());
/// ```
pub fn verify(secret: &[u8], body: &[u8], signature: &str) -> Result<bool, Error> {
  let expected = sign(secret, body)?;
  Ok(expected.len() == signature.len()
     && openssl::memcmp::eq(expected.as_bytes(), signature.as_bytes()))
}

/// The outcome of receiving a webhook delivery
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
  /// The signature matched; here is the body
  Accepted(Value),
  /// The body was signed with some other secret (or tampered with)
  SignatureMismatch,
  /// There was no signature to check
  Unsigned,
  /// There was no body
  Empty,
}

impl Delivery {
  /// Was the delivery authentic?
  pub fn is_accepted(&self) -> bool {
    matches!(self, Delivery::Accepted(_))
  }
}

/// Receives webhook deliveries from CoAPWorks.
///
/// CoAPWorks POSTs a JSON body along with a `signature` query parameter;
/// hand the raw body and that parameter to [`Webhook::receive`].
/// Hosting the endpoint is up to you.
///
/// ```
/// use coapworks_auth::{Delivery, Webhook};
///
/// let hook = Webhook::new("whsec");
/// let sig = "GTc+8OjGbyBuSdJR5EAikWFbvObvAJIulKR6IT+3buE=";
///
/// match hook.receive(br#"{"a":1}"#, Some(sig)).unwrap() {
///   | Delivery::Accepted(json) => assert_eq!(json["a"], 1),
///   | other => panic!("{:?}", other),
/// }
/// ```
#[derive(Clone)]
pub struct Webhook {
  secret: Vec<u8>,
}

impl core::fmt::Debug for Webhook {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str("Webhook { secret: .. }")
  }
}

impl Webhook {
  /// Create a receiver for the secret configured alongside the webhook
  pub fn new(secret: impl AsRef<[u8]>) -> Self {
    Self { secret: secret.as_ref().to_vec() }
  }

  /// Check a delivery.
  ///
  /// The body must be JSON even when it is unsigned.
  pub fn receive(&self, body: &[u8], signature: Option<&str>) -> Result<Delivery, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
      log::warn!(target: "coapworks_auth", "no data received in body");
      return Ok(Delivery::Empty);
    }

    let json = serde_json::from_slice::<Value>(body)?;

    let signature = match signature.map(str::trim) {
      | Some(s) if !s.is_empty() => s,
      | _ => return Ok(Delivery::Unsigned),
    };

    if verify(&self.secret, body, signature)? {
      log::info!(target: "coapworks_auth", "accepted webhook delivery");
      Ok(Delivery::Accepted(json))
    } else {
      log::warn!(target: "coapworks_auth", "webhook signature mismatch");
      Ok(Delivery::SignatureMismatch)
    }
  }
}
