//! HMAC-SHA256 helpers for the HTTP side of [CoAPWorks](https://coapworks.com):
//! verifying [webhook](webhook) deliveries and signing [web API](webapi) requests.
//!
//! Both use `base64(HMAC-SHA256(secret, data))`, see [`sign`].

// -
// deny
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(not(test), deny(unsafe_code))]
// -
// warnings
#![warn(missing_copy_implementations)]
#![cfg_attr(not(test), warn(unreachable_pub))]

use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::sign::Signer;

/// verifying webhook deliveries
pub mod webhook;

/// signing web API requests
pub mod webapi;

pub use webapi::{Credentials, Nonce};
pub use webhook::{Delivery, Webhook};

/// Errors encounterable while signing or verifying
#[derive(Debug)]
pub enum Error {
  /// OpenSSL failed to compute a digest
  Crypto(ErrorStack),
  /// A webhook body was not valid JSON
  Json(serde_json::Error),
}

impl core::fmt::Display for Error {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      | Error::Crypto(e) => write!(f, "hmac failed: {}", e),
      | Error::Json(e) => write!(f, "body is not json: {}", e),
    }
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      | Error::Crypto(e) => Some(e),
      | Error::Json(e) => Some(e),
    }
  }
}

impl From<ErrorStack> for Error {
  fn from(e: ErrorStack) -> Self {
    Error::Crypto(e)
  }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self {
    Error::Json(e)
  }
}

/// `base64(HMAC-SHA256(secret, data))`
///
/// ```
/// // RFC 4231, test case 2
/// let mac = coapworks_auth::sign(b"Jefe", b"what do ya want for nothing?").unwrap();
/// assert_eq!(mac, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
/// ```
pub fn sign(secret: &[u8], data: &[u8]) -> Result<String, Error> {
  let key = PKey::hmac(secret)?;
  let mut signer = Signer::new(MessageDigest::sha256(), &key)?;
  signer.update(data)?;
  let mac = signer.sign_to_vec()?;
  Ok(openssl::base64::encode_block(&mac))
}
