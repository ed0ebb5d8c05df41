use chrono::{DateTime, Timelike, Utc};

use crate::{sign, Error};

/// Where the web API is served from
pub const BASE_URL: &str = "https://wapi.coapworks.com/v1/api";

/// Web client id header
pub const WCID: &str = "X-COAPWK-WCID";

/// Nonce header
pub const NONCE: &str = "X-COAPWK-NONCE";

/// Web client name header
pub const WCNAME: &str = "X-COAPWK-WCNAME";

/// Signature header
pub const WCHASH: &str = "X-COAPWK-WCHASH";

/// The time of day (UTC, seconds precision) a request was signed at,
/// written as the number `HHmmss` (so 01:02:03 is `10203`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nonce(pub u32);

impl Nonce {
  /// The nonce for right now
  pub fn now() -> Self {
    Self::at(Utc::now())
  }

  /// The nonce for a point in time
  ///
  /// ```
  /// use chrono::{TimeZone, Utc};
  /// use coapworks_auth::Nonce;
  ///
  /// let t = Utc.with_ymd_and_hms(2024, 4, 5, 13, 45, 2).unwrap();
  /// assert_eq!(Nonce::at(t), Nonce(134502));
  /// ```
  pub fn at(time: DateTime<Utc>) -> Self {
    Self(time.hour() * 10_000 + time.minute() * 100 + time.second())
  }
}

impl core::fmt::Display for Nonce {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A web client registered in the CoAPWorks console.
///
/// Every web API request carries four headers identifying the
/// client, with a signature over `<name>;<id>;<nonce>`.
/// Sending the requests is up to you.
///
/// ```
/// use coapworks_auth::{Credentials, Nonce};
///
/// let creds = Credentials::new(42, "dashboard", "wc-secret");
/// let headers = creds.headers(Nonce(134502)).unwrap();
///
/// assert_eq!(headers[0], ("X-COAPWK-WCID", "42".to_string()));
/// assert_eq!(headers[3].1, "YIu/mEUF4T4LQtL/D6rRikAaB1vqTbOOTi+ERjJy4XM=");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
  /// Web client id
  pub id: i64,
  /// Web client name
  pub name: String,
  secret: String,
}

impl core::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("Credentials")
     .field("id", &self.id)
     .field("name", &self.name)
     .finish_non_exhaustive()
  }
}

impl Credentials {
  /// Create credentials
  pub fn new(id: i64, name: impl Into<String>, secret: impl Into<String>) -> Self {
    Self { id,
           name: name.into(),
           secret: secret.into() }
  }

  /// [`BASE_URL`]
  pub fn base_url() -> &'static str {
    BASE_URL
  }

  /// The url of a web API resource, e.g. `machine/m-01`
  ///
  /// ```
  /// use coapworks_auth::Credentials;
  ///
  /// assert_eq!(Credentials::url("/machine"), "https://wapi.coapworks.com/v1/api/machine");
  /// ```
  pub fn url(path: &str) -> String {
    format!("{}/{}", BASE_URL, path.trim_start_matches('/'))
  }

  /// The data the signature covers
  pub fn signed_data(&self, nonce: Nonce) -> String {
    format!("{};{};{}", self.name.trim(), self.id, nonce)
  }

  /// Headers to attach to a request, in the order
  /// [`WCID`], [`NONCE`], [`WCNAME`], [`WCHASH`]
  pub fn headers(&self, nonce: Nonce) -> Result<Vec<(&'static str, String)>, Error> {
    let hash = sign(self.secret.as_bytes(), self.signed_data(nonce).as_bytes())?;
    Ok(vec![(WCID, self.id.to_string()),
            (NONCE, nonce.to_string()),
            (WCNAME, self.name.clone()),
            (WCHASH, hash)])
  }
}
