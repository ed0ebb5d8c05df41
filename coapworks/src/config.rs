use embedded_time::duration::Milliseconds;

use crate::time::Millis;

/// Host name the CoAP API is served from
pub const HOST: &str = "capi.coapworks.com";

/// Default CoAP port
pub const PORT: u16 = 5683;

/// API version prefix of every request path
pub const BASE_PATH: &str = "v1";

/// Configuration options related to the two-step provisioning exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Provision {
  /// Whether the "confirm" request reuses the message id of
  /// the "initiate" request.
  ///
  /// Deployed devices send both requests with one id, so
  /// this defaults to `true`.
  ///
  /// ```
  /// use coapworks::config::Provision;
  ///
  /// assert!(Provision::default().reuse_message_id);
  /// ```
  pub reuse_message_id: bool,
}

impl Default for Provision {
  fn default() -> Self {
    Provision { reuse_message_id: true }
  }
}

/// Size limits enforced locally, before a request is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Limits {
  /// Maximum characters in an email alert subject.
  ///
  /// ```
  /// use coapworks::config::Limits;
  ///
  /// assert_eq!(Limits::default().alert_subject, 20);
  /// ```
  pub alert_subject: usize,
  /// Maximum characters in an email alert body.
  ///
  /// ```
  /// use coapworks::config::Limits;
  ///
  /// assert_eq!(Limits::default().alert_body, 128);
  /// ```
  pub alert_body: usize,
  /// Maximum characters (after trimming) in heartbeat data
  /// and channel feeds.
  ///
  /// ```
  /// use coapworks::config::Limits;
  ///
  /// assert_eq!(Limits::default().payload, 128);
  /// ```
  pub payload: usize,
}

impl Default for Limits {
  fn default() -> Self {
    Limits { alert_subject: 20,
             alert_body: 128,
             payload: 128 }
  }
}

/// Client config
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Config {
  /// Host the API is served from
  ///
  /// ```
  /// use coapworks::config::Config;
  ///
  /// assert_eq!(Config::default().host, "capi.coapworks.com");
  /// ```
  pub host: String,
  /// Port the API is served on
  ///
  /// ```
  /// use coapworks::config::Config;
  ///
  /// assert_eq!(Config::default().port, 5683);
  /// ```
  pub port: u16,
  /// First Uri-Path segment of every request
  pub base_path: String,
  /// How long to wait for a response before giving up.
  ///
  /// Defaults to 30 seconds.
  ///
  /// ```
  /// use coapworks::config::Config;
  /// use embedded_time::duration::Milliseconds;
  ///
  /// assert_eq!(Config::default().rx_timeout, Milliseconds(30_000u64));
  /// ```
  pub rx_timeout: Millis,
  /// Seed for message ids & tokens.
  ///
  /// `None` (the default) seeds from the system clock.
  /// Tests set this for reproducible ids.
  pub id_seed: Option<u64>,
  /// See [`Provision`]
  pub provision: Provision,
  /// See [`Limits`]
  pub limits: Limits,
}

impl Default for Config {
  fn default() -> Self {
    Config { host: HOST.to_string(),
             port: PORT,
             base_path: BASE_PATH.to_string(),
             rx_timeout: Milliseconds(30_000),
             id_seed: None,
             provision: Provision::default(),
             limits: Limits::default() }
  }
}

impl Config {
  /// `coap://<host>:<port>/<base path>`
  ///
  /// ```
  /// use coapworks::config::Config;
  ///
  /// assert_eq!(Config::default().base_url(), "coap://capi.coapworks.com:5683/v1");
  /// ```
  pub fn base_url(&self) -> String {
    format!("coap://{}:{}/{}", self.host, self.port, self.base_path)
  }

  pub(crate) fn rx_timeout(&self) -> core::time::Duration {
    core::time::Duration::from_millis(self.rx_timeout.0)
  }
}
