/// Identifier of a machine (device) registered with CoAPWorks
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MachineId(pub String);

/// Identifier of one of a machine's data channels
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(pub String);

/// Shared secret for authenticated exchanges.
///
/// Debug output never shows the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
  /// Wrap a secret
  pub fn new(secret: impl Into<String>) -> Self {
    Self(secret.into())
  }

  /// Is the secret empty (or all whitespace)?
  pub fn is_blank(&self) -> bool {
    self.0.trim().is_empty()
  }
}

impl core::fmt::Debug for Secret {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str("Secret(..)")
  }
}

macro_rules! id_newtype {
  ($t:ident) => {
    impl $t {
      /// Borrow the identifier
      pub fn as_str(&self) -> &str {
        &self.0
      }

      /// Is the identifier empty (or all whitespace)?
      pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
      }
    }

    impl core::fmt::Display for $t {
      fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
      }
    }

    impl From<&str> for $t {
      fn from(s: &str) -> Self {
        Self(s.to_string())
      }
    }

    impl From<String> for $t {
      fn from(s: String) -> Self {
        Self(s)
      }
    }
  };
}

id_newtype!(MachineId);
id_newtype!(ChannelId);

/// Who a client speaks for.
///
/// Fixed for the lifetime of a [`Machine`](crate::machine::Machine).
///
/// ```
/// use coapworks::identity::{Identity, Secret};
///
/// let open = Identity::new("m-01").channel("temperature");
/// assert!(open.is_open_auth());
///
/// let shared = Identity::new("m-01").secret(Secret::new("s3cr3t"));
/// assert!(!shared.is_open_auth());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  /// The machine
  pub machine: MachineId,
  /// The channel feeds are stored to
  pub channel: Option<ChannelId>,
  /// Shared secret; see [`Identity::is_open_auth`]
  pub secret: Option<Secret>,
}

impl Identity {
  /// An open-auth identity with no channel
  pub fn new(machine: impl Into<MachineId>) -> Self {
    Self { machine: machine.into(),
           channel: None,
           secret: None }
  }

  /// Set the channel
  pub fn channel(mut self, channel: impl Into<ChannelId>) -> Self {
    self.channel = Some(channel.into());
    self
  }

  /// Set the shared secret
  pub fn secret(mut self, secret: Secret) -> Self {
    self.secret = Some(secret);
    self
  }

  /// With no secret (or a blank one) the machine id alone
  /// authenticates requests.
  pub fn is_open_auth(&self) -> bool {
    self.secret.as_ref().map(Secret::is_blank).unwrap_or(true)
  }
}
