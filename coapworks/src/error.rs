use toad_msg::Id;

use crate::payload::DecodeError;
use crate::req;

/// The context that an error occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
  /// Checking inputs, before anything touched the network
  Validating,
  /// Sending a request or waiting for its response
  Exchanging(Id),
  /// Interpreting the response to a request
  Decoding(Id),
}

impl When {
  /// Construct a specific error from the context the error occurred in
  pub fn what<E>(self, what: What<E>) -> Error<E> {
    Error { when: self, what }
  }
}

/// An input rejected before any request was built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalid {
  /// The identity has a blank machine id
  MachineIdMissing,
  /// The operation needs a channel id and the identity has none
  ChannelIdMissing,
  /// A required text field was empty
  Blank(&'static str),
  /// A text field was longer than allowed
  TooLong {
    /// Which field
    field: &'static str,
    /// Its length, in characters
    len: usize,
    /// The limit, in characters
    max: usize,
  },
  /// A number was outside of the range the service accepts
  OutOfRange {
    /// Which field
    field: &'static str,
    /// The rejected value
    value: String,
  },
}

/// A contextless error with some additional debug data attached.
#[derive(Debug)]
pub enum What<E> {
  /// Caller input failed local validation
  Invalid(Invalid),
  /// The identity carries a shared secret, but this client can
  /// only speak open authentication.
  SecureExchangeUnsupported,
  /// The request could not be built
  Build(req::builder::Error),
  /// The transport failed
  Transport(E),
  /// No response arrived before the receive timeout
  Timeout,
  /// The response body could not be understood
  Decode(DecodeError),
}

/// An error encounterable while talking to the CoAPWorks API
#[derive(Debug)]
pub struct Error<E> {
  /// What happened?
  pub what: What<E>,
  /// What were we doing when it happened?
  pub when: When,
}

impl<E> Error<E> {
  /// Did we give up waiting for a response?
  pub fn is_timeout(&self) -> bool {
    matches!(self.what, What::Timeout)
  }

  /// Was this a local validation failure?
  pub fn invalid(&self) -> Option<&Invalid> {
    match self.what {
      | What::Invalid(ref e) => Some(e),
      | _ => None,
    }
  }

  /// Is this a decode error?
  pub fn decode_error(&self) -> Option<&DecodeError> {
    match self.what {
      | What::Decode(ref e) => Some(e),
      | _ => None,
    }
  }
}

impl<E> From<Invalid> for Error<E> {
  fn from(e: Invalid) -> Self {
    When::Validating.what(What::Invalid(e))
  }
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self.when {
      | When::Validating => write!(f, "while validating: ")?,
      | When::Exchanging(Id(id)) => write!(f, "during exchange {}: ", id)?,
      | When::Decoding(Id(id)) => write!(f, "while decoding response {}: ", id)?,
    }

    match &self.what {
      | What::Invalid(e) => write!(f, "invalid input {:?}", e),
      | What::SecureExchangeUnsupported => {
        f.write_str("secure exchanges are not supported, use open authentication")
      },
      | What::Build(e) => write!(f, "could not build request {:?}", e),
      | What::Transport(e) => write!(f, "transport error {:?}", e),
      | What::Timeout => f.write_str("timed out waiting for a response"),
      | What::Decode(e) => write!(f, "{}", e),
    }
  }
}

impl<E: core::fmt::Debug> std::error::Error for Error<E> {}

/// Helper methods on operation Results
pub trait ClientResultExt<T, E> {
  /// If we timed out waiting for a response, consider that Ok(None).
  ///
  /// Useful when a caller polls the service on a schedule
  /// and a missed reply is not worth failing over.
  fn timeout_ok(self) -> Result<Option<T>, Error<E>>;
}

impl<T, E> ClientResultExt<T, E> for Result<T, Error<E>> {
  fn timeout_ok(self) -> Result<Option<T>, Error<E>> {
    match self {
      | Ok(t) => Ok(Some(t)),
      | Err(Error { what: What::Timeout,
                    .. }) => Ok(None),
      | Err(e) => Err(e),
    }
  }
}
