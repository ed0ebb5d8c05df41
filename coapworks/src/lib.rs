//! `coapworks` is a client for the [CoAPWorks](https://coapworks.com) IoT
//! device-management API.
//!
//! ## CoAP
//! CoAP is an application-level network protocol that copies the semantics of HTTP
//! to an environment conducive to **constrained** devices. (weak hardware, small battery capacity, etc.)
//!
//! CoAPWorks serves its device API over CoAP at `coap://capi.coapworks.com:5683/v1`.
//! Every response body is either plain text (`key1=value1;key2=value2`) or a flat
//! JSON object, and always carries an `ec` field (`0` means success).
//!
//! ## Layout
//! - [`req`] & [`resp`]: requests and responses, independent of any network
//! - [`transport`]: the [`Transport`] trait a [`Machine`] exchanges requests over
//! - [`payload`] & [`status`]: decoding response bodies and their `ec` status
//! - [`machine`]: the API operations (provisioning, time, settings, alerts, heartbeats, feeds)
//! - [`std`](crate::std): a plain CoAP-over-UDP [`Transport`]
//!
//! ## Features
//! The crate always links `std`. The default `std` feature only
//! controls whether the [`UdpTransport`](crate::std::UdpTransport) and
//! [`Machine::new_udp`] are built; without it, bring your own [`Transport`].
//!
//! ```no_run
//! use coapworks::{Identity, Machine};
//!
//! let mut machine = Machine::new_udp(Identity::new("m-01").channel("temperature"));
//!
//! if machine.send_heartbeat("").unwrap() {
//!   machine.store_channel_feed(r#"{"celsius":21.5}"#).unwrap();
//! }
//! ```

// -
// style
#![allow(clippy::unused_unit)]
// -
// deny
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(not(test), deny(unsafe_code))]
// -
// warnings
#![warn(missing_copy_implementations)]
#![cfg_attr(not(test), warn(unreachable_pub))]


pub(crate) mod logging;

/// configuring runtime behavior
pub mod config;

/// errors
pub mod error;

/// who a client speaks for
pub mod identity;

/// message ids & tokens
pub mod ids;

/// the CoAPWorks API operations
pub mod machine;

/// option numbers & content formats
pub mod option;

/// decoding response bodies
pub mod payload;

/// requests
pub mod req;

/// responses
pub mod resp;

/// evaluating the `ec` status of a response
pub mod status;

/// time abstractions
pub mod time;

/// the channel requests are exchanged over
pub mod transport;

/// `std`-only coapworks stuff
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
pub mod std;

pub use error::{ClientResultExt, Error, Invalid, What, When};
pub use identity::{ChannelId, Identity, MachineId, Secret};
pub use machine::Machine;
pub use option::ContentFormat;
pub use payload::{DecodeError, Map, Payload};
pub use time::LocalTimeInfo;
pub use transport::Transport;

macro_rules! code {
  (rfc7252($section:literal) $name:ident = $c:literal * $d:literal) => {
    #[doc = concat!("[RFC7252 Section ",
                    $section,
                    "](https://datatracker.ietf.org/doc/html/rfc7252#section-",
                    $section,
                    ")")]
    #[allow(clippy::zero_prefixed_literal)]
    pub const $name: toad_msg::Code = toad_msg::Code::new($c, $d);
  };
}

pub(crate) use code;
