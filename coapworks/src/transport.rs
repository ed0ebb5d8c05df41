use core::time::Duration;

use crate::req::Req;
use crate::resp::Resp;

/// A channel requests can be sent over.
///
/// Framing, retransmission and (if any) DTLS are the implementor's
/// business; the client only needs to send one request and wait
/// for the response correlated with it.
///
/// [`UdpTransport`](crate::std::UdpTransport) implements this
/// for plain CoAP over UDP.
pub trait Transport {
  /// The error yielded by transport operations
  type Error: core::fmt::Debug;

  /// Start a new channel to `host:port`.
  ///
  /// Clients call [`Transport::shutdown`] first, so any
  /// channel from a previous exchange is already gone.
  fn open(&mut self, host: &str, port: u16) -> Result<(), Self::Error>;

  /// Tear down the current channel, if there is one
  fn shutdown(&mut self);

  /// Send a request over the open channel
  fn send(&mut self, req: &Req) -> Result<(), Self::Error>;

  /// Wait for the response to the last request sent.
  ///
  /// `Ok(None)` means nothing arrived within `timeout`.
  fn recv(&mut self, timeout: Duration) -> Result<Option<Resp>, Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
  type Error = T::Error;

  fn open(&mut self, host: &str, port: u16) -> Result<(), Self::Error> {
    (**self).open(host, port)
  }

  fn shutdown(&mut self) {
    (**self).shutdown()
  }

  fn send(&mut self, req: &Req) -> Result<(), Self::Error> {
    (**self).send(req)
  }

  fn recv(&mut self, timeout: Duration) -> Result<Option<Resp>, Self::Error> {
    (**self).recv(timeout)
  }
}
