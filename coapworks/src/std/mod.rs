use std::collections::BTreeMap;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use toad_msg::to_bytes::MessageToBytesError;
use toad_msg::{Id, OptNumber, OptValue, Payload, Token, TryFromBytes, TryIntoBytes, Type};

use crate::config::Config;
use crate::identity::Identity;
use crate::ids::Ids;
use crate::logging::TARGET;
use crate::machine::Machine;
use crate::option::{CONTENT_FORMAT, URI_HOST, URI_PATH, URI_QUERY};
use crate::req::Req;
use crate::resp::{code, Resp};
use crate::transport::Transport;
use crate::ContentFormat;

/// Networking helpers
pub(crate) mod net;

use net::io_to_nb;

type Message = toad_msg::alloc::Message;

/// Largest datagram we expect (RFC 7252 §4.6)
const MAX_DGRAM: usize = 1152;

/// How long to sleep between polls of a socket with nothing to read
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Errors encounterable by [`UdpTransport`]
#[derive(Debug)]
pub enum Error {
  /// The socket failed
  Io(io::Error),
  /// `send` or `recv` before `open`
  NotOpen,
  /// The host name did not resolve to any address
  Unresolved(String),
  /// The request could not be serialized
  ToBytes(MessageToBytesError),
  /// The server reset the exchange with this id
  Reset(Id),
}

/// [`Transport`] speaking plain CoAP over a [`UdpSocket`].
///
/// Each [`Transport::open`] binds a new ephemeral socket; requests
/// are serialized with `toad-msg` and carry a random token that the
/// response must echo. Handles piggybacked responses as well as an
/// empty ACK followed by a separate response (which is ACKed if
/// confirmable). There are no retransmissions.
#[derive(Debug)]
pub struct UdpTransport {
  ids: Ids,
  chan: Option<Channel>,
}

#[derive(Debug)]
struct Channel {
  sock: UdpSocket,
  peer: SocketAddr,
  host: String,
  pending: Option<(Id, Token)>,
}

/// What to do with a datagram from the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Incoming {
  /// Server rejected our request
  Reset,
  /// Request received; a separate response will follow
  Acked,
  /// Not for us
  Ignore,
  /// The response; `true` if it must be ACKed
  Response(bool),
}

impl Default for UdpTransport {
  fn default() -> Self {
    Self::new(None)
  }
}

impl UdpTransport {
  /// Create a transport, seeding tokens from `seed` (or the system clock)
  pub fn new(seed: Option<u64>) -> Self {
    Self { ids: Ids::new(seed),
           chan: None }
  }

  /// Local address of the open channel's socket
  pub fn local_addr(&self) -> Option<SocketAddr> {
    self.chan.as_ref().and_then(|c| c.sock.local_addr().ok())
  }
}

impl Transport for UdpTransport {
  type Error = Error;

  fn open(&mut self, host: &str, port: u16) -> Result<(), Self::Error> {
    let peer = (host, port).to_socket_addrs()
                           .map_err(Error::Io)?
                           .next()
                           .ok_or_else(|| Error::Unresolved(host.to_string()))?;

    let local = match peer {
      | SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
      | SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
    };

    let sock = UdpSocket::bind(local).map_err(Error::Io)?;
    sock.set_nonblocking(true).map_err(Error::Io)?;
    log::trace!(target: TARGET, "opened channel to {} ({})", host, peer);

    self.chan = Some(Channel { sock,
                               peer,
                               host: host.to_string(),
                               pending: None });
    Ok(())
  }

  fn shutdown(&mut self) {
    if let Some(chan) = self.chan.take() {
      log::trace!(target: TARGET, "closing channel to {}", chan.peer);
    }
  }

  fn send(&mut self, req: &Req) -> Result<(), Self::Error> {
    let chan = self.chan.as_mut().ok_or(Error::NotOpen)?;
    let token = self.ids.next_token();

    let bytes = message(req, &chan.host, token).try_into_bytes::<Vec<u8>>()
                                               .map_err(Error::ToBytes)?;
    nb::block!(chan.sock
                   .send_to(&bytes, chan.peer)
                   .map_err(io_to_nb)).map_err(Error::Io)?;
    log::trace!(target: TARGET, "sent {}b -> {}", bytes.len(), chan.peer);

    chan.pending = Some((req.msg_id(), token));
    Ok(())
  }

  fn recv(&mut self, timeout: Duration) -> Result<Option<Resp>, Self::Error> {
    let chan = self.chan.as_mut().ok_or(Error::NotOpen)?;
    let (id, token) = chan.pending.ok_or(Error::NotOpen)?;
    let deadline = Instant::now().checked_add(timeout);
    let mut buf = [0u8; MAX_DGRAM];

    loop {
      if deadline.map(|d| Instant::now() >= d).unwrap_or(false) {
        return Ok(None);
      }

      let (n, addr) = match chan.sock.recv_from(&mut buf).map_err(io_to_nb) {
        | Ok(dgram) => dgram,
        | Err(nb::Error::WouldBlock) => {
          std::thread::sleep(POLL_INTERVAL);
          continue;
        },
        | Err(nb::Error::Other(e)) => return Err(Error::Io(e)),
      };

      if addr != chan.peer {
        log::warn!(target: TARGET, "ignoring {}b from unexpected peer {}", n, addr);
        continue;
      }

      let msg = match Message::try_from_bytes(&buf[..n]) {
        | Ok(msg) => msg,
        | Err(e) => {
          log::warn!(target: TARGET, "ignoring unparseable datagram: {:?}", e);
          continue;
        },
      };

      match classify(&msg, id, token) {
        | Incoming::Reset => {
          chan.pending = None;
          return Err(Error::Reset(id));
        },
        | Incoming::Acked => {
          log::debug!(target: TARGET, "{} acked, waiting for separate response", id.0);
        },
        | Incoming::Ignore => {
          log::trace!(target: TARGET, "ignoring {:?} {:?} (id {})", msg.ty, msg.code, msg.id.0);
        },
        | Incoming::Response(needs_ack) => {
          if needs_ack {
            chan.ack(msg.id)?;
          }
          chan.pending = None;
          return Ok(Some(resp(msg)));
        },
      }
    }
  }
}

impl Channel {
  fn ack(&self, id: Id) -> Result<(), Error> {
    let ack = Message { id,
                        ty: Type::Ack,
                        ver: Default::default(),
                        token: Token(Default::default()),
                        code: code::EMPTY,
                        opts: BTreeMap::new(),
                        payload: Payload(Vec::new()) };
    let bytes = ack.try_into_bytes::<Vec<u8>>().map_err(Error::ToBytes)?;
    nb::block!(self.sock.send_to(&bytes, self.peer).map_err(io_to_nb)).map(|_| ())
                                                                     .map_err(Error::Io)
  }
}

fn classify(msg: &Message, id: Id, token: Token) -> Incoming {
  match msg.ty {
    | Type::Reset if msg.id == id => Incoming::Reset,
    | Type::Ack if msg.id == id && msg.code == code::EMPTY => Incoming::Acked,
    | _ if msg.token != token || !code::is_response(msg.code) => Incoming::Ignore,
    | Type::Con => Incoming::Response(true),
    | _ => Incoming::Response(false),
  }
}

fn message(req: &Req, host: &str, token: Token) -> Message {
  let value = |s: &str| OptValue(s.as_bytes().to_vec());
  let mut opts = BTreeMap::<OptNumber, Vec<OptValue<Vec<u8>>>>::new();

  if host.parse::<IpAddr>().is_err() {
    opts.insert(OptNumber(URI_HOST), vec![value(host)]);
  }

  if !req.path().is_empty() {
    opts.insert(OptNumber(URI_PATH),
                req.path().iter().map(|s| value(s)).collect());
  }

  if !req.query().is_empty() {
    opts.insert(OptNumber(URI_QUERY),
                req.query_options().map(|q| value(&q)).collect());
  }

  if let Some(format) = req.content_format() {
    opts.insert(OptNumber(CONTENT_FORMAT), vec![OptValue(format.bytes())]);
  }

  Message { id: req.msg_id(),
            ty: req.msg_type(),
            ver: Default::default(),
            token,
            code: req.method().code(),
            opts,
            payload: Payload(req.payload().to_vec()) }
}

fn resp(msg: Message) -> Resp {
  let format = msg.opts
                  .get(&OptNumber(CONTENT_FORMAT))
                  .and_then(|vals| vals.first())
                  .map(|val| ContentFormat::from_bytes(&val.0));

  let resp = Resp::new(msg.ty, msg.code, msg.id).payload(msg.payload.0);
  match format {
    | Some(f) => resp.content_format(f),
    | None => resp,
  }
}

impl Machine<UdpTransport> {
  /// Create a client talking to CoAPWorks over UDP
  pub fn new_udp(identity: Identity) -> Self {
    Self::new_udp_config(Config::default(), identity)
  }

  /// Create a client talking to CoAPWorks over UDP with a specific config
  pub fn new_udp_config(config: Config, identity: Identity) -> Self {
    let transport = UdpTransport::new(config.id_seed);
    Machine::new_config(config, identity, transport)
  }
}

#[cfg(test)]
mod tests {
  use tinyvec::array_vec;

  use super::*;
  use crate::req::ReqBuilder;

  fn token() -> Token {
    Token(array_vec!([u8; 8] => 1, 2, 3, 4))
  }

  fn reply(ty: Type, id: u16, token: Token, code: toad_msg::Code) -> Message {
    Message { id: Id(id),
              ty,
              ver: Default::default(),
              token,
              code,
              opts: BTreeMap::new(),
              payload: Payload(Vec::new()) }
  }

  #[test]
  fn options() {
    let req = ReqBuilder::post("v1/machine/hbt").id(Id(3))
                                                .query("mid", "m-01")
                                                .content_format(ContentFormat::Json)
                                                .payload("{}")
                                                .build()
                                                .unwrap();
    let msg = message(&req, "capi.coapworks.com", token());

    assert_eq!(msg.id, Id(3));
    assert_eq!(msg.ty, Type::Con);
    assert_eq!(msg.code, toad_msg::Code::new(0, 2));
    assert_eq!(msg.payload.0, b"{}".to_vec());

    let opt = |n: u32| {
      msg.opts
         .get(&OptNumber(n))
         .map(|vs| vs.iter().map(|v| v.0.clone()).collect::<Vec<_>>())
    };
    assert_eq!(opt(URI_HOST), Some(vec![b"capi.coapworks.com".to_vec()]));
    assert_eq!(opt(URI_PATH),
               Some(vec![b"v1".to_vec(), b"machine".to_vec(), b"hbt".to_vec()]));
    assert_eq!(opt(URI_QUERY), Some(vec![b"mid=m-01".to_vec()]));
    assert_eq!(opt(CONTENT_FORMAT), Some(vec![vec![50]]));
  }

  #[test]
  fn no_uri_host_for_ip() {
    let req = ReqBuilder::get("v1/time/utc").build().unwrap();
    let msg = message(&req, "127.0.0.1", token());
    assert!(msg.opts.get(&OptNumber(URI_HOST)).is_none());
    assert!(msg.opts.get(&OptNumber(CONTENT_FORMAT)).is_none());
  }

  #[test]
  fn classify_replies() {
    let other = Token(array_vec!([u8; 8] => 9, 9, 9, 9));

    assert_eq!(classify(&reply(Type::Reset, 7, Token(Default::default()), code::EMPTY),
                        Id(7),
                        token()),
               Incoming::Reset);
    assert_eq!(classify(&reply(Type::Ack, 7, Token(Default::default()), code::EMPTY),
                        Id(7),
                        token()),
               Incoming::Acked);
    assert_eq!(classify(&reply(Type::Ack, 7, token(), code::CONTENT), Id(7), token()),
               Incoming::Response(false));
    assert_eq!(classify(&reply(Type::Con, 100, token(), code::CONTENT), Id(7), token()),
               Incoming::Response(true));
    assert_eq!(classify(&reply(Type::Non, 100, other, code::CONTENT), Id(7), token()),
               Incoming::Ignore);
    assert_eq!(classify(&reply(Type::Reset, 8, Token(Default::default()), code::EMPTY),
                        Id(7),
                        token()),
               Incoming::Ignore);
  }

  #[test]
  fn error_codes_are_responses() {
    for c in [toad_msg::Code::new(4, 4), toad_msg::Code::new(5, 0)] {
      assert_eq!(classify(&reply(Type::Ack, 7, token(), c), Id(7), token()),
                 Incoming::Response(false));
    }
    assert_eq!(classify(&reply(Type::Ack, 7, token(), toad_msg::Code::new(0, 1)),
                        Id(7),
                        token()),
               Incoming::Ignore);
  }

  #[test]
  fn resp_reads_content_format() {
    let mut msg = reply(Type::Ack, 1, token(), code::CONTENT);
    msg.opts
       .insert(OptNumber(CONTENT_FORMAT), vec![OptValue(vec![50])]);
    msg.payload = Payload(br#"{"ec":0}"#.to_vec());

    let resp = resp(msg);
    assert_eq!(resp.content_format_option(), Some(ContentFormat::Json));
    assert_eq!(resp.payload_str().unwrap(), r#"{"ec":0}"#);
  }

  #[test]
  fn resp_with_wide_content_format_is_not_json() {
    let mut msg = reply(Type::Ack, 1, token(), code::CONTENT);
    msg.opts
       .insert(OptNumber(CONTENT_FORMAT), vec![OptValue(vec![1, 0, 50])]);
    msg.payload = Payload(br#"{"ec":0}"#.to_vec());

    let resp = resp(msg);
    assert_eq!(resp.content_format_option(),
               Some(ContentFormat::Other(65586)));
    assert!(matches!(crate::Payload::decode(&resp),
                     Err(crate::DecodeError::UnsupportedContentFormat(65586))));
  }

  #[test]
  fn recv_without_deadline() {
    crate::test::init_logger();
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    server.set_read_timeout(Some(Duration::from_secs(5)))
          .unwrap();
    let port = server.local_addr().unwrap().port();

    let mut t = UdpTransport::new(Some(1));
    t.open("127.0.0.1", port).unwrap();
    let req = ReqBuilder::get("v1/time/utc").id(Id(9)).build().unwrap();
    t.send(&req).unwrap();

    let mut buf = [0u8; MAX_DGRAM];
    let (n, addr) = server.recv_from(&mut buf).unwrap();
    let sent = Message::try_from_bytes(&buf[..n]).unwrap();
    let ack = reply(Type::Ack, 9, sent.token, code::CONTENT);
    server.send_to(&ack.try_into_bytes::<Vec<u8>>().unwrap(), addr)
          .unwrap();

    let resp = t.recv(Duration::MAX).unwrap().unwrap();
    assert_eq!(resp.code(), code::CONTENT);
  }

  #[test]
  fn send_before_open() {
    let mut t = UdpTransport::new(Some(1));
    let req = ReqBuilder::get("v1/time/utc").build().unwrap();
    assert!(matches!(t.send(&req), Err(Error::NotOpen)));
    assert!(matches!(t.recv(Duration::from_millis(1)), Err(Error::NotOpen)));
  }
}
