use std::collections::BTreeMap;
use std::net::{SocketAddr, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use coapworks::config::Config;
use coapworks::std::{Error as UdpError, UdpTransport};
use coapworks::{Identity, Machine, What};
use embedded_time::duration::Milliseconds;
use toad_msg::alloc::Message;
use toad_msg::{Code, Id, OptNumber, OptValue, Payload, Token, TryFromBytes, TryIntoBytes, Type};

fn init_logger() {
  simple_logger::init_with_level(log::Level::Trace).ok();
}

fn server() -> (UdpSocket, u16) {
  let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
  sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
  let port = sock.local_addr().unwrap().port();
  (sock, port)
}

fn machine(port: u16) -> Machine<UdpTransport> {
  let config = Config { host: "127.0.0.1".into(),
                        port,
                        rx_timeout: Milliseconds(2_000),
                        id_seed: Some(7),
                        ..Config::default() };
  Machine::new_udp_config(config, Identity::new("m-01"))
}

/// Receive a request, keeping the raw datagram alongside the parsed message
fn recv(sock: &UdpSocket) -> (Message, Vec<u8>, SocketAddr) {
  let mut buf = [0u8; 1152];
  let (n, addr) = sock.recv_from(&mut buf).unwrap();
  (Message::try_from_bytes(&buf[..n]).unwrap(), buf[..n].to_vec(), addr)
}

fn send(sock: &UdpSocket, msg: Message, addr: SocketAddr) {
  sock.send_to(&msg.try_into_bytes::<Vec<u8>>().unwrap(), addr)
      .unwrap();
}

fn msg(ty: Type, id: Id, token: Token, code: Code, format: Option<u8>, payload: &str) -> Message {
  let mut opts = BTreeMap::<OptNumber, Vec<OptValue<Vec<u8>>>>::new();
  if let Some(f) = format {
    opts.insert(OptNumber(12), vec![OptValue(vec![f])]);
  }

  Message { id,
            ty,
            ver: Default::default(),
            token,
            code,
            opts,
            payload: Payload(payload.as_bytes().to_vec()) }
}

/// Every value of option `number`, in wire order.
///
/// `Message` keeps one value per repeated option, so this walks
/// the option deltas of the datagram itself.
fn strings(dgram: &[u8], number: u32) -> Vec<String> {
  fn ext(bytes: &[u8], at: &mut usize, nibble: u8) -> usize {
    match nibble {
      | 13 => {
        *at += 1;
        bytes[*at - 1] as usize + 13
      },
      | 14 => {
        *at += 2;
        u16::from_be_bytes([bytes[*at - 2], bytes[*at - 1]]) as usize + 269
      },
      | n => n as usize,
    }
  }

  let mut at = 4 + (dgram[0] & 0x0f) as usize;
  let mut current = 0u32;
  let mut found = vec![];

  while at < dgram.len() && dgram[at] != 0xff {
    let head = dgram[at];
    at += 1;
    current += ext(dgram, &mut at, head >> 4) as u32;
    let len = ext(dgram, &mut at, head & 0x0f);

    if current == number {
      found.push(String::from_utf8(dgram[at..at + len].to_vec()).unwrap());
    }
    at += len;
  }

  found
}

#[test]
fn piggybacked_response() {
  init_logger();
  let (sock, port) = server();

  let srv: JoinHandle<(Message, Vec<u8>)> = thread::spawn(move || {
    let (req, dgram, addr) = recv(&sock);
    send(&sock,
         msg(Type::Ack,
             req.id,
             req.token,
             Code::new(2, 5),
             None,
             "ec=0;utc=05-04-2024-13-45-02"),
         addr);
    (req, dgram)
  });

  let utc = machine(port).utc_time().unwrap();
  assert_eq!(utc.to_rfc3339(), "2024-04-05T13:45:02+00:00");

  let (req, dgram) = srv.join().unwrap();
  assert_eq!(req.ty, Type::Con);
  assert_eq!(req.code, Code::new(0, 1));
  assert_eq!(req.token.0.len(), 4);
  assert_eq!(strings(&dgram, 3), Vec::<String>::new());
  assert_eq!(strings(&dgram, 11), vec!["v1", "time", "utc"]);
  assert_eq!(strings(&dgram, 15), vec!["mid=m-01"]);
}

#[test]
fn separate_response_is_acked() {
  init_logger();
  let (sock, port) = server();

  let srv: JoinHandle<(Message, Message)> = thread::spawn(move || {
    let (req, _, addr) = recv(&sock);
    send(&sock,
         msg(Type::Ack, req.id, Token(Default::default()), Code::new(0, 0), None, ""),
         addr);

    let sep_id = Id(req.id.0.wrapping_add(1000));
    send(&sock,
         msg(Type::Con,
             sep_id,
             req.token,
             Code::new(2, 5),
             Some(50),
             r#"{"ec":0,"interval":60}"#),
         addr);

    let (ack, ..) = recv(&sock);
    (req, ack)
  });

  let settings = machine(port).settings().unwrap().unwrap();
  assert_eq!(settings.get("interval").map(String::as_str), Some("60"));
  assert!(!settings.contains_key("ec"));

  let (req, ack) = srv.join().unwrap();
  assert_eq!(ack.ty, Type::Ack);
  assert_eq!(ack.id, Id(req.id.0.wrapping_add(1000)));
  assert_eq!(ack.code, Code::new(0, 0));
}

#[test]
fn other_tokens_are_ignored() {
  init_logger();
  let (sock, port) = server();

  let srv = thread::spawn(move || {
    let (req, _, addr) = recv(&sock);
    let stranger = Token(tinyvec::array_vec!([u8; 8] => 0xde, 0xad));
    send(&sock,
         msg(Type::Non, Id(1), stranger, Code::new(2, 5), None, "ec=5"),
         addr);
    send(&sock,
         msg(Type::Ack, req.id, req.token, Code::new(2, 5), None, "ec=0"),
         addr);
  });

  assert!(machine(port).send_heartbeat("").unwrap());
  srv.join().unwrap();
}

#[test]
fn reset_is_a_transport_error() {
  init_logger();
  let (sock, port) = server();

  let srv = thread::spawn(move || {
    let (req, _, addr) = recv(&sock);
    send(&sock,
         msg(Type::Reset, req.id, Token(Default::default()), Code::new(0, 0), None, ""),
         addr);
  });

  let err = machine(port).settings().unwrap_err();
  assert!(matches!(err.what, What::Transport(UdpError::Reset(_))));
  srv.join().unwrap();
}

#[test]
fn silence_times_out() {
  init_logger();
  let (sock, port) = server();

  let srv = thread::spawn(move || recv(&sock));

  let config = Config { host: "127.0.0.1".into(),
                        port,
                        rx_timeout: Milliseconds(200),
                        ..Config::default() };
  let mut machine = Machine::new_udp_config(config, Identity::new("m-01"));
  assert!(machine.settings().unwrap_err().is_timeout());
  srv.join().unwrap();
}

#[test]
fn alert_is_not_confirmable() {
  init_logger();
  let (sock, port) = server();

  let srv = thread::spawn(move || {
    let (req, dgram, _) = recv(&sock);
    (req, dgram)
  });

  machine(port).send_email_alert("Door", "Front door opened")
               .unwrap();

  let (req, dgram) = srv.join().unwrap();
  assert_eq!(req.ty, Type::Non);
  assert_eq!(strings(&dgram, 11), vec!["v1", "alerts", "eml"]);
  assert_eq!(req.payload.0, b"s=Door;b=Front door opened".to_vec());
}
