use chrono::{DateTime, TimeZone, Utc};
use toad_msg::Id;

use crate::config::Config;
use crate::error::{Error, Invalid, What, When};
use crate::identity::{Identity, MachineId};
use crate::ids::Ids;
use crate::logging::{req_summary, resp_summary, TARGET};
use crate::payload::{DecodeError, Map, Payload};
use crate::req::{Req, ReqBuilder};
use crate::resp::Resp;
use crate::status::{Status, ERROR_CODE_KEY};
use crate::time::{self, LocalTimeInfo};
use crate::transport::Transport;
use crate::ContentFormat;

/// A CoAPWorks machine (device), talking to the API
/// over some [`Transport`].
///
/// Every operation is a single exchange (two for [`Machine::provision`]):
/// validate inputs, build the request, send it, wait for the response,
/// decode it and check its `ec` status.
///
/// A failure reported by the service is a normal outcome and
/// comes back as an absence value (`None`, `false`, the epoch).
/// `Err` is reserved for bad inputs, transport failures, timeouts
/// and responses that could not be understood.
///
/// ```no_run
/// use coapworks::identity::Identity;
/// use coapworks::machine::Machine;
///
/// let mut machine = Machine::new_udp(Identity::new("m-01"));
/// let now = machine.utc_time().unwrap();
/// println!("it is {} at CoAPWorks", now);
/// ```
#[derive(Debug)]
pub struct Machine<T: Transport> {
  identity: Identity,
  config: Config,
  transport: T,
  ids: Ids,
}

impl<T: Transport> Machine<T> {
  /// Create a client with the default [`Config`]
  pub fn new(identity: Identity, transport: T) -> Self {
    Self::new_config(Config::default(), identity, transport)
  }

  /// Create a client with a specific config
  pub fn new_config(config: Config, identity: Identity, transport: T) -> Self {
    let ids = Ids::new(config.id_seed);
    Self { identity,
           config,
           transport,
           ids }
  }

  /// Who this client speaks for
  pub fn identity(&self) -> &Identity {
    &self.identity
  }

  /// The config this client was created with
  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Consume this client, yielding one that speaks for
  /// a different machine (keeping the channel & secret).
  ///
  /// Typically used with the id [`Machine::provision`] returns.
  pub fn reidentify(self, machine: MachineId) -> Self {
    let identity = Identity { machine,
                              ..self.identity };
    Self { identity, ..self }
  }

  /// Give back the transport
  pub fn into_transport(self) -> T {
    self.transport
  }

  /// Provision this machine using a provisioning token.
  ///
  /// Initiates provisioning (`machine/pme`), then confirms it
  /// (`machine/pcm`) for the machine id the service allocated.
  /// Yields the new id, or `None` if either step failed.
  ///
  /// Whether the confirm request reuses the initiate request's
  /// message id is controlled by [`Provision`](crate::config::Provision).
  pub fn provision(&mut self, token: &str) -> Result<Option<MachineId>, Error<T::Error>> {
    let mid = self.mid()?;
    if token.trim().is_empty() {
      return Err(Invalid::Blank("token").into());
    }

    let id = self.ids.next_id();
    let initiate = Self::build(ReqBuilder::post(self.path("machine/pme")).id(id)
                                                                         .query("mid", &mid)
                                                                         .content_format(ContentFormat::Text)
                                                                         .payload(format!("pt={}", token.trim())))?;

    let new_mid = match self.call(&initiate)? {
      | Some(payload) => {
        let new_mid = payload.require("mid")
                             .map_err(Self::decode_error(id))?
                             .trim()
                             .to_string();
        if new_mid.is_empty() {
          return Err(Self::decode_error(id)(DecodeError::InvalidField { key: "mid",
                                                                        value: new_mid }));
        }
        new_mid
      },
      | None => return Ok(None),
    };

    let id = if self.config.provision.reuse_message_id {
      id
    } else {
      self.ids.next_id()
    };
    let confirm = Self::build(ReqBuilder::post(self.path("machine/pcm")).id(id)
                                                                        .query("mid", &new_mid))?;

    match self.call(&confirm)? {
      | Some(_) => {
        log::info!(target: TARGET, "machine {} provisioned as {}", mid, new_mid);
        Ok(Some(MachineId(new_mid)))
      },
      | None => Ok(None),
    }
  }

  /// Get the current UTC time from the service.
  ///
  /// Yields [`time::epoch`] if the service reports a failure.
  pub fn utc_time(&mut self) -> Result<DateTime<Utc>, Error<T::Error>> {
    let mid = self.mid()?;
    let req = Self::build(ReqBuilder::get(self.path("time/utc")).id(self.ids.next_id())
                                                                .query("mid", mid))?;

    match self.call(&req)? {
      | Some(payload) => {
        let utc = time::date_time_field(&payload, "utc").map_err(Self::decode_error(req.msg_id()))?;
        Ok(Utc.from_utc_datetime(&utc))
      },
      | None => Ok(time::epoch()),
    }
  }

  /// Get the local time at the location configured for this
  /// machine in the CoAPWorks console.
  pub fn preconfigured_location_time(&mut self)
                                     -> Result<Option<LocalTimeInfo>, Error<T::Error>> {
    let mid = self.mid()?;
    let req = Self::build(ReqBuilder::get(self.path("time/pcl")).id(self.ids.next_id())
                                                                .query("mid", mid))?;
    self.local_time(&req)
  }

  /// Get the local time at a longitude & latitude (in degrees)
  pub fn location_time(&mut self,
                       longitude: f64,
                       latitude: f64)
                       -> Result<Option<LocalTimeInfo>, Error<T::Error>> {
    let mid = self.mid()?;
    Self::check_range("latitude", latitude, 90.0)?;
    Self::check_range("longitude", longitude, 180.0)?;

    let req = Self::build(ReqBuilder::get(self.path("time/loc")).id(self.ids.next_id())
                                                                .query("mid", mid)
                                                                .query("lat", latitude)
                                                                .query("lng", longitude))?;
    self.local_time(&req)
  }

  /// Get this machine's settings, without the `ec` field
  pub fn settings(&mut self) -> Result<Option<Map>, Error<T::Error>> {
    let mid = self.mid()?;
    let req = Self::build(ReqBuilder::get(self.path("machine/set")).id(self.ids.next_id())
                                                                   .query("mid", mid))?;

    Ok(self.call(&req)?.map(|payload| {
                         let mut map = payload.into_map();
                         map.remove(ERROR_CODE_KEY);
                         map
                       }))
  }

  /// Ask the service to send an email alert.
  ///
  /// Fire-and-forget: the request is non-confirmable and this
  /// does not wait for (or evaluate) a response.
  pub fn send_email_alert(&mut self, subject: &str, body: &str) -> Result<(), Error<T::Error>> {
    let mid = self.mid()?;
    Self::check_text("subject", subject, self.config.limits.alert_subject)?;
    Self::check_text("body", body, self.config.limits.alert_body)?;

    let req = Self::build(ReqBuilder::post(self.path("alerts/eml")).non()
                                                                   .id(self.ids.next_id())
                                                                   .query("mid", mid)
                                                                   .content_format(ContentFormat::Text)
                                                                   .payload(format!("s={};b={}", subject, body)))?;
    self.fling(&req)
  }

  /// Send a heartbeat, optionally carrying some data
  /// (text or a JSON object).
  ///
  /// Yields whether the service accepted it.
  pub fn send_heartbeat(&mut self, data: &str) -> Result<bool, Error<T::Error>> {
    let mid = self.mid()?;
    let builder = ReqBuilder::post(self.path("machine/hbt")).id(self.ids.next_id())
                                                            .query("mid", mid);
    let req = Self::build(self.with_data(builder, "heartbeat data", data)?)?;

    self.call(&req).map(|payload| payload.is_some())
  }

  /// Store a feed (text or a JSON object) to this machine's channel.
  ///
  /// Yields the whole decoded response on success.
  pub fn store_channel_feed(&mut self, feed: &str) -> Result<Option<Map>, Error<T::Error>> {
    let mid = self.mid()?;
    let cid = match self.identity.channel {
      | Some(ref c) if !c.is_blank() => c.to_string(),
      | _ => return Err(Invalid::ChannelIdMissing.into()),
    };

    let builder = ReqBuilder::post(self.path("machine/scf")).id(self.ids.next_id())
                                                            .query("mid", mid)
                                                            .query("cid", cid);
    let req = Self::build(self.with_data(builder, "feed", feed)?)?;

    Ok(self.call(&req)?.map(Payload::into_map))
  }

  fn mid(&self) -> Result<String, Error<T::Error>> {
    if !self.identity.is_open_auth() {
      return Err(When::Validating.what(What::SecureExchangeUnsupported));
    }

    if self.identity.machine.is_blank() {
      return Err(Invalid::MachineIdMissing.into());
    }

    Ok(self.identity.machine.as_str().trim().to_string())
  }

  fn path(&self, op: &str) -> String {
    format!("{}/{}", self.config.base_path, op)
  }

  /// Attach heartbeat / feed data, if there is any
  fn with_data(&self,
               builder: ReqBuilder,
               field: &'static str,
               data: &str)
               -> Result<ReqBuilder, Error<T::Error>> {
    let data = data.trim();
    if data.is_empty() {
      return Ok(builder);
    }

    let len = data.chars().count();
    let max = self.config.limits.payload;
    if len > max {
      return Err(Invalid::TooLong { field, len, max }.into());
    }

    Ok(builder.content_format(ContentFormat::sniff(data))
              .payload(data))
  }

  fn local_time(&mut self, req: &Req) -> Result<Option<LocalTimeInfo>, Error<T::Error>> {
    match self.call(req)? {
      | Some(payload) => LocalTimeInfo::from_payload(&payload).map(Some)
                                                              .map_err(Self::decode_error(req.msg_id())),
      | None => Ok(None),
    }
  }

  /// Exchange a request, then decode and evaluate the response
  fn call(&mut self, req: &Req) -> Result<Option<Payload>, Error<T::Error>> {
    let resp = self.exchange(req)?;
    Self::evaluate(&resp)
  }

  /// Start a new channel and send a request over it
  fn fling(&mut self, req: &Req) -> Result<(), Error<T::Error>> {
    let when = When::Exchanging(req.msg_id());
    log::debug!(target: TARGET, "sending {}", req_summary(req, &self.config));

    self.transport.shutdown();
    self.transport
        .open(&self.config.host, self.config.port)
        .and_then(|_| self.transport.send(req))
        .map_err(|e| when.what(What::Transport(e)))
  }

  fn exchange(&mut self, req: &Req) -> Result<Resp, Error<T::Error>> {
    let when = When::Exchanging(req.msg_id());
    self.fling(req)?;

    match self.transport.recv(self.config.rx_timeout()) {
      | Ok(Some(resp)) => {
        log::debug!(target: TARGET, "received {}", resp_summary(&resp));
        Ok(resp)
      },
      | Ok(None) => {
        log::warn!(target: TARGET,
                   "no response to {} after {}ms",
                   req_summary(req, &self.config),
                   self.config.rx_timeout.0);
        Err(when.what(What::Timeout))
      },
      | Err(e) => Err(when.what(What::Transport(e))),
    }
  }

  /// Decode a response and check its status.
  ///
  /// `Ok(None)` when the service reported a failure.
  fn evaluate(resp: &Resp) -> Result<Option<Payload>, Error<T::Error>> {
    let payload = Payload::decode(resp).map_err(Self::decode_error(resp.msg_id()))?;

    match Status::of(payload.map()) {
      | Status::Success => Ok(Some(payload)),
      | Status::Failure(why) => {
        log::warn!(target: TARGET, "request {} failed: {:?}", resp.msg_id().0, why);
        Ok(None)
      },
    }
  }

  fn build(builder: ReqBuilder) -> Result<Req, Error<T::Error>> {
    builder.build()
           .map_err(|e| When::Validating.what(What::Build(e)))
  }

  fn decode_error(id: Id) -> impl Fn(DecodeError) -> Error<T::Error> {
    move |e| When::Decoding(id).what(What::Decode(e))
  }

  fn check_text(field: &'static str, value: &str, max: usize) -> Result<(), Error<T::Error>> {
    if value.trim().is_empty() {
      return Err(Invalid::Blank(field).into());
    }

    let len = value.chars().count();
    if len > max {
      return Err(Invalid::TooLong { field, len, max }.into());
    }

    Ok(())
  }

  fn check_range(field: &'static str, degrees: f64, max: f64) -> Result<(), Error<T::Error>> {
    if degrees.is_finite() && (-max..=max).contains(&degrees) {
      Ok(())
    } else {
      Err(Invalid::OutOfRange { field,
                                value: degrees.to_string() }.into())
    }
  }
}
