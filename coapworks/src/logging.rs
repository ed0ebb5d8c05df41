use crate::config::Config;
use crate::req::Req;
use crate::resp::Resp;

pub(crate) const TARGET: &str = "coapworks";

pub(crate) fn req_summary(req: &Req, config: &Config) -> String {
  format!("{:?} {} {} (id {}) with {} byte payload",
          req.msg_type(),
          req.method(),
          req.url(config),
          req.msg_id().0,
          req.payload().len())
}

pub(crate) fn resp_summary(resp: &Resp) -> String {
  format!("{:?} {}.{:02} (id {}) with {} byte payload",
          resp.msg_type(),
          resp.code().class,
          resp.code().detail,
          resp.msg_id().0,
          resp.payload_bytes().len())
}
