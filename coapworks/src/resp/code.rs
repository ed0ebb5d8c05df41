pub use toad_msg::Code;

use crate::code;

/// Empty message (0.00), e.g. an ACK without a piggybacked response
pub const EMPTY: Code = Code::new(0, 0);

code!(rfc7252("5.9.1.5") CONTENT = 2*05);

/// Is this a response code (class 2, 4 or 5)?
///
/// ```
/// use coapworks::resp::code;
///
/// assert!(code::is_response(code::CONTENT));
/// assert!(code::is_response(code::Code::new(4, 4)));
/// assert!(!code::is_response(code::EMPTY));
/// ```
pub fn is_response(code: Code) -> bool {
  matches!(code.class, 2 | 4 | 5)
}
