use ::std::io;

/// Split `WouldBlock` out of an io error so socket calls can
/// be polled with [`nb::block!`]
pub(crate) fn io_to_nb(err: io::Error) -> nb::Error<io::Error> {
  match err.kind() {
    | io::ErrorKind::WouldBlock => nb::Error::WouldBlock,
    | _ => nb::Error::Other(err),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn would_block_is_not_an_error() {
    assert!(matches!(io_to_nb(io::ErrorKind::WouldBlock.into()), nb::Error::WouldBlock));
    assert!(matches!(io_to_nb(io::ErrorKind::ConnectionRefused.into()),
                     nb::Error::Other(_)));
  }
}
