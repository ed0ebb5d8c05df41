use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tinyvec::ArrayVec;
use toad_msg::{Id, Token};

/// Number of random bytes in a generated token
pub const TOKEN_LEN: usize = 4;

/// Source of message ids & tokens for one client.
///
/// Ids start at a random point and increase (wrapping) by one per
/// request, so back-to-back requests never share an id.
///
/// ```
/// use coapworks::ids::Ids;
/// use toad_msg::Id;
///
/// let mut ids = Ids::seeded(7);
/// let Id(a) = ids.next_id();
/// let Id(b) = ids.next_id();
/// assert_eq!(b, a.wrapping_add(1));
/// ```
#[derive(Debug, Clone)]
pub struct Ids {
  rng: ChaCha8Rng,
  next: u16,
}

impl Ids {
  /// Create an id source from a fixed seed
  pub fn seeded(seed: u64) -> Self {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let next = rng.gen::<u16>();
    Self { rng, next }
  }

  /// Create an id source seeded from the system clock
  /// (or `seed` if given)
  pub fn new(seed: Option<u64>) -> Self {
    Self::seeded(seed.unwrap_or_else(clock_seed))
  }

  /// Get a fresh message id
  pub fn next_id(&mut self) -> Id {
    let id = Id(self.next);
    self.next = self.next.wrapping_add(1);
    id
  }

  /// Get a fresh random token
  pub fn next_token(&mut self) -> Token {
    let bytes = self.rng.gen::<[u8; TOKEN_LEN]>();
    Token(bytes.into_iter().collect::<ArrayVec<[u8; 8]>>())
  }
}

fn clock_seed() -> u64 {
  let nanos = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH)
                                          .map(|d| d.as_nanos() as u64)
                                          .unwrap_or_default();
  nanos ^ ((std::process::id() as u64) << 32)
}
