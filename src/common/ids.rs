use crate::common::defaults::SEQ_KEY_SIZE;
use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A bucket sequence number as handed out by `append`.
///
/// Encoded keys are big-endian so byte-wise key order matches numeric order.
#[derive(
  Default, Debug, Copy, Clone, PartialOrd, PartialEq, Ord, Eq, Hash, Serialize, Deserialize,
)]
pub struct SeqId(pub u64);

impl SeqId {
  /// The 8-byte big-endian key stored in the bucket.
  pub fn to_key(self) -> [u8; SEQ_KEY_SIZE] {
    let mut key = [0u8; SEQ_KEY_SIZE];
    BigEndian::write_u64(&mut key, self.0);
    key
  }

  /// Decodes a key written by `append`. Returns `None` unless `key` is exactly 8 bytes.
  pub fn from_key(key: &[u8]) -> Option<SeqId> {
    if key.len() != SEQ_KEY_SIZE {
      return None;
    }
    Some(SeqId(BigEndian::read_u64(key)))
  }
}

impl Display for SeqId {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<u64> for SeqId {
  #[inline(always)]
  fn from(value: u64) -> Self {
    SeqId(value)
  }
}

impl From<SeqId> for u64 {
  #[inline(always)]
  fn from(value: SeqId) -> Self {
    value.0
  }
}

impl PartialEq<SeqId> for u64 {
  fn eq(&self, other: &SeqId) -> bool {
    *self == other.0
  }
}

#[cfg(test)]
mod test {
  use crate::SeqId;

  #[test]
  fn test_seq_key_big_endian() {
    assert_eq!([0, 0, 0, 0, 0, 0, 1, 2], SeqId(258).to_key());
    assert_eq!(Some(SeqId(258)), SeqId::from_key(&[0, 0, 0, 0, 0, 0, 1, 2]));
  }

  #[test]
  fn test_seq_key_order_matches_numeric_order() {
    let ids = [0u64, 1, 255, 256, 65535, 1 << 32, u64::MAX - 1, u64::MAX];
    for pair in ids.windows(2) {
      let (a, b) = (SeqId(pair[0]), SeqId(pair[1]));
      assert!(a.to_key() < b.to_key(), "{} vs {}", a, b);
    }
  }

  #[test]
  fn test_seq_from_key_wrong_size() {
    assert_eq!(None, SeqId::from_key(b"foo"));
    assert_eq!(None, SeqId::from_key(&[0u8; 9]));
    assert_eq!(None, SeqId::from_key(&[]));
  }
}
