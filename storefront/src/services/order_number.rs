// storefront/src/services/order_number.rs

//! Human-facing order numbers: `ORD-<unix-ms>-<9 base36 chars>`.

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};

pub const PREFIX: &str = "ORD";
pub const SUFFIX_LEN: usize = 9;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub fn generate(now: DateTime<Utc>) -> String {
  generate_with(now, &mut OsRng)
}

pub fn generate_with(now: DateTime<Utc>, rng: &mut impl RngCore) -> String {
  let suffix: String = (0..SUFFIX_LEN)
    .map(|_| ALPHABET[(rng.next_u32() % 36) as usize] as char)
    .collect();
  format!("{}-{}-{}", PREFIX, now.timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;
  use std::collections::HashSet;

  struct Counter(u32);

  impl RngCore for Counter {
    fn next_u32(&mut self) -> u32 {
      self.0 += 1;
      self.0 - 1
    }
    fn next_u64(&mut self) -> u64 {
      u64::from(self.next_u32())
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
      rand_core::impls::fill_bytes_via_next(self, dest)
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
      self.fill_bytes(dest);
      Ok(())
    }
  }

  #[test]
  fn format_is_prefix_millis_and_base36_suffix() {
    let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    let n = generate_with(now, &mut Counter(8));
    assert_eq!(n, "ORD-1700000000123-89abcdefg");
  }

  #[test]
  fn random_suffixes_differ() {
    let now = Utc::now();
    let numbers: HashSet<String> = (0..200).map(|_| generate(now)).collect();
    assert_eq!(numbers.len(), 200);
    for n in &numbers {
      let suffix = n.rsplit('-').next().unwrap();
      assert_eq!(suffix.len(), SUFFIX_LEN);
      assert!(suffix.bytes().all(|b| ALPHABET.contains(&b)));
    }
  }
}
