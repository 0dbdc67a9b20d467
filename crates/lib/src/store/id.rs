//! Entity identities and their generator.
//!
//! An identity is a 24-character uppercase hexadecimal token, the format
//! Xcode uses for object keys. Generated identities are three 32-bit words:
//! a counter seeded from wall-clock seconds, followed by a per-process,
//! per-machine salt. The counter advances on every allocation, so identities
//! from one generator never repeat.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::consts::DETERMINISTIC_IDS_ENV;
use crate::{ProjectError, Result};

/// Opaque identity of an entity in an [`ObjectStore`](super::ObjectStore).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
  /// Length of every identity.
  pub const LEN: usize = 24;

  /// Validate an identity received from outside the store.
  pub fn parse(candidate: &str) -> Result<Self> {
    if Self::is_valid(candidate) {
      Ok(ObjectId(candidate.to_string()))
    } else {
      Err(ProjectError::InvalidArgument(format!(
        "'{}' is not a {}-digit hexadecimal identity",
        candidate,
        Self::LEN
      )))
    }
  }

  /// Exact-length, hex-digit predicate.
  pub fn is_valid(candidate: &str) -> bool {
    candidate.len() == Self::LEN && candidate.bytes().all(|b| b.is_ascii_hexdigit())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ObjectId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl AsRef<str> for ObjectId {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

impl FromStr for ObjectId {
  type Err = ProjectError;

  fn from_str(s: &str) -> Result<Self> {
    ObjectId::parse(s)
  }
}

impl TryFrom<String> for ObjectId {
  type Error = ProjectError;

  fn try_from(s: String) -> Result<Self> {
    ObjectId::parse(&s)
  }
}

impl From<ObjectId> for String {
  fn from(id: ObjectId) -> Self {
    id.0
  }
}

/// Allocates fresh identities.
#[derive(Debug, Clone)]
pub struct IdGenerator {
  words: [u32; 3],
}

impl IdGenerator {
  /// Counter seed used by [`IdGenerator::deterministic`].
  pub const DETERMINISTIC_SEED: u32 = 1_285_116_226;

  /// Seed from the wall clock and a per-process, per-machine salt.
  pub fn new() -> Self {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    let pid = std::process::id();
    let salt = machine_salt(pid, now.subsec_nanos());

    // Layout: [seconds] [pid:16 | salt-high:16] [salt-low:32]
    let words = [
      now.as_secs() as u32,
      (pid << 16) | (salt >> 32) as u32,
      (salt & 0xFFFF_FFFF) as u32,
    ];
    debug!(seed = words[0], "seeded identity generator");
    Self { words }
  }

  /// Reproducible sequence for fixtures and golden files.
  pub fn deterministic() -> Self {
    Self {
      words: [Self::DETERMINISTIC_SEED, 0, 0],
    }
  }

  /// [`IdGenerator::deterministic`] when `PBXGEN_DETERMINISTIC_IDS` is truthy,
  /// otherwise [`IdGenerator::new`].
  pub fn from_env() -> Self {
    let deterministic = std::env::var(DETERMINISTIC_IDS_ENV)
      .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
      .unwrap_or(false);
    if deterministic { Self::deterministic() } else { Self::new() }
  }

  /// Advance the counter and return the next identity.
  pub fn next_id(&mut self) -> ObjectId {
    self.words[0] = self.words[0].wrapping_add(1);
    ObjectId(format!(
      "{:08X}{:08X}{:08X}",
      self.words[0], self.words[1], self.words[2]
    ))
  }
}

impl Default for IdGenerator {
  fn default() -> Self {
    Self::new()
  }
}

/// 48-bit salt derived from the host name, process id and clock jitter.
fn machine_salt(pid: u32, nanos: u32) -> u64 {
  let host = std::env::var("HOSTNAME")
    .or_else(|_| std::env::var("COMPUTERNAME"))
    .or_else(|_| std::fs::read_to_string("/etc/hostname"))
    .unwrap_or_default();

  let mut hasher = Sha256::new();
  hasher.update(host.trim().as_bytes());
  hasher.update(pid.to_be_bytes());
  hasher.update(nanos.to_be_bytes());
  let digest = hasher.finalize();

  digest.iter().take(6).fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;
  use serial_test::serial;

  #[test]
  fn deterministic_sequence_is_reproducible() {
    let mut a = IdGenerator::deterministic();
    let mut b = IdGenerator::deterministic();
    assert_eq!(a.next_id(), b.next_id());
    assert_eq!(a.next_id(), b.next_id());
  }

  #[test]
  fn deterministic_sequence_counts_from_seed() {
    let mut ids = IdGenerator::deterministic();
    assert_eq!(ids.next_id().as_str(), "4C9951430000000000000000");
    assert_eq!(ids.next_id().as_str(), "4C9951440000000000000000");
  }

  #[test]
  fn generated_identities_are_distinct() {
    let mut ids = IdGenerator::new();
    let first = ids.next_id();
    let second = ids.next_id();
    assert_ne!(first, second);
  }

  #[test]
  fn parse_rejects_wrong_length() {
    assert!(ObjectId::parse("ABC").is_err());
    assert!(ObjectId::parse("0123456789ABCDEF012345678").is_err());
  }

  #[test]
  fn parse_rejects_non_hex() {
    assert!(ObjectId::parse("0123456789ABCDEF0123456Z").is_err());
  }

  #[test]
  fn parse_accepts_xcode_identity() {
    let id = ObjectId::parse("8D1107260486CEB800E47090").unwrap();
    assert_eq!(id.to_string(), "8D1107260486CEB800E47090");
  }

  #[test]
  #[serial]
  fn from_env_honours_deterministic_flag() {
    temp_env::with_var(DETERMINISTIC_IDS_ENV, Some("1"), || {
      let mut ids = IdGenerator::from_env();
      assert_eq!(ids.next_id(), IdGenerator::deterministic().next_id());
    });
  }

  #[test]
  #[serial]
  fn from_env_defaults_to_seeded_generator() {
    temp_env::with_var(DETERMINISTIC_IDS_ENV, None::<&str>, || {
      let mut ids = IdGenerator::from_env();
      assert_ne!(ids.next_id(), IdGenerator::deterministic().next_id());
    });
  }

  proptest! {
    #[test]
    fn generated_identities_are_valid(steps in 1usize..500) {
      let mut ids = IdGenerator::new();
      for _ in 0..steps {
        let id = ids.next_id();
        prop_assert!(ObjectId::is_valid(id.as_str()));
      }
    }

    #[test]
    fn parse_agrees_with_predicate(candidate in "[0-9A-Fa-fG-Z]{20,28}") {
      prop_assert_eq!(ObjectId::parse(&candidate).is_ok(), ObjectId::is_valid(&candidate));
    }
  }
}
