//! One-way contributor identities.

use sha2::{Digest, Sha256};

/// Hash a client network address into a lowercase hex SHA-256 digest.
///
/// Deterministic, so repeated contributions from one address share a hash.
pub fn hash_ip(address: &str) -> String {
  let digest = Sha256::digest(address.as_bytes());
  hex::encode(digest)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_digest() {
    assert_eq!(
      hash_ip("127.0.0.1"),
      "12ca17b49af2289436f303e0166030a21e525d266e209267433801a8fd4071a0"
    );
  }

  #[test]
  fn same_address_same_hash() {
    assert_eq!(hash_ip("203.0.113.7"), hash_ip("203.0.113.7"));
  }

  #[test]
  fn different_addresses_differ() {
    assert_ne!(hash_ip("203.0.113.7"), hash_ip("203.0.113.8"));
  }

  #[test]
  fn digest_is_hex_and_hides_address() {
    let h = hash_ip("::1");
    assert_eq!(h.len(), 64);
    assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert!(!h.contains("::1"));
  }
}
