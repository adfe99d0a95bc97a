//! # MAC Normalization
//!
//! Hardware identifiers arrive from both stores in inconsistent shapes:
//! lowercase hex, missing padding zeros (`18:fe:34:0:a:c5`), or outright
//! garbage. All comparisons in this crate go through [`Mac`], which stores
//! the canonical uppercase, zero-padded form. Records whose identifier fails
//! normalization are dropped at the reader boundary rather than carried
//! around raw.

use crate::error::ReconcileError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A normalized MAC address: six uppercase, zero-padded hex octets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mac(String);

impl Mac {
    /// Normalize a raw identifier string.
    ///
    /// Accepts unpadded and lowercase octets; rejects anything that is not
    /// six colon-separated hex octets. Normalizing an already-normalized
    /// value is idempotent.
    pub fn normalize(raw: &str) -> Result<Self, ReconcileError> {
        let malformed = || ReconcileError::MalformedIdentifier {
            value: raw.to_string(),
        };
        let octets: Vec<&str> = raw.split(':').collect();
        if octets.len() != 6 {
            return Err(malformed());
        }
        let mut canonical = String::with_capacity(17);
        for (i, octet) in octets.iter().enumerate() {
            let value = u8::from_str_radix(octet, 16).map_err(|_| malformed())?;
            if i > 0 {
                canonical.push(':');
            }
            canonical.push_str(&format!("{value:02X}"));
        }
        Ok(Self(canonical))
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Mac {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl TryFrom<String> for Mac {
    type Error = ReconcileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value)
    }
}

impl From<Mac> for String {
    fn from(mac: Mac) -> String {
        mac.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_and_uppercases() {
        let mac = Mac::normalize("18:fe:34:0:a:c5").unwrap();
        assert_eq!(mac.as_str(), "18:FE:34:00:0A:C5");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = Mac::normalize("5c:cf:7f:82:8e:b2").unwrap();
        let twice = Mac::normalize(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_wrong_octet_count() {
        assert!(matches!(
            Mac::normalize("AA:BB:CC:DD:EE"),
            Err(ReconcileError::MalformedIdentifier { .. })
        ));
    }

    #[test]
    fn rejects_non_hex_octets() {
        assert!(Mac::normalize("AA:BB:CC:DD:EE:GG").is_err());
        assert!(Mac::normalize("").is_err());
    }

    #[test]
    fn rejects_oversized_octets() {
        // Octets wider than a byte are not valid MAC material.
        assert!(Mac::normalize("1AA:BB:CC:DD:EE:FF").is_err());
    }

    #[test]
    fn serde_round_trip_validates() {
        let mac: Mac = serde_json::from_str("\"18:fe:34:0:a:c5\"").unwrap();
        assert_eq!(mac.as_str(), "18:FE:34:00:0A:C5");
        assert!(serde_json::from_str::<Mac>("\"nonsense\"").is_err());
    }
}
