use crate::error::{JdkScanError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Dotted numeric JDK version such as "1.8.0" or "21.0.1".
///
/// Components are compared numerically segment by segment, never as strings,
/// so "1.10.0" sorts above "1.9.0". A shorter version sorts below a longer
/// one with the same prefix ("1.8" < "1.8.0").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub components: Vec<u32>,
}

impl Version {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            components: vec![major, minor, patch],
        }
    }

    pub fn major(&self) -> u32 {
        self.components.first().copied().unwrap_or(0)
    }

    pub fn minor(&self) -> Option<u32> {
        self.components.get(1).copied()
    }

    pub fn patch(&self) -> Option<u32> {
        self.components.get(2).copied()
    }
}

impl FromStr for Version {
    type Err = JdkScanError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(JdkScanError::InvalidVersionFormat(s.to_string()));
        }

        let components: Result<Vec<u32>> = s
            .split('.')
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| JdkScanError::InvalidVersionFormat(s.to_string()))
            })
            .collect();

        Ok(Version {
            components: components?,
        })
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{component}")?;
        }
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Version::from_str(&s).map_err(serde::de::Error::custom)
    }
}
