//! Common types used across the congress workspace

use crate::error::{CommonError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Identifier
// ============================================================================

/// Unique key for a listing entry and its hydrated detail record.
///
/// The API hands out both integer keys (`eventId: 115538`) and string keys
/// (`systemCode: "hsag00"`). Both collapse into one exact-match string key
/// space so a pending reference and its hydrated record always agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawIdentifier", into = "String")]
pub struct Identifier(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdentifier {
    Text(String),
    Number(i64),
}

impl From<RawIdentifier> for Identifier {
    fn from(raw: RawIdentifier) -> Self {
        match raw {
            RawIdentifier::Text(s) => Identifier(s),
            RawIdentifier::Number(n) => Identifier(n.to_string()),
        }
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl Identifier {
    /// Create an identifier from a non-empty string
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CommonError::invalid_identifier("identifier cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Extract an identifier from a JSON value (string or integer)
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::new(s.as_str()).ok(),
            Value::Number(n) => n.as_i64().map(|n| Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl std::str::FromStr for Identifier {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Chamber
// ============================================================================

/// Chamber of Congress a listing is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Chamber {
    #[default]
    House,
    Senate,
    /// Joint or chamber-less events
    NoChamber,
}

impl Chamber {
    /// Wire name used in API paths
    pub fn as_str(self) -> &'static str {
        match self {
            Chamber::House => "house",
            Chamber::Senate => "senate",
            Chamber::NoChamber => "nochamber",
        }
    }

    /// Committees only exist per real chamber
    pub fn require_legislative(self, resource: &str) -> Result<Self> {
        match self {
            Chamber::House | Chamber::Senate => Ok(self),
            Chamber::NoChamber => Err(CommonError::UnsupportedChamber {
                chamber: self.as_str().to_string(),
                resource: resource.to_string(),
            }),
        }
    }
}

impl std::str::FromStr for Chamber {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "house" => Ok(Chamber::House),
            "senate" => Ok(Chamber::Senate),
            "nochamber" => Ok(Chamber::NoChamber),
            _ => Err(CommonError::InvalidChamber(s.to_string())),
        }
    }
}

impl std::fmt::Display for Chamber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Congress Number
// ============================================================================

/// Session of Congress, bounded to the range the API is known to serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u16")]
pub struct CongressNumber(u16);

impl CongressNumber {
    pub const MIN: u16 = 100;
    pub const MAX: u16 = 120;
    pub const CURRENT: u16 = 119;

    pub fn new(value: i64) -> Result<Self> {
        if value < i64::from(Self::MIN) || value > i64::from(Self::MAX) {
            return Err(CommonError::InvalidCongress {
                value,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Self(value as u16))
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl Default for CongressNumber {
    fn default() -> Self {
        Self(Self::CURRENT)
    }
}

impl TryFrom<i64> for CongressNumber {
    type Error = CommonError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CongressNumber> for u16 {
    fn from(value: CongressNumber) -> Self {
        value.0
    }
}

impl std::str::FromStr for CongressNumber {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| CommonError::CongressNotANumber(s.to_string()))?;
        Self::new(value)
    }
}

impl std::fmt::Display for CongressNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
