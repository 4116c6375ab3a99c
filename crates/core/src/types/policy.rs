//! Policies governing cart mutations.

use serde::{Deserialize, Serialize};

/// Error returned when a policy name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid decrement policy: {0} (expected keep, clamp or remove)")]
pub struct ParsePolicyError(pub String);

/// What happens to a line item when decrementing takes it to zero or below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecrementPolicy {
    /// Leave the line in place; quantity may reach zero or go negative.
    #[default]
    Keep,
    /// Never decrement below zero.
    Clamp,
    /// Drop the line once its quantity reaches zero or below.
    Remove,
}

impl std::fmt::Display for DecrementPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keep => write!(f, "keep"),
            Self::Clamp => write!(f, "clamp"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

impl std::str::FromStr for DecrementPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "clamp" => Ok(Self::Clamp),
            "remove" => Ok(Self::Remove),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}
