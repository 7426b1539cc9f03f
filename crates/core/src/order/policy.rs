//! Commit rules for the quantity-constrained flows.
//!
//! The shop has run both rule sets over time, so each is a policy chosen by
//! configuration rather than hard-coded.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the frozen-dessert flavor count is checked at commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlavorPolicy {
    /// The selected flavor count must equal the size's slot count.
    #[default]
    Exact,
    /// At least one flavor and no more than the size's slot count. The rest
    /// is settled with the shop over chat.
    UpToCap,
}

/// How the confection flow is priced and constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfectionPolicy {
    /// Free per-unit quantities, priced per unit.
    #[default]
    PerItem,
    /// A box must be chosen and filled exactly; priced by the box.
    Boxed,
}

/// Both policies together, carried by an order session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OrderPolicy {
    pub flavors: FlavorPolicy,
    pub confections: ConfectionPolicy,
}

impl fmt::Display for FlavorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::UpToCap => write!(f, "up-to-cap"),
        }
    }
}

impl FromStr for FlavorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "up-to-cap" => Ok(Self::UpToCap),
            _ => Err(format!("invalid flavor policy: {s}")),
        }
    }
}

impl fmt::Display for ConfectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerItem => write!(f, "per-item"),
            Self::Boxed => write!(f, "boxed"),
        }
    }
}

impl FromStr for ConfectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per-item" => Ok(Self::PerItem),
            "boxed" => Ok(Self::Boxed),
            _ => Err(format!("invalid confection policy: {s}")),
        }
    }
}
