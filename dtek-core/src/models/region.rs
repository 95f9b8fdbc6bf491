//! Upstream regions.
//!
//! Each DTEK distribution company runs its own site with its own session
//! cookies, so every region gets an independent session.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DtekError;

// ============================================================================
// Region
// ============================================================================

/// Supported upstream regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// Kyiv city (`dtek-kem`).
    Kem,
    /// Kyiv oblast (`dtek-krem`).
    Krem,
    /// Odesa oblast (`dtek-oem`).
    Oem,
    /// Dnipro oblast (`dtek-dnem`).
    Dnem,
    /// Donetsk oblast (`dtek-dem`).
    Dem,
}

impl Region {
    /// Returns the short region code used in hostnames and cookie names.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Kem => "kem",
            Self::Krem => "krem",
            Self::Oem => "oem",
            Self::Dnem => "dnem",
            Self::Dem => "dem",
        }
    }

    /// Returns the display name for this region.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Kem => "Kyiv",
            Self::Krem => "Kyiv Oblast",
            Self::Oem => "Odesa Oblast",
            Self::Dnem => "Dnipro Oblast",
            Self::Dem => "Donetsk Oblast",
        }
    }

    /// Returns the default upstream origin, without a trailing slash.
    pub fn default_origin(&self) -> String {
        format!("https://www.dtek-{}.com.ua", self.code())
    }

    /// Returns all regions.
    pub fn all() -> &'static [Region] {
        &[Self::Kem, Self::Krem, Self::Oem, Self::Dnem, Self::Dem]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = DtekError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        let needle = needle.strip_prefix("dtek-").unwrap_or(&needle);
        Self::all()
            .iter()
            .copied()
            .find(|r| r.code() == needle)
            .ok_or_else(|| DtekError::validation("region", format!("unknown region code {s:?}")))
    }
}

// ============================================================================
// Tests
// ============================================================================
