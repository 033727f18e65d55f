//! Document families and their output vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A category of billing source sharing a consumption unit and a pair of
/// charge labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UtilityFamily {
    /// Water and sewer statements, metered in cubic feet.
    Water,
    /// Natural gas statements, metered in therms.
    Gas,
    /// Electric statements (MA layouts, 2009 onwards), metered in kWh.
    Electric,
    /// Electric statements (NH layouts), metered in kWh.
    ElectricNh,
}

impl Default for UtilityFamily {
    fn default() -> Self {
        Self::Water
    }
}

impl UtilityFamily {
    /// All known families, in display order.
    pub const ALL: [UtilityFamily; 4] = [Self::Water, Self::Gas, Self::Electric, Self::ElectricNh];

    /// Identifier used on the command line and in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Gas => "gas",
            Self::Electric => "electric",
            Self::ElectricNh => "electric-nh",
        }
    }

    /// JSON key of the consumption quantity.
    pub fn quantity_key(&self) -> &'static str {
        match self {
            Self::Water => "cf",
            Self::Gas => "therms",
            Self::Electric | Self::ElectricNh => "kwh",
        }
    }

    /// JSON keys of the two charge components (`charge_a`, `charge_b`).
    pub fn charge_keys(&self) -> (&'static str, &'static str) {
        match self {
            Self::Water => ("water", "sewer"),
            Self::Gas | Self::Electric | Self::ElectricNh => ("supply", "delivery"),
        }
    }

    /// Unit label used in warnings and summaries.
    pub fn unit_label(&self) -> &'static str {
        match self {
            Self::Water => "CF",
            Self::Gas => "therms",
            Self::Electric | Self::ElectricNh => "kWh",
        }
    }
}

impl fmt::Display for UtilityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UtilityFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "water" => Ok(Self::Water),
            "gas" => Ok(Self::Gas),
            "electric" | "electric-ma" => Ok(Self::Electric),
            "electric-nh" => Ok(Self::ElectricNh),
            other => Err(format!(
                "unknown document family '{}' (expected one of: water, gas, electric, electric-nh)",
                other
            )),
        }
    }
}
