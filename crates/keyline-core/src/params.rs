//! Rainfall/water-strategy context supplied by the caller. Absence is valid
//! everywhere; defaults are standard spacing and a 1.0 size multiplier.

use serde::{Deserialize, Serialize};

/// Qualitative keyline spacing class from the caller's water strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeylineSpacing {
    Tight,
    Standard,
    Wide,
}

impl KeylineSpacing {
    /// Recommended spacing between successive keylines, in metres.
    pub fn spacing_m(self) -> f64 {
        match self {
            KeylineSpacing::Tight => 20.0,
            KeylineSpacing::Standard => 30.0,
            KeylineSpacing::Wide => 50.0,
        }
    }
}

impl Default for KeylineSpacing {
    fn default() -> Self {
        KeylineSpacing::Standard
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterStrategy {
    pub keyline_spacing: KeylineSpacing,
    pub pond_size_multiplier: f64,
}

impl Default for WaterStrategy {
    fn default() -> Self {
        Self {
            keyline_spacing: KeylineSpacing::Standard,
            pond_size_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RainfallContext {
    pub water_strategy: WaterStrategy,
}

impl RainfallContext {
    pub fn keyline_spacing(&self) -> KeylineSpacing {
        self.water_strategy.keyline_spacing
    }

    pub fn pond_size_multiplier(&self) -> f64 {
        self.water_strategy.pond_size_multiplier
    }
}
