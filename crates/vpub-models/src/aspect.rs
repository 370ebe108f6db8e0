//! Aspect-ratio classification.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance for the aspect-ratio membership test.
const RATIO_TOLERANCE: f64 = 0.01;

/// Coarse aspect-ratio class of a video, used as the storage-key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AspectClass {
    /// Tall video (height/width within tolerance of 16/9).
    Portrait,
    /// Wide video (height/width within tolerance of 9/16).
    Landscape,
    /// Anything else (square, unusual ratios, degenerate dimensions).
    Other,
}

impl AspectClass {
    /// Classify a video by its pixel dimensions.
    ///
    /// The test is an exact-tolerance membership check, not a nearest match:
    /// a ratio outside both bands always falls to `Other`. The two bands
    /// cannot overlap at the current tolerance, so check order is irrelevant.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return AspectClass::Other;
        }

        let ratio = height as f64 / width as f64;

        if (ratio - 16.0 / 9.0).abs() < RATIO_TOLERANCE {
            AspectClass::Portrait
        } else if (ratio - 9.0 / 16.0).abs() < RATIO_TOLERANCE {
            AspectClass::Landscape
        } else {
            AspectClass::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectClass::Portrait => "portrait",
            AspectClass::Landscape => "landscape",
            AspectClass::Other => "other",
        }
    }
}

impl fmt::Display for AspectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
