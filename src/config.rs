use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geom::Viewport;

/// All tunable layout parameters. Defaults reproduce the production canvas.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    // Bubble geometry
    pub bubble_size: f64,
    pub bubble_margin: f64,

    // Spiral placement
    pub spiral_spacing: f64,
    pub golden_angle_deg: f64,
    /// Total angular jitter as a fraction of pi (0.3 => +-27 degrees).
    pub angle_jitter: f64,
    /// Total radial jitter as a fraction of `spiral_spacing` (0.4 => +-20%).
    pub radius_jitter: f64,

    // Collision resolution
    pub max_passes: usize,

    // Culling
    pub cull_buffer: f64,

    // Fallbacks
    pub fallback_seed: u32,
    pub fallback_viewport: Viewport,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            bubble_size: 280.0,
            bubble_margin: 40.0,
            spiral_spacing: 150.0,
            golden_angle_deg: 137.5,
            angle_jitter: 0.3,
            radius_jitter: 0.4,
            max_passes: 15,
            cull_buffer: 400.0,
            fallback_seed: 12345,
            fallback_viewport: Viewport::new(1600.0, 1200.0),
        }
    }
}

impl Params {
    /// Minimum allowed center-to-center distance between two bubbles.
    #[inline]
    pub fn min_distance(&self) -> f64 {
        self.bubble_size + self.bubble_margin
    }

    #[inline]
    pub fn bubble_radius(&self) -> f64 {
        self.bubble_size / 2.0
    }

    pub fn validate(&self) -> Result<()> {
        positive("bubble_size", self.bubble_size)?;
        non_negative("bubble_margin", self.bubble_margin)?;
        positive("spiral_spacing", self.spiral_spacing)?;
        finite("golden_angle_deg", self.golden_angle_deg)?;
        non_negative("angle_jitter", self.angle_jitter)?;
        non_negative("radius_jitter", self.radius_jitter)?;
        non_negative("cull_buffer", self.cull_buffer)?;
        positive("fallback_viewport.width", self.fallback_viewport.width)?;
        positive("fallback_viewport.height", self.fallback_viewport.height)?;
        if self.max_passes == 0 {
            return Err(Error::InvalidParams {
                field: "max_passes",
                reason: "at least one pass is required".into(),
            });
        }
        Ok(())
    }
}

/// Caller-supplied viewport: both sides finite and positive.
pub fn validate_viewport(viewport: Viewport) -> Result<()> {
    positive("viewport.width", viewport.width)?;
    positive("viewport.height", viewport.height)
}

fn finite(field: &'static str, v: f64) -> Result<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidParams {
            field,
            reason: format!("{v} is not finite"),
        })
    }
}

fn positive(field: &'static str, v: f64) -> Result<()> {
    finite(field, v)?;
    if v > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParams {
            field,
            reason: format!("{v} must be > 0"),
        })
    }
}

fn non_negative(field: &'static str, v: f64) -> Result<()> {
    finite(field, v)?;
    if v >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParams {
            field,
            reason: format!("{v} must be >= 0"),
        })
    }
}
