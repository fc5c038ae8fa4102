use crate::core::types::Number;
use serde::{Deserialize, Serialize};
use valuable::Valuable;

/// How dark image regions are treated when deciding which pixels to resample
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Valuable, Serialize, Deserialize)]
pub enum DarkDetection {
    #[default]
    None,
    Linear,
    Curve,
}

/// Sampling configuration read by the integrators
#[derive(Copy, Clone, Debug, PartialEq, Valuable, Serialize, Deserialize)]
pub struct AntialiasingOpts {
    /// Samples per pixel in the first pass
    pub samples: u32,
    pub passes: u32,
    /// Samples per pixel in later passes
    pub inc_samples: u32,
    /// Colour difference above which a pixel is resampled
    pub threshold: Number,
    /// Minimum share of pixels resampled per pass, as a percentage
    pub resampled_floor: Number,
    pub sample_multiplier_factor: Number,
    pub light_sample_multiplier_factor: Number,
    pub indirect_sample_multiplier_factor: Number,
    pub detect_color_noise: bool,
    pub dark_detection: DarkDetection,
    pub dark_threshold_factor: Number,
    pub variance_edge_size: u32,
    pub variance_pixels: u32,
    /// `0` disables clamping
    pub clamp_samples: Number,
    /// `0` disables clamping
    pub clamp_indirect: Number,
}

impl Default for AntialiasingOpts {
    fn default() -> Self {
        Self {
            samples: 1,
            passes: 1,
            inc_samples: 1,
            threshold: 0.05,
            resampled_floor: 0.,
            sample_multiplier_factor: 1.,
            light_sample_multiplier_factor: 1.,
            indirect_sample_multiplier_factor: 1.,
            detect_color_noise: false,
            dark_detection: DarkDetection::None,
            dark_threshold_factor: 0.,
            variance_edge_size: 10,
            variance_pixels: 0,
            clamp_samples: 0.,
            clamp_indirect: 0.,
        }
    }
}

impl AntialiasingOpts {
    /// Applies the sample-count rules: at least one sample, and later passes default to the first pass' count
    pub fn normalised(self) -> Self {
        let samples = self.samples.max(1);
        Self {
            samples,
            inc_samples: if self.inc_samples > 0 { self.inc_samples } else { samples },
            ..self
        }
    }
}
