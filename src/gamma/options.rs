use crate::cache::{ContentHasher, ContentKey};
use crate::error::{QaError, QaResult};
use serde::{Deserialize, Serialize};

/// Parameters of a gamma comparison.
///
/// - `dose_percent_threshold`: dose tolerance in percent of the local
///   reference value (`local_gamma`) or of the global normalisation.
/// - `distance_mm_threshold`: distance-to-agreement tolerance (mm).
/// - `max_gamma`: cap on reported values; also bounds the search radius to
///   `distance_mm_threshold × max_gamma`.
/// - `lower_percent_dose_cutoff`: reference cells below this percentage of
///   the reference maximum are not evaluated.
/// - `interp_fraction`: search shells are spaced
///   `distance_mm_threshold / interp_fraction` apart.
/// - `global_normalisation`: explicit normaliser for global gamma; the
///   reference maximum is used when absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GammaOptions {
    pub dose_percent_threshold: f32,
    pub distance_mm_threshold: f32,
    pub local_gamma: bool,
    pub max_gamma: f32,
    pub lower_percent_dose_cutoff: f32,
    pub interp_fraction: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_normalisation: Option<f32>,
}

impl Default for GammaOptions {
    fn default() -> Self {
        Self {
            dose_percent_threshold: 2.0,
            distance_mm_threshold: 0.5,
            local_gamma: true,
            max_gamma: 5.0,
            lower_percent_dose_cutoff: 20.0,
            interp_fraction: 10,
            global_normalisation: None,
        }
    }
}

impl GammaOptions {
    pub fn new(
        dose_percent_threshold: f32,
        distance_mm_threshold: f32,
        local_gamma: bool,
        max_gamma: f32,
    ) -> Self {
        Self {
            dose_percent_threshold,
            distance_mm_threshold,
            local_gamma,
            max_gamma,
            ..Default::default()
        }
    }

    pub fn with_global_normalisation(mut self, value: f32) -> Self {
        self.global_normalisation = Some(value);
        self
    }

    pub fn with_lower_percent_dose_cutoff(mut self, percent: f32) -> Self {
        self.lower_percent_dose_cutoff = percent;
        self
    }

    pub fn with_interp_fraction(mut self, fraction: usize) -> Self {
        self.interp_fraction = fraction;
        self
    }

    pub fn validate(&self) -> QaResult<()> {
        let positive = |name: &str, v: f32| -> QaResult<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(QaError::config(format!("{name} must be positive, got {v}")))
            }
        };
        positive("dose_percent_threshold", self.dose_percent_threshold)?;
        positive("distance_mm_threshold", self.distance_mm_threshold)?;
        positive("max_gamma", self.max_gamma)?;
        if self.interp_fraction == 0 {
            return Err(QaError::config("interp_fraction must be at least 1"));
        }
        if !(self.lower_percent_dose_cutoff.is_finite() && self.lower_percent_dose_cutoff >= 0.0) {
            return Err(QaError::config(format!(
                "lower_percent_dose_cutoff must be non-negative, got {}",
                self.lower_percent_dose_cutoff
            )));
        }
        if let Some(norm) = self.global_normalisation {
            positive("global_normalisation", norm)?;
        }
        Ok(())
    }

    /// Denominator basis for global gamma: the explicit normalisation, else
    /// the reference maximum. Local gamma returns `None`.
    pub fn global_dose_basis(&self, reference_max: f32) -> QaResult<Option<f32>> {
        if self.local_gamma {
            return Ok(None);
        }
        match self.global_normalisation {
            Some(norm) => Ok(Some(norm)),
            None if reference_max > 0.0 && reference_max.is_finite() => Ok(Some(reference_max)),
            None => Err(QaError::config(
                "global gamma requested without a normalisation value and the reference grid is empty",
            )),
        }
    }

    pub(crate) fn content_key(&self) -> ContentKey {
        let mut hasher = ContentHasher::new();
        hasher.write_f32(self.dose_percent_threshold);
        hasher.write_f32(self.distance_mm_threshold);
        hasher.write_bool(self.local_gamma);
        hasher.write_f32(self.max_gamma);
        hasher.write_f32(self.lower_percent_dose_cutoff);
        hasher.write_usize(self.interp_fraction);
        match self.global_normalisation {
            Some(v) => {
                hasher.write_bool(true);
                hasher.write_f32(v);
            }
            None => hasher.write_bool(false),
        }
        hasher.finish()
    }
}
