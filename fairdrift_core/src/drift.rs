//! Valuation drift between timesteps.

use crate::config::DriftMode;
use crate::error::ConfigError;
use crate::valuation::ValuationMatrix;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// Perturbs valuations by `uniform(-delta, delta)` per entry, clipped at zero.
///
/// In [`DriftMode::Anchored`] each entry is re-drawn around the immutable
/// base snapshot, so deviations never compound. In [`DriftMode::Walk`] the
/// perturbation is added to the current value; the zero clip makes long runs
/// drift downwards.
#[derive(Debug, Clone)]
pub struct DriftModel {
    mode: DriftMode,
    delta: f64,
    base: ValuationMatrix,
}

impl DriftModel {
    /// `base` is the snapshot anchored drift is measured from.
    ///
    /// `delta` must be non-negative with `2 * delta` finite.
    pub fn new(mode: DriftMode, delta: f64, base: ValuationMatrix) -> Result<Self, ConfigError> {
        if !(delta >= 0.0 && (2.0 * delta).is_finite()) {
            return Err(ConfigError::invalid_real("delta", delta));
        }
        Ok(Self { mode, delta, base })
    }

    pub fn mode(&self) -> DriftMode {
        self.mode
    }

    pub fn base(&self) -> &ValuationMatrix {
        &self.base
    }

    /// Applies one step of drift in place, row-major.
    pub fn apply<R: Rng + ?Sized>(&self, valuations: &mut ValuationMatrix, rng: &mut R) {
        let noise = Uniform::new_inclusive(-self.delta, self.delta);

        for agent in 0..valuations.num_agents() {
            for item in 0..valuations.num_items() {
                let origin = match self.mode {
                    DriftMode::Anchored => self.base.value(agent, item),
                    DriftMode::Walk => valuations.value(agent, item),
                };
                let drifted = origin + noise.sample(rng);
                valuations.set(agent, item, drifted.max(0.0));
            }
        }
    }
}
