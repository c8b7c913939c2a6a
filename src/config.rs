use bytemuck::{Pod, Zeroable};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::EngineError;

const DEFAULT_GRID_SIZE: u32 = 256;
const DEFAULT_WORKGROUP_SIZE: u32 = 8;
const DEFAULT_UPDATE_INTERVAL: f32 = 0.1; // seconds per generation

/// Runtime simulation parameters. Grid and workgroup geometry are plain
/// inputs validated once at startup, not compile-time constants.
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    /// Side length of the square cell grid.
    pub grid_size: u32,
    /// Side length of a square compute workgroup (shader override constant).
    pub workgroup_size: u32,
    /// Simulated seconds between generations.
    pub update_interval: f32,
    /// Fixed RNG seed for the initial cell pattern; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            workgroup_size: DEFAULT_WORKGROUP_SIZE,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Defaults overridden by LIFE_* environment variables. Values that fail
    /// to parse are reported and ignored rather than aborting startup.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = parse_env("LIFE_GRID_SIZE") {
            config.grid_size = v;
        }
        if let Some(v) = parse_env("LIFE_WORKGROUP_SIZE") {
            config.workgroup_size = v;
        }
        if let Some(v) = parse_env("LIFE_UPDATE_INTERVAL") {
            config.update_interval = v;
        }
        config.seed = parse_env("LIFE_SEED");
        config
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.grid_size == 0 {
            return Err(EngineError::init("grid size must be positive"));
        }
        if self.workgroup_size == 0 {
            return Err(EngineError::init("workgroup size must be positive"));
        }
        if self.grid_size.checked_mul(self.grid_size).is_none() {
            return Err(EngineError::Init(format!(
                "grid size {} is too large: cell count overflows",
                self.grid_size
            )));
        }
        if !(self.update_interval.is_finite() && self.update_interval > 0.0) {
            return Err(EngineError::init(
                "update interval must be a positive number of seconds",
            ));
        }
        Ok(())
    }

    /// Only meaningful on a validated config; `validate` guarantees the
    /// product is representable.
    pub fn cell_count(&self) -> u32 {
        self.grid_size * self.grid_size
    }

    /// Workgroups per dispatch axis. Ceiling division: grids that do not
    /// divide evenly by the workgroup side still get full coverage, and the
    /// shader discards the overhanging invocations.
    pub fn workgroup_count(&self) -> u32 {
        (self.grid_size + self.workgroup_size - 1) / self.workgroup_size
    }

    pub fn grid_uniform(&self) -> GridUniform {
        GridUniform {
            width: self.grid_size as f32,
            height: self.grid_size as f32,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("ignoring unparseable {name}={raw:?}");
            None
        }
    }
}

/// Shader-visible mirror of the grid extent. Must stay byte-identical to the
/// dimensions the bind groups were sized for.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct GridUniform {
    pub width: f32,
    pub height: f32,
}

/// One 32-bit word per cell, each 0 or 1. Both ping-pong buffers are seeded
/// with the same pattern.
pub fn seed_cells(cell_count: usize, seed: Option<u64>) -> Vec<u32> {
    let mut words = vec![0u32; cell_count];
    match seed {
        Some(s) => fill_random(&mut StdRng::seed_from_u64(s), &mut words),
        None => fill_random(&mut rand::thread_rng(), &mut words),
    }
    words
}

fn fill_random<R: Rng>(rng: &mut R, words: &mut [u32]) {
    for word in words.iter_mut() {
        *word = rng.gen_range(0..=1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_grid_rejected() {
        let config = SimConfig {
            grid_size: 0,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_workgroup_rejected() {
        let config = SimConfig {
            workgroup_size: 0,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_grid_rejected() {
        // 70000² does not fit in u32; admitting it would size the storage
        // buffers from a wrapped cell count.
        let config = SimConfig {
            grid_size: 70_000,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());

        // The largest side whose square still fits is accepted.
        let config = SimConfig {
            grid_size: 65_535,
            ..SimConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.cell_count(), 65_535 * 65_535);
    }

    #[test]
    fn non_positive_interval_rejected() {
        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let config = SimConfig {
                update_interval: bad,
                ..SimConfig::default()
            };
            assert!(config.validate().is_err(), "interval {bad} should be rejected");
        }
    }

    #[test]
    fn workgroup_count_uses_ceiling_division() {
        let mut config = SimConfig {
            grid_size: 256,
            workgroup_size: 8,
            ..SimConfig::default()
        };
        assert_eq!(config.workgroup_count(), 32);

        // Non-dividing grid rounds up rather than dropping a partial row.
        config.grid_size = 10;
        assert_eq!(config.workgroup_count(), 2);

        config.grid_size = 1;
        assert_eq!(config.workgroup_count(), 1);
    }

    #[test]
    fn uniform_mirrors_grid_dimensions() {
        let config = SimConfig {
            grid_size: 4,
            ..SimConfig::default()
        };
        let uniform = config.grid_uniform();
        assert_eq!(uniform.width, 4.0);
        assert_eq!(uniform.height, 4.0);
        assert_eq!(std::mem::size_of::<GridUniform>(), 8);
    }

    #[test]
    fn seeding_is_deterministic_for_fixed_seed() {
        let a = seed_cells(16, Some(7));
        let b = seed_cells(16, Some(7));
        assert_eq!(a, b);
        assert_ne!(a, seed_cells(16, Some(8)));
    }

    #[test]
    fn seeded_cells_are_binary() {
        for word in seed_cells(1024, Some(42)) {
            assert!(word <= 1);
        }
    }
}
