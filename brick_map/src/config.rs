// Data-driven generation configuration.
//
// Tunable generation parameters live in `GeneratorConfig`, loadable from JSON.
// Every field has a default, so a config file only needs the keys it changes
// (`{}` is a valid config). The generator reads from the config rather than
// hard-coding plate size or height limits.
//
// See also: `generator.rs`, which consumes this config, and the `bricks` CLI,
// which loads it from `--config <file>`.

use crate::error::{BrickError, Result};
use crate::types::{Baseplate, STANDARD_BASEPLATE_SIZE};
use serde::{Deserialize, Serialize};

/// Largest baseplate area the generator accepts. Candidate enumeration walks
/// the whole frontier once per brick, and the frontier starts as the plate.
pub const MAX_BASEPLATE_CELLS: u64 = 4096;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Baseplate extent along X. Generated bricks stay within it.
    pub baseplate_width: u32,
    /// Baseplate extent along Z.
    pub baseplate_depth: u32,
    /// Optional cap on the number of layers. `None` lets the pile grow as
    /// high as it needs to.
    pub max_height: Option<u32>,
    /// Brick count used when a request doesn't name one.
    pub default_bricks: usize,
    /// How many fresh catalog draws to try before giving up on a request
    /// that keeps hitting `NoPlacement`.
    pub max_attempts: u32,
    /// Name given to generated maps.
    pub map_name: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            baseplate_width: STANDARD_BASEPLATE_SIZE,
            baseplate_depth: STANDARD_BASEPLATE_SIZE,
            max_height: None,
            default_bricks: 12,
            max_attempts: 5,
            map_name: "generated".into(),
        }
    }
}

impl GeneratorConfig {
    pub fn baseplate(&self) -> Baseplate {
        Baseplate::new(self.baseplate_width, self.baseplate_depth)
    }

    pub fn validate(&self) -> Result<()> {
        if self.baseplate_width == 0 || self.baseplate_depth == 0 {
            return Err(BrickError::Config(format!(
                "baseplate must be at least 1x1, got {}x{}",
                self.baseplate_width, self.baseplate_depth
            )));
        }
        let area = u64::from(self.baseplate_width) * u64::from(self.baseplate_depth);
        if area > MAX_BASEPLATE_CELLS {
            return Err(BrickError::Config(format!(
                "baseplate {}x{} exceeds {MAX_BASEPLATE_CELLS} cells",
                self.baseplate_width, self.baseplate_depth
            )));
        }
        if self.max_height == Some(0) {
            return Err(BrickError::Config("max_height must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(BrickError::Config("max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
