//! Build configuration.
//!
//! Every field has a default, so a JSON file only needs the keys it changes:
//!
//! ```json
//! { "max_depth": 24, "policy": { "kind": "midpoint" } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bvh::SplitPolicy;
use crate::util::{Error, Result};

/// Default depth cap, root is depth 0.
pub const DEFAULT_MAX_DEPTH: u32 = 16;

/// Default leaf threshold: nodes with this many triangles or fewer are never split.
pub const DEFAULT_LEAF_THRESHOLD: u32 = 1;

/// Parameters controlling hierarchy construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// No node at this depth or deeper is split.
    pub max_depth: u32,
    /// Nodes with `triangle_count <= leaf_threshold` stay leaves.
    pub leaf_threshold: u32,
    pub policy: SplitPolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            leaf_threshold: DEFAULT_LEAF_THRESHOLD,
            policy: SplitPolicy::default(),
        }
    }
}

impl BuildConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded build config");
        Ok(config)
    }

    /// Save as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values that would make the builder useless.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::config("max_depth must be at least 1"));
        }
        if let SplitPolicy::Sah { candidates: 0 } = self.policy {
            return Err(Error::config("SAH needs at least one candidate plane per axis"));
        }
        Ok(())
    }
}
