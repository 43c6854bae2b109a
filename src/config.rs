//! Configuration types for snap.
//!
//! The instruction profile is fixed when the crate is compiled (see
//! [`crate::simd::PROFILE`]); the structures here cover the knobs that can be
//! chosen at runtime when moving data between external buffers and matrices.

use serde::{Deserialize, Serialize};

/// Main configuration for the conversion dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// How aligned and unaligned lane loads are chosen for a conversion.
    pub load_selection: LoadSelection,

    /// After a load, zero every byte of each matrix row past the loaded
    /// pixels, row padding (`cols..step`) included.
    ///
    /// When disabled, bytes past the loaded pixels keep whatever the trailing
    /// lane load read past the end of the source row, and anything beyond
    /// that lane is left as it was.
    pub zero_padding: bool,

    /// Accept routes from the runtime table. When disabled only statically
    /// resolved (same-format) conversions succeed.
    pub allow_runtime_routes: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            load_selection: LoadSelection::WholeMatrix,
            zero_padding: false,
            allow_runtime_routes: true,
        }
    }
}

impl ConvertConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the load selection policy.
    pub fn with_load_selection(mut self, selection: LoadSelection) -> Self {
        self.load_selection = selection;
        self
    }

    /// Zero row padding after each load.
    pub fn with_zero_padding(mut self) -> Self {
        self.zero_padding = true;
        self
    }

    /// Only accept statically resolved routes.
    pub fn strict(mut self) -> Self {
        self.allow_runtime_routes = false;
        self
    }

    /// Check if runtime routes may be used.
    pub fn allows_runtime_routes(&self) -> bool {
        self.allow_runtime_routes
    }
}

/// Policy for picking aligned or unaligned lane loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoadSelection {
    /// Decide once per conversion: aligned loads for every lane when each
    /// source row is a whole number of lanes and starts aligned, unaligned
    /// loads for every lane otherwise.
    #[default]
    WholeMatrix,

    /// Decide per lane: every full lane of an aligned row uses the aligned
    /// load, only a trailing partial lane is read unaligned.
    PerLane,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConvertConfig::default();
        assert_eq!(config.load_selection, LoadSelection::WholeMatrix);
        assert!(!config.zero_padding);
        assert!(config.allows_runtime_routes());
    }

    #[test]
    fn test_builder() {
        let config = ConvertConfig::new()
            .with_load_selection(LoadSelection::PerLane)
            .with_zero_padding()
            .strict();
        assert_eq!(config.load_selection, LoadSelection::PerLane);
        assert!(config.zero_padding);
        assert!(!config.allows_runtime_routes());
    }

    #[test]
    fn test_config_serialization() {
        let config = ConvertConfig::new()
            .with_load_selection(LoadSelection::PerLane)
            .with_zero_padding();

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ConvertConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, config);
    }
}
