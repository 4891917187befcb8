use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Error;

/// Tunables for the layout engine. All distances are in layout units; one
/// unit corresponds to `NodeMetricsConfig::pixels_per_unit` renderer pixels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub layered: LayeredConfig,
    pub metrics: NodeMetricsConfig,
    pub force: ForceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayeredConfig {
    /// Alternating barycenter sweeps; there is no convergence check.
    pub crossing_passes: usize,
    /// Forward/backward median refinement passes.
    pub refinement_passes: usize,
    pub forward_pull: f32,
    pub backward_pull: f32,
    /// Gap between neighbours when a layer is first packed.
    pub node_gap: f32,
    /// Extra gap enforced by the per-layer overlap resolution.
    pub overlap_padding: f32,
    /// Extra gap enforced by the final per-row sweep on integer positions.
    pub row_padding: f32,
    pub min_rank_spacing: f32,
    pub max_rank_spacing: f32,
    pub top_margin: f32,
    pub left_margin: f32,
    /// Gap kept between a corridor and the siblings of its virtual node.
    pub corridor_clearance: f32,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self {
            crossing_passes: 4,
            refinement_passes: 3,
            forward_pull: 0.5,
            backward_pull: 0.3,
            node_gap: 3.0,
            overlap_padding: 2.0,
            row_padding: 3.0,
            min_rank_spacing: 4.0,
            max_rank_spacing: 10.0,
            top_margin: 2.0,
            left_margin: 5.0,
            corridor_clearance: 1.0,
        }
    }
}

/// Node footprint derived from label length, matching the SVG renderer's
/// `max(min_pixel_width, chars * char_width + label_padding)` box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeMetricsConfig {
    pub char_width: f32,
    pub label_padding: f32,
    pub min_pixel_width: f32,
    pub pixels_per_unit: f32,
    /// Spacing added to every node so neighbours never touch.
    pub width_padding: f32,
    pub node_height: f32,
    pub virtual_node_width: f32,
}

impl Default for NodeMetricsConfig {
    fn default() -> Self {
        Self {
            char_width: 7.2,
            label_padding: 40.0,
            min_pixel_width: 60.0,
            pixels_per_unit: 15.0,
            width_padding: 3.0,
            node_height: 2.0,
            virtual_node_width: 1.0,
        }
    }
}

impl NodeMetricsConfig {
    pub fn label_width(&self, label: &str) -> f32 {
        let text_width = label.chars().count() as f32 * self.char_width;
        let pixel_width = (text_width + self.label_padding).max(self.min_pixel_width);
        pixel_width / self.pixels_per_unit.max(f32::EPSILON) + self.width_padding
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    pub iterations: usize,
    pub repulsion: f32,
    pub attraction: f32,
    pub damping: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            iterations: 50,
            repulsion: 500.0,
            attraction: 0.1,
            damping: 0.85,
        }
    }
}

/// Loads a JSON5 config file; missing keys keep their defaults.
pub fn load_config(path: Option<&Path>) -> Result<LayoutConfig, Error> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };
    let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<LayoutConfig, Error> {
    Ok(json5::from_str(contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let source = "{ layered: { crossing_passes: 2 }, force: { damping: 0.5 } }";
        let config = parse_config(source).unwrap();
        assert_eq!(config.layered.crossing_passes, 2);
        assert_eq!(config.layered.refinement_passes, 3);
        assert_eq!(config.force.damping, 0.5);
        assert_eq!(config.force.iterations, 50);
        assert_eq!(config.metrics, NodeMetricsConfig::default());
    }

    #[test]
    fn label_width_has_floor() {
        let metrics = NodeMetricsConfig::default();
        // 60px floor / 15 + 3
        assert_eq!(metrics.label_width("A"), 7.0);
        assert!(metrics.label_width("a_very_long_state_name") > 7.0);
    }

    #[test]
    fn missing_path_yields_default() {
        assert_eq!(load_config(None).unwrap(), LayoutConfig::default());
    }
}
