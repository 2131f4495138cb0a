//! Runtime configuration, read from an inline JSON block in the page.
//!
//! Every field has a default so an empty object (or a missing block) yields a
//! working setup: 100 particles, 150px links, a 200px pointer radius and the
//! violet palette.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;

pub const DEFAULT_API_BASE: &str = "https://question-paper-generator-jg4p.onrender.com/api";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("`{field}` must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("`field.palette` must contain at least one color")]
    EmptyPalette,
    #[error("`field.radius_range` must satisfy 0 < min <= max")]
    RadiusRange,
}

/// Which background renderer drives the full-screen canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    Particles,
    Shader,
    Graph,
}

/// How pointer proximity moves a particle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repulsion {
    /// Force is added to velocity and accumulates over frames.
    #[default]
    Velocity,
    /// Force displaces position directly and does not persist.
    Position,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base: String,
    pub variant: Variant,
    pub log_level: String,
    pub field: FieldConfig,
    pub shader: ShaderConfig,
    pub graph: GraphConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            variant: Variant::default(),
            log_level: "info".to_owned(),
            field: FieldConfig::default(),
            shader: ShaderConfig::default(),
            graph: GraphConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = if raw.trim().is_empty() {
            Self::default()
        } else {
            serde_json::from_str(raw)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.field.validate()?;
        positive("graph.bounds", self.graph.bounds)?;
        self.graph.field.validate()
    }

    pub fn log_level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }
}

/// Parameters of the particle field, shared by the 2D canvas and the
/// 3D graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub count: usize,
    pub connection_distance: f32,
    pub pointer_radius: f32,
    pub repulsion: Repulsion,
    /// Multiplier on the falloff factor before it touches the particle.
    pub force_scale: f32,
    /// Initial velocity components are drawn from `-max_speed/2..max_speed/2`.
    pub max_speed: f32,
    pub radius_range: [f32; 2],
    pub palette: Vec<Rgb>,
    pub link_color: Rgb,
    pub link_alpha: f32,
    pub pointer_links: bool,
    pub pointer_link_color: Rgb,
    pub pointer_link_alpha: f32,
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            count: 100,
            connection_distance: 150.0,
            pointer_radius: 200.0,
            repulsion: Repulsion::Velocity,
            force_scale: 0.6,
            max_speed: 1.5,
            radius_range: [1.0, 3.0],
            palette: vec![
                Rgb::new(0x52, 0x27, 0xFF),
                Rgb::new(0xFF, 0x9F, 0xFC),
                Rgb::new(0xB1, 0x9E, 0xEF),
            ],
            link_color: Rgb::new(177, 158, 239),
            link_alpha: 0.5,
            pointer_links: true,
            pointer_link_color: Rgb::new(82, 39, 255),
            pointer_link_alpha: 0.8,
            seed: None,
        }
    }
}

impl FieldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("field.connection_distance", self.connection_distance)?;
        positive("field.pointer_radius", self.pointer_radius)?;
        if self.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        let [lo, hi] = self.radius_range;
        if !(lo > 0.0 && lo <= hi) {
            return Err(ConfigError::RadiusRange);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub colors: [Rgb; 3],
    /// Seconds of elapsed time per noise unit; higher is slower drift.
    pub time_scale: f32,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            colors: [
                Rgb::new(0x52, 0x27, 0xFF),
                Rgb::new(0xFF, 0x9F, 0xFC),
                Rgb::new(0xB1, 0x9E, 0xEF),
            ],
            time_scale: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Half-size of the cube nodes bounce inside.
    pub bounds: f32,
    pub field: FieldConfig,
    pub spin: f32,
    pub smoothing: f32,
    pub camera_distance: f32,
    pub camera_pan: f32,
    pub color_gain: f32,
    pub speed_gain: f32,
    pub node_color: Rgb,
    pub edge_color: Rgb,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            bounds: 40.0,
            field: FieldConfig {
                count: 60,
                connection_distance: 15.0,
                max_speed: 0.2,
                radius_range: [0.4, 0.8],
                pointer_links: false,
                ..FieldConfig::default()
            },
            spin: 0.01,
            smoothing: 0.05,
            camera_distance: 80.0,
            camera_pan: 20.0,
            color_gain: 1.5,
            speed_gain: 3.0,
            node_color: Rgb::new(0x00, 0xF3, 0xFF),
            edge_color: Rgb::new(0x52, 0x27, 0xFF),
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_default() {
        let config = AppConfig::from_json("  ").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.field.count, 100);
    }

    #[test]
    fn partial_overrides_keep_other_defaults() {
        let config = AppConfig::from_json(
            r#"{"variant":"graph","field":{"count":60,"repulsion":"position"}}"#,
        )
        .unwrap();
        assert_eq!(config.variant, Variant::Graph);
        assert_eq!(config.field.count, 60);
        assert_eq!(config.field.repulsion, Repulsion::Position);
        assert_eq!(config.field.connection_distance, 150.0);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            AppConfig::from_json(r#"{"field":{"connection_distance":0}}"#),
            Err(ConfigError::NotPositive { .. })
        ));
        assert!(matches!(
            AppConfig::from_json(r#"{"field":{"palette":[]}}"#),
            Err(ConfigError::EmptyPalette)
        ));
        assert!(matches!(
            AppConfig::from_json(r##"{"field":{"palette":["#12"]}}"##),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let config = AppConfig {
            log_level: "chatty".into(),
            ..AppConfig::default()
        };
        assert_eq!(config.log_level(), log::Level::Info);
    }
}
