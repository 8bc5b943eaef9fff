use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::genetic::GeneticConfig;
use crate::types::{Border, Economics, Obstacle, OrientationMode, PanelSpec, RoofPlane, Side};

/// Which placement strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Lattice, obstacle mask and gap fill over all nine alignments.
    #[default]
    Grid,
    /// Slot permutation search.
    Genetic,
}

/// Complete input of one run. Every field has a default so a JSON file only
/// needs to name what differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub roof_left: RoofPlane,
    pub roof_right: Option<RoofPlane>,
    pub border: f64,
    pub panel: PanelSpec,
    pub orientation: OrientationMode,
    pub strategy: Strategy,
    pub obstacles: Vec<Obstacle>,
    pub genetic: GeneticConfig,
    pub economics: Economics,
}

impl Default for Config {
    fn default() -> Self {
        let roof = RoofPlane::new(5500.0, 20000.0);
        Self {
            roof_left: roof,
            roof_right: Some(roof),
            border: 300.0,
            panel: PanelSpec::default(),
            orientation: OrientationMode::Auto,
            strategy: Strategy::Grid,
            obstacles: Vec::new(),
            genetic: GeneticConfig::default(),
            economics: Economics::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Validated config from already parsed JSON. An unknown orientation
    /// name is reported as [`Error::InvalidOrientation`], not as a parse error.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if let Some(name) = value.get("orientation").and_then(|v| v.as_str()) {
            name.parse::<OrientationMode>()?;
        }
        let config: Config = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn border(&self) -> Border {
        Border::uniform(self.border)
    }

    /// Roof planes present in this run, left first.
    pub fn sides(&self) -> Vec<(Side, RoofPlane)> {
        let mut sides = vec![(Side::Left, self.roof_left)];
        if let Some(right) = self.roof_right {
            sides.push((Side::Right, right));
        }
        sides
    }

    pub fn obstacles_for(&self, side: Side) -> Vec<Obstacle> {
        self.obstacles
            .iter()
            .filter(|o| o.side == side)
            .copied()
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        for (side, roof) in self.sides() {
            if roof.width <= 0.0 || roof.length <= 0.0 {
                return Err(Error::Config(format!(
                    "roof {side} dimensions must be positive, got {roof}"
                )));
            }
        }
        if self.border < 0.0 {
            return Err(Error::Config("border must not be negative".to_string()));
        }
        let p = &self.panel;
        if p.width <= 0.0 || p.height <= 0.0 {
            return Err(Error::Config(format!(
                "panel dimensions must be positive, got {}x{}",
                p.width, p.height
            )));
        }
        if p.gap_x < 0.0 || p.gap_y < 0.0 || p.clamp_margin < 0.0 {
            return Err(Error::Config(
                "panel gaps and clamp margin must not be negative".to_string(),
            ));
        }
        for ob in &self.obstacles {
            if ob.w <= 0.0 || ob.h <= 0.0 || ob.clearance < 0.0 {
                return Err(Error::Config(format!(
                    "obstacle {} at ({}, {}) needs positive size and non-negative clearance",
                    ob.kind.name(),
                    ob.x,
                    ob.y
                )));
            }
            if ob.side == Side::Right && self.roof_right.is_none() {
                return Err(Error::Config(
                    "obstacle on the right side but no right roof configured".to_string(),
                ));
            }
        }

        self.genetic.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObstacleKind;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sides().len(), 2);
        assert_eq!(config.border(), Border::uniform(300.0));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json(
            r#"{
                "roof_right": null,
                "border": 250,
                "orientation": "portrait",
                "obstacles": [
                    {"side": "L", "x": 5000, "y": 2870, "w": 780, "h": 1180,
                     "clearance": 100, "kind": {"type": "window"}}
                ],
                "genetic": {"seed": 9}
            }"#,
        )
        .unwrap();
        assert_eq!(config.border, 250.0);
        assert_eq!(config.orientation, OrientationMode::Portrait);
        assert_eq!(config.sides().len(), 1);
        assert_eq!(config.panel, PanelSpec::default());
        assert_eq!(config.genetic.seed, Some(9));
        assert_eq!(config.genetic.population_size, 30);
        assert_eq!(config.obstacles_for(Side::Left).len(), 1);
        assert_eq!(config.obstacles[0].kind, ObstacleKind::window());
        assert!(config.obstacles_for(Side::Right).is_empty());
    }

    #[test]
    fn test_unknown_orientation_is_rejected() {
        let err = Config::from_json(r#"{"orientation": "diagonal"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidOrientation(s) if s == "diagonal"));

        let value = serde_json::json!({"border": 200, "orientation": "sideways"});
        assert!(matches!(
            Config::from_value(value),
            Err(Error::InvalidOrientation(s)) if s == "sideways"
        ));
    }

    #[test]
    fn test_orientation_deserializes_through_from_str() {
        let mode: OrientationMode = serde_json::from_str(r#""landscape""#).unwrap();
        assert_eq!(mode, OrientationMode::Landscape);
        let err = serde_json::from_str::<OrientationMode>(r#""diagonal""#).unwrap_err();
        assert!(err.to_string().contains("invalid orientation 'diagonal'"));
        assert_eq!(
            serde_json::to_string(&OrientationMode::Portrait).unwrap(),
            r#""portrait""#
        );
    }

    #[test]
    fn test_non_string_orientation_is_a_parse_error() {
        let err = Config::from_json(r#"{"orientation": 3}"#).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_semantic_checks() {
        let mut config = Config::default();
        config.panel.width = 0.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.genetic.elite_count = 50;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.roof_right = None;
        config.obstacles = vec![Obstacle::new(Side::Right, 0.0, 0.0, 10.0, 10.0)];
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.genetic.mutation_rate = 1.8;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
