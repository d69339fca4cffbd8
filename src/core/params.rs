use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::types::Band;

/// Percentile window and optional power-law remap for one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StretchParams {
    pub min_percentile: f64,
    pub max_percentile: f64,
    /// Normalized values are raised to `1 / power_scale`; `None` keeps the stretch linear
    #[serde(default)]
    pub power_scale: Option<f64>,
}

impl StretchParams {
    pub fn new(min_percentile: f64, max_percentile: f64, power_scale: Option<f64>) -> Self {
        Self {
            min_percentile,
            max_percentile,
            power_scale,
        }
    }

    pub fn linear(min_percentile: f64, max_percentile: f64) -> Self {
        Self::new(min_percentile, max_percentile, None)
    }
}

/// Stretch parameters for a full true-color run, suitable for preset files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrueColorParams {
    pub red: StretchParams,
    pub green: StretchParams,
    pub blue: StretchParams,
    /// Background value shared by all three bands
    pub nodata: f64,
}

impl Default for TrueColorParams {
    fn default() -> Self {
        Self {
            red: StretchParams::new(1.0, 99.0, Some(1.1)),
            green: StretchParams::new(1.0, 99.0, Some(1.4)),
            blue: StretchParams::new(5.0, 99.0, Some(2.0)),
            nodata: 0.0,
        }
    }
}

impl TrueColorParams {
    /// Build from per-band triples ordered (red, green, blue)
    pub fn from_triples(
        min_percentiles: [f64; 3],
        max_percentiles: [f64; 3],
        power_scales: [Option<f64>; 3],
        nodata: f64,
    ) -> Self {
        let band = |i: usize| StretchParams::new(min_percentiles[i], max_percentiles[i], power_scales[i]);
        Self {
            red: band(0),
            green: band(1),
            blue: band(2),
            nodata,
        }
    }

    pub fn for_band(&self, band: Band) -> &StretchParams {
        match band {
            Band::Red => &self.red,
            Band::Green => &self.green,
            Band::Blue => &self.blue,
        }
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let params: TrueColorParams = serde_json::from_str(&json)?;
        info!("Loaded stretch preset from {:?}", path);
        Ok(params)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!("Saved stretch preset to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_tool() {
        let p = TrueColorParams::default();
        assert_eq!(p.for_band(Band::Red).min_percentile, 1.0);
        assert_eq!(p.for_band(Band::Blue).min_percentile, 5.0);
        assert_eq!(p.for_band(Band::Green).max_percentile, 99.0);
        assert_eq!(p.for_band(Band::Blue).power_scale, Some(2.0));
        assert_eq!(p.nodata, 0.0);
    }

    #[test]
    fn preset_survives_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preset.json");
        let params = TrueColorParams::from_triples(
            [2.0, 2.0, 3.0],
            [98.0, 97.0, 96.0],
            [None, Some(1.5), None],
            -1.0,
        );
        params.save_json(&path).unwrap();
        let loaded = TrueColorParams::load_json(&path).unwrap();
        assert_eq!(loaded, params);
    }

    #[test]
    fn missing_power_scale_defaults_to_linear() {
        let json = r#"{
            "red": {"min_percentile": 1.0, "max_percentile": 99.0},
            "green": {"min_percentile": 1.0, "max_percentile": 99.0, "power_scale": 1.4},
            "blue": {"min_percentile": 5.0, "max_percentile": 99.0, "power_scale": null},
            "nodata": 0.0
        }"#;
        let p: TrueColorParams = serde_json::from_str(json).unwrap();
        assert_eq!(p.red.power_scale, None);
        assert_eq!(p.green.power_scale, Some(1.4));
        assert_eq!(p.blue.power_scale, None);
    }
}
