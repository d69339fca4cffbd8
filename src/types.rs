//! Shared types and enums used across the crate.
//! Includes the true-color `Band` identifiers, `OutputFormat`, and the
//! geodetic footprint `GeoBounds` threaded from the reader to the map renderer.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One of the three spectral bands of a true-color composite.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Red,
    Green,
    Blue,
}

impl Band {
    /// Composite channel order (R, G, B).
    pub const ALL: [Band; 3] = [Band::Red, Band::Green, Band::Blue];

    /// Landsat 8 OLI band number carrying this colour.
    pub fn landsat8_band_number(self) -> u8 {
        match self {
            Band::Red => 4,
            Band::Green => 3,
            Band::Blue => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Band::Red => "red",
            Band::Green => "green",
            Band::Blue => "blue",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    /// 8-bit RGB JPEG with world file and JSON sidecar
    Jpeg,
    /// 3-band georeferenced GeoTIFF
    Tiff,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Tiff => "tif",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Jpeg => write!(f, "JPEG"),
            OutputFormat::Tiff => write!(f, "TIFF"),
        }
    }
}

/// Bounding box in a geodetic frame: (min_lon, min_lat, max_lon, max_lat).
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    pub fn from_array(b: [f64; 4]) -> Self {
        Self {
            min_lon: b[0],
            min_lat: b[1],
            max_lon: b[2],
            max_lat: b[3],
        }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }

    /// Closed outline ring, clockwise in lon/lat from the lower-left corner.
    pub fn outline(self) -> [(f64, f64); 5] {
        [
            (self.min_lon, self.min_lat),
            (self.min_lon, self.max_lat),
            (self.max_lon, self.max_lat),
            (self.max_lon, self.min_lat),
            (self.min_lon, self.min_lat),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_order_and_numbers() {
        let numbers: Vec<u8> = Band::ALL.iter().map(|b| b.landsat8_band_number()).collect();
        assert_eq!(numbers, vec![4, 3, 2]);
        assert_eq!(Band::Green.to_string(), "green");
    }

    #[test]
    fn bounds_outline_is_closed() {
        let b = GeoBounds::from_array([139.0, 35.0, 141.5, 37.2]);
        let ring = b.outline();
        assert_eq!(ring[0], ring[4]);
        assert_eq!(ring[2], (141.5, 37.2));
        assert_eq!(b.to_array(), [139.0, 35.0, 141.5, 37.2]);
    }

    #[test]
    fn bounds_outline_winds_clockwise() {
        let ring = GeoBounds::from_array([0.0, 0.0, 2.0, 1.0]).outline();
        let twice_area: f64 = ring.windows(2).map(|w| w[0].0 * w[1].1 - w[1].0 * w[0].1).sum();
        // negative shoelace area => clockwise with lat pointing up
        assert_eq!(twice_area, -4.0);
    }
}
