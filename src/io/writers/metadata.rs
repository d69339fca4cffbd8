use gdal::Dataset;
use gdal::Metadata;
use gdal::spatial_ref::SpatialRef;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::params::{StretchParams, TrueColorParams};
use crate::core::processing::stretch::StretchStats;
use crate::error::Result;
use crate::io::GdalError;
use crate::types::{Band, GeoBounds};

/// Per-band record of what was read and how it was stretched
#[derive(Debug, Clone, Serialize)]
pub struct BandMetadata {
    pub source: PathBuf,
    #[serde(flatten)]
    pub params: StretchParams,
    #[serde(flatten)]
    pub stats: StretchStats,
}

/// Everything needed to reproduce or georeference a composite
#[derive(Debug, Clone, Serialize)]
pub struct CompositeMetadata {
    pub width: usize,
    pub height: usize,
    pub nodata: f64,
    pub bands: BTreeMap<Band, BandMetadata>,
    /// Geodetic footprint (min_lon, min_lat, max_lon, max_lat)
    pub bounds: GeoBounds,
    pub crs: String,
    pub geotransform: [f64; 6],
    pub created: String,
}

impl CompositeMetadata {
    pub fn new(
        width: usize,
        height: usize,
        params: &TrueColorParams,
        sources: &BTreeMap<Band, PathBuf>,
        stats: &BTreeMap<Band, StretchStats>,
        bounds: GeoBounds,
        crs: String,
        geotransform: [f64; 6],
    ) -> Self {
        let bands = Band::ALL
            .iter()
            .filter_map(|&band| {
                let stats = stats.get(&band)?;
                Some((
                    band,
                    BandMetadata {
                        source: sources.get(&band).cloned().unwrap_or_default(),
                        params: *params.for_band(band),
                        stats: *stats,
                    },
                ))
            })
            .collect();
        Self {
            width,
            height,
            nodata: params.nodata,
            bands,
            bounds,
            crs,
            geotransform,
            created: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Flat `KEY=value` items for GDAL metadata
    pub fn to_items(&self) -> BTreeMap<String, String> {
        let mut items = BTreeMap::new();
        items.insert("NODATA_VALUE".to_string(), self.nodata.to_string());
        items.insert("CREATED".to_string(), self.created.clone());
        items.insert(
            "GEODETIC_BOUNDS".to_string(),
            self.bounds
                .to_array()
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(","),
        );
        for (band, meta) in &self.bands {
            let prefix = band.as_str().to_ascii_uppercase();
            items.insert(format!("{prefix}_SOURCE"), meta.source.display().to_string());
            items.insert(format!("{prefix}_MIN_PERCENTILE"), meta.params.min_percentile.to_string());
            items.insert(format!("{prefix}_MAX_PERCENTILE"), meta.params.max_percentile.to_string());
            items.insert(
                format!("{prefix}_POWER_SCALE"),
                meta.params
                    .power_scale
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            );
            items.insert(format!("{prefix}_BAND_MIN"), meta.stats.band_min.to_string());
            items.insert(format!("{prefix}_BAND_MAX"), meta.stats.band_max.to_string());
            items.insert(format!("{prefix}_VALID_PIXELS"), meta.stats.valid_count.to_string());
        }
        items
    }
}

/// Attach georeferencing and metadata items to a written GeoTIFF
pub fn embed_tiff_metadata(ds: &mut Dataset, meta: &CompositeMetadata) -> Result<()> {
    let is_identity = |gt: [f64; 6]| gt == [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

    // Only set projection if we also set a non-identity geotransform
    if !is_identity(meta.geotransform) {
        ds.set_geo_transform(&meta.geotransform).map_err(GdalError::from)?;
        if !meta.crs.is_empty() {
            let srs = SpatialRef::from_definition(&meta.crs).map_err(GdalError::from)?;
            ds.set_spatial_ref(&srs).map_err(GdalError::from)?;
        }
    }

    for (key, value) in meta.to_items() {
        ds.set_metadata_item(&key, &value, "").map_err(GdalError::from)?;
    }
    Ok(())
}

/// Write the metadata as a pretty JSON sidecar next to `output_path`
pub fn write_json_sidecar(output_path: &Path, meta: &CompositeMetadata) -> Result<PathBuf> {
    let sidecar_path = output_path.with_extension("json");
    let json_string = serde_json::to_string_pretty(meta)?;
    std::fs::write(&sidecar_path, json_string)?;
    info!("Created metadata sidecar: {:?}", sidecar_path);
    Ok(sidecar_path)
}
