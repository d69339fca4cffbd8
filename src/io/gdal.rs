use gdal::Dataset;
use gdal::errors::GdalError as GdalCrateError;
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use ndarray::Array2;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::types::GeoBounds;

/// EPSG code of the geodetic frame used for mapping (WGS 84 longitude/latitude)
pub const GEODETIC_EPSG: u32 = 4326;

/// Errors encountered when using GDAL reader
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Dimension mismatch: expected {0}x{1}, got {2} samples")]
    DimensionMismatch(usize, usize, usize),
}

/// Metadata extracted from a GDAL-supported raster
#[derive(Debug, Clone)]
pub struct RasterMetadata {
    pub path: PathBuf,
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Number of raster bands
    pub bands: usize,
    /// Affine geotransform coefficients ([origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height])
    pub geotransform: [f64; 6],
    /// Projection as `EPSG:XXXX` when an authority code is present, WKT otherwise
    pub projection: String,
    /// Full projection WKT
    pub wkt: String,
    /// Nodata value declared by the first band, if any
    pub nodata: Option<f64>,
}

/// Reader for single-band georeferenced rasters (e.g. Landsat GeoTIFF bands)
pub struct RasterReader {
    pub dataset: Dataset,
    pub metadata: RasterMetadata,
}

// Helper to extract EPSG code from WKT authority tag
fn parse_epsg(wkt: &str) -> Option<String> {
    const KEY: &str = "AUTHORITY[\"EPSG\",\"";
    if let Some(idx) = wkt.rfind(KEY) {
        let start = idx + KEY.len();
        if let Some(end) = wkt[start..].find('"') {
            let code = &wkt[start..start + end];
            return Some(format!("EPSG:{}", code));
        }
    }
    None
}

/// Copy of `srs` with (x, y) = (easting/longitude, northing/latitude) axis order.
fn traditional_axis_order(srs: &SpatialRef) -> SpatialRef {
    let mut srs = srs.clone();
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    srs
}

/// Bounds (min_x, min_y, max_x, max_y) covered by a raster of `size_x` by `size_y` pixels.
pub fn bounds_from_geotransform(gt: [f64; 6], size_x: usize, size_y: usize) -> [f64; 4] {
    let corners = [(0.0, 0.0), (size_x as f64, 0.0), (0.0, size_y as f64), (size_x as f64, size_y as f64)];
    let mut b = [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY];
    for (px, py) in corners {
        let x = gt[0] + px * gt[1] + py * gt[2];
        let y = gt[3] + px * gt[4] + py * gt[5];
        b[0] = b[0].min(x);
        b[1] = b[1].min(y);
        b[2] = b[2].max(x);
        b[3] = b[3].max(y);
    }
    b
}

/// Reproject a bounding box between coordinate systems, densifying the edges.
pub fn reproject_bounds(
    bounds: [f64; 4],
    from: &SpatialRef,
    to: &SpatialRef,
) -> Result<[f64; 4], GdalError> {
    let from = traditional_axis_order(from);
    let to = traditional_axis_order(to);
    let transform = CoordTransform::new(&from, &to)?;
    let out = transform.transform_bounds(&bounds, 21)?;
    debug!("Reprojected bounds {:?} -> {:?}", bounds, out);
    Ok(out)
}

impl RasterReader {
    /// Open a GDAL-supported raster (GeoTIFF for Landsat bands)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GdalError> {
        let dataset = Dataset::open(path.as_ref())?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(GdalError::UnsupportedFormat("No raster bands found".into()));
        }
        let geotransform = match dataset.geo_transform() {
            Ok(gt) => gt,
            Err(_) => [0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        };
        let wkt = dataset.projection();
        let projection = if wkt.starts_with("EPSG:") {
            wkt.clone()
        } else if let Some(code) = parse_epsg(&wkt) {
            code
        } else {
            wkt.clone()
        };
        let nodata = dataset.rasterband(1)?.no_data_value();
        debug!(
            "Opened {:?}: {}x{} px, {} band(s), projection {}, nodata {:?}",
            path.as_ref(),
            size_x,
            size_y,
            bands,
            projection,
            nodata
        );
        Ok(RasterReader {
            dataset,
            metadata: RasterMetadata {
                path: path.as_ref().to_path_buf(),
                size_x,
                size_y,
                bands,
                geotransform,
                projection,
                wkt,
                nodata,
            },
        })
    }

    /// Read a single band (1-based index) as an f64 ndarray of shape (height, width)
    pub fn read_band(&self, index: usize) -> Result<Array2<f64>, GdalError> {
        if index == 0 || index > self.metadata.bands {
            return Err(GdalError::UnsupportedFormat(format!(
                "Band index {} out of range",
                index
            )));
        }
        let band = self.dataset.rasterband(index)?;
        let window = (self.metadata.size_x, self.metadata.size_y);
        let buf = band.read_as::<f64>((0, 0), window, window, None)?;
        let data_vec = buf.data().to_vec();
        let len = data_vec.len();
        Array2::from_shape_vec((self.metadata.size_y, self.metadata.size_x), data_vec).map_err(|_| {
            GdalError::DimensionMismatch(self.metadata.size_x, self.metadata.size_y, len)
        })
    }

    /// Footprint in the raster's own coordinate system: (min_x, min_y, max_x, max_y)
    pub fn native_bounds(&self) -> [f64; 4] {
        bounds_from_geotransform(
            self.metadata.geotransform,
            self.metadata.size_x,
            self.metadata.size_y,
        )
    }

    pub fn spatial_ref(&self) -> Result<SpatialRef, GdalError> {
        Ok(self.dataset.spatial_ref()?)
    }

    /// Footprint reprojected to geodetic longitude/latitude
    pub fn geodetic_bounds(&self) -> Result<GeoBounds, GdalError> {
        let from = self.spatial_ref()?;
        let to = SpatialRef::from_epsg(GEODETIC_EPSG)?;
        let b = reproject_bounds(self.native_bounds(), &from, &to)?;
        Ok(GeoBounds::from_array(b))
    }
}
