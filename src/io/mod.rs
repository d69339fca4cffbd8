//! I/O layer: fetching band files (`fetch`), GDAL-backed raster reading and
//! bounds reprojection (`gdal`), and `writers` for JPEG/TIFF outputs and
//! metadata embedding/sidecars.
pub mod fetch;
pub use fetch::{FetchConfig, FetchError, Fetcher, SceneSource};

pub mod gdal;
pub use gdal::{GdalError, RasterMetadata, RasterReader};

pub mod writers;
