//! Output writers: RGB JPEG, 3-band GeoTIFF, world/projection files and
//! run metadata (embedded in TIFF or written as a JSON sidecar).
pub mod jpeg;
pub mod metadata;
pub mod tiff;
pub mod worldfile;
