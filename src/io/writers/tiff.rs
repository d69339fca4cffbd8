use gdal::Dataset;
use gdal::DriverManager;
use gdal::raster::{Buffer, ColorInterpretation};
use ndarray::{Array3, Axis};
use std::path::Path;

use crate::error::Result;
use crate::io::GdalError;

/// Write an (rows, cols, 3) composite as a 3-band 8-bit GeoTIFF with
/// red/green/blue colour interpretation. The dataset is returned open so
/// georeferencing and metadata can be attached before it is flushed.
pub fn write_tiff_rgb_u8(output: &Path, rgb: &Array3<u8>) -> Result<Dataset> {
    let (rows, cols, _) = rgb.dim();
    let driver = DriverManager::get_driver_by_name("GTiff").map_err(GdalError::from)?;
    let ds = driver
        .create_with_band_type::<u8, _>(output, cols, rows, 3)
        .map_err(GdalError::from)?;

    let interpretations = [
        ColorInterpretation::RedBand,
        ColorInterpretation::GreenBand,
        ColorInterpretation::BlueBand,
    ];
    for (channel, interp) in interpretations.into_iter().enumerate() {
        let mut band = ds.rasterband(channel + 1).map_err(GdalError::from)?;
        band.set_color_interpretation(interp)
            .map_err(GdalError::from)?;
        let samples: Vec<u8> = rgb.index_axis(Axis(2), channel).iter().copied().collect();
        let mut buf = Buffer::new((cols, rows), samples);
        band.write((0, 0), (cols, rows), &mut buf)
            .map_err(GdalError::from)?;
    }

    Ok(ds)
}
