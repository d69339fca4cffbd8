use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// World file path for an image: `.jgw` for JPEG, `.tfw` for TIFF, `.pgw` for PNG,
/// `.wld` otherwise.
pub fn world_file_path(output_image: &Path) -> PathBuf {
    let ext = output_image
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let world_ext = match ext.as_str() {
        "jpg" | "jpeg" => "jgw",
        "png" => "pgw",
        "tif" | "tiff" => "tfw",
        _ => "wld",
    };
    output_image.with_extension(world_ext)
}

/// Write a world file next to the raster image using the provided geotransform.
/// The world file stores the transform in pixel-center convention.
pub fn write_world_file(output_image: &Path, geotransform: [f64; 6]) -> Result<PathBuf> {
    let world_path = world_file_path(output_image);

    // A: pixel size in X, D: rotation about Y, B: rotation about X, E: pixel size Y
    // C, F: center of upper-left pixel
    let a = geotransform[1];
    let d = geotransform[4];
    let b = geotransform[2];
    let e = geotransform[5];
    let c = geotransform[0] + 0.5 * a + 0.5 * b;
    let f = geotransform[3] + 0.5 * d + 0.5 * e;

    let mut file = BufWriter::new(File::create(&world_path)?);
    for v in [a, d, b, e, c, f] {
        writeln!(file, "{:.12}", v)?;
    }
    file.flush()?;

    Ok(world_path)
}

/// Write a .prj file with the provided projection (WKT or EPSG:XXXX)
pub fn write_prj_file(output_image: &Path, projection: &str) -> Result<PathBuf> {
    let prj_path = output_image.with_extension("prj");
    std::fs::write(&prj_path, projection.as_bytes())?;
    Ok(prj_path)
}
