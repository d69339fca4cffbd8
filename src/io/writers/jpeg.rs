use jpeg_encoder::{ColorType, Encoder};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::{Error, Result};

pub const DEFAULT_QUALITY: u8 = 100;

fn dims_u16(cols: usize, rows: usize) -> Result<(u16, u16)> {
    match (u16::try_from(cols), u16::try_from(rows)) {
        (Ok(c), Ok(r)) => Ok((c, r)),
        _ => Err(Error::Encode(format!(
            "{}x{} exceeds the JPEG size limit of 65535x65535",
            cols, rows
        ))),
    }
}

/// Write interleaved 8-bit RGB samples as a baseline JPEG
pub fn write_rgb_jpeg(
    output: &Path,
    cols: usize,
    rows: usize,
    rgb_data: &[u8],
    quality: u8,
) -> Result<()> {
    let (c, r) = dims_u16(cols, rows)?;
    if rgb_data.len() != cols * rows * 3 {
        return Err(Error::Encode(format!(
            "expected {} RGB bytes for {}x{}, got {}",
            cols * rows * 3,
            cols,
            rows,
            rgb_data.len()
        )));
    }
    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    let encoder = Encoder::new(&mut writer, quality);
    encoder
        .encode(rgb_data, c, r, ColorType::Rgb)
        .map_err(Error::encode)?;
    Ok(())
}
