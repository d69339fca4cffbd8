use ndarray::{Array3, ArrayView2, Axis};
use thiserror::Error;

/// Raised when the three stretched bands do not share one shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("band shapes differ: red {red:?}, green {green:?}, blue {blue:?}")]
pub struct ShapeMismatch {
    pub red: (usize, usize),
    pub green: (usize, usize),
    pub blue: (usize, usize),
}

/// Stack red, green and blue along a trailing channel axis of size 3.
/// Shapes must match exactly; nothing is cropped or padded.
pub fn compose(
    red: ArrayView2<'_, u8>,
    green: ArrayView2<'_, u8>,
    blue: ArrayView2<'_, u8>,
) -> Result<Array3<u8>, ShapeMismatch> {
    if red.dim() != green.dim() || red.dim() != blue.dim() {
        return Err(ShapeMismatch {
            red: red.dim(),
            green: green.dim(),
            blue: blue.dim(),
        });
    }

    let (rows, cols) = red.dim();
    let mut rgb = Array3::<u8>::zeros((rows, cols, 3));
    for (channel, band) in [red.view(), green.view(), blue.view()].iter().enumerate() {
        rgb.index_axis_mut(Axis(2), channel).assign(band);
    }
    Ok(rgb)
}

/// Interleaved RGB bytes (row-major, `RGBRGB...`) of a composite.
pub fn interleaved(rgb: &Array3<u8>) -> Vec<u8> {
    rgb.as_standard_layout().iter().copied().collect()
}
