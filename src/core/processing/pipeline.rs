use std::collections::BTreeMap;

use ndarray::{Array3, ArrayView2};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::core::params::TrueColorParams;
use crate::core::processing::composite::compose;
use crate::core::processing::stretch::{StretchStats, StretchedBand, stretch_with_stats};
use crate::error::{Error, Result};
use crate::types::Band;

/// Stretched composite together with the window used for each band.
#[derive(Debug, Clone)]
pub struct TrueColorComposite {
    /// Shape (rows, cols, 3), channel order R, G, B
    pub rgb: Array3<u8>,
    pub stats: BTreeMap<Band, StretchStats>,
}

impl TrueColorComposite {
    pub fn rows(&self) -> usize {
        self.rgb.dim().0
    }

    pub fn cols(&self) -> usize {
        self.rgb.dim().1
    }
}

/// Stretch the three bands independently (in parallel) and stack them into RGB.
/// The first failing band aborts the whole composite.
pub fn stretch_truecolor(
    red: ArrayView2<'_, f64>,
    green: ArrayView2<'_, f64>,
    blue: ArrayView2<'_, f64>,
    params: &TrueColorParams,
) -> Result<TrueColorComposite> {
    info!("Computing true color image...");
    let inputs = [
        (Band::Red, red.view()),
        (Band::Green, green.view()),
        (Band::Blue, blue.view()),
    ];

    let stretched: Vec<(Band, StretchedBand)> = inputs
        .into_par_iter()
        .map(|(band, data)| {
            let p = params.for_band(band);
            debug!(
                "Stretching band {} with min_percentile {} max_percentile {} and power scale {:?}",
                band, p.min_percentile, p.max_percentile, p.power_scale
            );
            stretch_with_stats(data, p, params.nodata)
                .map(|s| (band, s))
                .map_err(|e| Error::stretch(band, e))
        })
        .collect::<Result<Vec<_>>>()?;

    let rgb = compose(
        stretched[0].1.data.view(),
        stretched[1].1.data.view(),
        stretched[2].1.data.view(),
    )?;
    let stats = stretched.iter().map(|(band, s)| (*band, s.stats)).collect();

    Ok(TrueColorComposite { rgb, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::processing::stretch::StretchError;
    use ndarray::{Array2, array};

    #[test]
    fn composes_three_stretched_bands() {
        let red = array![[0.0, 10.0, 20.0, 30.0]];
        let green = array![[0.0, 30.0, 20.0, 10.0]];
        let blue = array![[0.0, 5.0, 5.0, 15.0]];
        let params = TrueColorParams::from_triples([0.0; 3], [100.0; 3], [None; 3], 0.0);
        let out = stretch_truecolor(red.view(), green.view(), blue.view(), &params).unwrap();
        assert_eq!(out.rgb.dim(), (1, 4, 3));
        assert_eq!(out.rgb[[0, 3, 0]], 255);
        assert_eq!(out.rgb[[0, 3, 1]], 0);
        assert_eq!(out.rgb[[0, 3, 2]], 255);
        assert_eq!(out.rgb[[0, 0, 0]], 0);
        assert_eq!(out.stats[&Band::Green].band_max, 30.0);
    }

    #[test]
    fn failing_band_is_reported_by_name() {
        let ok = array![[1.0, 2.0, 3.0]];
        let empty = Array2::<f64>::zeros((1, 3));
        let params = TrueColorParams::default();
        let err = stretch_truecolor(ok.view(), empty.view(), ok.view(), &params).unwrap_err();
        match err {
            Error::Stretch { band, source } => {
                assert_eq!(band, Band::Green);
                assert_eq!(source, StretchError::EmptyValidRegion);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn band_shapes_must_agree() {
        let a = Array2::from_shape_fn((4, 4), |(i, j)| (i * 4 + j + 1) as f64);
        let b = Array2::from_shape_fn((4, 5), |(i, j)| (i * 5 + j + 1) as f64);
        let params = TrueColorParams::default();
        let err = stretch_truecolor(a.view(), a.view(), b.view(), &params).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }
}
