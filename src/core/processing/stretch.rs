//! Percentile contrast stretch of a single band to 8 bits.
//!
//! Samples equal to the nodata sentinel are masked out, the remaining values are
//! clipped to the `[min_percentile, max_percentile]` window computed over the valid
//! samples only, normalized to `0..1`, optionally raised to `1 / power_scale`, and
//! scaled by 255. The byte conversion truncates toward zero; masked positions are 0.
use ndarray::{Array2, ArrayView2};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::core::params::StretchParams;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StretchError {
    #[error("every sample equals the nodata value; percentiles are undefined over an empty valid region")]
    EmptyValidRegion,

    #[error("degenerate stretch range: band_min == band_max == {value}")]
    DegenerateRange { value: f64 },

    #[error("invalid percentiles min={min}, max={max}: expected 0 <= min <= max <= 100")]
    InvalidPercentiles { min: f64, max: f64 },

    #[error("power scale must be positive and finite, got {0}")]
    InvalidPowerScale(f64),
}

/// Statistics computed while stretching one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StretchStats {
    /// Value at `min_percentile` over the valid samples
    pub band_min: f64,
    /// Value at `max_percentile` over the valid samples
    pub band_max: f64,
    pub valid_count: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone)]
pub struct StretchedBand {
    pub data: Array2<u8>,
    pub stats: StretchStats,
}

/// Percentile over ascending `sorted` values using linear interpolation between
/// order statistics at rank `q / 100 * (n - 1)`. Returns `None` for an empty slice.
pub fn percentile_of_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let rank = q / 100.0 * (n - 1) as f64;
    let lo = (rank.floor() as usize).min(n - 1);
    let hi = (rank.ceil() as usize).min(n - 1);
    let t = rank - lo as f64;
    Some(lerp(sorted[lo], sorted[hi], t))
}

// Interpolates from the nearer endpoint so t == 1 returns `b` exactly.
#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let diff = b - a;
    if t >= 0.5 { b - diff * (1.0 - t) } else { a + diff * t }
}

fn validate(params: &StretchParams) -> Result<(), StretchError> {
    let (min, max) = (params.min_percentile, params.max_percentile);
    let in_range = |p: f64| (0.0..=100.0).contains(&p);
    if !in_range(min) || !in_range(max) || min > max {
        return Err(StretchError::InvalidPercentiles { min, max });
    }
    if let Some(power) = params.power_scale {
        if !(power.is_finite() && power > 0.0) {
            return Err(StretchError::InvalidPowerScale(power));
        }
    }
    Ok(())
}

#[inline]
fn is_valid<T>(v: T, nodata: T) -> bool
where
    T: Copy + PartialEq + Into<f64>,
{
    // NaN never equals the sentinel but must not reach the percentile sort
    v != nodata && !Into::<f64>::into(v).is_nan()
}

/// Stretch `band` to 8 bits and report the percentile window that was used.
pub fn stretch_with_stats<T>(
    band: ArrayView2<'_, T>,
    params: &StretchParams,
    nodata: T,
) -> Result<StretchedBand, StretchError>
where
    T: Copy + PartialEq + Into<f64>,
{
    validate(params)?;

    let mut valid: Vec<f64> = band
        .iter()
        .copied()
        .filter(|&v| is_valid(v, nodata))
        .map(Into::<f64>::into)
        .collect();
    if valid.is_empty() {
        return Err(StretchError::EmptyValidRegion);
    }
    valid.sort_unstable_by(f64::total_cmp);

    let band_min =
        percentile_of_sorted(&valid, params.min_percentile).ok_or(StretchError::EmptyValidRegion)?;
    let band_max =
        percentile_of_sorted(&valid, params.max_percentile).ok_or(StretchError::EmptyValidRegion)?;

    debug!(
        "Stretch window: p{}={:.3}, p{}={:.3}, valid={}/{}",
        params.min_percentile,
        band_min,
        params.max_percentile,
        band_max,
        valid.len(),
        band.len()
    );

    if band_max == band_min {
        return Err(StretchError::DegenerateRange { value: band_min });
    }

    let range = band_max - band_min;
    let exponent = params.power_scale.map(|p| 1.0 / p);

    let data = band.mapv(|v| {
        if !is_valid(v, nodata) {
            return 0u8;
        }
        let clipped = Into::<f64>::into(v).max(band_min).min(band_max);
        let mut normalized = (clipped - band_min) / range;
        if let Some(e) = exponent {
            normalized = normalized.powf(e);
        }
        // `as` saturates and truncates toward zero
        (normalized * 255.0) as u8
    });

    Ok(StretchedBand {
        data,
        stats: StretchStats {
            band_min,
            band_max,
            valid_count: valid.len(),
            total_count: band.len(),
        },
    })
}

/// Stretch one band's raw samples into an 8-bit array of the same shape.
pub fn stretch<T>(
    band: ArrayView2<'_, T>,
    min_percentile: f64,
    max_percentile: f64,
    power_scale: Option<f64>,
    nodata_value: T,
) -> Result<Array2<u8>, StretchError>
where
    T: Copy + PartialEq + Into<f64>,
{
    let params = StretchParams::new(min_percentile, max_percentile, power_scale);
    stretch_with_stats(band, &params, nodata_value).map(|s| s.data)
}
