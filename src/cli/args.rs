use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use landsat_truecolor::OutputFormat;

/// Power-law exponent for one band, or `none` for a linear stretch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerScaleArg(pub Option<f64>);

impl FromStr for PowerScaleArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("none") {
            return Ok(PowerScaleArg(None));
        }
        let v: f64 = s
            .parse()
            .map_err(|_| format!("invalid power scale {s:?}: expected a positive number or 'none'"))?;
        if !(v.is_finite() && v > 0.0) {
            return Err(format!("power scale must be positive, got {v}"));
        }
        Ok(PowerScaleArg(Some(v)))
    }
}

#[derive(Parser, Debug)]
#[command(name = "landsat-truecolor", version, about = "Landsat 8 true color composite and overview map")]
pub struct CliArgs {
    /// Folder where the Landsat 8 bands are downloaded and outputs are written
    #[arg(short = 'w', long)]
    pub working_folder: PathBuf,

    /// Per band (red, green, blue) percentiles used to compute the minimum stretch value
    #[arg(long, num_args = 3, value_names = ["RED", "GREEN", "BLUE"], default_values_t = [1.0, 1.0, 5.0])]
    pub min_percentiles: Vec<f64>,

    /// Per band (red, green, blue) percentiles used to compute the maximum stretch value
    #[arg(long, num_args = 3, value_names = ["RED", "GREEN", "BLUE"], default_values_t = [99.0, 99.0, 99.0])]
    pub max_percentiles: Vec<f64>,

    /// Per band (red, green, blue) power scales; 'none' keeps a band linear
    #[arg(long, num_args = 3, value_names = ["RED", "GREEN", "BLUE"], default_values = ["1.1", "1.4", "2"])]
    pub power_scales: Vec<PowerScaleArg>,

    /// Background value ignored while stretching, common to all bands
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub no_data: i64,

    /// JSON stretch preset; replaces the percentile, power scale and nodata flags
    #[arg(long)]
    pub preset: Option<PathBuf>,

    /// Output format of the composite
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Jpeg)]
    pub format: OutputFormat,

    /// Base URL (or local directory) holding the band files
    #[arg(long)]
    pub base_url: Option<String>,

    /// Scene product identifier used to name the band files
    #[arg(long)]
    pub product_id: Option<String>,

    /// Basemap layer for the overview map (shapefile, zipped shapefile, GeoJSON or URL);
    /// repeat for several layers. Defaults to Natural Earth 1:50m land and coastlines
    #[arg(long)]
    pub basemap: Vec<String>,

    /// Skip the overview map
    #[arg(long, default_value_t = false)]
    pub no_map: bool,

    /// Open the true color image in the system viewer when done
    #[arg(short, long, default_value_t = false)]
    pub view: bool,

    /// HTTP timeout in seconds for each band download
    #[arg(long, default_value_t = 600)]
    pub timeout: u64,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_reference_tool() {
        let args = CliArgs::try_parse_from(["landsat-truecolor", "-w", "/tmp"]).unwrap();
        assert_eq!(args.min_percentiles, vec![1.0, 1.0, 5.0]);
        assert_eq!(args.max_percentiles, vec![99.0, 99.0, 99.0]);
        assert_eq!(
            args.power_scales,
            vec![PowerScaleArg(Some(1.1)), PowerScaleArg(Some(1.4)), PowerScaleArg(Some(2.0))]
        );
        assert_eq!(args.no_data, 0);
        assert_eq!(args.format, OutputFormat::Jpeg);
        assert!(!args.view);
    }

    #[test]
    fn working_folder_is_required() {
        assert!(CliArgs::try_parse_from(["landsat-truecolor"]).is_err());
    }

    #[test]
    fn triples_and_linear_bands() {
        let args = CliArgs::try_parse_from([
            "landsat-truecolor",
            "--working-folder",
            "/tmp",
            "--min-percentiles",
            "2",
            "2",
            "3",
            "--power-scales",
            "none",
            "1.5",
            "NONE",
            "--no-data",
            "-9999",
            "--format",
            "tiff",
        ])
        .unwrap();
        assert_eq!(args.min_percentiles, vec![2.0, 2.0, 3.0]);
        assert_eq!(args.power_scales[0], PowerScaleArg(None));
        assert_eq!(args.power_scales[1], PowerScaleArg(Some(1.5)));
        assert_eq!(args.no_data, -9999);
        assert_eq!(args.format, OutputFormat::Tiff);
    }

    #[test]
    fn rejects_non_positive_power_scale() {
        assert!("0".parse::<PowerScaleArg>().is_err());
        assert!("-2".parse::<PowerScaleArg>().is_err());
        assert!("abc".parse::<PowerScaleArg>().is_err());
    }

    #[test]
    fn rejects_incomplete_triple() {
        let res = CliArgs::try_parse_from([
            "landsat-truecolor",
            "-w",
            "/tmp",
            "--max-percentiles",
            "99",
            "98",
        ]);
        assert!(res.is_err());
    }
}
