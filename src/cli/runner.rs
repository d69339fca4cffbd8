use std::path::Path;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use landsat_truecolor::api::{MapSettings, RunConfig, run as run_truecolor};
use landsat_truecolor::io::fetch::is_remote;
use landsat_truecolor::{SystemViewer, TrueColorParams, Viewer};

use super::args::CliArgs;
use super::errors::AppError;

fn triple<T: Copy>(values: &[T], arg: &'static str) -> Result<[T; 3], AppError> {
    match values {
        [r, g, b] => Ok([*r, *g, *b]),
        _ => Err(AppError::InvalidTriple {
            arg,
            count: values.len(),
        }),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Translate parsed arguments into a library run configuration
pub fn build_config(args: &CliArgs) -> Result<RunConfig, AppError> {
    let params = match &args.preset {
        Some(path) => TrueColorParams::load_json(path)?,
        None => {
            let power = triple(&args.power_scales, "--power-scales")?;
            TrueColorParams::from_triples(
                triple(&args.min_percentiles, "--min-percentiles")?,
                triple(&args.max_percentiles, "--max-percentiles")?,
                [power[0].0, power[1].0, power[2].0],
                args.no_data as f64,
            )
        }
    };

    let mut config = RunConfig::new(&args.working_folder);
    config.params = params;
    config.format = args.format;
    config.view = args.view;
    config.fetch.timeout = Duration::from_secs(args.timeout);
    if let Some(url) = &args.base_url {
        config.source.base_url = url.clone();
    }
    if let Some(id) = &args.product_id {
        config.source.product_id = id.clone();
    }

    config.map = if args.no_map {
        None
    } else {
        let mut settings = MapSettings::default();
        if !args.basemap.is_empty() {
            for locator in &args.basemap {
                let path = Path::new(locator);
                if !is_remote(locator) && !path.is_file() {
                    return Err(AppError::MissingBasemap { path: path.to_path_buf() });
                }
            }
            settings.basemap = args.basemap.clone();
        }
        Some(settings)
    };

    Ok(config)
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(args.log);

    let config = build_config(&args)?;
    info!("Working folder: {:?}", config.working_folder);

    let viewer = SystemViewer;
    let report = run_truecolor(&config, Some(&viewer as &dyn Viewer)).map_err(AppError::from)?;

    info!("True color image: {:?}", report.image_path);
    if let Some(map) = &report.map_path {
        info!("Overview map: {:?}", map);
    }
    info!(
        "Footprint: lon {:.4}..{:.4}, lat {:.4}..{:.4}",
        report.bounds.min_lon, report.bounds.max_lon, report.bounds.min_lat, report.bounds.max_lat
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use landsat_truecolor::{Band, OutputFormat};

    #[test]
    fn flags_become_run_config() {
        let args = CliArgs::try_parse_from([
            "landsat-truecolor",
            "-w",
            "/data",
            "--power-scales",
            "none",
            "1.2",
            "3",
            "--no-data",
            "5",
            "--no-map",
            "--format",
            "tiff",
            "--base-url",
            "/mirror",
        ])
        .unwrap();
        let config = build_config(&args).unwrap();
        assert_eq!(config.params.for_band(Band::Red).power_scale, None);
        assert_eq!(config.params.for_band(Band::Blue).power_scale, Some(3.0));
        assert_eq!(config.params.nodata, 5.0);
        assert!(config.map.is_none());
        assert_eq!(config.format, OutputFormat::Tiff);
        assert_eq!(config.source.base_url, "/mirror");
    }

    #[test]
    fn preset_replaces_stretch_flags() {
        let dir = tempfile::tempdir().unwrap();
        let preset = dir.path().join("p.json");
        let params = TrueColorParams::from_triples([3.0; 3], [97.0; 3], [None; 3], 1.0);
        params.save_json(&preset).unwrap();
        let args = CliArgs::try_parse_from([
            "landsat-truecolor",
            "-w",
            "/data",
            "--preset",
            preset.to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(build_config(&args).unwrap().params, params);
    }

    #[test]
    fn missing_basemap_is_reported() {
        let args = CliArgs::try_parse_from([
            "landsat-truecolor",
            "-w",
            "/data",
            "--basemap",
            "/no/such/coast.geojson",
        ])
        .unwrap();
        assert!(matches!(build_config(&args), Err(AppError::MissingBasemap { .. })));
    }

    #[test]
    fn basemap_layers_replace_the_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let land = dir.path().join("land.geojson");
        std::fs::write(&land, "{}").unwrap();
        let land = land.to_string_lossy().to_string();
        let args = CliArgs::try_parse_from([
            "landsat-truecolor",
            "-w",
            "/data",
            "--basemap",
            land.as_str(),
            "--basemap",
            "https://example.com/ne_10m_coastline.zip",
        ])
        .unwrap();
        let map = build_config(&args).unwrap().map.unwrap();
        assert_eq!(map.basemap, vec![land, "https://example.com/ne_10m_coastline.zip".to_string()]);

        let defaults = CliArgs::try_parse_from(["landsat-truecolor", "-w", "/data"]).unwrap();
        assert_eq!(build_config(&defaults).unwrap().map.unwrap().basemap, MapSettings::default().basemap);
    }
}
