//! High-level, ergonomic library API: validate the working folder, fetch the three
//! true-color bands, stretch and compose them, write the composite and the overview
//! map. Prefer these entrypoints over the low-level modules when integrating.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use tracing::{debug, info, warn};

use crate::core::params::TrueColorParams;
use crate::core::processing::composite::interleaved;
use crate::core::processing::pipeline::{TrueColorComposite, stretch_truecolor};
use crate::error::{Error, Result};
use crate::io::fetch::{FetchConfig, Fetcher, SceneSource, is_remote};
use crate::io::gdal::RasterReader;
use crate::io::writers::jpeg::{DEFAULT_QUALITY, write_rgb_jpeg};
use crate::io::writers::metadata::{CompositeMetadata, embed_tiff_metadata, write_json_sidecar};
use crate::io::writers::tiff::write_tiff_rgb_u8;
use crate::io::writers::worldfile::{write_prj_file, write_world_file};
use crate::render::overview::{
    Annotation, Basemap, MapOptions, NATURAL_EARTH_COASTLINE_50M, NATURAL_EARTH_LAND_50M, write_overview,
};
use crate::render::viewer::Viewer;
use crate::types::{Band, GeoBounds, OutputFormat};

/// Overview map settings for a run
#[derive(Debug, Clone)]
pub struct MapSettings {
    pub options: MapOptions,
    /// Basemap layers drawn in order: local vector files or URLs, which are
    /// downloaded into the working folder and cached like the band files
    pub basemap: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub file_name: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            options: MapOptions::default(),
            basemap: vec![
                NATURAL_EARTH_LAND_50M.to_string(),
                NATURAL_EARTH_COASTLINE_50M.to_string(),
            ],
            annotations: vec![Annotation::tokyo()],
            file_name: "map.jpg".to_string(),
        }
    }
}

/// Everything a run needs; passed explicitly to every collaborator
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Folder the band files are cached in and outputs are written to
    pub working_folder: PathBuf,
    pub params: TrueColorParams,
    pub source: SceneSource,
    pub fetch: FetchConfig,
    pub format: OutputFormat,
    /// Composite file stem; the extension follows `format`
    pub output_stem: String,
    /// `None` skips the overview map
    pub map: Option<MapSettings>,
    /// Show the composite with the viewer when finished
    pub view: bool,
}

impl RunConfig {
    pub fn new(working_folder: impl Into<PathBuf>) -> Self {
        Self {
            working_folder: working_folder.into(),
            params: TrueColorParams::default(),
            source: SceneSource::default(),
            fetch: FetchConfig::default(),
            format: OutputFormat::Jpeg,
            output_stem: "tci".to_string(),
            map: Some(MapSettings::default()),
            view: false,
        }
    }
}

/// Result of writing a composite
#[derive(Debug, Clone)]
pub struct TrueColorOutput {
    pub image_path: PathBuf,
    /// Geodetic footprint of the red band
    pub bounds: GeoBounds,
    pub composite: TrueColorComposite,
}

/// Summary of a complete run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub band_paths: BTreeMap<Band, PathBuf>,
    pub image_path: PathBuf,
    pub map_path: Option<PathBuf>,
    pub bounds: GeoBounds,
}

/// Fail early unless `path` is an existing, writable directory.
pub fn validate_working_folder(path: &Path) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidWorkingFolder {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    if !path.exists() {
        return Err(invalid("does not exist"));
    }
    if !path.is_dir() {
        return Err(invalid("is not a directory"));
    }
    tempfile::tempfile_in(path).map_err(|e| invalid(&format!("is not writable ({e})")))?;
    Ok(())
}

/// Resolve the scene's three bands and make them available locally.
pub fn fetch_bands(config: &RunConfig) -> Result<BTreeMap<Band, PathBuf>> {
    validate_working_folder(&config.working_folder)?;
    let locators = config.source.resolve(&Band::ALL);
    let fetcher = Fetcher::new(&config.fetch)?;
    Ok(fetcher.fetch_bands(&locators, &config.working_folder)?)
}

struct LoadedBand {
    data: Array2<f64>,
    reader: RasterReader,
}

fn load_band(band: Band, path: &Path) -> Result<LoadedBand> {
    debug!("Reading {} band from {:?}", band, path);
    let reader = RasterReader::open(path)?;
    let data = reader.read_band(1)?;
    Ok(LoadedBand { data, reader })
}

/// Read, stretch and compose the three bands, then write the composite next to
/// the band files. Returns the written path and the red band's geodetic bounds.
pub fn create_truecolor(
    image_paths: &BTreeMap<Band, PathBuf>,
    params: &TrueColorParams,
    format: OutputFormat,
    output_stem: &str,
) -> Result<TrueColorOutput> {
    let path_of = |band: Band| {
        image_paths.get(&band).ok_or_else(|| Error::InvalidArgument {
            arg: "image_paths",
            value: format!("missing {} band", band),
        })
    };
    let red_path = path_of(Band::Red)?;
    let red = load_band(Band::Red, red_path)?;
    let green = load_band(Band::Green, path_of(Band::Green)?)?;
    let blue = load_band(Band::Blue, path_of(Band::Blue)?)?;

    let bounds = red.reader.geodetic_bounds()?;
    debug!("Red band geodetic bounds: {:?}", bounds);

    let composite = stretch_truecolor(red.data.view(), green.data.view(), blue.data.view(), params)?;

    let folder = red_path.parent().unwrap_or_else(|| Path::new("."));
    let image_path = folder.join(format!("{}.{}", output_stem, format.extension()));
    let meta = CompositeMetadata::new(
        composite.cols(),
        composite.rows(),
        params,
        image_paths,
        &composite.stats,
        bounds,
        red.reader.metadata.projection.clone(),
        red.reader.metadata.geotransform,
    );

    info!("Writing 8-bit true color image to {:?}", image_path);
    match format {
        OutputFormat::Jpeg => {
            write_rgb_jpeg(
                &image_path,
                composite.cols(),
                composite.rows(),
                &interleaved(&composite.rgb),
                DEFAULT_QUALITY,
            )?;
            write_world_file(&image_path, red.reader.metadata.geotransform)?;
            if !red.reader.metadata.wkt.is_empty() {
                write_prj_file(&image_path, &red.reader.metadata.wkt)?;
            }
            write_json_sidecar(&image_path, &meta)?;
        }
        OutputFormat::Tiff => {
            let mut ds = write_tiff_rgb_u8(&image_path, &composite.rgb)?;
            embed_tiff_metadata(&mut ds, &meta)?;
        }
    }

    Ok(TrueColorOutput {
        image_path,
        bounds,
        composite,
    })
}

/// Read every basemap layer of `settings`, fetching remote ones into the working folder.
pub fn load_basemap(settings: &MapSettings, config: &RunConfig) -> Result<Basemap> {
    let fetcher = if settings.basemap.iter().any(|l| is_remote(l)) {
        Some(Fetcher::new(&config.fetch)?)
    } else {
        None
    };
    let mut basemap = Basemap::default();
    for locator in &settings.basemap {
        let path = match &fetcher {
            Some(f) if is_remote(locator) => f.materialize(locator, &config.working_folder)?,
            _ => PathBuf::from(locator),
        };
        basemap.extend_from(&path)?;
    }
    Ok(basemap)
}

/// Full run: fetch → read → stretch ×3 → compose → write → map → optional view.
pub fn run(config: &RunConfig, viewer: Option<&dyn Viewer>) -> Result<RunReport> {
    let band_paths = fetch_bands(config)?;

    let output = create_truecolor(&band_paths, &config.params, config.format, &config.output_stem)?;

    let map_path = match &config.map {
        Some(settings) => {
            let basemap = load_basemap(settings, config)?;
            let path = config.working_folder.join(&settings.file_name);
            Some(write_overview(
                &path,
                &output.bounds,
                &basemap,
                &settings.annotations,
                &settings.options,
            )?)
        }
        None => None,
    };

    if config.view {
        match viewer {
            Some(viewer) => viewer.show(&output.image_path)?,
            None => warn!("Display requested but no viewer is available; skipping"),
        }
    }

    Ok(RunReport {
        band_paths,
        image_path: output.image_path,
        map_path,
        bounds: output.bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_folder_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_working_folder(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::InvalidWorkingFolder { .. }));
    }

    #[test]
    fn file_is_not_a_working_folder() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, "x").unwrap();
        let err = validate_working_folder(&file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn writable_folder_passes() {
        let dir = tempfile::tempdir().unwrap();
        validate_working_folder(dir.path()).unwrap();
    }

    #[test]
    fn missing_band_path_is_an_argument_error() {
        let mut paths = BTreeMap::new();
        paths.insert(Band::Green, PathBuf::from("/x/g.TIF"));
        let err = create_truecolor(&paths, &TrueColorParams::default(), OutputFormat::Jpeg, "tci")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn default_map_uses_natural_earth_land_and_coastlines() {
        let settings = MapSettings::default();
        assert_eq!(settings.basemap.len(), 2);
        assert!(settings.basemap[0].ends_with("ne_50m_land.zip"));
        assert!(settings.basemap[1].ends_with("ne_50m_coastline.zip"));
        assert!(settings.basemap.iter().all(|l| is_remote(l)));
    }

    #[test]
    fn local_basemap_layers_are_read_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let layer = dir.path().join("coast.geojson");
        std::fs::write(
            &layer,
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{},
               "geometry":{"type":"LineString","coordinates":[[130,33],[140,36]]}}]}"#,
        )
        .unwrap();
        let work = tempfile::tempdir().unwrap();
        let config = RunConfig::new(work.path());
        let settings = MapSettings {
            basemap: vec![layer.to_string_lossy().to_string(); 2],
            ..MapSettings::default()
        };
        let basemap = load_basemap(&settings, &config).unwrap();
        assert_eq!(basemap.features.len(), 2);
        // nothing is copied into the working folder for local layers
        assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
    }

    #[test]
    fn fetch_failure_surfaces_before_any_processing() {
        let dir = tempfile::tempdir().unwrap();
        let empty_source = tempfile::tempdir().unwrap();
        let mut config = RunConfig::new(dir.path());
        config.source = SceneSource::new(empty_source.path().to_string_lossy(), "NONE");
        let err = run(&config, None).unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        assert!(!dir.path().join("tci.jpg").exists());
    }
}
