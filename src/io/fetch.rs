//! Band file fetching: resolve the three band locators of a scene and make each
//! one available in the working folder, downloading only when it is not cached.
//!
//! A download is streamed into a temporary file inside the destination folder and
//! renamed into place once complete, so an interrupted transfer never leaves a file
//! that a later run would mistake for a cached band.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::types::Band;

const DEFAULT_BASE_URL: &str = "http://landsat-pds.s3.amazonaws.com/c1/L8/107/035/LC08_L1TP_107035_20190105_20190130_01_T1/";
const DEFAULT_PRODUCT_ID: &str = "LC08_L1TP_107035_20190105_20190130_01_T1";
const WRITE_CHUNK_SIZE: usize = 10 * 1024;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} while fetching {url}")]
    Status { url: String, status: u16 },

    #[error("I/O error while fetching {locator}: {source}")]
    Io {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Source does not exist: {0}")]
    MissingSource(String),

    #[error("Cannot derive a file name from locator {0:?}")]
    InvalidLocator(String),
}

/// Where a scene's band files live: an HTTP(S) prefix or a local directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSource {
    pub base_url: String,
    pub product_id: String,
}

impl Default for SceneSource {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            product_id: DEFAULT_PRODUCT_ID.to_string(),
        }
    }
}

impl SceneSource {
    pub fn new(base_url: impl Into<String>, product_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            product_id: product_id.into(),
        }
    }

    pub fn band_file_name(&self, band: Band) -> String {
        format!("{}_B{}.TIF", self.product_id, band.landsat8_band_number())
    }

    pub fn locator(&self, band: Band) -> String {
        let name = self.band_file_name(band);
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, name)
        } else {
            format!("{}/{}", self.base_url, name)
        }
    }

    /// Map each requested band to its source locator.
    pub fn resolve(&self, bands: &[Band]) -> BTreeMap<Band, String> {
        info!("Creating locators for bands");
        bands.iter().map(|&b| (b, self.locator(b))).collect()
    }
}

/// HTTP client settings; timeouts bound how long a single transfer may block.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY` from the environment
    pub use_system_proxy: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            connect_timeout: Duration::from_secs(30),
            user_agent: concat!("landsat-truecolor/", env!("CARGO_PKG_VERSION")).to_string(),
            use_system_proxy: true,
        }
    }
}

enum Locator<'a> {
    Http(&'a str),
    Local(PathBuf),
}

impl<'a> Locator<'a> {
    fn parse(locator: &'a str) -> Self {
        if locator.starts_with("http://") || locator.starts_with("https://") {
            Locator::Http(locator)
        } else if let Some(path) = locator.strip_prefix("file://") {
            Locator::Local(PathBuf::from(path))
        } else {
            Locator::Local(PathBuf::from(locator))
        }
    }
}

/// True when `locator` is fetched over HTTP(S) rather than read from disk.
pub fn is_remote(locator: &str) -> bool {
    matches!(Locator::parse(locator), Locator::Http(_))
}

/// Last path segment of a URL or file path.
pub fn file_name_of(locator: &str) -> Result<String, FetchError> {
    let trimmed = locator.split(['?', '#']).next().unwrap_or(locator);
    match trimmed.rsplit(['/', '\\']).next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => Ok(name.to_string()),
        _ => Err(FetchError::InvalidLocator(locator.to_string())),
    }
}

pub struct Fetcher {
    client: reqwest::blocking::Client,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone());
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|source| FetchError::Http {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }

    /// Make `locator` available as a file in `destination_folder`.
    ///
    /// An existing file with the same name is reused without revalidation.
    pub fn materialize(&self, locator: &str, destination_folder: &Path) -> Result<PathBuf, FetchError> {
        let file_name = file_name_of(locator)?;
        let local_path = destination_folder.join(&file_name);
        if local_path.exists() {
            info!("Using cached {:?}", local_path);
            return Ok(local_path);
        }

        let io_err = |source: std::io::Error| FetchError::Io {
            locator: locator.to_string(),
            source,
        };

        let mut partial = tempfile::Builder::new()
            .prefix(&format!(".{}.", file_name))
            .suffix(".partial")
            .tempfile_in(destination_folder)
            .map_err(io_err)?;

        let bytes = {
            let mut writer = BufWriter::with_capacity(WRITE_CHUNK_SIZE, partial.as_file_mut());
            let bytes = match Locator::parse(locator) {
                Locator::Http(url) => {
                    info!("Downloading {}", url);
                    let mut response = self.client.get(url).send().map_err(|source| FetchError::Http {
                        url: url.to_string(),
                        source,
                    })?;
                    let status = response.status();
                    if !status.is_success() {
                        return Err(FetchError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }
                    response.copy_to(&mut writer).map_err(|source| FetchError::Http {
                        url: url.to_string(),
                        source,
                    })?
                }
                Locator::Local(src) => {
                    if !src.is_file() {
                        return Err(FetchError::MissingSource(src.display().to_string()));
                    }
                    info!("Copying {:?}", src);
                    let mut file = File::open(&src).map_err(io_err)?;
                    std::io::copy(&mut file, &mut writer).map_err(io_err)?
                }
            };
            writer.flush().map_err(io_err)?;
            bytes
        };
        partial.as_file().sync_all().map_err(io_err)?;

        partial
            .persist(&local_path)
            .map_err(|e| io_err(e.error))?;
        debug!("Wrote {} bytes to {:?}", bytes, local_path);
        info!("Saved {} to {:?}", file_name, local_path);
        Ok(local_path)
    }

    /// Materialize every resolved band into `destination_folder`.
    pub fn fetch_bands(
        &self,
        locators: &BTreeMap<Band, String>,
        destination_folder: &Path,
    ) -> Result<BTreeMap<Band, PathBuf>, FetchError> {
        info!("Fetching bands...");
        let mut paths = BTreeMap::new();
        for (&band, locator) in locators {
            debug!("Fetching {} band from {}", band, locator);
            let path = self.materialize(locator, destination_folder)?;
            info!("Setting {} band to {:?}", band, path);
            paths.insert(band, path);
        }
        Ok(paths)
    }
}
