#![doc = r#"
landsat-truecolor — Landsat 8 true-color composites with percentile stretching.

This crate fetches the red, green and blue bands (B4, B3, B2) of a Landsat 8 scene,
stretches each band to 8 bits with a percentile window and an optional power-law
remap, composes them into an RGB image, and draws an overview map with the scene
footprint. It powers the `landsat-truecolor` CLI and can be embedded in your own
Rust applications.

Requirements
------------
- GDAL development headers and runtime available on your system.
- Rust 2024 edition toolchain.

Quick start: full run into a working folder
-------------------------------------------
```rust,no_run
use landsat_truecolor::{RunConfig, SystemViewer, run};

fn main() -> landsat_truecolor::Result<()> {
    let mut config = RunConfig::new("/data/landsat");
    config.view = true;
    let report = run(&config, Some(&SystemViewer))?;
    println!("composite: {:?}, bounds: {:?}", report.image_path, report.bounds);
    Ok(())
}
```

Stretch a band in memory
------------------------
```rust
use landsat_truecolor::stretch;
use ndarray::array;

let band = array![[0u16, 0, 10, 20, 30, 0]];
let out = stretch(band.view(), 0.0, 100.0, None, 0).unwrap();
// 0 marks nodata; the byte conversion truncates (127.5 -> 127)
assert_eq!(out, array![[0u8, 0, 0, 127, 255, 0]]);
```

Error handling
--------------
All public functions return `landsat_truecolor::Result<T>`; match on
`landsat_truecolor::Error` to handle specific cases.

```rust,no_run
use landsat_truecolor::{Error, RunConfig, run};
use landsat_truecolor::core::processing::stretch::StretchError;

fn main() {
    match run(&RunConfig::new("/data/landsat"), None) {
        Ok(report) => println!("wrote {:?}", report.image_path),
        Err(Error::Stretch { band, source: StretchError::EmptyValidRegion }) => {
            eprintln!("{band} band contains only nodata")
        }
        Err(Error::Fetch(e)) => eprintln!("download failed: {e}"),
        Err(other) => eprintln!("error: {other}"),
    }
}
```

Useful modules
--------------
- [`api`] — high-level entry points (`run`, `create_truecolor`, `fetch_bands`).
- [`core`] — the band stretch, composite assembly, and stretch parameters.
- [`io`] — band fetching, GDAL raster reading, and image/metadata writers.
- [`render`] — overview map (Natural Earth basemap, graticule, labels) and optional viewer.
- [`error`] — crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod render;
pub mod types;

// Curated public API surface
// Types
pub use core::params::{StretchParams, TrueColorParams};
pub use error::{Error, Result};
pub use types::{Band, GeoBounds, OutputFormat};

// Core transform
pub use core::processing::composite::{ShapeMismatch, compose};
pub use core::processing::pipeline::{TrueColorComposite, stretch_truecolor};
pub use core::processing::stretch::{StretchError, StretchStats, stretch, stretch_with_stats};

// Collaborators
pub use io::fetch::{FetchConfig, FetchError, Fetcher, SceneSource};
pub use io::gdal::{GdalError, RasterMetadata, RasterReader, reproject_bounds};
pub use render::{Annotation, Basemap, MapOptions, SystemViewer, Viewer, render_overview};

// High-level API re-exports
pub use api::{
    MapSettings, RunConfig, RunReport, TrueColorOutput, create_truecolor, fetch_bands, load_basemap, run,
    validate_working_folder,
};
