//! Presentation collaborators: the overview map of the scene footprint and the
//! optional interactive viewer. Neither touches the numeric core.
pub mod overview;
pub mod viewer;

pub use overview::{
    Annotation, Basemap, Feature, MapOptions, NATURAL_EARTH_COASTLINE_50M, NATURAL_EARTH_LAND_50M, render_overview,
    write_overview,
};
pub use viewer::{SystemViewer, Viewer};
