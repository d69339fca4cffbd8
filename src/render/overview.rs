//! Static overview map: an equirectangular (plate carrée) canvas with basemap
//! features, a labelled graticule, the scene footprint as a red rectangle, point
//! annotations and a title band. Text uses an embedded DejaVu Sans Mono font.
//!
//! Basemap layers are read with GDAL's vector drivers, so Natural Earth shapefiles
//! (plain or zipped) and GeoJSON files work alike.
use std::path::{Path, PathBuf};

use ab_glyph::{FontRef, PxScale};
use gdal::vector::{Geometry, LayerAccess, OGRwkbGeometryType, geometry_type_flatten};
use gdal::{Dataset, DatasetOptions, GdalOpenFlags};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut, draw_text_mut, text_size,
};
use imageproc::point::Point;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::io::GdalError;
use crate::io::writers::jpeg::{DEFAULT_QUALITY, write_rgb_jpeg};
use crate::types::GeoBounds;

/// Natural Earth 1:50m land polygons (filled)
pub const NATURAL_EARTH_LAND_50M: &str = "https://naturalearth.s3.amazonaws.com/50m_physical/ne_50m_land.zip";
/// Natural Earth 1:50m coastlines (stroked)
pub const NATURAL_EARTH_COASTLINE_50M: &str =
    "https://naturalearth.s3.amazonaws.com/50m_physical/ne_50m_coastline.zip";

/// Embedded font data - DejaVu Sans Mono
const FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const LAND: Rgb<u8> = Rgb([211, 211, 211]);
const COAST: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([150, 150, 150]);
const FOOTPRINT: Rgb<u8> = Rgb([255, 0, 0]);
const TEXT: Rgb<u8> = Rgb([0, 0, 0]);

const TITLE_SIZE: f32 = 16.0;
const TITLE_LINE_HEIGHT: u32 = 20;
const TITLE_MARGIN: u32 = 8;
const LABEL_SIZE: f32 = 13.0;
/// Upper bound on graticule lines per axis
const MAX_GRID_LINES: usize = 360;

/// Map canvas settings
#[derive(Debug, Clone, Serialize)]
pub struct MapOptions {
    /// Visible extent as [lon_min, lon_max, lat_min, lat_max]
    pub extent: [f64; 4],
    /// Size of the map area in pixels; the title band is added above it
    pub width: u32,
    pub height: u32,
    /// Spacing of graticule lines in degrees; 0 disables the graticule
    pub graticule_step: f64,
    /// Title drawn above the map, one line per `\n`; empty for none
    pub title: String,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            extent: [128.0, 152.0, 30.0, 48.0],
            width: 768,
            height: 1152,
            graticule_step: 2.0,
            title: "Landsat 8 true color image from\nLC08_L1TP_107035_20190105_20190130_01_T1_B{4,3,2}".to_string(),
        }
    }
}

/// A labelled point drawn on the map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub label: String,
    pub lon: f64,
    pub lat: f64,
    /// Lower-left corner of the label text
    pub label_lon: f64,
    pub label_lat: f64,
}

impl Annotation {
    pub fn new(label: impl Into<String>, lon: f64, lat: f64) -> Self {
        Self {
            label: label.into(),
            lon,
            lat,
            label_lon: lon,
            label_lat: lat,
        }
    }

    pub fn with_label_at(mut self, lon: f64, lat: f64) -> Self {
        self.label_lon = lon;
        self.label_lat = lat;
        self
    }

    pub fn tokyo() -> Self {
        Annotation::new("Tokyo", 139.839478, 35.652832).with_label_at(139.0, 36.0)
    }
}

/// Basemap geometry in longitude/latitude
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    /// Exterior ring first; interior rings are only stroked
    Polygon(Vec<Vec<(f64, f64)>>),
    Line(Vec<(f64, f64)>),
}

#[derive(Debug, Clone, Default)]
pub struct Basemap {
    pub features: Vec<Feature>,
}

/// GDAL path for a vector file; a zip archive is read through `/vsizip/`
/// assuming it holds `<stem>.shp`, as Natural Earth archives do.
fn vector_source(path: &Path) -> PathBuf {
    let is_zip = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"));
    match path.file_stem() {
        Some(stem) if is_zip => PathBuf::from(format!(
            "/vsizip/{}/{}.shp",
            path.display(),
            stem.to_string_lossy()
        )),
        _ => path.to_path_buf(),
    }
}

fn points_of(geom: &Geometry) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(geom.point_count());
    geom.get_points(&mut points);
    points.into_iter().map(|(x, y, _)| (x, y)).collect()
}

fn collect_geometry(geom: &Geometry, out: &mut Vec<Feature>) {
    use OGRwkbGeometryType::*;
    match geometry_type_flatten(geom.geometry_type()) {
        wkbLineString | wkbLinearRing => out.push(Feature::Line(points_of(geom))),
        wkbPolygon => {
            let rings = (0..geom.geometry_count())
                .map(|i| points_of(&geom.get_geometry(i)))
                .collect();
            out.push(Feature::Polygon(rings));
        }
        wkbMultiLineString | wkbMultiPolygon | wkbGeometryCollection => {
            for i in 0..geom.geometry_count() {
                collect_geometry(&geom.get_geometry(i), out);
            }
        }
        // Points carry no outline to draw
        _ => {}
    }
}

impl Basemap {
    /// Read every feature of a vector file (shapefile, zipped shapefile, GeoJSON).
    pub fn load(path: &Path) -> Result<Self> {
        let mut basemap = Self::default();
        basemap.extend_from(path)?;
        Ok(basemap)
    }

    /// Append the features of another vector file.
    pub fn extend_from(&mut self, path: &Path) -> Result<()> {
        let source = vector_source(path);
        let options = DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_READONLY | GdalOpenFlags::GDAL_OF_VECTOR,
            ..DatasetOptions::default()
        };
        let dataset = Dataset::open_ex(&source, options).map_err(GdalError::from)?;
        let before = self.features.len();
        for mut layer in dataset.layers() {
            for feature in layer.features() {
                if let Some(geom) = feature.geometry() {
                    collect_geometry(geom, &mut self.features);
                }
            }
        }
        info!(
            "Loaded {} basemap feature(s) from {:?}",
            self.features.len() - before,
            source
        );
        Ok(())
    }
}

/// Linear lon/lat to pixel mapping over the map area, which starts `top` pixels
/// below the canvas edge.
#[derive(Debug, Clone, Copy)]
struct PlateCarree {
    lon_min: f64,
    lon_max: f64,
    lat_min: f64,
    lat_max: f64,
    width: f64,
    height: f64,
    top: f64,
}

impl PlateCarree {
    fn new(options: &MapOptions, top: u32) -> Result<Self> {
        let [lon_min, lon_max, lat_min, lat_max] = options.extent;
        if !(lon_max > lon_min && lat_max > lat_min) || options.width == 0 || options.height == 0 {
            return Err(Error::Render(format!(
                "invalid map extent {:?} or size {}x{}",
                options.extent, options.width, options.height
            )));
        }
        Ok(Self {
            lon_min,
            lon_max,
            lat_min,
            lat_max,
            width: options.width as f64,
            height: options.height as f64,
            top: top as f64,
        })
    }

    fn to_pixel(&self, lon: f64, lat: f64) -> (f32, f32) {
        let x = (lon - self.lon_min) / (self.lon_max - self.lon_min) * self.width;
        let y = self.top + (self.lat_max - lat) / (self.lat_max - self.lat_min) * self.height;
        (x as f32, y as f32)
    }

    fn intersects(&self, points: &[(f64, f64)]) -> bool {
        let (mut x0, mut y0, mut x1, mut y1) = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for &(lon, lat) in points {
            x0 = x0.min(lon);
            y0 = y0.min(lat);
            x1 = x1.max(lon);
            y1 = y1.max(lat);
        }
        x1 >= self.lon_min && x0 <= self.lon_max && y1 >= self.lat_min && y0 <= self.lat_max
    }
}

fn draw_polyline(img: &mut RgbImage, proj: &PlateCarree, points: &[(f64, f64)], color: Rgb<u8>) {
    for w in points.windows(2) {
        let a = proj.to_pixel(w[0].0, w[0].1);
        let b = proj.to_pixel(w[1].0, w[1].1);
        draw_line_segment_mut(img, a, b, color);
    }
}

fn fill_ring(img: &mut RgbImage, proj: &PlateCarree, ring: &[(f64, f64)], color: Rgb<u8>) {
    let mut pts: Vec<Point<i32>> = Vec::with_capacity(ring.len());
    for &(lon, lat) in ring {
        let (x, y) = proj.to_pixel(lon, lat);
        let p = Point::new(x.round() as i32, y.round() as i32);
        if pts.last() != Some(&p) {
            pts.push(p);
        }
    }
    // imageproc rejects an explicitly closed ring
    while pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    if pts.len() >= 3 {
        draw_polygon_mut(img, &pts, color);
    }
}

/// Multiples of `step` within [min, max], at most `MAX_GRID_LINES` of them.
fn grid_values(min: f64, max: f64, step: f64) -> Vec<f64> {
    if !(step.is_finite() && step > 0.0) {
        return Vec::new();
    }
    let first = (min / step).ceil();
    let last = (max / step).floor();
    if !(last >= first) {
        return Vec::new();
    }
    let count = ((last - first) as usize).saturating_add(1).min(MAX_GRID_LINES);
    (0..count).map(|i| (first + i as f64) * step).collect()
}

fn degrees_label(value: f64, positive: char, negative: char) -> String {
    match value {
        v if v > 0.0 => format!("{}°{}", v, positive),
        v if v < 0.0 => format!("{}°{}", -v, negative),
        _ => "0°".to_string(),
    }
}

fn title_band_height(title: &str) -> u32 {
    match title.lines().count() as u32 {
        0 => 0,
        lines => 2 * TITLE_MARGIN + lines * TITLE_LINE_HEIGHT,
    }
}

fn load_font() -> Result<FontRef<'static>> {
    FontRef::try_from_slice(FONT_DATA).map_err(|e| Error::Render(format!("embedded font: {e:?}")))
}

fn draw_graticule(img: &mut RgbImage, proj: &PlateCarree, step: f64, font: &FontRef) {
    let scale = PxScale::from(LABEL_SIZE);
    let bottom = (proj.top + proj.height) as i32;
    for lon in grid_values(proj.lon_min, proj.lon_max, step) {
        draw_polyline(img, proj, &[(lon, proj.lat_min), (lon, proj.lat_max)], GRID);
        let (x, _) = proj.to_pixel(lon, proj.lat_min);
        let label = degrees_label(lon, 'E', 'W');
        draw_text_mut(img, TEXT, x as i32 + 2, bottom - LABEL_SIZE as i32 - 2, scale, font, &label);
    }
    for lat in grid_values(proj.lat_min, proj.lat_max, step) {
        draw_polyline(img, proj, &[(proj.lon_min, lat), (proj.lon_max, lat)], GRID);
        let (_, y) = proj.to_pixel(proj.lon_min, lat);
        let label = degrees_label(lat, 'N', 'S');
        draw_text_mut(img, TEXT, 2, y as i32 - LABEL_SIZE as i32 - 1, scale, font, &label);
    }
}

fn draw_title(img: &mut RgbImage, title: &str, font: &FontRef) {
    let scale = PxScale::from(TITLE_SIZE);
    for (i, line) in title.lines().enumerate() {
        let (w, _) = text_size(scale, font, line);
        let x = (img.width().saturating_sub(w) / 2) as i32;
        let y = (TITLE_MARGIN + i as u32 * TITLE_LINE_HEIGHT) as i32;
        draw_text_mut(img, TEXT, x, y, scale, font, line);
    }
}

/// Draw the overview map in memory. The canvas is `options.width` wide and
/// `options.height` plus the title band tall.
pub fn render_overview(
    bounds: &GeoBounds,
    basemap: &Basemap,
    annotations: &[Annotation],
    options: &MapOptions,
) -> Result<RgbImage> {
    let font = load_font()?;
    let top = title_band_height(&options.title);
    let proj = PlateCarree::new(options, top)?;
    let mut img = RgbImage::from_pixel(options.width, options.height + top, BACKGROUND);

    let mut drawn = 0usize;
    for feature in &basemap.features {
        match feature {
            Feature::Polygon(rings) => {
                let Some(exterior) = rings.first() else { continue };
                if !proj.intersects(exterior) {
                    continue;
                }
                fill_ring(&mut img, &proj, exterior, LAND);
                for ring in rings {
                    draw_polyline(&mut img, &proj, ring, COAST);
                }
                drawn += 1;
            }
            Feature::Line(line) => {
                if !proj.intersects(line) {
                    continue;
                }
                draw_polyline(&mut img, &proj, line, COAST);
                drawn += 1;
            }
        }
    }
    debug!("Drew {} of {} basemap feature(s)", drawn, basemap.features.len());

    draw_graticule(&mut img, &proj, options.graticule_step, &font);

    // Two-pixel outline so the footprint stands out from coastlines
    let outline = bounds.outline();
    draw_polyline(&mut img, &proj, &outline, FOOTPRINT);
    for w in outline.windows(2) {
        let (ax, ay) = proj.to_pixel(w[0].0, w[0].1);
        let (bx, by) = proj.to_pixel(w[1].0, w[1].1);
        draw_line_segment_mut(&mut img, (ax + 1.0, ay + 1.0), (bx + 1.0, by + 1.0), FOOTPRINT);
    }

    let label_scale = PxScale::from(LABEL_SIZE);
    for a in annotations {
        let (x, y) = proj.to_pixel(a.lon, a.lat);
        draw_filled_circle_mut(&mut img, (x.round() as i32, y.round() as i32), 3, FOOTPRINT);
        let (lx, ly) = proj.to_pixel(a.label_lon, a.label_lat);
        draw_text_mut(&mut img, TEXT, lx as i32, ly as i32 - LABEL_SIZE as i32, label_scale, &font, &a.label);
    }

    // Clear any basemap spill before laying the title over the band
    for y in 0..top {
        for x in 0..img.width() {
            img.put_pixel(x, y, BACKGROUND);
        }
    }
    draw_title(&mut img, &options.title, &font);

    Ok(img)
}

#[derive(Serialize)]
struct MapSidecar<'a> {
    title: &'a str,
    extent: [f64; 4],
    footprint: &'a GeoBounds,
    annotations: &'a [Annotation],
}

/// Render the overview map to a JPEG at `map_path`, plus a JSON sidecar with
/// the title, extent, footprint and annotations.
pub fn write_overview(
    map_path: &Path,
    bounds: &GeoBounds,
    basemap: &Basemap,
    annotations: &[Annotation],
    options: &MapOptions,
) -> Result<PathBuf> {
    let img = render_overview(bounds, basemap, annotations, options)?;
    info!("Saving latlon map to {:?}", map_path);
    write_rgb_jpeg(
        map_path,
        img.width() as usize,
        img.height() as usize,
        img.as_raw(),
        DEFAULT_QUALITY,
    )?;

    let sidecar = MapSidecar {
        title: &options.title,
        extent: options.extent,
        footprint: bounds,
        annotations,
    };
    std::fs::write(
        map_path.with_extension("json"),
        serde_json::to_string_pretty(&sidecar)?,
    )?;
    Ok(map_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_options() -> MapOptions {
        MapOptions {
            extent: [0.0, 10.0, 0.0, 10.0],
            width: 100,
            height: 100,
            graticule_step: 0.0,
            title: String::new(),
        }
    }

    fn count_pixels(img: &RgbImage, color: Rgb<u8>, rows: std::ops::Range<u32>) -> usize {
        rows.flat_map(|y| (0..img.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| *img.get_pixel(x, y) == color)
            .count()
    }

    #[test]
    fn projection_maps_corners() {
        let proj = PlateCarree::new(&small_options(), 0).unwrap();
        assert_eq!(proj.to_pixel(0.0, 10.0), (0.0, 0.0));
        assert_eq!(proj.to_pixel(10.0, 0.0), (100.0, 100.0));
        assert_eq!(proj.to_pixel(5.0, 2.5), (50.0, 75.0));
        let shifted = PlateCarree::new(&small_options(), 30).unwrap();
        assert_eq!(shifted.to_pixel(0.0, 10.0), (0.0, 30.0));
    }

    #[test]
    fn footprint_and_annotation_are_red() {
        let bounds = GeoBounds::from_array([2.0, 2.0, 8.0, 8.0]);
        let img = render_overview(
            &bounds,
            &Basemap::default(),
            &[Annotation::new("", 5.0, 5.0)],
            &small_options(),
        )
        .unwrap();
        assert_eq!(img.dimensions(), (100, 100));
        // left edge of the footprint at lon 2 => x 20, y between 20 and 80
        assert_eq!(*img.get_pixel(20, 50), FOOTPRINT);
        assert_eq!(*img.get_pixel(50, 50), FOOTPRINT);
        assert_eq!(*img.get_pixel(5, 5), BACKGROUND);
    }

    #[test]
    fn land_polygons_are_filled() {
        let basemap = Basemap {
            features: vec![Feature::Polygon(vec![vec![(1.0, 1.0), (1.0, 4.0), (4.0, 4.0), (4.0, 1.0), (1.0, 1.0)]])],
        };
        let bounds = GeoBounds::from_array([6.0, 6.0, 9.0, 9.0]);
        let img = render_overview(&bounds, &basemap, &[], &small_options()).unwrap();
        assert_eq!(*img.get_pixel(25, 75), LAND);
    }

    #[test]
    fn title_band_sits_above_the_map() {
        let mut options = small_options();
        options.title = "Line one\nLine two".to_string();
        let top = title_band_height(&options.title);
        assert_eq!(top, 2 * TITLE_MARGIN + 2 * TITLE_LINE_HEIGHT);

        let img = render_overview(&GeoBounds::from_array([2.0, 2.0, 8.0, 8.0]), &Basemap::default(), &[], &options)
            .unwrap();
        assert_eq!(img.dimensions(), (100, 100 + top));
        assert!(count_pixels(&img, BACKGROUND, 0..top) < (100 * top) as usize);
        // footprint moved down by the band
        assert_eq!(*img.get_pixel(20, 50 + top), FOOTPRINT);
    }

    #[test]
    fn annotation_label_is_drawn() {
        let bounds = GeoBounds::from_array([9.0, 9.0, 9.5, 9.5]);
        let plain = render_overview(&bounds, &Basemap::default(), &[Annotation::new("", 5.0, 5.0)], &small_options())
            .unwrap();
        let labelled = render_overview(
            &bounds,
            &Basemap::default(),
            &[Annotation::new("Tokyo", 5.0, 5.0).with_label_at(1.0, 3.0)],
            &small_options(),
        )
        .unwrap();
        // text lands in the rows just above the label anchor (y = 70)
        let rows = 55..70;
        assert!(count_pixels(&labelled, BACKGROUND, rows.clone()) < count_pixels(&plain, BACKGROUND, rows));
    }

    #[test]
    fn grid_values_are_bounded() {
        assert_eq!(grid_values(128.0, 152.0, 2.0).len(), 13);
        assert_eq!(grid_values(30.5, 35.0, 2.0), vec![32.0, 34.0]);
        assert!(grid_values(0.0, 10.0, 0.0).is_empty());
        assert!(grid_values(0.0, 10.0, f64::NAN).is_empty());
        assert_eq!(grid_values(0.0, 10.0, 1e-12).len(), MAX_GRID_LINES);
    }

    #[test]
    fn tiny_graticule_step_still_renders() {
        let mut options = small_options();
        options.graticule_step = 1e-9;
        let img = render_overview(&GeoBounds::from_array([2.0, 2.0, 8.0, 8.0]), &Basemap::default(), &[], &options)
            .unwrap();
        assert_eq!(img.dimensions(), (100, 100));
    }

    #[test]
    fn degree_labels_carry_hemisphere() {
        assert_eq!(degrees_label(140.0, 'E', 'W'), "140°E");
        assert_eq!(degrees_label(-2.5, 'N', 'S'), "2.5°S");
        assert_eq!(degrees_label(0.0, 'E', 'W'), "0°");
    }

    #[test]
    fn zipped_shapefiles_are_read_through_vsizip() {
        assert_eq!(
            vector_source(Path::new("/data/ne_50m_land.zip")),
            PathBuf::from("/vsizip//data/ne_50m_land.zip/ne_50m_land.shp")
        );
        assert_eq!(vector_source(Path::new("/data/coast.geojson")), PathBuf::from("/data/coast.geojson"));
    }

    #[test]
    fn geojson_basemap_is_read_with_gdal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basemap.geojson");
        std::fs::write(
            &path,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{},"geometry":{"type":"Polygon",
                 "coordinates":[[[1,1],[1,4],[4,4],[4,1],[1,1]]]}},
                {"type":"Feature","properties":{},"geometry":{"type":"MultiLineString",
                 "coordinates":[[[0,0],[1,1]],[[2,2],[3,3],[4,4]]]}},
                {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[5,5]}}
            ]}"#,
        )
        .unwrap();
        let basemap = Basemap::load(&path).unwrap();
        assert_eq!(basemap.features.len(), 3);
        match &basemap.features[0] {
            Feature::Polygon(rings) => {
                assert_eq!(rings.len(), 1);
                assert_eq!(rings[0].len(), 5);
                assert_eq!(rings[0][1], (1.0, 4.0));
            }
            other => panic!("expected polygon, got {other:?}"),
        }
        assert_eq!(basemap.features[2], Feature::Line(vec![(2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]));
    }

    #[test]
    fn missing_basemap_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Basemap::load(&dir.path().join("nope.shp")).is_err());
    }

    #[test]
    fn invalid_extent_is_rejected() {
        let mut options = small_options();
        options.extent = [10.0, 0.0, 0.0, 10.0];
        let err = render_overview(&GeoBounds::from_array([0.0; 4]), &Basemap::default(), &[], &options);
        assert!(err.is_err());
    }

    #[test]
    fn writes_map_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.jpg");
        let mut options = small_options();
        options.title = "test".to_string();
        write_overview(
            &path,
            &GeoBounds::from_array([2.0, 2.0, 8.0, 8.0]),
            &Basemap::default(),
            &[Annotation::tokyo()],
            &options,
        )
        .unwrap();
        assert!(path.exists());
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("map.json")).unwrap()).unwrap();
        assert_eq!(v["annotations"][0]["label"], "Tokyo");
        assert_eq!(v["title"], "test");
    }
}
