//! Natural Earth vector layers.
//!
//! A data directory is indexed once; layers are then looked up by file stem
//! and read from a shapefile, a GeoJSON FeatureCollection, or a zip archive
//! holding a shapefile. Every reader yields the same `Feature` records, which
//! the typed loaders at the bottom of this file turn into map layers.

use std::{
    collections::{BTreeMap, HashMap},
    fs::File,
    io::{BufReader, Cursor, Read, Seek},
    path::{Path, PathBuf},
};

use geo::{Coord, LineString, MultiLineString, MultiPolygon, Polygon};
use log::{debug, warn};
use mapcolor::{Continent, Region, RegionGeometry, RegionId};
use shapefile::dbase::{self, FieldValue};
use shapefile::{PolygonRing, Shape};
use walkdir::WalkDir;

use crate::error::PipelineError;

pub const COUNTRIES: &str = "ne_50m_admin_0_countries";
pub const RIVERS: &str = "ne_50m_rivers_lake_centerlines_scale_rank";
pub const LAKES: &str = "ne_50m_lakes";
pub const GLACIERS: &str = "ne_50m_glaciated_areas";
pub const GEOGRAPHIC_LINES: &str = "ne_50m_geographic_lines";

// ---------------------------------------------------------------------------
// Directory index
// ---------------------------------------------------------------------------

/// Lookup order among files sharing a stem; lower wins.
fn format_rank(path: &Path) -> Option<u8> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())?;

    match ext.as_str() {
        "shp" => Some(0),
        "geojson" | "json" => Some(1),
        "zip" => Some(2),
        _ => None,
    }
}

/// Readable vector files under a directory, keyed by file stem.
#[derive(Debug, Default)]
pub struct DatasetIndex {
    by_stem: BTreeMap<String, Vec<PathBuf>>,
}

impl DatasetIndex {
    pub fn build(dir: &Path) -> Self {
        let mut index = DatasetIndex::default();

        for entry in WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.into_path();
            if format_rank(&path).is_none() {
                continue;
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("")
                .to_owned();
            index.by_stem.entry(stem).or_default().push(path);
        }

        // Ties on rank keep walk order, which is sorted by name.
        for paths in index.by_stem.values_mut() {
            paths.sort_by_key(|p| format_rank(p));
        }

        debug!(
            "Indexed {} vector datasets under {}",
            index.by_stem.len(),
            dir.display()
        );
        index
    }

    /// Preferred file for `stem`: shapefile, then GeoJSON, then zip.
    pub fn resolve(&self, stem: &str) -> Option<&Path> {
        self.by_stem
            .get(stem)
            .and_then(|paths| paths.first())
            .map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.by_stem.len()
    }
}

// ---------------------------------------------------------------------------
// Format-independent records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Polygons(MultiPolygon<f64>),
    Lines(MultiLineString<f64>),
}

/// One row of a vector layer. Attribute values are kept as text.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: FeatureGeometry,
    pub properties: BTreeMap<String, String>,
}

/// Attribute lookup ignoring key case (`NAME`, `name`, `Name`).
fn property<'a>(properties: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    properties
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}

fn dataset_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read every feature of the dataset at `path`, choosing the reader by extension.
pub fn read_features(path: &Path) -> Result<Vec<Feature>, PipelineError> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    debug!("Reading {}", path.display());
    let features = match ext.as_str() {
        "shp" => read_shapefile(path)?,
        "zip" => read_zipped_shapefile(path)?,
        "geojson" | "json" => read_geojson(path)?,
        _ => {
            return Err(PipelineError::MissingInput {
                what: format!("vector dataset (unsupported extension {ext:?})"),
                path: path.to_owned(),
            })
        }
    };
    debug!("{}: {} features", path.display(), features.len());
    Ok(features)
}

// ---------------------------------------------------------------------------
// Shapefile
// ---------------------------------------------------------------------------

fn read_shapefile(path: &Path) -> Result<Vec<Feature>, PipelineError> {
    let reader = shapefile::Reader::from_path(path)?;
    collect_shapes(reader, &dataset_name(path))
}

fn read_zipped_shapefile(path: &Path) -> Result<Vec<Feature>, PipelineError> {
    let mut archive = zip::ZipArchive::new(BufReader::new(File::open(path)?))?;

    let mut names: Vec<String> = archive.file_names().map(str::to_owned).collect();
    names.sort();

    let shp_name = names
        .iter()
        .find(|n| n.to_ascii_lowercase().ends_with(".shp"))
        .cloned()
        .ok_or_else(|| PipelineError::MissingInput {
            what: "shapefile inside zip archive".into(),
            path: path.to_owned(),
        })?;
    let dbf_stem = &shp_name[..shp_name.len() - 4];
    let dbf_name = names
        .iter()
        .find(|n| n.len() == shp_name.len() && n.starts_with(dbf_stem) && n.to_ascii_lowercase().ends_with(".dbf"))
        .cloned()
        .ok_or_else(|| PipelineError::MissingInput {
            what: format!("attribute table for {shp_name}"),
            path: path.to_owned(),
        })?;

    let mut read_entry = |name: &str| -> Result<Cursor<Vec<u8>>, PipelineError> {
        let mut entry = archive.by_name(name)?;
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buf)?;
        Ok(Cursor::new(buf))
    };
    let shp = read_entry(&shp_name)?;
    let dbf = read_entry(&dbf_name)?;

    debug!("{}: using {} and {}", path.display(), shp_name, dbf_name);
    let shapes = shapefile::ShapeReader::new(shp)?;
    let records = dbase::Reader::new(dbf)?;
    collect_shapes(shapefile::Reader::new(shapes, records), &dataset_name(path))
}

fn field_text(value: FieldValue) -> Option<String> {
    match value {
        FieldValue::Character(s) => s.map(|s| s.trim().to_owned()),
        FieldValue::Memo(s) => Some(s),
        FieldValue::Numeric(n) => n.map(|n| n.to_string()),
        FieldValue::Float(n) => n.map(|n| n.to_string()),
        FieldValue::Double(n) => Some(n.to_string()),
        FieldValue::Integer(n) => Some(n.to_string()),
        FieldValue::Logical(b) => b.map(|b| b.to_string()),
        _ => None,
    }
}

fn to_coord(p: &shapefile::Point) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}

/// Shapefile polygons list rings flat; holes follow the outer ring they belong to.
fn polygon_parts(shape: &shapefile::Polygon) -> MultiPolygon<f64> {
    let mut parts: Vec<Polygon<f64>> = Vec::new();

    for ring in shape.rings() {
        let line: LineString<f64> = ring.points().iter().map(to_coord).collect();
        match ring {
            PolygonRing::Inner(_) if !parts.is_empty() => {
                if let Some(outer) = parts.last_mut() {
                    outer.interiors_push(line);
                }
            }
            _ => parts.push(Polygon::new(line, vec![])),
        }
    }

    MultiPolygon::new(parts)
}

fn collect_shapes<T, D>(mut reader: shapefile::Reader<T, D>, dataset: &str) -> Result<Vec<Feature>, PipelineError>
where
    T: Read + Seek,
    D: Read + Seek,
{
    let mut features = Vec::new();

    for (index, item) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = item?;

        let geometry = match shape {
            Shape::Polygon(p) => FeatureGeometry::Polygons(polygon_parts(&p)),
            Shape::Polyline(l) => FeatureGeometry::Lines(MultiLineString::new(
                l.parts()
                    .iter()
                    .map(|part| part.iter().map(to_coord).collect())
                    .collect(),
            )),
            Shape::NullShape => {
                warn!("{dataset}: record {index} has no geometry, skipped");
                continue;
            }
            other => {
                return Err(PipelineError::invalid(
                    dataset,
                    index,
                    format!("unsupported shape type {:?}", other.shapetype()),
                ))
            }
        };

        let properties = HashMap::<String, FieldValue>::from(record)
            .into_iter()
            .filter_map(|(k, v)| field_text(v).map(|v| (k, v)))
            .collect();

        features.push(Feature { geometry, properties });
    }

    Ok(features)
}

// ---------------------------------------------------------------------------
// GeoJSON
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Deserialize)]
struct FeatureCollection {
    features: Vec<JsonFeature>,
}

#[derive(Debug, serde::Deserialize)]
struct JsonFeature {
    geometry: Option<JsonGeometry>,
    #[serde(default)]
    properties: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Positions may carry a third (height) value, which is ignored.
type Position = Vec<f64>;

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type")]
enum JsonGeometry {
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    #[serde(other)]
    Unsupported,
}

fn json_line(positions: &[Position], dataset: &str, index: usize) -> Result<LineString<f64>, PipelineError> {
    positions
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(PipelineError::invalid(dataset, index, "position with fewer than 2 values")),
        })
        .collect()
}

fn json_polygon(rings: &[Vec<Position>], dataset: &str, index: usize) -> Result<Polygon<f64>, PipelineError> {
    let mut rings = rings.iter();
    let exterior = match rings.next() {
        Some(r) => json_line(r, dataset, index)?,
        None => return Err(PipelineError::invalid(dataset, index, "polygon without rings")),
    };
    let interiors = rings
        .map(|r| json_line(r, dataset, index))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn read_geojson(path: &Path) -> Result<Vec<Feature>, PipelineError> {
    let dataset = dataset_name(path);
    let root: FeatureCollection = serde_json::from_reader(BufReader::new(File::open(path)?))?;

    let mut features = Vec::with_capacity(root.features.len());
    for (index, feature) in root.features.into_iter().enumerate() {
        let geometry = match feature.geometry {
            None => {
                warn!("{dataset}: feature {index} has no geometry, skipped");
                continue;
            }
            Some(JsonGeometry::Polygon { coordinates }) => FeatureGeometry::Polygons(MultiPolygon::new(vec![
                json_polygon(&coordinates, &dataset, index)?,
            ])),
            Some(JsonGeometry::MultiPolygon { coordinates }) => FeatureGeometry::Polygons(MultiPolygon::new(
                coordinates
                    .iter()
                    .map(|p| json_polygon(p, &dataset, index))
                    .collect::<Result<_, _>>()?,
            )),
            Some(JsonGeometry::LineString { coordinates }) => {
                FeatureGeometry::Lines(MultiLineString::new(vec![json_line(&coordinates, &dataset, index)?]))
            }
            Some(JsonGeometry::MultiLineString { coordinates }) => FeatureGeometry::Lines(MultiLineString::new(
                coordinates
                    .iter()
                    .map(|l| json_line(l, &dataset, index))
                    .collect::<Result<_, _>>()?,
            )),
            Some(JsonGeometry::Unsupported) => {
                return Err(PipelineError::invalid(&dataset, index, "unsupported geometry type"))
            }
        };

        let properties = feature
            .properties
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(k, v)| match v {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some((k, s)),
                other => Some((k, other.to_string())),
            })
            .collect();

        features.push(Feature { geometry, properties });
    }

    Ok(features)
}

// ---------------------------------------------------------------------------
// Typed layers
// ---------------------------------------------------------------------------

/// A geographic line layer entry (equator, tropics, polar circles, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct NamedLines {
    pub name: String,
    pub lines: MultiLineString<f64>,
}

type Properties = BTreeMap<String, String>;

fn expect_polygons(feature: Feature, dataset: &str, index: usize) -> Result<(MultiPolygon<f64>, Properties), PipelineError> {
    match feature.geometry {
        FeatureGeometry::Polygons(mp) => Ok((mp, feature.properties)),
        FeatureGeometry::Lines(_) => Err(PipelineError::invalid(dataset, index, "expected polygon geometry")),
    }
}

fn expect_lines(feature: Feature, dataset: &str, index: usize) -> Result<(MultiLineString<f64>, Properties), PipelineError> {
    match feature.geometry {
        FeatureGeometry::Lines(ml) => Ok((ml, feature.properties)),
        FeatureGeometry::Polygons(_) => Err(PipelineError::invalid(dataset, index, "expected line geometry")),
    }
}

/// Country records: requires `NAME` and `CONTINENT`. Ids follow load order.
pub fn load_regions(path: &Path) -> Result<Vec<Region>, PipelineError> {
    let dataset = dataset_name(path);

    read_features(path)?
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let (parts, properties) = expect_polygons(feature, &dataset, index)?;
            let name = property(&properties, "NAME")
                .ok_or_else(|| PipelineError::invalid(&dataset, index, "missing NAME"))?;
            let label = property(&properties, "CONTINENT")
                .ok_or_else(|| PipelineError::invalid(&dataset, index, "missing CONTINENT"))?;
            let continent: Continent = label.parse().map_err(|_| PipelineError::UnknownContinent {
                dataset: dataset.clone(),
                name: name.to_owned(),
                value: label.to_owned(),
            })?;

            Ok(Region::new(
                RegionId(index),
                name,
                continent,
                RegionGeometry::from_parts(parts.0),
            ))
        })
        .collect()
}

pub fn load_polygons(path: &Path) -> Result<Vec<MultiPolygon<f64>>, PipelineError> {
    let dataset = dataset_name(path);
    read_features(path)?
        .into_iter()
        .enumerate()
        .map(|(index, f)| expect_polygons(f, &dataset, index).map(|(mp, _)| mp))
        .collect()
}

pub fn load_lines(path: &Path) -> Result<Vec<MultiLineString<f64>>, PipelineError> {
    let dataset = dataset_name(path);
    read_features(path)?
        .into_iter()
        .enumerate()
        .map(|(index, f)| expect_lines(f, &dataset, index).map(|(ml, _)| ml))
        .collect()
}

/// Line layer keyed by the lower-case `name` attribute.
pub fn load_named_lines(path: &Path) -> Result<Vec<NamedLines>, PipelineError> {
    let dataset = dataset_name(path);
    read_features(path)?
        .into_iter()
        .enumerate()
        .map(|(index, f)| {
            let (lines, properties) = expect_lines(f, &dataset, index)?;
            let name = property(&properties, "name")
                .ok_or_else(|| PipelineError::invalid(&dataset, index, "missing name"))?
                .to_owned();
            Ok(NamedLines { name, lines })
        })
        .collect()
}
