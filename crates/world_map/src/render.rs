//! Layer composition.
//!
//! Every geometry handed to `render` is already projected. Here it is only
//! scaled to SVG units with `y` pointing down.

use geo::{LineString, MultiLineString, MultiPolygon, Polygon, Rect};
use mapcolor::{
    palette::WATER,
    svg::{Group, Image, Num, Shape, SvgDocument, ViewBox},
    ColorAssignment, Continent, FillScheme, Graticule, Region,
};

use crate::datasets::NamedLines;

/// Projected map content, in drawing order.
#[derive(Debug, Clone)]
pub struct MapLayers {
    pub regions: Vec<Region>,
    pub colors: ColorAssignment,
    pub rivers: Vec<MultiLineString<f64>>,
    pub lakes: Vec<MultiPolygon<f64>>,
    pub glaciers: Vec<MultiPolygon<f64>>,
    pub graticule: Graticule,
    pub geographic_lines: Vec<NamedLines>,
    /// JPEG bytes of the projected relief.
    pub relief: Option<Vec<u8>>,
}

/// Exterior ring without its closing vertex.
fn ring_points(polygon: &Polygon<f64>, scale: f64) -> Vec<(f64, f64)> {
    let coords = &polygon.exterior().0;
    let open = coords.len().saturating_sub(1);
    coords[..open]
        .iter()
        .map(|c| (c.x * scale, -c.y * scale))
        .collect()
}

fn line_points(line: &LineString<f64>, scale: f64) -> Vec<(f64, f64)> {
    line.0.iter().map(|c| (c.x * scale, -c.y * scale)).collect()
}

fn countries(layers: &MapLayers, fill: FillScheme, scale: f64) -> Group {
    let mut countries = Group::with_id("countries").set("opacity", 0.15);

    for continent in Continent::ALL {
        let mut group = Group::with_id(continent.label());
        if let Some(color) = fill.continent_fill(continent) {
            group = group.set("fill", color);
        }

        for (node, region) in layers.regions.iter().enumerate() {
            if region.continent() != continent {
                continue;
            }
            let color = fill.region_fill(region, node, &layers.colors);
            let mut country = Group::for_feature(region.name());
            for part in region.geometry().parts() {
                country.add(Shape::polygon(ring_points(part, scale)).set("fill", color));
            }
            group.add(country);
        }

        countries.add(group);
    }

    countries
}

fn polygon_layer<'a>(
    id: &str,
    polygons: impl IntoIterator<Item = &'a Polygon<f64>>,
    scale: f64,
    style: &[(&'static str, &str)],
) -> Group {
    let mut group = Group::with_id(id);
    for polygon in polygons {
        let mut shape = Shape::polygon(ring_points(polygon, scale));
        for &(name, value) in style {
            shape = shape.set(name, value);
        }
        group.add(shape);
    }
    group
}

fn geographic_lines(lines: &[NamedLines], scale: f64) -> Group {
    let mut group = Group::with_id("geographic_lines");
    for named in lines {
        let mut line_group = Group::for_feature(&named.name);
        for line in &named.lines {
            line_group.add(
                Shape::polyline(line_points(line, scale))
                    .set("fill", "none")
                    .set("stroke", "black")
                    .set("stroke-opacity", 0.2)
                    .set("stroke-dasharray", 0.1)
                    .set("stroke-width", 0.03),
            );
        }
        group.add(line_group);
    }
    group
}

/// Compose the full map. `bounds` is the projected extent shown by the viewBox.
pub fn render(layers: &MapLayers, fill: FillScheme, bounds: Rect<f64>, scale: f64) -> SvgDocument {
    let view_box = ViewBox::from_bounds(bounds, scale);
    let mut doc = SvgDocument::new(view_box);
    doc.set("fill", WATER);
    doc.set("stroke", WATER);
    doc.set("stroke-width", 0.01);

    if let Some(jpeg) = &layers.relief {
        doc.add(
            Image::new(crate::relief::data_uri(jpeg))
                .set("height", "100%")
                .set("width", "100%")
                .set("x", Num(view_box.min_x))
                .set("y", Num(view_box.min_y)),
        );
    }

    doc.add(countries(layers, fill, scale));

    let mut rivers = Group::with_id("rivers");
    for line in layers.rivers.iter().flatten() {
        rivers.add(Shape::polyline(line_points(line, scale)).set("fill", "none"));
    }
    doc.add(rivers);

    doc.add(polygon_layer(
        "lakes",
        layers.lakes.iter().flatten(),
        scale,
        &[("stroke", "none")],
    ));
    doc.add(polygon_layer(
        "glaciers",
        layers.glaciers.iter().flatten(),
        scale,
        &[("stroke", "none"), ("fill", "white")],
    ));
    doc.add(polygon_layer(
        "graticules",
        layers.graticule.cells(),
        scale,
        &[("fill", "none"), ("stroke", "black"), ("stroke-opacity", "0.1")],
    ));
    doc.add(geographic_lines(&layers.geographic_lines, scale));
    doc.add(polygon_layer(
        "borders",
        layers.regions.iter().flat_map(|r| r.geometry().parts()),
        scale,
        &[("fill", "none"), ("stroke", "black")],
    ));

    doc
}
