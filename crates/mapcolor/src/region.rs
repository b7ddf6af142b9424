use std::fmt;
use std::str::FromStr;

use geo::{Area, BoundingRect, Coord, MapCoords, MultiPolygon, Polygon, Rect};

use crate::error::{GeometryError, ParseContinentError};

/// Stable index of a region; equal to its position in the loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(pub usize);

impl RegionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Natural Earth `CONTINENT` labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Continent {
    Africa,
    Antarctica,
    Asia,
    Europe,
    NorthAmerica,
    Oceania,
    SevenSeas,
    SouthAmerica,
}

impl Continent {
    /// All continents in rendering order.
    pub const ALL: [Continent; 8] = [
        Continent::Africa,
        Continent::Antarctica,
        Continent::Asia,
        Continent::Europe,
        Continent::NorthAmerica,
        Continent::Oceania,
        Continent::SevenSeas,
        Continent::SouthAmerica,
    ];

    /// The label exactly as it appears in the source attribute table.
    pub fn label(self) -> &'static str {
        match self {
            Continent::Africa => "Africa",
            Continent::Antarctica => "Antarctica",
            Continent::Asia => "Asia",
            Continent::Europe => "Europe",
            Continent::NorthAmerica => "North America",
            Continent::Oceania => "Oceania",
            Continent::SevenSeas => "Seven seas (open ocean)",
            Continent::SouthAmerica => "South America",
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Continent {
    type Err = ParseContinentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Continent::ALL
            .into_iter()
            .find(|c| c.label() == trimmed)
            .ok_or_else(|| ParseContinentError(s.to_owned()))
    }
}

/// A single polygon or an ordered collection of polygons.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl RegionGeometry {
    /// Build from loaded parts: one part stays a `Polygon`, anything else is a `MultiPolygon`.
    pub fn from_parts(mut parts: Vec<Polygon<f64>>) -> Self {
        if parts.len() == 1 {
            RegionGeometry::Polygon(parts.remove(0))
        } else {
            RegionGeometry::MultiPolygon(MultiPolygon::new(parts))
        }
    }

    /// The polygons making up this geometry, in source order.
    pub fn parts(&self) -> &[Polygon<f64>] {
        match self {
            RegionGeometry::Polygon(p) => std::slice::from_ref(p),
            RegionGeometry::MultiPolygon(mp) => &mp.0,
        }
    }

    pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
        MultiPolygon::new(self.parts().to_vec())
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.parts()
            .iter()
            .filter_map(|p| p.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    Coord {
                        x: a.min().x.min(b.min().x),
                        y: a.min().y.min(b.min().y),
                    },
                    Coord {
                        x: a.max().x.max(b.max().x),
                        y: a.max().y.max(b.max().y),
                    },
                )
            })
    }

    /// Apply `func` to every coordinate, keeping the variant.
    pub fn map_coords(&self, func: impl Fn(Coord<f64>) -> Coord<f64> + Copy) -> Self {
        match self {
            RegionGeometry::Polygon(p) => RegionGeometry::Polygon(p.map_coords(func)),
            RegionGeometry::MultiPolygon(mp) => RegionGeometry::MultiPolygon(mp.map_coords(func)),
        }
    }

    /// Reject geometry a touches test cannot be trusted on.
    pub fn validate(&self, region: RegionId, name: &str) -> Result<(), GeometryError> {
        let parts = self.parts();
        if parts.is_empty() {
            return Err(GeometryError::Empty {
                region,
                name: name.to_owned(),
            });
        }

        for (part, polygon) in parts.iter().enumerate() {
            let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());
            for (ring, line) in rings.enumerate() {
                // Rings are closed, so a triangle already has four coordinates.
                if line.0.len() < 4 {
                    return Err(GeometryError::RingTooShort {
                        region,
                        name: name.to_owned(),
                        part,
                        ring,
                        len: line.0.len(),
                    });
                }
                if line.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
                    return Err(GeometryError::NonFinite {
                        region,
                        name: name.to_owned(),
                        part,
                    });
                }
            }

            if polygon.unsigned_area() <= 0.0 {
                return Err(GeometryError::ZeroArea {
                    region,
                    name: name.to_owned(),
                    part,
                });
            }
        }

        Ok(())
    }
}

impl From<Polygon<f64>> for RegionGeometry {
    fn from(p: Polygon<f64>) -> Self {
        RegionGeometry::Polygon(p)
    }
}

impl From<MultiPolygon<f64>> for RegionGeometry {
    fn from(mp: MultiPolygon<f64>) -> Self {
        RegionGeometry::MultiPolygon(mp)
    }
}

/// One country (or other admin-0 unit) from the boundaries dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    id: RegionId,
    name: String,
    continent: Continent,
    geometry: RegionGeometry,
}

impl Region {
    pub fn new(
        id: RegionId,
        name: impl Into<String>,
        continent: Continent,
        geometry: impl Into<RegionGeometry>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            continent,
            geometry: geometry.into(),
        }
    }

    pub fn id(&self) -> RegionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn continent(&self) -> Continent {
        self.continent
    }

    pub fn geometry(&self) -> &RegionGeometry {
        &self.geometry
    }

    /// Same region with every coordinate passed through `func`.
    pub fn reprojected(&self, func: impl Fn(Coord<f64>) -> Coord<f64> + Copy) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            continent: self.continent,
            geometry: self.geometry.map_coords(func),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, LineString};

    fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
        ]
    }

    #[test]
    fn continent_labels_parse_back() {
        for c in Continent::ALL {
            assert_eq!(c.label().parse::<Continent>(), Ok(c));
        }
        assert_eq!(
            "Atlantis".parse::<Continent>(),
            Err(ParseContinentError("Atlantis".into()))
        );
    }

    #[test]
    fn parts_is_uniform_over_variants() {
        let single = RegionGeometry::from_parts(vec![square(0.0, 0.0, 1.0)]);
        assert!(matches!(single, RegionGeometry::Polygon(_)));
        assert_eq!(single.parts().len(), 1);

        let multi = RegionGeometry::from_parts(vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0)]);
        assert!(matches!(multi, RegionGeometry::MultiPolygon(_)));
        assert_eq!(multi.parts().len(), 2);

        let rect = multi.bounding_rect().unwrap();
        assert_eq!(rect.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(rect.max(), Coord { x: 6.0, y: 6.0 });
    }

    #[test]
    fn validate_rejects_degenerate_shapes() {
        let id = RegionId(3);

        let empty = RegionGeometry::MultiPolygon(MultiPolygon::new(vec![]));
        assert!(matches!(empty.validate(id, "x"), Err(GeometryError::Empty { .. })));

        let sliver = RegionGeometry::Polygon(Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]),
            vec![],
        ));
        assert!(matches!(
            sliver.validate(id, "x"),
            Err(GeometryError::RingTooShort { .. })
        ));

        let flat = RegionGeometry::Polygon(Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]),
            vec![],
        ));
        assert!(matches!(flat.validate(id, "x"), Err(GeometryError::ZeroArea { .. })));

        let nan = RegionGeometry::Polygon(Polygon::new(
            LineString::from(vec![(0.0, 0.0), (f64::NAN, 0.0), (1.0, 1.0)]),
            vec![],
        ));
        assert!(matches!(nan.validate(id, "x"), Err(GeometryError::NonFinite { .. })));

        assert!(RegionGeometry::from(square(0.0, 0.0, 1.0)).validate(id, "x").is_ok());
    }

    #[test]
    fn reprojection_keeps_identity() {
        let region = Region::new(RegionId(0), "Square", Continent::Europe, square(1.0, 1.0, 1.0));
        let moved = region.reprojected(|c| Coord { x: c.x * 2.0, y: c.y * 2.0 });

        assert_eq!(moved.id(), region.id());
        assert_eq!(moved.name(), "Square");
        assert_eq!(moved.continent(), Continent::Europe);
        let rect = moved.geometry().bounding_rect().unwrap();
        assert_eq!(rect.max(), Coord { x: 4.0, y: 4.0 });
    }
}
