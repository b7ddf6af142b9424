use geo::{coord, Coord, Polygon, Rect};

use crate::projection::Projection;

/// Default cell size of the reference grid, degrees.
pub const GRATICULE_STEP_DEG: i32 = 10;

/// Lon/lat grid cells, row by row from the south pole.
#[derive(Debug, Clone, PartialEq)]
pub struct Graticule {
    cells: Vec<Polygon<f64>>,
}

impl Graticule {
    /// Cells of `step` degrees covering the globe in geographic coordinates.
    pub fn geographic(step: i32) -> Self {
        let step = step.max(1);
        let mut cells = Vec::new();
        for lat in (-90..90).step_by(step as usize) {
            for lon in (-180..180).step_by(step as usize) {
                let rect = Rect::new(
                    coord! { x: lon as f64, y: lat as f64 },
                    coord! { x: (lon + step).min(180) as f64, y: (lat + step).min(90) as f64 },
                );
                cells.push(rect.to_polygon());
            }
        }
        Self { cells }
    }

    /// Project the cell corners. Edges stay straight: under Eckert II both
    /// parallels and meridians (within one hemisphere) are straight lines.
    pub fn projected(&self, projection: &Projection) -> Self {
        Self {
            cells: self.cells.iter().map(|c| projection.project(c)).collect(),
        }
    }

    pub fn cells(&self) -> &[Polygon<f64>] {
        &self.cells
    }

    /// Envelope of all cells; `None` for an empty grid.
    pub fn total_bounds(&self) -> Option<Rect<f64>> {
        let mut coords = self.cells.iter().flat_map(|c| c.exterior().0.iter().copied());
        let first = coords.next()?;
        let (lo, hi) = coords.fold((first, first), |(lo, hi), c: Coord<f64>| {
            (
                coord! { x: lo.x.min(c.x), y: lo.y.min(c.y) },
                coord! { x: hi.x.max(c.x), y: hi.y.max(c.y) },
            )
        });
        Some(Rect::new(lo, hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_degree_grid_has_648_cells() {
        let grid = Graticule::geographic(GRATICULE_STEP_DEG);
        assert_eq!(grid.cells().len(), 18 * 36);

        let bounds = grid.total_bounds().unwrap();
        assert_eq!(bounds.min(), coord! { x: -180.0, y: -90.0 });
        assert_eq!(bounds.max(), coord! { x: 180.0, y: 90.0 });
    }

    #[test]
    fn projected_bounds_match_projection_extent() {
        let p = Projection::default();
        let grid = Graticule::geographic(GRATICULE_STEP_DEG).projected(&p);
        let bounds = grid.total_bounds().unwrap();

        let (x_eq, _) = p.forward(180.0, 0.0);
        let (_, y_pole) = p.forward(0.0, 90.0);
        assert!((bounds.max().x - x_eq).abs() < 1e-6);
        assert!((bounds.min().y + y_pole).abs() < 1e-6);
    }

    #[test]
    fn empty_grid_has_no_bounds() {
        let grid = Graticule { cells: vec![] };
        assert!(grid.total_bounds().is_none());
    }
}
