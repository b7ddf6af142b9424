//! Map projections used for the output.
//!
//! Eckert II (ESRI:53014) is equal-area and pseudo-cylindrical: parallels are
//! straight and meridians are straight line segments, broken at the equator.
//!
//! Forward (sphere of radius R, lambda/phi in radians):
//!   s = sqrt(4 - 3 sin|phi|)
//!   x = R * FXC * lambda * s
//!   y = R * FYC * (2 - s) * sign(phi)
//! with FXC = 2 / sqrt(6 pi), FYC = sqrt(2 pi / 3).

use std::f64::consts::{FRAC_PI_2, PI};

use geo::{Coord, MapCoords, Rect};

/// Mean Earth radius used by ESRI:53014.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const FXC: f64 = 0.460_658_865_961_780_6;
const FYC: f64 = 1.447_202_509_116_535_3;
const ONE_EPS: f64 = 1.000_000_1;

/// Samples per rectangle edge when computing projected bounds.
const DENSIFY_POINTS: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Eckert II on a sphere, metres.
    Eckert2 { radius: f64 },
    /// Unprojected WGS84 longitude/latitude, degrees.
    Wgs84,
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Eckert2 {
            radius: EARTH_RADIUS_M,
        }
    }
}

impl Projection {
    /// Longitude/latitude in degrees to projected `(x, y)`.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        match *self {
            Projection::Wgs84 => (lon_deg, lat_deg),
            Projection::Eckert2 { radius } => {
                let lam = lon_deg.to_radians();
                let phi = lat_deg.to_radians().clamp(-FRAC_PI_2, FRAC_PI_2);

                let s = (4.0 - 3.0 * phi.abs().sin()).sqrt();
                let x = FXC * lam * s;
                let mut y = FYC * (2.0 - s);
                if phi < 0.0 {
                    y = -y;
                }
                (x * radius, y * radius)
            }
        }
    }

    /// Projected `(x, y)` back to degrees; `None` outside the map's outline.
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        match *self {
            Projection::Wgs84 => {
                if x.abs() <= 180.0 && y.abs() <= 90.0 {
                    Some((x, y))
                } else {
                    None
                }
            }
            Projection::Eckert2 { radius } => {
                let (x, y) = (x / radius, y / radius);

                let t = 2.0 - y.abs() / FYC;
                let mut sin_phi = (4.0 - t * t) / 3.0;
                let phi = if sin_phi.abs() >= 1.0 {
                    if sin_phi.abs() > ONE_EPS {
                        return None;
                    }
                    sin_phi = sin_phi.signum();
                    sin_phi * FRAC_PI_2
                } else {
                    sin_phi.asin()
                };
                let phi = if y < 0.0 { -phi } else { phi };

                let lam = x / (FXC * t);
                if !lam.is_finite() || lam.abs() > PI * ONE_EPS {
                    return None;
                }

                Some((lam.to_degrees(), phi.to_degrees()))
            }
        }
    }

    #[inline]
    pub fn forward_coord(&self, c: Coord<f64>) -> Coord<f64> {
        let (x, y) = self.forward(c.x, c.y);
        Coord { x, y }
    }

    /// Reproject any `geo` geometry given in lon/lat degrees.
    pub fn project<G>(&self, geometry: &G) -> G::Output
    where
        G: MapCoords<f64, f64>,
    {
        let projection = *self;
        geometry.map_coords(move |c| projection.forward_coord(c))
    }

    /// Factor from projected units to SVG user units.
    pub fn svg_scale(&self) -> f64 {
        match self {
            Projection::Eckert2 { .. } => 1e-6,
            Projection::Wgs84 => 0.1,
        }
    }

    /// Envelope of a lon/lat rectangle after projection, sampling each edge.
    pub fn projected_bounds(&self, geographic: Rect<f64>) -> Rect<f64> {
        let (min, max) = (geographic.min(), geographic.max());
        let step = |a: f64, b: f64, i: usize| a + (b - a) * i as f64 / (DENSIFY_POINTS - 1) as f64;

        let mut lo = Coord {
            x: f64::INFINITY,
            y: f64::INFINITY,
        };
        let mut hi = Coord {
            x: f64::NEG_INFINITY,
            y: f64::NEG_INFINITY,
        };

        for i in 0..DENSIFY_POINTS {
            let lon = step(min.x, max.x, i);
            let lat = step(min.y, max.y, i);
            for (x, y) in [
                self.forward(lon, min.y),
                self.forward(lon, max.y),
                self.forward(min.x, lat),
                self.forward(max.x, lat),
            ] {
                lo.x = lo.x.min(x);
                lo.y = lo.y.min(y);
                hi.x = hi.x.max(x);
                hi.y = hi.y.max(y);
            }
        }

        Rect::new(lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, LineString};

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn eckert2_extents() {
        let p = Projection::default();

        let (x, y) = p.forward(0.0, 0.0);
        assert_eq!((x, y), (0.0, 0.0));

        // Equator is twice as long as the pole line.
        let (x_eq, _) = p.forward(180.0, 0.0);
        let (x_pole, y_pole) = p.forward(180.0, 90.0);
        assert!(close(x_eq, 2.0 * x_pole, 1e-6));
        assert!(close(x_eq, FXC * PI * 2.0 * EARTH_RADIUS_M, 1e-3));
        assert!(close(y_pole, FYC * EARTH_RADIUS_M, 1e-3));

        let (_, y_south) = p.forward(0.0, -90.0);
        assert!(close(y_south, -y_pole, 1e-9));
    }

    #[test]
    fn eckert2_round_trips() {
        let p = Projection::default();
        for &(lon, lat) in &[(0.0, 0.0), (12.5, 41.9), (-74.0, 40.7), (151.2, -33.9), (-179.0, -85.0), (179.9, 89.0)] {
            let (x, y) = p.forward(lon, lat);
            let (lon2, lat2) = p.inverse(x, y).expect("inside the outline");
            assert!(close(lon, lon2, 1e-9), "lon {lon} -> {lon2}");
            assert!(close(lat, lat2, 1e-9), "lat {lat} -> {lat2}");
        }
    }

    #[test]
    fn eckert2_inverse_rejects_outside() {
        let p = Projection::default();
        let (x_pole, y_pole) = p.forward(180.0, 90.0);
        // Corner of the bounding box is outside the trapezoid.
        assert!(p.inverse(x_pole * 1.9, y_pole * 0.99).is_none());
        assert!(p.inverse(0.0, y_pole * 1.01).is_none());
    }

    #[test]
    fn equal_area_strips() {
        // A projected 10x10 degree cell has the area of the spherical cell.
        let p = Projection::default();
        let band_area = |lat0: f64, lat1: f64| {
            // Trapezoid between the central meridian and the (straight) 10 degree meridian.
            let (x0, y0) = p.forward(10.0, lat0);
            let (x1, y1) = p.forward(10.0, lat1);
            0.5 * (x0 + x1) * (y1 - y0).abs()
        };
        let sphere = |lat0: f64, lat1: f64| {
            EARTH_RADIUS_M.powi(2) * 10f64.to_radians() * (lat1.to_radians().sin() - lat0.to_radians().sin())
        };
        for (a, b) in [(0.0, 10.0), (40.0, 50.0), (70.0, 80.0)] {
            let rel = (band_area(a, b) - sphere(a, b)).abs() / sphere(a, b);
            assert!(rel < 1e-9, "band {a}..{b} off by {rel}");
        }
    }

    #[test]
    fn projected_bounds_cover_the_world() {
        let p = Projection::default();
        let world = Rect::new(coord! { x: -180.0, y: -90.0 }, coord! { x: 180.0, y: 90.0 });
        let b = p.projected_bounds(world);
        let (x_eq, _) = p.forward(180.0, 0.0);
        let (_, y_pole) = p.forward(0.0, 90.0);
        assert!(close(b.max().x, x_eq, 1e-3));
        assert!(close(b.min().x, -x_eq, 1e-3));
        assert!(close(b.max().y, y_pole, 1e-3));
        assert!(close(b.min().y, -y_pole, 1e-3));
    }

    #[test]
    fn wgs84_is_identity() {
        let p = Projection::Wgs84;
        let line = LineString::from(vec![(1.0, 2.0), (3.0, 4.0)]);
        assert_eq!(p.project(&line), line);
        assert_eq!(p.svg_scale(), 0.1);
        assert!(p.inverse(200.0, 0.0).is_none());
    }
}
