//! Built-in isosurfaces

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use super::ScalarField;
use crate::error::CmsError;

/// Named analytic fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Isosurface {
    /// Unit sphere
    Sphere,
    /// Quartic torus, major radius 0.45, minor radius 0.2
    Torus,
    /// Axis-aligned cube of half-size 1
    Cube,
    /// Height field built from fractal noise
    Terrain,
    /// Triply periodic gyroid
    Gyroid,
    /// Genus-2 implicit surface
    DoubleTorus,
}

impl Isosurface {
    pub const ALL: [Isosurface; 6] = [
        Isosurface::Sphere,
        Isosurface::Torus,
        Isosurface::Cube,
        Isosurface::Terrain,
        Isosurface::Gyroid,
        Isosurface::DoubleTorus,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Isosurface::Sphere => "sphere",
            Isosurface::Torus => "torus",
            Isosurface::Cube => "cube",
            Isosurface::Terrain => "terrain",
            Isosurface::Gyroid => "gyroid",
            Isosurface::DoubleTorus => "double_torus",
        }
    }

    /// Look up a field by case-insensitive name (`doubletorus` is accepted too)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sphere" => Some(Isosurface::Sphere),
            "torus" => Some(Isosurface::Torus),
            "cube" => Some(Isosurface::Cube),
            "terrain" => Some(Isosurface::Terrain),
            "gyroid" => Some(Isosurface::Gyroid),
            "double_torus" | "doubletorus" => Some(Isosurface::DoubleTorus),
            _ => None,
        }
    }
}

impl fmt::Display for Isosurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Isosurface {
    type Err = CmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Isosurface::from_name(s)
            .ok_or_else(|| CmsError::InvalidConfig(format!("unknown isosurface '{}'", s)))
    }
}

impl ScalarField for Isosurface {
    fn evaluate(&self, x: f64, y: f64, z: f64) -> f64 {
        match self {
            Isosurface::Sphere => sphere(x, y, z),
            Isosurface::Torus => torus(x, y, z),
            Isosurface::Cube => cube(x, y, z),
            Isosurface::Terrain => terrain(x, y, z),
            Isosurface::Gyroid => gyroid(x, y, z),
            Isosurface::DoubleTorus => double_torus(x, y, z),
        }
    }
}

fn sphere(x: f64, y: f64, z: f64) -> f64 {
    x * x + y * y + z * z - 1.0
}

fn torus(x: f64, y: f64, z: f64) -> f64 {
    const MAJOR: f64 = 0.45;
    const MINOR: f64 = 0.2;
    let x0 = x - 0.25;
    let q = x0 * x0 + y * y + z * z + MAJOR * MAJOR - MINOR * MINOR;
    q * q - 4.0 * MAJOR * MAJOR * (z * z + x0 * x0)
}

fn cube(x: f64, y: f64, z: f64) -> f64 {
    (x.abs() - 1.0).max((y.abs() - 1.0).max(z.abs() - 1.0))
}

fn terrain_noise() -> &'static Fbm<Perlin> {
    static NOISE: OnceLock<Fbm<Perlin>> = OnceLock::new();
    NOISE.get_or_init(|| {
        Fbm::<Perlin>::new(0)
            .set_octaves(3)
            .set_lacunarity(2.2)
            .set_persistence(0.42)
    })
}

fn terrain(x: f64, y: f64, z: f64) -> f64 {
    const GROUND_HEIGHT: f64 = -0.25;
    const SCALE: f64 = 1.5;

    // Rotate a few degrees about y
    let (rx, rz) = (x * 0.98 - z * 0.17, x * 0.17 + z * 0.98);
    let noise = terrain_noise().get([rx * SCALE, y * SCALE, rz * SCALE]) * 0.5 + 0.5;

    let variation = (x * 3.1 + z * 2.7).sin() * 0.05;
    let height = noise * 0.8 + variation;
    let centre_bump = (0.1 - (x * x + z * z)).max(0.0) * 0.2;

    y - (GROUND_HEIGHT + height + centre_bump)
}

fn gyroid(x: f64, y: f64, z: f64) -> f64 {
    x.sin() * y.cos() + y.sin() * z.cos() + z.sin() * x.cos()
}

fn double_torus(x: f64, y: f64, z: f64) -> f64 {
    let x2 = x * x;
    let y2 = y * y;
    -(0.01 - x2 * x2 + 2.0 * x2 * x2 * x2 - x2 * x2 * x2 * x2 + 2.0 * x2 * y2
        - 2.0 * x2 * x2 * y2
        - y2 * y2
        - z * z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for surface in Isosurface::ALL {
            assert_eq!(Isosurface::from_name(surface.name()), Some(surface));
        }
        assert_eq!(Isosurface::from_name("SPHERE"), Some(Isosurface::Sphere));
        assert_eq!(
            Isosurface::from_name("doubleTorus"),
            Some(Isosurface::DoubleTorus)
        );
        assert_eq!(Isosurface::from_name("teapot"), None);
        assert!("teapot".parse::<Isosurface>().is_err());
    }

    #[test]
    fn test_sphere_sign_convention() {
        let s = Isosurface::Sphere;
        assert!(s.evaluate(0.0, 0.0, 0.0) < 0.0);
        assert_eq!(s.evaluate(1.0, 0.0, 0.0), 0.0);
        assert!(s.evaluate(1.0, 1.0, 0.0) > 0.0);
    }

    #[test]
    fn test_cube_faces() {
        let c = Isosurface::Cube;
        assert_eq!(c.evaluate(1.0, 0.3, -0.5), 0.0);
        assert_eq!(c.evaluate(0.0, 0.0, 0.0), -1.0);
        assert_eq!(c.evaluate(0.0, -1.5, 0.0), 0.5);
    }

    #[test]
    fn test_torus_tube_is_inside() {
        let t = Isosurface::Torus;
        // Centre of the tube: distance MAJOR from the axis through (0.25, y, 0)
        assert!(t.evaluate(0.25 + 0.45, 0.0, 0.0) < 0.0);
        assert!(t.evaluate(0.25, 0.0, 0.0) > 0.0);
    }

    #[test]
    fn test_terrain_is_deterministic_and_layered() {
        let t = Isosurface::Terrain;
        assert_eq!(t.evaluate(0.3, 0.1, -0.4), t.evaluate(0.3, 0.1, -0.4));
        assert!(t.evaluate(0.0, -1.0, 0.0) < 0.0, "deep points are inside");
        assert!(t.evaluate(0.0, 1.0, 0.0) > 0.0, "high points are outside");
    }

    #[test]
    fn test_fields_are_finite_in_unit_box() {
        for surface in Isosurface::ALL {
            for &p in &[-1.0, -0.33, 0.0, 0.5, 1.0] {
                assert!(surface.evaluate(p, -p, p * 0.5).is_finite(), "{surface}");
            }
        }
    }
}
