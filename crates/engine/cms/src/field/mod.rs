//! Scalar fields
//!
//! A field is any deterministic function `(x, y, z) -> f64` whose zero set is
//! the surface to extract. Negative values are inside.
//!
//! - [`Isosurface`]: named built-in fields (sphere, torus, cube, terrain, ...)
//! - [`ExpressionField`]: fields compiled from a text expression
//! - any `Fn(f64, f64, f64) -> f64` closure

mod expr;
mod library;

pub use expr::ExpressionField;
pub use library::Isosurface;

use glam::DVec3;

use crate::vertex::normalize_guarded;

/// Forward-difference step used for vertex normals
pub const NORMAL_STEP: f64 = 0.01;

/// Scalar field sampled by the extractor
pub trait ScalarField {
    /// Field value at a world position
    fn evaluate(&self, x: f64, y: f64, z: f64) -> f64;

    /// Field value at a world position given as a vector
    #[inline]
    fn evaluate_at(&self, p: DVec3) -> f64 {
        self.evaluate(p.x, p.y, p.z)
    }

    /// Forward-difference gradient with per-axis step, using a known centre value
    fn forward_difference(&self, p: DVec3, step: DVec3, value: f64) -> DVec3 {
        DVec3::new(
            self.evaluate(p.x + step.x, p.y, p.z) - value,
            self.evaluate(p.x, p.y + step.y, p.z) - value,
            self.evaluate(p.x, p.y, p.z + step.z) - value,
        )
    }

    /// Unit surface normal estimated by a forward difference of `step`
    fn gradient_normal(&self, p: DVec3, step: f64) -> DVec3 {
        let value = self.evaluate_at(p);
        normalize_guarded(self.forward_difference(p, DVec3::splat(step), value))
    }
}

impl<F> ScalarField for F
where
    F: Fn(f64, f64, f64) -> f64 + ?Sized,
{
    #[inline]
    fn evaluate(&self, x: f64, y: f64, z: f64) -> f64 {
        self(x, y, z)
    }
}
