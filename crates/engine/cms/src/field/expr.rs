//! Fields compiled from text expressions
//!
//! Uses fasteval for compiled expression evaluation. Besides fasteval's
//! built-ins (`sin`, `cos`, `abs`, `min`, `max`, `^`, ...) the namespace
//! provides:
//!
//! - `x`, `y`, `z` - world position
//! - `sqrt(v)`, `exp(v)`, `pow(b, e)`
//! - `noise(x, y, z)` - Perlin noise in [-1, 1]
//! - `fbm(x, y, z, octaves)` - normalized fractal sum of Perlin octaves

use std::fmt;

use fasteval::{Compiler, Evaler, Instruction, Slab};
use noise::{NoiseFn, Perlin};

use super::ScalarField;
use crate::error::{CmsError, Result};

/// Octave count cap for `fbm`
const MAX_FBM_OCTAVES: u32 = 12;

/// Scalar field defined by an expression in `x`, `y`, `z`
pub struct ExpressionField {
    source: String,
    compiled: Instruction,
    slab: Slab,
    perlin: Perlin,
}

impl ExpressionField {
    /// Compile an expression such as `"x^2 + y^2 + z^2 - 1"`
    pub fn compile(source: &str) -> Result<Self> {
        let parser = fasteval::Parser::new();
        let mut slab = Slab::new();

        let compiled = parser
            .parse(source, &mut slab.ps)
            .map_err(|e| CmsError::Expression(format!("{}: {}", source, e)))?
            .from(&slab.ps)
            .compile(&slab.ps, &mut slab.cs);

        Ok(Self {
            source: source.to_string(),
            compiled,
            slab,
            perlin: Perlin::new(0),
        })
    }

    /// The expression text this field was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    fn fbm(&self, x: f64, y: f64, z: f64, octaves: u32) -> f64 {
        let mut sum = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut total = 0.0;
        for _ in 0..octaves.clamp(1, MAX_FBM_OCTAVES) {
            sum += amplitude * self.perlin.get([x * frequency, y * frequency, z * frequency]);
            total += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        sum / total
    }
}

impl fmt::Debug for ExpressionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionField")
            .field("source", &self.source)
            .finish()
    }
}

impl ScalarField for ExpressionField {
    /// Evaluation errors (unknown variables, bad arity) yield NaN
    fn evaluate(&self, x: f64, y: f64, z: f64) -> f64 {
        let mut ns = |name: &str, args: Vec<f64>| -> Option<f64> {
            match (name, args.as_slice()) {
                ("x", []) => Some(x),
                ("y", []) => Some(y),
                ("z", []) => Some(z),
                ("sqrt", [v]) => Some(v.sqrt()),
                ("exp", [v]) => Some(v.exp()),
                ("pow", [b, e]) => Some(b.powf(*e)),
                ("noise", [a, b, c]) => Some(self.perlin.get([*a, *b, *c])),
                ("fbm", [a, b, c, o]) => Some(self.fbm(*a, *b, *c, o.max(0.0) as u32)),
                _ => None,
            }
        };

        self.compiled
            .eval(&self.slab, &mut ns)
            .unwrap_or(f64::NAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_expression() {
        let field = ExpressionField::compile("x^2 + y^2 + z^2 - 1").unwrap();
        assert_eq!(field.evaluate(0.0, 0.0, 0.0), -1.0);
        assert_eq!(field.evaluate(1.0, 0.0, 0.0), 0.0);
        assert_eq!(field.evaluate(1.0, 1.0, 1.0), 2.0);
        assert_eq!(field.source(), "x^2 + y^2 + z^2 - 1");
    }

    #[test]
    fn test_custom_functions() {
        let field = ExpressionField::compile("sqrt(x*x + y*y + z*z) - 0.5").unwrap();
        assert!((field.evaluate(3.0, 0.0, 4.0) - 4.5).abs() < 1e-12);

        let field = ExpressionField::compile("max(abs(x), abs(y)) - 1").unwrap();
        assert_eq!(field.evaluate(-2.0, 0.5, 0.0), 1.0);
    }

    #[test]
    fn test_noise_functions_are_bounded() {
        let field = ExpressionField::compile("noise(x, y, z) + fbm(x, y, z, 4)").unwrap();
        for i in 0..20 {
            let t = i as f64 * 0.37;
            let v = field.evaluate(t, -t, 0.5 * t);
            assert!(v.is_finite());
            assert!(v.abs() <= 2.5, "value {v} out of range");
        }
    }

    #[test]
    fn test_parse_error() {
        let result = ExpressionField::compile("x + * y");
        assert!(matches!(result, Err(CmsError::Expression(_))));
    }

    #[test]
    fn test_unknown_variable_is_nan() {
        let field = ExpressionField::compile("x + w").unwrap();
        assert!(field.evaluate(1.0, 2.0, 3.0).is_nan());
    }
}
