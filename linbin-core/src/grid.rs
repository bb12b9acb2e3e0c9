use linbin_common::{GridError, LinbinError, Result};
use serde::{Deserialize, Serialize};

/// `m` equally spaced points covering `[a, b]`. Only constructible through validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct GridSpec {
    a: f64,
    b: f64,
    m: usize,
}

#[derive(Deserialize)]
struct RawGrid {
    a: f64,
    b: f64,
    m: usize,
}

impl TryFrom<RawGrid> for GridSpec {
    type Error = LinbinError;
    fn try_from(raw: RawGrid) -> Result<Self> {
        Self::new(raw.a, raw.b, raw.m)
    }
}

impl GridSpec {
    pub fn new(a: f64, b: f64, m: usize) -> Result<Self> {
        if m < 2 {
            return Err(GridError::TooFewPoints { m: m as i64 }.into());
        }
        if !a.is_finite() || !b.is_finite() {
            return Err(GridError::NonFiniteBound { a, b }.into());
        }
        if b <= a {
            return Err(GridError::EmptyRange { a, b }.into());
        }
        // b - a can overflow, and a tiny range can round delta to zero
        let delta = (b - a) / (m - 1) as f64;
        if !(delta.is_finite() && delta > 0.0) {
            return Err(GridError::DegenerateSpacing { a, b, m }.into());
        }
        Ok(Self { a, b, m })
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    pub fn m(&self) -> usize {
        self.m
    }

    /// Grid size as the signed count foreign callers pass.
    pub fn from_raw(a: f64, b: f64, m: i64) -> Result<Self> {
        if m < 2 {
            return Err(GridError::TooFewPoints { m }.into());
        }
        Self::new(a, b, m as usize)
    }

    /// Takes the bounds and size of an existing grid; interior points are not checked.
    pub fn from_points(points: &[f64]) -> Result<Self> {
        match (points.first(), points.last()) {
            (Some(&a), Some(&b)) => Self::new(a, b, points.len()),
            _ => Err(GridError::TooFewPoints { m: 0 }.into()),
        }
    }

    pub fn delta(&self) -> f64 {
        (self.b - self.a) / (self.m - 1) as f64
    }

    pub fn point(&self, i: usize) -> f64 {
        if i + 1 == self.m {
            self.b
        } else {
            self.a + i as f64 * self.delta()
        }
    }

    pub fn points(&self) -> Vec<f64> {
        (0..self.m).map(|i| self.point(i)).collect()
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.a && x <= self.b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linbin_common::LinbinError;

    fn grid_err(r: Result<GridSpec>) -> GridError {
        match r {
            Err(LinbinError::InvalidGrid(e)) => e,
            other => panic!("expected grid error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_single_point() {
        assert_eq!(grid_err(GridSpec::new(0.0, 1.0, 1)), GridError::TooFewPoints { m: 1 });
    }

    #[test]
    fn rejects_negative_raw_size() {
        assert_eq!(grid_err(GridSpec::from_raw(0.0, 1.0, -3)), GridError::TooFewPoints { m: -3 });
    }

    #[test]
    fn rejects_empty_and_reversed_ranges() {
        assert!(matches!(grid_err(GridSpec::new(1.0, 1.0, 5)), GridError::EmptyRange { .. }));
        assert!(matches!(grid_err(GridSpec::new(2.0, 1.0, 5)), GridError::EmptyRange { .. }));
    }

    #[test]
    fn rejects_non_finite_bounds() {
        assert!(matches!(
            grid_err(GridSpec::new(f64::NAN, 1.0, 5)),
            GridError::NonFiniteBound { .. }
        ));
        assert!(matches!(
            grid_err(GridSpec::new(0.0, f64::INFINITY, 5)),
            GridError::NonFiniteBound { .. }
        ));
    }

    #[test]
    fn rejects_overflowing_range() {
        assert_eq!(
            grid_err(GridSpec::new(-f64::MAX, f64::MAX, 3)),
            GridError::DegenerateSpacing { a: -f64::MAX, b: f64::MAX, m: 3 }
        );
    }

    #[test]
    fn rejects_spacing_that_rounds_to_zero() {
        assert!(matches!(
            grid_err(GridSpec::new(0.0, 5e-324, 3)),
            GridError::DegenerateSpacing { m: 3, .. }
        ));
        // two points keep the full subnormal range as spacing
        assert!(GridSpec::new(0.0, 5e-324, 2).is_ok());
    }

    #[test]
    fn deserialize_validates() {
        let g: GridSpec = serde_json::from_str(r#"{"a":0.0,"b":2.0,"m":5}"#).unwrap();
        assert_eq!(g.m(), 5);
        assert!(serde_json::from_str::<GridSpec>(r#"{"a":0.0,"b":1.0,"m":1}"#).is_err());
        assert!(serde_json::from_str::<GridSpec>(r#"{"a":1.0,"b":0.0,"m":3}"#).is_err());
    }

    #[test]
    fn points_span_bounds_exactly() {
        let g = GridSpec::new(0.0, 1.0, 11).unwrap();
        let pts = g.points();
        assert_eq!(pts.len(), 11);
        assert_eq!(pts[0], 0.0);
        assert_eq!(pts[10], 1.0);
        assert!((pts[3] - 0.3).abs() < 1e-12);
        assert!((g.delta() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn from_points_uses_ends_and_len() {
        let g = GridSpec::from_points(&[-1.0, 0.0, 1.0, 2.0]).unwrap();
        assert_eq!((g.a(), g.b(), g.m()), (-1.0, 2.0, 4));
        assert!(GridSpec::from_points(&[]).is_err());
        assert!(GridSpec::from_points(&[1.0]).is_err());
    }
}
