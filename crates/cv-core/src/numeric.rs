use crate::CvError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// Reject NaN/inf coordinates and parameters at the configuration boundary.
pub fn ensure_finite(v: Real, what: &str) -> Result<Real, CvError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CvError::config(format!("non-finite value for {what}: {v}")))
    }
}

/// Sort and deduplicate coordinates, merging values closer than `tol`.
pub fn sorted_unique(values: &[Real], tol: Tolerances) -> Vec<Real> {
    let mut v: Vec<Real> = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    let mut out: Vec<Real> = Vec::with_capacity(v.len());
    for x in v {
        match out.last() {
            Some(&last) if nearly_equal(last, x, tol) => {}
            _ => out.push(x),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
        assert!(format!("{err}").contains("non-finite"));
    }

    #[test]
    fn sorted_unique_merges_duplicates() {
        let v = sorted_unique(&[1.0, 0.5, 0.0, 0.5 + 1e-14, 1.0], Tolerances::default());
        assert_eq!(v, vec![0.0, 0.5, 1.0]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn sorted_unique_is_strictly_increasing(values in proptest::collection::vec(0.0f64..1.0, 0..32)) {
                let out = sorted_unique(&values, Tolerances::default());
                prop_assert!(out.windows(2).all(|w| w[0] < w[1]));
                prop_assert!(out.len() <= values.len());
            }
        }
    }
}
