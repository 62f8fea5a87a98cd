//! Time domain supplied by the owning flowsheet.

use cv_core::{CvError, CvResult, Real, ensure_finite};

#[derive(Clone, Debug, PartialEq)]
pub struct TimeDomain {
    points: Vec<Real>,
    dynamic: bool,
}

impl TimeDomain {
    /// Single time point at 0.
    pub fn steady() -> Self {
        Self {
            points: vec![0.0],
            dynamic: false,
        }
    }

    /// Strictly increasing time points (at least two).
    pub fn dynamic(points: &[Real]) -> CvResult<Self> {
        if points.len() < 2 {
            return Err(CvError::config(
                "a dynamic time domain needs at least two points",
            ));
        }
        for &t in points {
            ensure_finite(t, "time point")?;
        }
        if points.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CvError::config("time points must be strictly increasing"));
        }
        Ok(Self {
            points: points.to_vec(),
            dynamic: true,
        })
    }

    pub fn points(&self) -> &[Real] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }
}
