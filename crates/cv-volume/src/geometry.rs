//! Length domain of a 1D control volume.

use cv_core::{CvError, CvResult, Real, Tolerances, ensure_finite, sorted_unique};

use crate::config::FlowDirection;

/// Finite-element structure recorded by a collocation transformation.
#[derive(Clone, Debug, PartialEq)]
pub struct Collocation {
    /// Point positions of element boundaries, including both domain ends.
    pub element_starts: Vec<usize>,
    /// Collocation nodes per element.
    pub points: usize,
}

/// Ordered dimensionless positions on [0, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct LengthDomain {
    points: Vec<Real>,
    owned: bool,
    transformed: bool,
    collocation: Option<Collocation>,
}

impl LengthDomain {
    /// Domain seeded by a control volume from a coordinate set.
    ///
    /// Endpoints are added when missing; values must lie in [0, 1].
    pub fn from_set(set: &[Real]) -> CvResult<Self> {
        for &x in set {
            ensure_finite(x, "length domain coordinate")?;
            if !(0.0..=1.0).contains(&x) {
                return Err(CvError::config(format!(
                    "length domain coordinate {x} lies outside [0, 1]"
                )));
            }
        }
        let mut all = set.to_vec();
        all.extend([0.0, 1.0]);
        Ok(Self {
            points: sorted_unique(&all, Tolerances::default()),
            owned: true,
            transformed: false,
            collocation: None,
        })
    }

    /// The default `{0, 1}` domain.
    pub fn unit() -> Self {
        Self {
            points: vec![0.0, 1.0],
            owned: true,
            transformed: false,
            collocation: None,
        }
    }

    /// Domain owned and already discretized by someone else.
    pub fn external(points: &[Real]) -> CvResult<Self> {
        let mut d = Self::from_set(points)?;
        if d.points.len() != points.len() {
            return Err(CvError::config(
                "external length domain must be sorted, unique and contain both endpoints",
            ));
        }
        d.owned = false;
        d.transformed = true;
        Ok(d)
    }

    pub(crate) fn discretized(points: Vec<Real>, collocation: Option<Collocation>) -> Self {
        Self {
            points,
            owned: true,
            transformed: true,
            collocation,
        }
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

    pub fn last(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }

    pub fn is_transformed(&self) -> bool {
        self.transformed
    }

    pub fn collocation(&self) -> Option<&Collocation> {
        self.collocation.as_ref()
    }

    /// Position of the boundary point that is upstream for `direction`.
    pub fn inlet(&self, direction: FlowDirection) -> usize {
        match direction {
            FlowDirection::Forward => 0,
            FlowDirection::Backward => self.last(),
        }
    }

    pub fn outlet(&self, direction: FlowDirection) -> usize {
        match direction {
            FlowDirection::Forward => self.last(),
            FlowDirection::Backward => 0,
        }
    }
}

/// Arguments of `add_geometry` for a 1D volume.
#[derive(Clone, Debug, Default)]
pub struct GeometryArgs {
    pub length_domain: Option<LengthDomain>,
    pub length_domain_set: Option<Vec<Real>>,
    pub flow_direction: Option<FlowDirection>,
}

impl GeometryArgs {
    pub(crate) fn resolve(self) -> CvResult<(LengthDomain, FlowDirection)> {
        let domain = match (self.length_domain, self.length_domain_set) {
            (Some(_), Some(_)) => {
                return Err(CvError::config(
                    "give either length_domain or length_domain_set, not both",
                ));
            }
            (Some(d), None) => d,
            (None, Some(set)) => LengthDomain::from_set(&set)?,
            (None, None) => LengthDomain::unit(),
        };
        Ok((domain, self.flow_direction.unwrap_or_default()))
    }
}
