//! Discretization of the length domain and the derivative operator.
//!
//! Finite elements split [0, 1] into N intervals. Collocation places K nodes
//! inside each element: shifted Gauss-Radau (right end included) or
//! Gauss-Legendre (interior only, element end kept as a separate point).
//! Nodes are eigenvalues of the Jacobi matrix (Golub-Welsch).

use cv_core::{CvError, CvResult, Real};
use nalgebra::{DMatrix, SymmetricEigen};
use tracing::warn;

use crate::config::{TransformationMethod, TransformationScheme};
use crate::geometry::{Collocation, LengthDomain};

/// Element boundaries for `n` elements.
///
/// A two-point seed is split uniformly. Otherwise existing points are kept
/// and the widest interval is bisected until `n` elements exist.
pub fn finite_elements(seed: &[Real], n: usize) -> CvResult<Vec<Real>> {
    if n == 0 {
        return Err(CvError::config("finite_elements must be at least 1"));
    }
    if seed.len() < 2 {
        return Err(CvError::internal("length domain without both endpoints"));
    }
    if seed.len() == 2 {
        let (a, b) = (seed[0], seed[1]);
        return Ok((0..=n).map(|i| a + (b - a) * i as Real / n as Real).collect());
    }
    let mut points = seed.to_vec();
    if points.len() > n + 1 {
        warn!(
            requested = n,
            existing = points.len() - 1,
            "length domain already has more elements than requested; keeping existing points"
        );
        return Ok(points);
    }
    while points.len() < n + 1 {
        let widest = points
            .windows(2)
            .enumerate()
            .max_by(|(_, a), (_, b)| (a[1] - a[0]).total_cmp(&(b[1] - b[0])))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let mid = 0.5 * (points[widest] + points[widest + 1]);
        points.insert(widest + 1, mid);
    }
    Ok(points)
}

fn symmetric_tridiagonal_eigenvalues(diag: &[Real], off: &[Real]) -> Vec<Real> {
    let k = diag.len();
    let m = DMatrix::from_fn(k, k, |i, j| {
        if i == j {
            diag[i]
        } else if i + 1 == j {
            off[i]
        } else if j + 1 == i {
            off[j]
        } else {
            0.0
        }
    });
    let mut values: Vec<Real> = SymmetricEigen::new(m).eigenvalues.iter().copied().collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

/// Gauss-Legendre nodes on [0, 1].
pub fn legendre_nodes(k: usize) -> Vec<Real> {
    if k == 0 {
        return Vec::new();
    }
    let diag = vec![0.0; k];
    let off: Vec<Real> = (1..k)
        .map(|n| {
            let n = n as Real;
            n / (4.0 * n * n - 1.0).sqrt()
        })
        .collect();
    symmetric_tridiagonal_eigenvalues(&diag, &off)
        .into_iter()
        .map(|x| 0.5 * (x + 1.0))
        .collect()
}

/// Right Gauss-Radau nodes on [0, 1]; the last node is 1.
///
/// Interior nodes are the roots of the Jacobi polynomial P(1,0) of degree k-1.
pub fn radau_nodes(k: usize) -> Vec<Real> {
    if k == 0 {
        return Vec::new();
    }
    let m = k - 1;
    let diag: Vec<Real> = (0..m)
        .map(|n| {
            let n = n as Real;
            -1.0 / ((2.0 * n + 1.0) * (2.0 * n + 3.0))
        })
        .collect();
    let off: Vec<Real> = (1..m)
        .map(|n| {
            let n = n as Real;
            (n * (n + 1.0)).sqrt() / (2.0 * n + 1.0)
        })
        .collect();
    let mut nodes: Vec<Real> = if m == 0 {
        Vec::new()
    } else {
        symmetric_tridiagonal_eigenvalues(&diag, &off)
            .into_iter()
            .map(|x| 0.5 * (x + 1.0))
            .collect()
    };
    nodes.push(1.0);
    nodes
}

/// Number of points a transformation produces.
pub fn expected_points(
    scheme: TransformationScheme,
    elements: usize,
    collocation_points: usize,
) -> usize {
    match scheme {
        TransformationScheme::Backward | TransformationScheme::Forward => elements + 1,
        TransformationScheme::LagrangeRadau => elements * collocation_points + 1,
        TransformationScheme::LagrangeLegendre => elements * (collocation_points + 1) + 1,
    }
}

/// Discretize an owned, continuous domain.
pub fn discretize(
    domain: &LengthDomain,
    method: TransformationMethod,
    scheme: TransformationScheme,
    elements: usize,
    collocation_points: Option<usize>,
) -> CvResult<LengthDomain> {
    if !scheme.compatible_with(method) {
        return Err(CvError::config(format!(
            "transformation_scheme {scheme} is not valid for transformation_method {method}"
        )));
    }
    let boundaries = finite_elements(domain.points(), elements)?;
    if method == TransformationMethod::FiniteDifference {
        return Ok(LengthDomain::discretized(boundaries, None));
    }

    let k = match collocation_points {
        Some(k) if k > 0 => k,
        _ => {
            return Err(CvError::config(
                "collocation_points must be set to at least 1 for collocation",
            ));
        }
    };
    let nodes = match scheme {
        TransformationScheme::LagrangeRadau => radau_nodes(k),
        _ => legendre_nodes(k),
    };

    let mut points = vec![boundaries[0]];
    let mut element_starts = vec![0];
    for w in boundaries.windows(2) {
        let (a, b) = (w[0], w[1]);
        points.extend(nodes.iter().map(|c| a + c * (b - a)));
        if scheme == TransformationScheme::LagrangeLegendre {
            points.push(b);
        }
        element_starts.push(points.len() - 1);
    }
    Ok(LengthDomain::discretized(
        points,
        Some(Collocation {
            element_starts,
            points: k,
        }),
    ))
}

/// What a stencil's weighted sum stands for at `point`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StencilKind {
    /// `d/dx` of the interpolant at `point`.
    Derivative,
    /// Value of the element interpolant at `point`, which is not one of its nodes.
    Continuity,
}

/// Linear combination of point values defining one discretization equation.
#[derive(Clone, Debug, PartialEq)]
pub struct Stencil {
    pub point: usize,
    pub kind: StencilKind,
    pub weights: Vec<(usize, Real)>,
}

/// Value of the j-th Lagrange basis polynomial through `xs` at `x`.
fn lagrange_basis(xs: &[Real], j: usize, x: Real) -> Real {
    xs.iter()
        .enumerate()
        .filter(|&(m, _)| m != j)
        .map(|(_, &xm)| (x - xm) / (xs[j] - xm))
        .product()
}

/// Derivative of the j-th Lagrange basis polynomial through `xs`, evaluated at `x`.
fn lagrange_basis_derivative(xs: &[Real], j: usize, x: Real) -> Real {
    let mut total = 0.0;
    for m in 0..xs.len() {
        if m == j {
            continue;
        }
        let mut term = 1.0 / (xs[j] - xs[m]);
        for (l, &xl) in xs.iter().enumerate() {
            if l != j && l != m {
                term *= (x - xl) / (xs[j] - xs[l]);
            }
        }
        total += term;
    }
    total
}

/// Discretization stencils for every point that carries an equation.
///
/// Collocated domains differentiate the element interpolant through the
/// element start and its collocation nodes. Legendre element ends lie outside
/// those nodes; they get a continuity stencil tying the end value to the
/// interpolant, and their derivative is left to the balance at that point.
/// Other domains use first-order differences in the direction of `scheme`.
pub fn derivative_stencils(domain: &LengthDomain, scheme: TransformationScheme) -> Vec<Stencil> {
    let x = domain.points();
    let last = domain.last();

    if let Some(colloc) = domain.collocation() {
        let mut out = Vec::new();
        for w in colloc.element_starts.windows(2) {
            let (start, end) = (w[0], w[1]);
            let nodes: Vec<usize> = (start..=start + colloc.points).collect();
            let xs: Vec<Real> = nodes.iter().map(|&i| x[i]).collect();
            for target in start + 1..=end {
                let (kind, basis): (StencilKind, fn(&[Real], usize, Real) -> Real) =
                    if nodes.contains(&target) {
                        (StencilKind::Derivative, lagrange_basis_derivative)
                    } else {
                        (StencilKind::Continuity, lagrange_basis)
                    };
                let weights = nodes
                    .iter()
                    .enumerate()
                    .map(|(j, &i)| (i, basis(&xs, j, x[target])))
                    .collect();
                out.push(Stencil {
                    point: target,
                    kind,
                    weights,
                });
            }
        }
        return out;
    }

    match scheme {
        TransformationScheme::Forward => (0..last)
            .map(|i| {
                let h = x[i + 1] - x[i];
                Stencil {
                    point: i,
                    kind: StencilKind::Derivative,
                    weights: vec![(i, -1.0 / h), (i + 1, 1.0 / h)],
                }
            })
            .collect(),
        _ => (1..=last)
            .map(|i| {
                let h = x[i] - x[i - 1];
                Stencil {
                    point: i,
                    kind: StencilKind::Derivative,
                    weights: vec![(i - 1, -1.0 / h), (i, 1.0 / h)],
                }
            })
            .collect(),
    }
}
