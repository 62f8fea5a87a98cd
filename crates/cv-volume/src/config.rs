//! Control-volume options.
//!
//! Options are plain serde data so unit models can carry them in YAML or
//! JSON configuration. Package objects are bound separately.

use core::fmt;
use core::str::FromStr;

use cv_core::{CvError, CvResult};
use cv_props::PackageArgs;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    #[default]
    Forward,
    Backward,
}

impl FlowDirection {
    /// Sign of the spatial flow derivative in the governing equations.
    pub fn sign(self) -> f64 {
        match self {
            FlowDirection::Forward => -1.0,
            FlowDirection::Backward => 1.0,
        }
    }
}

impl FromStr for FlowDirection {
    type Err = CvError;

    fn from_str(s: &str) -> CvResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "forward" => Ok(FlowDirection::Forward),
            "backward" => Ok(FlowDirection::Backward),
            other => Err(CvError::config(format!(
                "unrecognised flow direction '{other}' (expected forward or backward)"
            ))),
        }
    }
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowDirection::Forward => write!(f, "forward"),
            FlowDirection::Backward => write!(f, "backward"),
        }
    }
}

/// Cross-sectional area representation along the length domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaDefinition {
    #[default]
    Uniform,
    Variant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformationMethod {
    #[serde(rename = "finite-difference", alias = "dae.finite_difference")]
    FiniteDifference,
    #[serde(rename = "collocation", alias = "dae.collocation")]
    Collocation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformationScheme {
    #[serde(rename = "BACKWARD")]
    Backward,
    #[serde(rename = "FORWARD")]
    Forward,
    #[serde(rename = "LAGRANGE-RADAU")]
    LagrangeRadau,
    #[serde(rename = "LAGRANGE-LEGENDRE")]
    LagrangeLegendre,
}

impl TransformationScheme {
    pub fn compatible_with(self, method: TransformationMethod) -> bool {
        matches!(
            (method, self),
            (
                TransformationMethod::FiniteDifference,
                TransformationScheme::Backward | TransformationScheme::Forward
            ) | (
                TransformationMethod::Collocation,
                TransformationScheme::LagrangeRadau | TransformationScheme::LagrangeLegendre
            )
        )
    }

    /// Length boundary left without a derivative equation.
    ///
    /// Every scheme but FORWARD leaves the inlet of forward flow open. The
    /// balance point excluded by a control volume is its defined-state
    /// boundary instead; when the two differ (FORWARD with forward
    /// information flow, or any other scheme with backward) the derivative
    /// at the far boundary carries a balance but no discretization equation,
    /// and the unit model must supply one more equation per balance axis there.
    pub fn open_boundary(self) -> FlowDirection {
        match self {
            TransformationScheme::Forward => FlowDirection::Backward,
            _ => FlowDirection::Forward,
        }
    }
}

macro_rules! str_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($ty::$variant => write!(f, $text)),+
                }
            }
        }

        impl FromStr for $ty {
            type Err = CvError;

            fn from_str(s: &str) -> CvResult<Self> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(CvError::config(format!(
                        "unrecognised {} '{}'",
                        stringify!($ty),
                        other
                    ))),
                }
            }
        }
    };
}

str_enum!(TransformationMethod {
    FiniteDifference => "finite-difference",
    Collocation => "collocation",
});

str_enum!(TransformationScheme {
    Backward => "BACKWARD",
    Forward => "FORWARD",
    LagrangeRadau => "LAGRANGE-RADAU",
    LagrangeLegendre => "LAGRANGE-LEGENDRE",
});

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaterialBalanceType {
    None,
    #[default]
    ComponentPhase,
    ComponentTotal,
    ElementTotal,
    Total,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnergyBalanceType {
    None,
    #[default]
    EnthalpyTotal,
    EnthalpyPhase,
    EnergyTotal,
    EnergyPhase,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MomentumBalanceType {
    None,
    #[default]
    PressureTotal,
    PressurePhase,
    MomentumTotal,
    MomentumPhase,
}

/// Recognised control-volume options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlVolumeOptions {
    /// Defaults to the time domain's own flag.
    pub dynamic: Option<bool>,
    /// Defaults to `dynamic`.
    pub has_holdup: Option<bool>,
    pub property_package_args: PackageArgs,
    pub reaction_package_args: PackageArgs,
    pub area_definition: AreaDefinition,
    pub transformation_method: Option<TransformationMethod>,
    pub transformation_scheme: Option<TransformationScheme>,
    pub finite_elements: Option<usize>,
    pub collocation_points: Option<usize>,
    pub auto_construct: bool,

    // Used by auto_construct only.
    pub flow_direction: FlowDirection,
    pub length_domain_set: Option<Vec<f64>>,
    pub material_balance_type: MaterialBalanceType,
    pub energy_balance_type: EnergyBalanceType,
    pub momentum_balance_type: MomentumBalanceType,
    pub has_phase_equilibrium: Option<bool>,
    pub has_equilibrium_reactions: bool,
    pub has_rate_reactions: bool,
    pub has_mass_transfer: bool,
    pub has_heat_of_reaction: bool,
    pub has_heat_transfer: bool,
    pub has_work_transfer: bool,
    pub has_pressure_change: bool,
}

impl ControlVolumeOptions {
    pub fn from_yaml_str(s: &str) -> CvResult<Self> {
        serde_yaml::from_str(s).map_err(|e| CvError::config(format!("invalid options: {e}")))
    }

    pub fn from_json_str(s: &str) -> CvResult<Self> {
        serde_json::from_str(s).map_err(|e| CvError::config(format!("invalid options: {e}")))
    }

    pub fn to_yaml_string(&self) -> CvResult<String> {
        serde_yaml::to_string(self).map_err(|e| CvError::internal(format!("serialize options: {e}")))
    }

    /// Method and scheme for a 1D volume, both required and compatible.
    pub fn transformation(&self) -> CvResult<(TransformationMethod, TransformationScheme)> {
        let method = self.transformation_method.ok_or_else(|| {
            CvError::config("transformation_method must be set for a 1D control volume")
        })?;
        let scheme = self.transformation_scheme.ok_or_else(|| {
            CvError::config("transformation_scheme must be set for a 1D control volume")
        })?;
        if !scheme.compatible_with(method) {
            return Err(CvError::config(format!(
                "transformation_scheme {scheme} is not valid for transformation_method {method}"
            )));
        }
        Ok((method, scheme))
    }
}
