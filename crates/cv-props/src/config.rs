//! Per-point configuration records handed to state and reaction blocks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Free-form package arguments, merged verbatim into every point.
pub type PackageArgs = BTreeMap<String, serde_yaml::Value>;

/// Initial guesses by state variable name, applied to every entry of that variable.
pub type StateArgs = BTreeMap<String, f64>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateConfig {
    /// Name of the property package the block belongs to.
    pub parameters: String,
    /// True when the state is an independent input rather than derived from a balance.
    pub defined_state: bool,
    pub has_phase_equilibrium: bool,
    #[serde(default, flatten)]
    pub extra: PackageArgs,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionConfig {
    pub parameters: String,
    /// Name of the state collection the reaction block reads from.
    pub state_block: String,
    pub has_equilibrium: bool,
    #[serde(default, flatten)]
    pub extra: PackageArgs,
}
