//! Port export: the state variables a unit model connects to.

use std::collections::BTreeMap;

use cv_model::VarRef;
use cv_props::StateBlock;

#[derive(Clone, Debug, PartialEq)]
pub struct Port {
    pub name: String,
    /// Member name to the referenced variable entries, over all time points.
    pub members: BTreeMap<String, Vec<VarRef>>,
}

impl Port {
    /// Collect the state-defining variables of `states`, one per time point.
    pub fn from_states<'a>(
        name: impl Into<String>,
        states: impl IntoIterator<Item = &'a dyn StateBlock>,
    ) -> Self {
        let mut members: BTreeMap<String, Vec<VarRef>> = BTreeMap::new();
        for state in states {
            for (member, refs) in state.define_state_vars() {
                members.entry(member).or_default().extend(refs);
            }
        }
        Self {
            name: name.into(),
            members,
        }
    }

    pub fn member(&self, name: &str) -> Option<&[VarRef]> {
        self.members.get(name).map(Vec::as_slice)
    }
}
