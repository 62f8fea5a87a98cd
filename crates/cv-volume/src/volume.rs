//! The control-volume contract shared by the 0D and 1D variants.

use cv_core::{CvError, CvResult};
use cv_model::{Block, ConstraintSet};
use cv_props::StateArgs;

use crate::balance::{
    EnergyBalanceArgs, InitFlags, MaterialBalanceArgs, MomentumBalanceArgs, ReactionBlockArgs,
    StateBlockArgs,
};
use crate::config::{
    ControlVolumeOptions, EnergyBalanceType, MaterialBalanceType, MomentumBalanceType,
};
use crate::ports::Port;

fn unsupported(cv: &str, what: &str) -> CvError {
    CvError::balance_type(format!("{cv}: {what} balances are not supported"))
}

/// Assembly surface of a control volume.
///
/// Balance builders validate the request before staging anything and commit
/// all new components at once; a failed call leaves the volume unchanged and
/// a repeated call fails with a configuration error. Each returns the
/// governing-equation set it created.
pub trait ControlVolume: Send + Sync {
    fn name(&self) -> &str;

    /// Model block holding every component created so far.
    fn block(&self) -> &Block;

    fn options(&self) -> &ControlVolumeOptions;

    fn is_dynamic(&self) -> bool;

    fn has_holdup(&self) -> bool;

    /// Build one state block per index point.
    fn add_state_blocks(&mut self, args: StateBlockArgs) -> CvResult<()>;

    /// Build one reaction block per index point, each paired with the state
    /// block at the same point.
    fn add_reaction_blocks(&mut self, args: ReactionBlockArgs) -> CvResult<()>;

    fn add_phase_component_balances(
        &mut self,
        args: MaterialBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet>;

    fn add_total_component_balances(
        &mut self,
        args: MaterialBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet>;

    fn add_total_element_balances(
        &mut self,
        args: MaterialBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet>;

    fn add_total_material_balances(
        &mut self,
        _args: MaterialBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet> {
        Err(unsupported(self.name(), "total material"))
    }

    fn add_total_enthalpy_balances(
        &mut self,
        args: EnergyBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet>;

    fn add_phase_enthalpy_balances(
        &mut self,
        _args: EnergyBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet> {
        Err(unsupported(self.name(), "phase enthalpy"))
    }

    fn add_total_energy_balances(
        &mut self,
        _args: EnergyBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet> {
        Err(unsupported(self.name(), "total energy"))
    }

    fn add_phase_energy_balances(
        &mut self,
        _args: EnergyBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet> {
        Err(unsupported(self.name(), "phase energy"))
    }

    fn add_total_pressure_balances(
        &mut self,
        args: MomentumBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet>;

    fn add_phase_pressure_balances(
        &mut self,
        _args: MomentumBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet> {
        Err(unsupported(self.name(), "phase pressure"))
    }

    fn add_total_momentum_balances(
        &mut self,
        _args: MomentumBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet> {
        Err(unsupported(self.name(), "total momentum"))
    }

    fn add_phase_momentum_balances(
        &mut self,
        _args: MomentumBalanceArgs<'_>,
    ) -> CvResult<&ConstraintSet> {
        Err(unsupported(self.name(), "phase momentum"))
    }

    /// Dispatch on the configured material balance type; `None` adds nothing.
    fn add_material_balances(
        &mut self,
        kind: MaterialBalanceType,
        args: MaterialBalanceArgs<'_>,
    ) -> CvResult<Option<&ConstraintSet>> {
        match kind {
            MaterialBalanceType::None => Ok(None),
            MaterialBalanceType::ComponentPhase => self.add_phase_component_balances(args).map(Some),
            MaterialBalanceType::ComponentTotal => self.add_total_component_balances(args).map(Some),
            MaterialBalanceType::ElementTotal => self.add_total_element_balances(args).map(Some),
            MaterialBalanceType::Total => self.add_total_material_balances(args).map(Some),
        }
    }

    fn add_energy_balances(
        &mut self,
        kind: EnergyBalanceType,
        args: EnergyBalanceArgs<'_>,
    ) -> CvResult<Option<&ConstraintSet>> {
        match kind {
            EnergyBalanceType::None => Ok(None),
            EnergyBalanceType::EnthalpyTotal => self.add_total_enthalpy_balances(args).map(Some),
            EnergyBalanceType::EnthalpyPhase => self.add_phase_enthalpy_balances(args).map(Some),
            EnergyBalanceType::EnergyTotal => self.add_total_energy_balances(args).map(Some),
            EnergyBalanceType::EnergyPhase => self.add_phase_energy_balances(args).map(Some),
        }
    }

    fn add_momentum_balances(
        &mut self,
        kind: MomentumBalanceType,
        args: MomentumBalanceArgs<'_>,
    ) -> CvResult<Option<&ConstraintSet>> {
        match kind {
            MomentumBalanceType::None => Ok(None),
            MomentumBalanceType::PressureTotal => self.add_total_pressure_balances(args).map(Some),
            MomentumBalanceType::PressurePhase => self.add_phase_pressure_balances(args).map(Some),
            MomentumBalanceType::MomentumTotal => self.add_total_momentum_balances(args).map(Some),
            MomentumBalanceType::MomentumPhase => self.add_phase_momentum_balances(args).map(Some),
        }
    }

    /// Run the consistency checks of every state and reaction block.
    fn model_check(&self) -> CvResult<()>;

    /// Apply initial guesses to every state block and hold the defined states.
    fn initialize(&mut self, args: &StateArgs) -> CvResult<InitFlags>;

    /// Release the entries fixed by `initialize`.
    fn release_state(&mut self, flags: InitFlags) -> CvResult<()>;

    /// Export the defined-state boundary as the `inlet` port.
    fn add_inlet_port(&mut self) -> CvResult<&Port>;

    /// Export the opposite boundary as the `outlet` port.
    fn add_outlet_port(&mut self) -> CvResult<&Port>;

    fn port(&self, name: &str) -> Option<&Port>;
}

pub(crate) fn material_args(o: &ControlVolumeOptions) -> MaterialBalanceArgs<'static> {
    MaterialBalanceArgs {
        has_rate_reactions: o.has_rate_reactions,
        has_equilibrium_reactions: o.has_equilibrium_reactions,
        has_phase_equilibrium: o.has_phase_equilibrium.unwrap_or(false),
        has_mass_transfer: o.has_mass_transfer,
        ..Default::default()
    }
}

pub(crate) fn energy_args(o: &ControlVolumeOptions) -> EnergyBalanceArgs<'static> {
    EnergyBalanceArgs {
        has_heat_of_reaction: o.has_heat_of_reaction,
        has_heat_transfer: o.has_heat_transfer,
        has_work_transfer: o.has_work_transfer,
        custom_term: None,
    }
}

pub(crate) fn momentum_args(o: &ControlVolumeOptions) -> MomentumBalanceArgs<'static> {
    MomentumBalanceArgs {
        has_pressure_change: o.has_pressure_change,
        custom_term: None,
    }
}

/// Shared tail of `auto_construct`: blocks and the configured balances.
pub(crate) fn construct_from_options<V: ControlVolume>(
    cv: &mut V,
    has_reaction_package: bool,
) -> CvResult<()> {
    let o = cv.options().clone();
    cv.add_state_blocks(StateBlockArgs {
        information_flow: None,
        has_phase_equilibrium: Some(o.has_phase_equilibrium.unwrap_or(false)),
    })?;
    if has_reaction_package {
        cv.add_reaction_blocks(ReactionBlockArgs {
            has_equilibrium: Some(o.has_equilibrium_reactions),
        })?;
    }
    cv.add_material_balances(o.material_balance_type, material_args(&o))?;
    cv.add_energy_balances(o.energy_balance_type, energy_args(&o))?;
    cv.add_momentum_balances(o.momentum_balance_type, momentum_args(&o))?;
    Ok(())
}
