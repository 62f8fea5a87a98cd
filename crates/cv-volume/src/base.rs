//! State shared by 0D and 1D control volumes.

use std::collections::BTreeMap;
use std::sync::Arc;

use cv_core::{CvError, CvResult};
use cv_model::{Block, ConstraintSet, Index, Label};
use cv_props::{PropertyPackage, ReactionPackage};
use tracing::{debug, info};

use crate::config::ControlVolumeOptions;
use crate::ports::Port;
use crate::time::TimeDomain;

/// Packages a control volume is bound to.
#[derive(Clone)]
pub struct Packages {
    pub property: Arc<dyn PropertyPackage>,
    pub reaction: Option<Arc<dyn ReactionPackage>>,
}

impl Packages {
    pub fn new(property: Arc<dyn PropertyPackage>) -> Self {
        Self {
            property,
            reaction: None,
        }
    }

    pub fn with_reactions(mut self, reaction: Arc<dyn ReactionPackage>) -> Self {
        self.reaction = Some(reaction);
        self
    }
}

/// One-way build sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildStage {
    Created,
    Geometry,
    Transformed,
    StateBlocks,
    ReactionBlocks,
    Balances,
}

/// Index point of a control volume: time position plus length position in 1D.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub t: usize,
    pub x: Option<usize>,
}

impl Point {
    pub fn index(self) -> Index {
        match self.x {
            Some(x) => Index(vec![Label::Pos(self.t), Label::Pos(x)]),
            None => Index(vec![Label::Pos(self.t)]),
        }
    }

    /// Point index extended by balance axes.
    pub fn with(self, tail: &Index) -> Index {
        self.index().join(tail)
    }

    /// Arena key.
    pub fn key(self) -> (usize, usize) {
        (self.t, self.x.unwrap_or(0))
    }
}

pub(crate) struct VolumeCore {
    pub(crate) options: ControlVolumeOptions,
    pub(crate) time: TimeDomain,
    pub(crate) dynamic: bool,
    pub(crate) has_holdup: bool,
    pub(crate) packages: Packages,
    pub(crate) block: Block,
    pub(crate) stage: BuildStage,
    /// `has_phase_equilibrium` the state blocks were built with.
    pub(crate) state_phase_equilibrium: Option<bool>,
    /// `has_equilibrium` the reaction blocks were built with.
    pub(crate) reaction_equilibrium: Option<bool>,
    pub(crate) ports: BTreeMap<String, Port>,
}

impl VolumeCore {
    pub(crate) fn new(
        name: &str,
        time: TimeDomain,
        packages: Packages,
        options: ControlVolumeOptions,
    ) -> CvResult<Self> {
        if name.is_empty() {
            return Err(CvError::config("control volume name must not be empty"));
        }
        let dynamic = options.dynamic.unwrap_or(time.is_dynamic());
        if dynamic && !time.is_dynamic() {
            return Err(CvError::config(format!(
                "{name}: dynamic control volume requires a dynamic time domain"
            )));
        }
        let has_holdup = options.has_holdup.unwrap_or(dynamic);
        if dynamic && !has_holdup {
            return Err(CvError::config(format!(
                "{name}: dynamic=true requires has_holdup=true"
            )));
        }
        debug!(cv = name, dynamic, has_holdup, "control volume created");
        Ok(Self {
            options,
            time,
            dynamic,
            has_holdup,
            packages,
            block: Block::new(name),
            stage: BuildStage::Created,
            state_phase_equilibrium: None,
            reaction_equilibrium: None,
            ports: BTreeMap::new(),
        })
    }

    pub(crate) fn name(&self) -> &str {
        self.block.name()
    }

    pub(crate) fn phases(&self) -> &[String] {
        self.packages.property.phases()
    }

    pub(crate) fn components(&self) -> &[String] {
        self.packages.property.components()
    }

    /// (phase, component) tail indices.
    pub(crate) fn phase_component_axes(&self) -> Vec<Index> {
        let mut out = Vec::new();
        for p in self.phases() {
            for j in self.components() {
                out.push(Index(vec![Label::from(p), Label::from(j)]));
            }
        }
        out
    }

    /// Structural changes are refused once any balance exists.
    pub(crate) fn ensure_open(&self, op: &str) -> CvResult<()> {
        if self.stage == BuildStage::Balances {
            return Err(CvError::config(format!(
                "{}: {op} called after balances were added",
                self.name()
            )));
        }
        Ok(())
    }

    pub(crate) fn advance(&mut self, stage: BuildStage) {
        self.stage = self.stage.max(stage);
    }

    /// Merge staged components and hand back the named constraint set.
    pub(crate) fn commit(&mut self, staged: Block, balance: &str) -> CvResult<&ConstraintSet> {
        self.block.merge(staged)?;
        self.advance(BuildStage::Balances);
        let set = self.block.require_constraints(balance)?;
        info!(cv = %self.block.name(), balance, entries = set.len(), "balance committed");
        Ok(set)
    }

    pub(crate) fn add_port(&mut self, port: Port) -> CvResult<&Port> {
        if self.ports.contains_key(&port.name) {
            return Err(CvError::config(format!(
                "{}: port '{}' already exists",
                self.name(),
                port.name
            )));
        }
        let name = port.name.clone();
        Ok(self.ports.entry(name).or_insert(port))
    }
}
