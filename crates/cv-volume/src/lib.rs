//! Control-volume balance assembly.
//!
//! Provides:
//! - 0D (well-mixed) and 1D (discretized length) control volumes
//! - Length-domain geometry and finite-difference / collocation transformation
//! - Per-point state and reaction block construction through `cv-props` packages
//! - Material (phase-component, component, element), enthalpy and pressure balances
//! - Declarative validation of balance requests before anything is created
//! - Options loading from YAML/JSON and `auto_construct`

pub mod arena;
pub mod balance;
pub mod base;
pub mod config;
pub mod conversion;
pub mod cv0d;
pub mod cv1d;
pub mod discretize;
pub mod geometry;
pub mod ports;
pub mod time;
pub mod validate;
pub mod volume;

// Internal modules
mod assemble;

pub use balance::{
    BalancePoint, EnergyBalanceArgs, InitFlags, MaterialBalanceArgs, MomentumBalanceArgs,
    ReactionBlockArgs, StateBlockArgs, TermFn,
};
pub use base::{BuildStage, Packages, Point};
pub use config::{
    AreaDefinition, ControlVolumeOptions, EnergyBalanceType, FlowDirection, MaterialBalanceType,
    MomentumBalanceType, TransformationMethod, TransformationScheme,
};
pub use cv_core::{CvError, CvResult, ErrorKind};
pub use cv0d::ControlVolume0D;
pub use cv1d::ControlVolume1D;
pub use geometry::{GeometryArgs, LengthDomain};
pub use ports::Port;
pub use time::TimeDomain;
pub use volume::ControlVolume;
