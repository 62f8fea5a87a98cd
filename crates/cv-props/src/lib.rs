//! cv-props: capability contract between control volumes and the property
//! and reaction packages they are bound to.
//!
//! Provides:
//! - `PropertyPackage` / `StateBlock` traits (flow and density term accessors, basis, port export)
//! - `ReactionPackage` / `ReactionBlock` traits (rate sets, stoichiometry, heat of reaction)
//! - Capability summaries declared once per package
//! - Per-point configuration records
//! - `TablePackage` / `TableReactions`: declarative packages backed by fixed tables

pub mod basis;
pub mod config;
pub mod error;
pub mod package;
pub mod reactions;
pub mod table;

pub use basis::{FlowBasis, PhaseEquilibrium};
pub use config::{PackageArgs, ReactionConfig, StateArgs, StateConfig};
pub use error::{PropsError, PropsResult};
pub use package::{
    PropertyCapabilities, PropertyPackage, ReactionBlock, ReactionCapabilities, ReactionPackage,
    StateBlock,
};
pub use reactions::{TableReactionBlock, TableReactions, TableReactionsBuilder};
pub use table::{TablePackage, TablePackageBuilder, TableState};
