//! cv-core: shared foundation for the control-volume crates.
//!
//! Contains:
//! - error (the four error kinds every builder reports)
//! - numeric (Real + tolerances + float helpers)
//! - units (uom SI types + constructors for geometry defaults)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{CvError, CvResult, ErrorKind};
pub use numeric::*;
pub use units::*;
