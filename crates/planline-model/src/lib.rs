//! Planline Model - draft rows, identity allocation, local validation
//!
//! The pure data layer of the plan editor:
//! - Temporary-id allocation disjoint from server ids
//! - Draft rows with explicit provenance and per-field dirty tracking
//! - The ordered plan draft the engine mutates
//! - Local validation gating what may be submitted
//!
//! No I/O happens here; the engine crate drives everything.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod draft;
pub mod error;
pub mod id;
pub mod row;
pub mod status;
pub mod validate;

pub use draft::{loaded_fields, PlanDraft, PlanField, PlanScalars};
pub use error::{FieldTypeError, RowValidationError};
pub use id::{IdAllocator, LocalId, ServerId};
pub use row::{DraftRow, FieldName, FieldValue, Provenance, Resolution, RowFields};
pub use status::ItemStatus;
pub use validate::{code_is_well_formed, validate_new_row, MIN_QUANTITY};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
