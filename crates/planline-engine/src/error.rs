//! Engine errors

use planline_client::ApiError;
use planline_model::{FieldTypeError, LocalId, ServerId};

/// Failure of an editor operation
///
/// Per-row validation problems and search outcomes are not errors; they
/// travel in reports and notices. This type covers the cases where the
/// requested operation itself cannot proceed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The addressed row is not in the draft
    #[error("row {0} not found")]
    RowNotFound(LocalId),

    /// The addressed plan is not in the loaded listing
    #[error("plan {0} not found")]
    PlanNotFound(ServerId),

    /// A value of the wrong shape was assigned to a field
    #[error(transparent)]
    Field(#[from] FieldTypeError),

    /// A backend call failed
    #[error(transparent)]
    Api(#[from] ApiError),
}
