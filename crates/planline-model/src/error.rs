//! Model-layer errors

use crate::row::{FieldName, FieldValue};

/// A value of the wrong shape was assigned to a field
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("field {field:?} cannot hold {value:?}")]
pub struct FieldTypeError {
    /// Target field
    pub field: FieldName,
    /// Rejected value
    pub value: FieldValue,
}

/// Why a new row cannot be submitted
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowValidationError {
    /// No catalog item bound
    #[error("product identity is not resolved")]
    UnresolvedProduct,

    /// Quantity missing
    #[error("planned quantity is required")]
    MissingQuantity,

    /// Quantity below the minimum
    #[error("planned quantity must be at least {min}, got {got}")]
    QuantityTooSmall {
        /// Smallest acceptable quantity
        min: i64,
        /// Value found on the row
        got: i64,
    },

    /// Planned date missing
    #[error("planned date is required")]
    MissingDate,

    /// Catalog code does not have the expected shape
    #[error("code '{code}' must start with 'E' and have 4 characters")]
    MalformedCode {
        /// Offending code
        code: String,
    },
}
