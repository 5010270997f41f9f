//! Local validation of rows before submission
//!
//! Only `New` rows are validated as a whole; edits to `Existing` rows are
//! constrained by the patch whitelist instead. Server-side business
//! validation (stock, pricing, transitions) is out of scope here.

use crate::error::RowValidationError;
use crate::row::DraftRow;

/// Smallest quantity a row may plan
pub const MIN_QUANTITY: i64 = 1;

/// Shape check for catalog codes: `E` followed by exactly three characters
#[inline]
#[must_use]
pub fn code_is_well_formed(code: &str) -> bool {
    code.starts_with('E') && code.chars().count() == 4
}

/// Collect everything that keeps a new row out of a submission
///
/// An empty result means the row is eligible for creation. Each problem is
/// reported so the operator can fix all of them in one pass.
#[must_use]
pub fn validate_new_row(row: &DraftRow) -> Vec<RowValidationError> {
    let mut problems = Vec::new();
    let fields = row.fields();

    if fields.product.is_none() {
        problems.push(RowValidationError::UnresolvedProduct);
    }
    if !fields.product_code.is_empty() && !code_is_well_formed(&fields.product_code) {
        problems.push(RowValidationError::MalformedCode {
            code: fields.product_code.clone(),
        });
    }
    match fields.planned_quantity {
        None => problems.push(RowValidationError::MissingQuantity),
        Some(qty) if qty < MIN_QUANTITY => problems.push(RowValidationError::QuantityTooSmall {
            min: MIN_QUANTITY,
            got: qty,
        }),
        Some(_) => {}
    }
    if fields.planned_date.is_none() {
        problems.push(RowValidationError::MissingDate);
    }

    problems
}
