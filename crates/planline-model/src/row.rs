//! Draft rows and per-field dirty tracking
//!
//! A [`DraftRow`] is the in-memory form of one plan line item. Its
//! [`Provenance`] is fixed when the row is built and never recomputed:
//! rows loaded from the server are `Existing`, rows added locally are
//! `New`. Ids are join keys only and carry no provenance information.

use crate::error::FieldTypeError;
use crate::id::{LocalId, ServerId};
use crate::status::ItemStatus;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Where a row came from
///
/// Fixed for the row's entire lifetime. A `New` row that is persisted is
/// replaced by a fresh `Existing` row, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Added locally, unknown to the server
    New,
    /// Loaded from the server
    Existing,
}

/// Editable fields of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldName {
    /// Resolved catalog item reference
    Product,
    /// Catalog code as typed into the search field
    ProductCode,
    /// Denormalized catalog item name
    ProductName,
    /// Quantity planned for production
    PlannedQuantity,
    /// Date the quantity is planned for
    PlannedDate,
    /// Production status
    Status,
}

impl FieldName {
    /// Wire name of the field on the item resource
    #[inline]
    #[must_use]
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::ProductCode => "product_id",
            Self::ProductName => "product_name",
            Self::PlannedQuantity => "planned_quantity",
            Self::PlannedDate => "planned_date",
            Self::Status => "status",
        }
    }
}

/// A value assignable to a row field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Free text
    Text(String),
    /// Whole-number quantity
    Integer(i64),
    /// Calendar date
    Date(NaiveDate),
    /// Production status
    Status(ItemStatus),
    /// Reference to a server-side entity
    Reference(ServerId),
    /// Clears an optional field
    Empty,
}

/// Display data copied from a resolved catalog match
///
/// Purely presentational; only the identity it carries is ever sent back.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Catalog item the code resolved to
    pub product: ServerId,
    /// Canonical catalog code
    pub code: String,
    /// Catalog item display name
    pub name: String,
}

/// Current values of a row's editable fields
#[derive(Debug, Clone, Default)]
pub struct RowFields {
    /// Resolved catalog item reference
    pub product: Option<ServerId>,
    /// Catalog code as typed (or as bound by a resolution)
    pub product_code: String,
    /// Denormalized item name
    pub product_name: Option<String>,
    /// Planned quantity
    pub planned_quantity: Option<i64>,
    /// Planned date
    pub planned_date: Option<NaiveDate>,
    /// Production status
    pub status: ItemStatus,
    /// Quantity already transferred; owned by the server, never editable
    pub transferred_pcs: i64,
}

/// One plan line item as held in the editor
#[derive(Debug, Clone)]
pub struct DraftRow {
    local_id: LocalId,
    server_id: Option<ServerId>,
    provenance: Provenance,
    fields: RowFields,
    dirty: BTreeSet<FieldName>,
    resolution: Option<Resolution>,
}

impl DraftRow {
    /// Row added locally by the operator
    ///
    /// Defaults mirror a freshly inserted form row: quantity 1, planned
    /// for `today`, status pending.
    #[must_use]
    pub fn new_local(local_id: LocalId, today: NaiveDate) -> Self {
        Self {
            local_id,
            server_id: None,
            provenance: Provenance::New,
            fields: RowFields {
                planned_quantity: Some(1),
                planned_date: Some(today),
                ..RowFields::default()
            },
            dirty: BTreeSet::new(),
            resolution: None,
        }
    }

    /// Row loaded from the server, pristine
    #[must_use]
    pub fn from_server(server_id: ServerId, fields: RowFields) -> Self {
        let resolution = match (fields.product, fields.product_name.as_deref()) {
            (Some(product), Some(name)) if !fields.product_code.is_empty() => Some(Resolution {
                product,
                code: fields.product_code.clone(),
                name: name.to_string(),
            }),
            _ => None,
        };
        Self {
            local_id: LocalId::from(server_id),
            server_id: Some(server_id),
            provenance: Provenance::Existing,
            fields,
            dirty: BTreeSet::new(),
            resolution,
        }
    }

    /// The `Existing` replacement for a `New` row the server just accepted
    ///
    /// Consumes the row; provenance never flips in place. The replacement
    /// is pristine and keyed by the assigned server id.
    #[must_use]
    pub fn into_created(self, server_id: ServerId, transferred_pcs: i64) -> Self {
        let mut fields = self.fields;
        fields.transferred_pcs = transferred_pcs;
        Self {
            local_id: LocalId::from(server_id),
            server_id: Some(server_id),
            provenance: Provenance::Existing,
            fields,
            dirty: BTreeSet::new(),
            resolution: self.resolution,
        }
    }

    /// Set one editable field
    ///
    /// On an `Existing` row the field is recorded as dirty; a `New` row
    /// stores the value without bookkeeping since it is submitted
    /// wholesale anyway.
    pub fn set_field(&mut self, name: FieldName, value: FieldValue) -> Result<(), FieldTypeError> {
        match (name, value) {
            (FieldName::Product, FieldValue::Reference(id)) => self.fields.product = Some(id),
            (FieldName::Product, FieldValue::Empty) => self.fields.product = None,
            (FieldName::ProductCode, FieldValue::Text(text)) => self.fields.product_code = text,
            (FieldName::ProductName, FieldValue::Text(text)) => {
                self.fields.product_name = Some(text);
            }
            (FieldName::ProductName, FieldValue::Empty) => self.fields.product_name = None,
            (FieldName::PlannedQuantity, FieldValue::Integer(qty)) => {
                self.fields.planned_quantity = Some(qty);
            }
            (FieldName::PlannedQuantity, FieldValue::Empty) => self.fields.planned_quantity = None,
            (FieldName::PlannedDate, FieldValue::Date(date)) => {
                self.fields.planned_date = Some(date);
            }
            (FieldName::PlannedDate, FieldValue::Empty) => self.fields.planned_date = None,
            (FieldName::Status, FieldValue::Status(status)) => self.fields.status = status,
            (field, value) => return Err(FieldTypeError { field, value }),
        }
        if self.provenance == Provenance::Existing {
            self.dirty.insert(name);
        }
        Ok(())
    }

    /// Bind a resolved catalog match into the row
    ///
    /// Atomically patches the identity reference, code, display name and a
    /// quantity default of 1, dirty-marking all of them on an `Existing`
    /// row.
    pub fn bind_resolution(&mut self, resolution: Resolution) {
        self.fields.product = Some(resolution.product);
        self.fields.product_code = resolution.code.clone();
        self.fields.product_name = Some(resolution.name.clone());
        self.fields.planned_quantity = Some(1);
        if self.provenance == Provenance::Existing {
            self.dirty.extend([
                FieldName::Product,
                FieldName::ProductCode,
                FieldName::ProductName,
                FieldName::PlannedQuantity,
            ]);
        }
        self.resolution = Some(resolution);
    }

    /// Clear the dirty set after a confirmed sync
    pub fn mark_pristine(&mut self) {
        self.dirty.clear();
    }

    /// Identifier within the draft's row list
    #[inline]
    #[must_use]
    pub fn local_id(&self) -> LocalId {
        self.local_id
    }

    /// Server-assigned identifier, if any
    #[inline]
    #[must_use]
    pub fn server_id(&self) -> Option<ServerId> {
        self.server_id
    }

    /// Row provenance
    #[inline]
    #[must_use]
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Current field values
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &RowFields {
        &self.fields
    }

    /// Fields changed since the last confirmed sync
    #[inline]
    #[must_use]
    pub fn dirty_fields(&self) -> &BTreeSet<FieldName> {
        &self.dirty
    }

    /// Whether any field is dirty
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Last bound catalog match
    #[inline]
    #[must_use]
    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    /// Same row under a different local id
    ///
    /// Used when a draft must move an unsaved row off an id the server
    /// just assigned to a sibling.
    pub(crate) fn rekeyed(mut self, local_id: LocalId) -> Self {
        self.local_id = local_id;
        self
    }

    /// Human-readable label for notices and reports
    #[must_use]
    pub fn label(&self) -> String {
        if let Some(name) = self.fields.product_name.as_deref() {
            return name.to_string();
        }
        if !self.fields.product_code.is_empty() {
            return self.fields.product_code.clone();
        }
        format!("row {}", self.local_id)
    }
}
