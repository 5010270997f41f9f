//! Wire types for the plan backend
//!
//! Field names follow the backend's serializers, including the
//! `transfered_pcs` spelling it ships with.

use chrono::NaiveDate;
use planline_model::{ItemStatus, ServerId};
use serde::{Deserialize, Serialize};

/// A production plan as served by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDto {
    pub id: ServerId,
    #[serde(default)]
    pub plan_number: String,
    #[serde(default)]
    pub plan_type: String,
    #[serde(default)]
    pub is_serialized: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub items: Vec<PlanItemDto>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// One plan line item as served by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanItemDto {
    pub id: ServerId,
    #[serde(default)]
    pub production_plan: Option<ServerId>,
    #[serde(default)]
    pub product: Option<ServerId>,
    /// Catalog code of the referenced product
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    pub planned_quantity: i64,
    #[serde(default)]
    pub planned_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: ItemStatus,
    /// Wire name keeps the backend's spelling
    #[serde(rename = "transfered_pcs", default)]
    pub transferred_pcs: i64,
}

/// A catalog product candidate returned by search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItemDto {
    pub id: ServerId,
    /// Catalog code, e.g. `E001`
    pub product_id: String,
    pub product_name: String,
    #[serde(default)]
    pub is_serialized: bool,
}

/// Payload creating one item on an existing plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItemPayload {
    pub production_plan: ServerId,
    pub product: ServerId,
    pub planned_quantity: i64,
    pub planned_date: NaiveDate,
    pub status: ItemStatus,
}

/// Item posted inline with a brand-new plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineItemPayload {
    pub product: ServerId,
    pub planned_quantity: i64,
    pub planned_date: NaiveDate,
    pub status: ItemStatus,
}

/// Payload creating a plan together with its items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlanPayload {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub items: Vec<InlineItemPayload>,
}

/// Partial update of an item; only set fields go on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ServerId>,
}

impl ItemPatch {
    /// Whether the patch would send anything at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.planned_quantity.is_none()
            && self.planned_date.is_none()
            && self.status.is_none()
            && self.product.is_none()
    }
}

/// Partial update of the parent plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl PlanPatch {
    /// Whether the patch would send anything at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_none()
    }
}
