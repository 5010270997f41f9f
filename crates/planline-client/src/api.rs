//! The backend seam
//!
//! Everything the editor needs from the server, behind one trait so the
//! engine and its tests never care whether calls go over HTTP.

use crate::dto::{
    CatalogItemDto, ItemPatch, NewItemPayload, NewPlanPayload, PlanDto, PlanItemDto, PlanPatch,
};
use crate::error::ApiError;
use planline_model::ServerId;

/// Backend operations consumed by the plan editor
///
/// All calls are plain request/response. Session-token attachment is the
/// transport's concern, not part of this contract.
#[async_trait::async_trait]
pub trait PlanApi: Send + Sync {
    /// All production plans, items embedded
    async fn list_plans(&self) -> Result<Vec<PlanDto>, ApiError>;

    /// All plan items in the system; the authoritative id set used to
    /// seed the temporary-id allocator
    async fn list_items(&self) -> Result<Vec<PlanItemDto>, ApiError>;

    /// Catalog candidates matching a typed code fragment
    async fn search_catalog(&self, query: &str) -> Result<Vec<CatalogItemDto>, ApiError>;

    /// Create one item on an existing plan
    async fn create_item(&self, payload: NewItemPayload) -> Result<PlanItemDto, ApiError>;

    /// Patch one item; only the supplied fields change
    async fn update_item(&self, id: ServerId, patch: ItemPatch) -> Result<PlanItemDto, ApiError>;

    /// Delete one item
    async fn delete_item(&self, id: ServerId) -> Result<(), ApiError>;

    /// Create a plan together with inline items
    async fn create_plan(&self, payload: NewPlanPayload) -> Result<PlanDto, ApiError>;

    /// Patch the parent plan's scalar fields
    async fn update_plan(&self, id: ServerId, patch: PlanPatch) -> Result<PlanDto, ApiError>;
}
