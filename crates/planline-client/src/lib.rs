//! Planline Client - wire types and backend access
//!
//! The boundary between the editor and the plan backend:
//! - DTOs mirroring the backend's serializers
//! - The [`PlanApi`] trait the engine consumes
//! - A reqwest-backed implementation
//! - Extraction of server-supplied error detail

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod api;
pub mod dto;
pub mod error;
pub mod http;

pub use api::PlanApi;
pub use dto::{
    CatalogItemDto, InlineItemPayload, ItemPatch, NewItemPayload, NewPlanPayload, PlanDto,
    PlanItemDto, PlanPatch,
};
pub use error::{extract_detail, ApiError};
pub use http::HttpPlanApi;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
