//! Planline Engine - the reconciliation core
//!
//! Converges an in-memory plan draft with the server:
//! - Live resolution of typed catalog codes (debounced, generation-guarded)
//! - Separation of the draft into create and update work
//! - Two-phase batched persistence with per-row outcomes
//! - A suppression gate freezing the pipeline during bulk resets
//! - A token-scoped command bus for editor hosts
//!
//! # Example
//!
//! ```rust,ignore
//! use planline_client::HttpPlanApi;
//! use planline_engine::{PlanEditor, TracingNotifier};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = Arc::new(HttpPlanApi::new("http://backend/api/"));
//! let editor = PlanEditor::new(api, Arc::new(TracingNotifier));
//!
//! editor.load().await?;
//! let row = editor.add_row().expect("not resetting");
//! editor.code_input(row, "E001")?;
//! let report = editor.save().await?;
//!
//! println!("created {} rows", report.created);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod commands;
pub mod config;
pub mod coordinator;
pub mod editor;
pub mod error;
pub mod gate;
pub mod notify;
pub mod resolver;
pub mod separator;

pub use commands::{CommandBus, EditorCommand, Subscription, SubscriptionToken};
pub use config::EditorConfig;
pub use coordinator::{
    BatchCoordinator, RowFailure, SaveOutcome, SavePhase, SaveReport, SubmitStage,
};
pub use editor::PlanEditor;
pub use error::EngineError;
pub use gate::{EditorPhase, ResetGuard, SuppressionGate};
pub use notify::{Notifier, NoticeLevel, TracingNotifier};
pub use resolver::{ResolveOutcome, SearchBindResolver};
pub use separator::{separate, CreateDraft, InvalidRow, RowPatch, Separation, PATCH_FIELDS};

/// The draft as shared between the editor, resolver and coordinator
///
/// One logical writer: mutation happens from editor entry points or from
/// a settled network response, never concurrently in spirit — the lock
/// makes that safe on a multi-threaded runtime, the gate makes bulk
/// resets atomic from the pipeline's point of view.
pub type SharedDraft = std::sync::Arc<parking_lot::Mutex<planline_model::PlanDraft>>;

/// Prelude for editor hosts
pub mod prelude {
    //! Common imports for driving a [`crate::PlanEditor`]
    pub use crate::{
        CommandBus, EditorCommand, EditorConfig, EditorPhase, EngineError, NoticeLevel, Notifier,
        PlanEditor, ResolveOutcome, SaveOutcome, SaveReport,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
