//! In-memory backend fake
//!
//! Behaves like the real backend for the flows the engine drives, plus
//! test controls: per-call failure injection, call counters, and parked
//! search responses that tests release in any order to exercise stale
//! response handling.

use chrono::NaiveDate;
use parking_lot::Mutex;
use planline_client::{
    ApiError, CatalogItemDto, ItemPatch, NewItemPayload, NewPlanPayload, PlanApi, PlanDto,
    PlanItemDto, PlanPatch,
};
use planline_model::{ItemStatus, ServerId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::oneshot;

#[derive(Debug, Default)]
struct ApiState {
    plans: Vec<PlanDto>,
    items: Vec<PlanItemDto>,
    catalog: Vec<CatalogItemDto>,
    next_plan_id: u64,
    next_item_id: u64,
}

struct ParkedSearch {
    query: String,
    release: oneshot::Sender<()>,
}

/// In-memory [`PlanApi`] implementation
#[derive(Default)]
pub struct InMemoryPlanApi {
    state: Mutex<ApiState>,
    park_searches: AtomicBool,
    parked: Mutex<Vec<ParkedSearch>>,
    fail_searches: Mutex<VecDeque<String>>,
    fail_creates: Mutex<VecDeque<String>>,
    fail_updates: Mutex<VecDeque<String>>,
    fail_plan_patches: Mutex<VecDeque<String>>,
    recorded_creates: Mutex<Vec<NewItemPayload>>,
    recorded_patches: Mutex<Vec<(ServerId, ItemPatch)>>,
    search_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    plan_create_calls: AtomicUsize,
    plan_patch_calls: AtomicUsize,
}

impl InMemoryPlanApi {
    /// Empty backend
    #[must_use]
    pub fn new() -> Self {
        let api = Self::default();
        {
            let mut state = api.state.lock();
            state.next_plan_id = 1;
            state.next_item_id = 1;
        }
        api
    }

    /// Backend pre-loaded with the standard fixture
    ///
    /// Catalog E001-E004, one monthly plan (id 1) carrying two persisted
    /// items with server ids 10 and 11.
    #[must_use]
    pub fn with_standard_fixture() -> Self {
        let api = Self::new();
        {
            let mut state = api.state.lock();
            state.catalog = vec![
                catalog_item(3, "E001", "Widget"),
                catalog_item(4, "E002", "Gadget"),
                catalog_item(5, "E003", "Sprocket"),
                catalog_item(6, "E004", "Flange"),
            ];
            state.plans = vec![PlanDto {
                id: ServerId(1),
                plan_number: "PP-2026-08".into(),
                plan_type: "monthly".into(),
                is_serialized: false,
                start_date: date("2026-08-01"),
                end_date: date("2026-08-31"),
                items: Vec::new(),
                created_at: None,
                updated_at: None,
            }];
            state.items = vec![
                fixture_item(10, 1, 3, "E001", "Widget", 5, "2026-08-10"),
                fixture_item(11, 1, 4, "E002", "Gadget", 3, "2026-08-12"),
            ];
            state.next_plan_id = 2;
            state.next_item_id = 12;
        }
        api
    }

    /// Park every search until released
    pub fn park_searches(&self) {
        self.park_searches.store(true, Ordering::SeqCst);
    }

    /// Stop parking; already parked searches stay parked
    pub fn unpark_searches(&self) {
        self.park_searches.store(false, Ordering::SeqCst);
    }

    /// Queries currently parked, oldest first
    #[must_use]
    pub fn parked_queries(&self) -> Vec<String> {
        self.parked.lock().iter().map(|p| p.query.clone()).collect()
    }

    /// Release the oldest parked search matching `query`
    pub fn release_search(&self, query: &str) -> bool {
        let mut parked = self.parked.lock();
        if let Some(index) = parked.iter().position(|p| p.query == query) {
            let entry = parked.remove(index);
            let _ = entry.release.send(());
            true
        } else {
            false
        }
    }

    /// Block until `count` searches are parked
    pub async fn wait_for_parked(&self, count: usize) {
        loop {
            if self.parked.lock().len() >= count {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
    }

    /// Fail the next search with a server error
    pub fn fail_next_search(&self, detail: &str) {
        self.fail_searches.lock().push_back(detail.to_string());
    }

    /// Fail the next item create with a server error
    pub fn fail_next_create(&self, detail: &str) {
        self.fail_creates.lock().push_back(detail.to_string());
    }

    /// Fail the next item patch with a server error
    pub fn fail_next_update(&self, detail: &str) {
        self.fail_updates.lock().push_back(detail.to_string());
    }

    /// Fail the next plan patch with a server error
    pub fn fail_next_plan_patch(&self, detail: &str) {
        self.fail_plan_patches.lock().push_back(detail.to_string());
    }

    /// Number of search calls seen
    #[must_use]
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Number of item create calls seen
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of item patch calls seen
    #[must_use]
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Number of item delete calls seen
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Number of plan create calls seen
    #[must_use]
    pub fn plan_create_calls(&self) -> usize {
        self.plan_create_calls.load(Ordering::SeqCst)
    }

    /// Number of plan patch calls seen
    #[must_use]
    pub fn plan_patch_calls(&self) -> usize {
        self.plan_patch_calls.load(Ordering::SeqCst)
    }

    /// Create payloads seen, in call order
    #[must_use]
    pub fn recorded_creates(&self) -> Vec<NewItemPayload> {
        self.recorded_creates.lock().clone()
    }

    /// Item patches seen, in call order
    #[must_use]
    pub fn recorded_patches(&self) -> Vec<(ServerId, ItemPatch)> {
        self.recorded_patches.lock().clone()
    }

    /// One stored item by id
    #[must_use]
    pub fn item(&self, id: ServerId) -> Option<PlanItemDto> {
        self.state.lock().items.iter().find(|i| i.id == id).cloned()
    }

    /// All stored items
    #[must_use]
    pub fn items(&self) -> Vec<PlanItemDto> {
        self.state.lock().items.clone()
    }

    fn plan_with_items(state: &ApiState, plan: &PlanDto) -> PlanDto {
        let mut dto = plan.clone();
        dto.items = state
            .items
            .iter()
            .filter(|item| item.production_plan == Some(plan.id))
            .cloned()
            .collect();
        dto
    }
}

#[async_trait::async_trait]
impl PlanApi for InMemoryPlanApi {
    async fn list_plans(&self) -> Result<Vec<PlanDto>, ApiError> {
        let state = self.state.lock();
        Ok(state
            .plans
            .iter()
            .map(|plan| Self::plan_with_items(&state, plan))
            .collect())
    }

    async fn list_items(&self) -> Result<Vec<PlanItemDto>, ApiError> {
        Ok(self.state.lock().items.clone())
    }

    async fn search_catalog(&self, query: &str) -> Result<Vec<CatalogItemDto>, ApiError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(detail) = self.fail_searches.lock().pop_front() {
            return Err(ApiError::Server {
                status: 500,
                detail,
            });
        }

        let needle = query.to_ascii_lowercase();
        let candidates: Vec<CatalogItemDto> = self
            .state
            .lock()
            .catalog
            .iter()
            .filter(|item| item.product_id.to_ascii_lowercase().contains(&needle))
            .cloned()
            .collect();

        if self.park_searches.load(Ordering::SeqCst) {
            let (tx, rx) = oneshot::channel();
            self.parked.lock().push(ParkedSearch {
                query: query.to_string(),
                release: tx,
            });
            if rx.await.is_err() {
                return Err(ApiError::Transport("search dropped".into()));
            }
        }

        Ok(candidates)
    }

    async fn create_item(&self, payload: NewItemPayload) -> Result<PlanItemDto, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.recorded_creates.lock().push(payload.clone());

        if let Some(detail) = self.fail_creates.lock().pop_front() {
            return Err(ApiError::Server {
                status: 400,
                detail,
            });
        }

        let mut state = self.state.lock();
        let id = ServerId(state.next_item_id);
        state.next_item_id += 1;
        let (code, name) = state
            .catalog
            .iter()
            .find(|c| c.id == payload.product)
            .map(|c| (c.product_id.clone(), c.product_name.clone()))
            .unzip();
        let item = PlanItemDto {
            id,
            production_plan: Some(payload.production_plan),
            product: Some(payload.product),
            product_id: code,
            product_name: name,
            planned_quantity: payload.planned_quantity,
            planned_date: Some(payload.planned_date),
            status: payload.status,
            transferred_pcs: 0,
        };
        state.items.push(item.clone());
        Ok(item)
    }

    async fn update_item(&self, id: ServerId, patch: ItemPatch) -> Result<PlanItemDto, ApiError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.recorded_patches.lock().push((id, patch.clone()));

        if let Some(detail) = self.fail_updates.lock().pop_front() {
            return Err(ApiError::Server {
                status: 400,
                detail,
            });
        }

        let mut state = self.state.lock();
        let Some(item) = state.items.iter_mut().find(|item| item.id == id) else {
            return Err(ApiError::Server {
                status: 404,
                detail: "not found".into(),
            });
        };
        if let Some(quantity) = patch.planned_quantity {
            item.planned_quantity = quantity;
        }
        if let Some(date) = patch.planned_date {
            item.planned_date = Some(date);
        }
        if let Some(status) = patch.status {
            item.status = status;
        }
        if let Some(product) = patch.product {
            item.product = Some(product);
        }
        Ok(item.clone())
    }

    async fn delete_item(&self, id: ServerId) -> Result<(), ApiError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.lock();
        let before = state.items.len();
        state.items.retain(|item| item.id != id);
        if state.items.len() == before {
            return Err(ApiError::Server {
                status: 404,
                detail: "not found".into(),
            });
        }
        Ok(())
    }

    async fn create_plan(&self, payload: NewPlanPayload) -> Result<PlanDto, ApiError> {
        self.plan_create_calls.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.lock();
        let plan_id = ServerId(state.next_plan_id);
        state.next_plan_id += 1;
        let plan = PlanDto {
            id: plan_id,
            plan_number: format!("PP-{}", plan_id.0),
            plan_type: "monthly".into(),
            is_serialized: false,
            start_date: payload.start_date,
            end_date: payload.end_date,
            items: Vec::new(),
            created_at: None,
            updated_at: None,
        };
        for inline in payload.items {
            let id = ServerId(state.next_item_id);
            state.next_item_id += 1;
            let (code, name) = state
                .catalog
                .iter()
                .find(|c| c.id == inline.product)
                .map(|c| (c.product_id.clone(), c.product_name.clone()))
                .unzip();
            state.items.push(PlanItemDto {
                id,
                production_plan: Some(plan_id),
                product: Some(inline.product),
                product_id: code,
                product_name: name,
                planned_quantity: inline.planned_quantity,
                planned_date: Some(inline.planned_date),
                status: inline.status,
                transferred_pcs: 0,
            });
        }
        state.plans.push(plan.clone());
        Ok(Self::plan_with_items(&state, &plan))
    }

    async fn update_plan(&self, id: ServerId, patch: PlanPatch) -> Result<PlanDto, ApiError> {
        self.plan_patch_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(detail) = self.fail_plan_patches.lock().pop_front() {
            return Err(ApiError::Server {
                status: 400,
                detail,
            });
        }

        let mut state = self.state.lock();
        let Some(index) = state.plans.iter().position(|plan| plan.id == id) else {
            return Err(ApiError::Server {
                status: 404,
                detail: "not found".into(),
            });
        };
        if let Some(start) = patch.start_date {
            state.plans[index].start_date = start;
        }
        if let Some(end) = patch.end_date {
            state.plans[index].end_date = end;
        }
        let plan = state.plans[index].clone();
        Ok(Self::plan_with_items(&state, &plan))
    }
}

fn date(s: &str) -> NaiveDate {
    s.parse().expect("fixture date")
}

fn catalog_item(id: u64, code: &str, name: &str) -> CatalogItemDto {
    CatalogItemDto {
        id: ServerId(id),
        product_id: code.into(),
        product_name: name.into(),
        is_serialized: false,
    }
}

fn fixture_item(
    id: u64,
    plan: u64,
    product: u64,
    code: &str,
    name: &str,
    quantity: i64,
    planned: &str,
) -> PlanItemDto {
    PlanItemDto {
        id: ServerId(id),
        production_plan: Some(ServerId(plan)),
        product: Some(ServerId(product)),
        product_id: Some(code.into()),
        product_name: Some(name.into()),
        planned_quantity: quantity,
        planned_date: Some(date(planned)),
        status: ItemStatus::Pending,
        transferred_pcs: 0,
    }
}
