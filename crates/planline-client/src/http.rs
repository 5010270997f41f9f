//! reqwest-backed implementation of [`PlanApi`]
//!
//! Paths follow the backend's router. Thin mapping only: authentication
//! headers and retries belong to the caller's `reqwest::Client`
//! configuration.

use crate::api::PlanApi;
use crate::dto::{
    CatalogItemDto, ItemPatch, NewItemPayload, NewPlanPayload, PlanDto, PlanItemDto, PlanPatch,
};
use crate::error::ApiError;
use planline_model::ServerId;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// HTTP client for the plan backend
#[derive(Debug, Clone)]
pub struct HttpPlanApi {
    base: String,
    client: reqwest::Client,
}

impl HttpPlanApi {
    /// Client against `base_url` (with or without a trailing slash)
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Client reusing a caller-configured `reqwest::Client`
    ///
    /// Use this to attach auth middleware, timeouts or proxies.
    #[must_use]
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let mut base = base_url.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        Self { base, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|err| ApiError::Decode(err.to_string()))
        } else {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            Err(ApiError::from_response(status.as_u16(), &body))
        }
    }

    async fn check_empty(response: reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            Err(ApiError::from_response(status.as_u16(), &body))
        }
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

#[async_trait::async_trait]
impl PlanApi for HttpPlanApi {
    async fn list_plans(&self) -> Result<Vec<PlanDto>, ApiError> {
        let response = self
            .client
            .get(self.url("production-plans/"))
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response).await
    }

    async fn list_items(&self) -> Result<Vec<PlanItemDto>, ApiError> {
        let response = self
            .client
            .get(self.url("production-plan-items/"))
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response).await
    }

    async fn search_catalog(&self, query: &str) -> Result<Vec<CatalogItemDto>, ApiError> {
        tracing::debug!(%query, "catalog search");
        let response = self
            .client
            .get(self.url("products/"))
            .query(&[("search", query)])
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response).await
    }

    async fn create_item(&self, payload: NewItemPayload) -> Result<PlanItemDto, ApiError> {
        let response = self
            .client
            .post(self.url("production-plan-items/"))
            .json(&payload)
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response).await
    }

    async fn update_item(&self, id: ServerId, patch: ItemPatch) -> Result<PlanItemDto, ApiError> {
        let response = self
            .client
            .patch(self.url(&format!("production-plan-items/{id}/")))
            .json(&patch)
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response).await
    }

    async fn delete_item(&self, id: ServerId) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("production-plan-items/{id}/")))
            .send()
            .await
            .map_err(transport)?;
        Self::check_empty(response).await
    }

    async fn create_plan(&self, payload: NewPlanPayload) -> Result<PlanDto, ApiError> {
        let response = self
            .client
            .post(self.url("production-plans/"))
            .json(&payload)
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response).await
    }

    async fn update_plan(&self, id: ServerId, patch: PlanPatch) -> Result<PlanDto, ApiError> {
        let response = self
            .client
            .patch(self.url(&format!("production-plans/{id}/")))
            .json(&patch)
            .send()
            .await
            .map_err(transport)?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_a_trailing_slash() {
        let api = HttpPlanApi::new("http://backend/api");
        assert_eq!(api.url("production-plans/"), "http://backend/api/production-plans/");

        let api = HttpPlanApi::new("http://backend/api/");
        assert_eq!(api.url("products/"), "http://backend/api/products/");
    }
}
