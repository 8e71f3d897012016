use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

use dividend_tracker_core::types::{Created, Dividend, DividendRequest};
use dividend_tracker_storage::{DividendRepository, DividendStoreError};
use dividend_tracker_util::EmptyListPolicy;

use crate::error::{json_body, path_id, storage_failure, ServiceError};
use crate::router::AppState;
use crate::telemetry::record_outcome;

const INVALID_DIVIDEND_DATA: &str = "Invalid dividend data.";
const INVALID_DIVIDEND_ID: &str = "Invalid dividend ID.";
const INVALID_COMPANY_ID: &str = "Invalid company ID.";

/// Validation and outcome mapping for the dividend resource.
#[derive(Clone)]
pub struct DividendService {
    repository: DividendRepository,
    empty_list_policy: EmptyListPolicy,
}

impl DividendService {
    pub fn new(repository: DividendRepository, empty_list_policy: EmptyListPolicy) -> Self {
        Self {
            repository,
            empty_list_policy,
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Dividend>, ServiceError> {
        let dividends = self
            .repository
            .list_all_dividends()
            .await
            .map_err(storage_failure("retrieving all dividends"))?;

        if dividends.is_empty() && self.empty_list_policy.empty_is_not_found() {
            info!(stage = "api", "no dividends found");
            return Err(ServiceError::not_found("No dividends found."));
        }
        Ok(dividends)
    }

    pub async fn list_by_company(&self, company_id: i64) -> Result<Vec<Dividend>, ServiceError> {
        if company_id <= 0 {
            warn!(stage = "api", company_id, "invalid company id provided");
            return Err(ServiceError::validation(INVALID_COMPANY_ID));
        }

        let dividends = self
            .repository
            .list_dividends_by_company(company_id)
            .await
            .map_err(storage_failure("retrieving dividends for a company"))?;

        if dividends.is_empty() && self.empty_list_policy.empty_is_not_found() {
            info!(stage = "api", company_id, "no dividends found for company");
            return Err(ServiceError::not_found(format!(
                "No dividends found for company ID {company_id}."
            )));
        }
        Ok(dividends)
    }

    pub async fn create(&self, request: &DividendRequest) -> Result<Created, ServiceError> {
        if !request.company_id_is_valid() {
            return Err(ServiceError::validation(INVALID_DIVIDEND_DATA));
        }

        let id = self
            .repository
            .create_dividend(request)
            .await
            .map_err(storage_failure("adding a dividend"))?;

        info!(stage = "api", dividend_id = id, company_id = request.company_id, "dividend added");
        Ok(Created::new(id))
    }

    pub async fn update(
        &self,
        id: i64,
        request: &DividendRequest,
    ) -> Result<Dividend, ServiceError> {
        if id <= 0 || !request.company_id_is_valid() {
            return Err(ServiceError::validation(INVALID_DIVIDEND_DATA));
        }

        match self.repository.update_dividend(id, request).await {
            Ok(dividend) => {
                info!(stage = "api", dividend_id = id, "dividend updated");
                Ok(dividend)
            }
            Err(DividendStoreError::NotFound(_)) => Err(ServiceError::not_found(format!(
                "Dividend with ID {id} not found."
            ))),
            Err(err) => Err(storage_failure("updating a dividend")(err)),
        }
    }

    /// Deletes a dividend. A delete that removed nothing is reported as not found.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if id <= 0 {
            return Err(ServiceError::validation(INVALID_DIVIDEND_ID));
        }

        let removed = self
            .repository
            .delete_dividend(id)
            .await
            .map_err(storage_failure("deleting a dividend"))?;
        if !removed {
            return Err(ServiceError::not_found(format!(
                "Dividend with ID {id} not found."
            )));
        }

        info!(stage = "api", dividend_id = id, "dividend deleted");
        Ok(())
    }
}

pub async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<Dividend>>, ServiceError> {
    let outcome = state.dividends().list_all().await;
    record_outcome("dividends", "list", &outcome);
    outcome.map(Json)
}

pub async fn list_by_company(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<Dividend>>, ServiceError> {
    let outcome = match path_id(path, INVALID_COMPANY_ID) {
        Ok(company_id) => state.dividends().list_by_company(company_id).await,
        Err(err) => Err(err),
    };
    record_outcome("dividends", "list_by_company", &outcome);
    outcome.map(Json)
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<DividendRequest>, JsonRejection>,
) -> Result<Json<Created>, ServiceError> {
    let outcome = match json_body(body, INVALID_DIVIDEND_DATA) {
        Ok(request) => state.dividends().create(&request).await,
        Err(err) => Err(err),
    };
    record_outcome("dividends", "create", &outcome);
    outcome.map(Json)
}

pub async fn update(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<DividendRequest>, JsonRejection>,
) -> Result<Json<Dividend>, ServiceError> {
    let outcome = match (
        path_id(path, INVALID_DIVIDEND_DATA),
        json_body(body, INVALID_DIVIDEND_DATA),
    ) {
        (Ok(id), Ok(request)) => state.dividends().update(id, &request).await,
        (Err(err), _) | (_, Err(err)) => Err(err),
    };
    record_outcome("dividends", "update", &outcome);
    outcome.map(Json)
}

pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ServiceError> {
    let outcome = match path_id(path, INVALID_DIVIDEND_ID) {
        Ok(id) => state.dividends().delete(id).await,
        Err(err) => Err(err),
    };
    record_outcome("dividends", "delete", &outcome);
    outcome.map(|()| StatusCode::NO_CONTENT)
}
