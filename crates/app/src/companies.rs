use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use tracing::info;

use dividend_tracker_core::types::{Acknowledgement, Company, CompanyPayload, Created};
use dividend_tracker_storage::CompanyRepository;

use crate::error::{json_body, path_id, storage_failure, ServiceError};
use crate::router::AppState;
use crate::telemetry::record_outcome;

const INVALID_COMPANY_DATA: &str = "Invalid company data.";
const INVALID_COMPANY_ID: &str = "Invalid company ID.";

/// Validation and outcome mapping for the company resource.
#[derive(Clone)]
pub struct CompanyService {
    repository: CompanyRepository,
}

impl CompanyService {
    pub fn new(repository: CompanyRepository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> Result<Vec<Company>, ServiceError> {
        self.repository
            .list_companies()
            .await
            .map_err(storage_failure("fetching companies"))
    }

    pub async fn get(&self, id: i64) -> Result<Company, ServiceError> {
        self.repository
            .get_company(id)
            .await
            .map_err(storage_failure("fetching a company"))?
            .ok_or(ServiceError::NotFound(None))
    }

    pub async fn create(&self, payload: &CompanyPayload) -> Result<Created, ServiceError> {
        let name = payload
            .validated_name()
            .map_err(|_| ServiceError::validation(INVALID_COMPANY_DATA))?;

        let id = self
            .repository
            .create_company(name)
            .await
            .map_err(storage_failure("adding a company"))?;

        info!(stage = "api", company_id = id, "company added");
        Ok(Created::with_message(id, "Company added successfully."))
    }

    /// Replaces the company name. The body id must match the path id; this is
    /// checked before the lookup so a mismatch is always a 400.
    pub async fn update(
        &self,
        id: i64,
        payload: &CompanyPayload,
    ) -> Result<Acknowledgement, ServiceError> {
        if payload.id != Some(id) {
            return Err(ServiceError::validation(INVALID_COMPANY_DATA));
        }
        let name = payload
            .validated_name()
            .map_err(|_| ServiceError::validation(INVALID_COMPANY_DATA))?;

        self.get(id).await?;

        let affected = self
            .repository
            .update_company(id, name)
            .await
            .map_err(storage_failure("updating a company"))?;
        if affected == 0 {
            return Err(ServiceError::Unexpected(
                "Error occurred while updating the company.",
            ));
        }

        info!(stage = "api", company_id = id, "company updated");
        Ok(Acknowledgement::new("Company updated successfully."))
    }

    pub async fn delete(&self, id: i64) -> Result<Acknowledgement, ServiceError> {
        self.get(id).await?;

        let deletion = self
            .repository
            .delete_company(id)
            .await
            .map_err(storage_failure("deleting a company"))?;
        if deletion.companies == 0 {
            return Err(ServiceError::Unexpected(
                "Error occurred while deleting the company.",
            ));
        }

        info!(
            stage = "api",
            company_id = id,
            dividends_removed = deletion.dividends,
            "company deleted"
        );
        Ok(Acknowledgement::new("Company deleted successfully."))
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Company>>, ServiceError> {
    let outcome = state.companies().list().await;
    record_outcome("companies", "list", &outcome);
    outcome.map(Json)
}

pub async fn get(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Company>, ServiceError> {
    let outcome = match path_id(path, INVALID_COMPANY_ID) {
        Ok(id) => state.companies().get(id).await,
        Err(err) => Err(err),
    };
    record_outcome("companies", "get", &outcome);
    outcome.map(Json)
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CompanyPayload>, JsonRejection>,
) -> Result<Json<Created>, ServiceError> {
    let outcome = match json_body(body, INVALID_COMPANY_DATA) {
        Ok(payload) => state.companies().create(&payload).await,
        Err(err) => Err(err),
    };
    record_outcome("companies", "create", &outcome);
    outcome.map(Json)
}

pub async fn update(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<CompanyPayload>, JsonRejection>,
) -> Result<Json<Acknowledgement>, ServiceError> {
    let outcome = match (
        path_id(path, INVALID_COMPANY_ID),
        json_body(body, INVALID_COMPANY_DATA),
    ) {
        (Ok(id), Ok(payload)) => state.companies().update(id, &payload).await,
        (Err(err), _) | (_, Err(err)) => Err(err),
    };
    record_outcome("companies", "update", &outcome);
    outcome.map(Json)
}

pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Acknowledgement>, ServiceError> {
    let outcome = match path_id(path, INVALID_COMPANY_ID) {
        Ok(id) => state.companies().delete(id).await,
        Err(err) => Err(err),
    };
    record_outcome("companies", "delete", &outcome);
    outcome.map(Json)
}
