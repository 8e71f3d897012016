//! Dashboard session: the two state slices plus the request flows that feed them.
//!
//! Every operation dispatches `Pending`, calls the API, then dispatches
//! `Fulfilled` or `Rejected`. Successful mutations are followed by a re-fetch
//! of the affected collection; a failing re-fetch is recorded in the slice
//! but the mutation is still reported as a success.

use tracing::{debug, warn};

use dividend_tracker_core::{
    charts::{self, ColumnSeries, DonutSeries},
    state::{CompaniesState, CompanyAction, DividendAction, DividendsState, Phase},
    Company, CompanyPayload, Dividend, DividendRequest,
};

use crate::api::{ApiClient, ClientError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient user-facing outcome of a dashboard action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == NotificationKind::Success
    }
}

pub struct Dashboard {
    api: ApiClient,
    companies: CompaniesState,
    dividends: DividendsState,
}

impl Dashboard {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            companies: CompaniesState::default(),
            dividends: DividendsState::default(),
        }
    }

    pub fn companies(&self) -> &CompaniesState {
        &self.companies
    }

    pub fn dividends(&self) -> &DividendsState {
        &self.dividends
    }

    /// Dividend rows paired with the owning company's name, when known.
    pub fn dividend_rows(&self) -> Vec<(&Dividend, &str)> {
        self.dividends
            .dividends()
            .iter()
            .map(|dividend| {
                let name = self
                    .companies
                    .company_name(dividend.company_id)
                    .unwrap_or("Unknown");
                (dividend, name)
            })
            .collect()
    }

    pub fn annual_amounts(&self) -> ColumnSeries {
        charts::annual_amounts(self.dividends.dividends())
    }

    pub fn yield_share(&self) -> DonutSeries {
        charts::yield_share(self.dividends.dividends())
    }

    pub async fn load_companies(&mut self) -> Result<(), ClientError> {
        self.companies.reduce(CompanyAction::FetchAll(Phase::Pending));
        match self.api.list_companies().await {
            Ok(companies) => {
                debug!(stage = "client", count = companies.len(), "companies loaded");
                self.companies
                    .reduce(CompanyAction::FetchAll(Phase::Fulfilled(companies)));
                Ok(())
            }
            Err(err) => {
                warn!(stage = "client", error = %err, "failed to load companies");
                self.companies
                    .reduce(CompanyAction::FetchAll(Phase::Rejected(err.user_message())));
                Err(err)
            }
        }
    }

    /// Loads companies and selects the first one when nothing is selected yet.
    pub async fn open(&mut self) -> Result<(), ClientError> {
        self.load_companies().await?;
        if self.companies.selected_company().is_some() {
            return Ok(());
        }
        match self.companies.companies().first().map(|company| company.id) {
            Some(id) => self.select_company(id).await,
            None => Ok(()),
        }
    }

    /// Selects a company and loads its dividends.
    pub async fn select_company(&mut self, id: i64) -> Result<(), ClientError> {
        self.companies.reduce(CompanyAction::Select(Some(id)));
        self.load_company_dividends(id).await
    }

    pub fn clear_selection(&mut self) {
        self.companies.reduce(CompanyAction::Select(None));
    }

    pub async fn load_dividends(&mut self) -> Result<(), ClientError> {
        self.dividends.reduce(DividendAction::FetchAll(Phase::Pending));
        match self.api.list_dividends().await {
            Ok(dividends) => {
                self.dividends
                    .reduce(DividendAction::FetchAll(Phase::Fulfilled(dividends)));
                Ok(())
            }
            Err(err) => {
                warn!(stage = "client", error = %err, "failed to load dividends");
                self.dividends
                    .reduce(DividendAction::FetchAll(Phase::Rejected(err.user_message())));
                Err(err)
            }
        }
    }

    pub async fn load_company_dividends(&mut self, company_id: i64) -> Result<(), ClientError> {
        self.dividends
            .reduce(DividendAction::FetchByCompany(Phase::Pending));
        match self.api.list_dividends_by_company(company_id).await {
            Ok(dividends) => {
                self.dividends
                    .reduce(DividendAction::FetchByCompany(Phase::Fulfilled(dividends)));
                Ok(())
            }
            Err(err) => {
                warn!(
                    stage = "client",
                    company_id,
                    error = %err,
                    "failed to load company dividends"
                );
                self.dividends.reduce(DividendAction::FetchByCompany(Phase::Rejected(
                    err.user_message(),
                )));
                Err(err)
            }
        }
    }

    pub async fn add_company(&mut self, name: &str) -> Notification {
        let payload = CompanyPayload::new(name);
        if let Err(err) = payload.validated_name() {
            return form_error(err.into());
        }

        self.companies.reduce(CompanyAction::Add(Phase::Pending));
        match self.api.add_company(&payload).await {
            Ok(created) => {
                self.companies.reduce(CompanyAction::Add(Phase::Fulfilled(Company {
                    id: created.id,
                    name: payload.name,
                })));
                self.refresh_companies().await;
                Notification::success("Company added successfully!")
            }
            Err(err) => {
                self.companies
                    .reduce(CompanyAction::Add(Phase::Rejected(err.user_message())));
                Notification::error(format!("Failed to add company: {}", err.user_message()))
            }
        }
    }

    pub async fn update_company(&mut self, id: i64, name: &str) -> Notification {
        let payload = CompanyPayload::with_id(id, name);
        if let Err(err) = payload.validated_name() {
            return form_error(err.into());
        }

        self.companies.reduce(CompanyAction::Update(Phase::Pending));
        match self.api.update_company(id, &payload).await {
            Ok(_) => {
                self.companies
                    .reduce(CompanyAction::Update(Phase::Fulfilled(Company {
                        id,
                        name: payload.name,
                    })));
                self.refresh_companies().await;
                Notification::success("Company updated successfully!")
            }
            Err(err) => {
                self.companies
                    .reduce(CompanyAction::Update(Phase::Rejected(err.user_message())));
                Notification::error(format!(
                    "Failed to update company: {}",
                    err.user_message()
                ))
            }
        }
    }

    pub async fn delete_company(&mut self, id: i64) -> Notification {
        self.companies.reduce(CompanyAction::Delete(Phase::Pending));
        match self.api.delete_company(id).await {
            Ok(_) => {
                self.companies
                    .reduce(CompanyAction::Delete(Phase::Fulfilled(id)));
                self.refresh_companies().await;
                // The server removed the company's dividends as well.
                self.refresh_dividends().await;
                Notification::success("Company deleted successfully!")
            }
            Err(err) => {
                self.companies
                    .reduce(CompanyAction::Delete(Phase::Rejected(err.user_message())));
                Notification::error("Failed to delete company.")
            }
        }
    }

    pub async fn add_dividend(&mut self, request: DividendRequest) -> Notification {
        if let Err(err) = request.validate() {
            return form_error(err.into());
        }

        self.dividends.reduce(DividendAction::Add(Phase::Pending));
        match self.api.add_dividend(&request).await {
            Ok(created) => {
                self.dividends.reduce(DividendAction::Add(Phase::Fulfilled(
                    Dividend::from_request(created.id, &request),
                )));
                self.refresh_dividends().await;
                Notification::success("Dividend added successfully!")
            }
            Err(err) => {
                self.dividends
                    .reduce(DividendAction::Add(Phase::Rejected(err.user_message())));
                Notification::error(format!("Error adding dividend: {}", err.user_message()))
            }
        }
    }

    pub async fn update_dividend(&mut self, id: i64, request: DividendRequest) -> Notification {
        if let Err(err) = request.validate() {
            return form_error(err.into());
        }

        self.dividends.reduce(DividendAction::Update(Phase::Pending));
        match self.api.update_dividend(id, &request).await {
            Ok(dividend) => {
                self.dividends
                    .reduce(DividendAction::Update(Phase::Fulfilled(dividend)));
                self.refresh_dividends().await;
                Notification::success("Dividend updated successfully!")
            }
            Err(err) => {
                self.dividends
                    .reduce(DividendAction::Update(Phase::Rejected(err.user_message())));
                Notification::error("Failed to update dividend.")
            }
        }
    }

    pub async fn delete_dividend(&mut self, id: i64) -> Notification {
        self.dividends.reduce(DividendAction::Delete(Phase::Pending));
        match self.api.delete_dividend(id).await {
            Ok(()) => {
                self.dividends
                    .reduce(DividendAction::Delete(Phase::Fulfilled(id)));
                self.refresh_dividends().await;
                Notification::success("Dividend deleted successfully!")
            }
            Err(err) => {
                self.dividends
                    .reduce(DividendAction::Delete(Phase::Rejected(err.user_message())));
                Notification::error("Failed to delete dividend.")
            }
        }
    }

    async fn refresh_companies(&mut self) {
        if let Err(err) = self.load_companies().await {
            debug!(
                stage = "client",
                error = %err,
                "company re-fetch after mutation failed"
            );
        }
    }

    async fn refresh_dividends(&mut self) {
        let outcome = match self.companies.selected_company() {
            Some(company_id) => self.load_company_dividends(company_id).await,
            None => self.load_dividends().await,
        };
        if let Err(err) = outcome {
            debug!(stage = "client", error = %err, "dividend re-fetch after mutation failed");
        }
    }
}

fn form_error(err: ClientError) -> Notification {
    Notification::error(format!("Please fix the errors in the form: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dividend_tracker_core::state::RequestStatus;
    use httpmock::prelude::*;
    use reqwest::Client;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use url::Url;

    fn dashboard(server: &MockServer) -> Dashboard {
        let base = Url::parse(&server.url("/")).expect("url");
        Dashboard::new(ApiClient::new(base, Client::builder().build().expect("client")))
    }

    fn request(company_id: i64, year: i32, amount: &str, dividend_yield: &str) -> DividendRequest {
        DividendRequest {
            company_id,
            dividend_amount: Decimal::from_str(amount).unwrap(),
            dividend_yield: Decimal::from_str(dividend_yield).unwrap(),
            year,
        }
    }

    #[tokio::test]
    async fn open_loads_companies_and_selects_first() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/companies");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"[{"id":3,"name":"Acme"},{"id":4,"name":"Globex"}]"#);
            })
            .await;
        let dividends = server
            .mock_async(|when, then| {
                when.method(GET).path("/dividends/company/3");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        r#"[{"id":1,"companyId":3,"dividendAmount":1.50,"dividendYield":2.25,"year":2023}]"#,
                    );
            })
            .await;
        let mut dashboard = dashboard(&server);

        dashboard.open().await.expect("open");
        dividends.assert_async().await;

        assert_eq!(dashboard.companies().selected_company(), Some(3));
        assert_eq!(dashboard.companies().status(), RequestStatus::Fulfilled);
        assert_eq!(dashboard.dividends().dividends().len(), 1);
        let rows = dashboard.dividend_rows();
        assert_eq!(rows[0].1, "Acme");
        assert_eq!(dashboard.annual_amounts().categories, vec![2023]);
    }

    #[tokio::test]
    async fn failed_load_is_recorded_as_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/dividends");
                then.status(404)
                    .header("content-type", "application/problem+json")
                    .body(r#"{"type":"not_found","title":"Not Found","detail":"No dividends found."}"#);
            })
            .await;
        let mut dashboard = dashboard(&server);

        let err = dashboard.load_dividends().await.expect_err("should fail");

        assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
        assert_eq!(dashboard.dividends().status(), RequestStatus::Rejected);
        assert_eq!(dashboard.dividends().error(), Some("No dividends found."));
        assert!(!dashboard.dividends().loading());
    }

    #[tokio::test]
    async fn add_company_refetches_companies() {
        let server = MockServer::start_async().await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/companies")
                    .json_body(serde_json::json!({ "name": "Acme" }));
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"id":1,"message":"Company added successfully."}"#);
            })
            .await;
        let list = server
            .mock_async(|when, then| {
                when.method(GET).path("/companies");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"[{"id":1,"name":"Acme"}]"#);
            })
            .await;
        let mut dashboard = dashboard(&server);

        let notification = dashboard.add_company("Acme").await;

        create.assert_async().await;
        list.assert_async().await;
        assert_eq!(notification, Notification::success("Company added successfully!"));
        assert_eq!(dashboard.companies().companies().len(), 1);
        assert_eq!(dashboard.companies().company_name(1), Some("Acme"));
    }

    #[tokio::test]
    async fn blank_company_name_is_not_sent() {
        let server = MockServer::start_async().await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/companies");
                then.status(200);
            })
            .await;
        let mut dashboard = dashboard(&server);

        let notification = dashboard.add_company("   ").await;

        create.assert_hits_async(0).await;
        assert!(!notification.is_success());
        assert_eq!(dashboard.companies().status(), RequestStatus::Idle);
    }

    #[tokio::test]
    async fn update_company_error_surfaces_server_detail() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/companies/5");
                then.status(400)
                    .header("content-type", "application/problem+json")
                    .body(r#"{"type":"invalid_input","title":"Bad Request","detail":"Invalid company data."}"#);
            })
            .await;
        let mut dashboard = dashboard(&server);

        let notification = dashboard.update_company(5, "Renamed").await;

        assert_eq!(
            notification,
            Notification::error("Failed to update company: Invalid company data.")
        );
        assert_eq!(dashboard.companies().error(), Some("Invalid company data."));
    }

    #[tokio::test]
    async fn delete_company_refetches_cascaded_dividends() {
        let server = MockServer::start_async().await;
        let mut dividends = server
            .mock_async(|when, then| {
                when.method(GET).path("/dividends");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        r#"[{"id":1,"companyId":3,"dividendAmount":1.50,"dividendYield":2.25,"year":2023}]"#,
                    );
            })
            .await;
        let mut dashboard = dashboard(&server);
        dashboard.load_dividends().await.expect("load dividends");
        assert_eq!(dashboard.dividend_rows().len(), 1);
        dividends.delete_async().await;

        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/companies/3");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"message":"Company deleted successfully."}"#);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/companies");
                then.status(200)
                    .header("content-type", "application/json")
                    .body("[]");
            })
            .await;
        let refetch = server
            .mock_async(|when, then| {
                when.method(GET).path("/dividends");
                then.status(200)
                    .header("content-type", "application/json")
                    .body("[]");
            })
            .await;

        let notification = dashboard.delete_company(3).await;

        delete.assert_async().await;
        refetch.assert_async().await;
        assert_eq!(notification, Notification::success("Company deleted successfully!"));
        assert!(dashboard.dividend_rows().is_empty());
        assert!(dashboard.annual_amounts().data.is_empty());
        assert!(dashboard.yield_share().data.is_empty());
    }

    #[tokio::test]
    async fn invalid_dividend_form_is_not_sent() {
        let server = MockServer::start_async().await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/dividends");
                then.status(200);
            })
            .await;
        let mut dashboard = dashboard(&server);

        let negative = dashboard.add_dividend(request(1, 2023, "-0.01", "1")).await;
        let no_year = dashboard.add_dividend(request(1, 0, "1", "1")).await;

        create.assert_hits_async(0).await;
        assert!(!negative.is_success());
        assert!(!no_year.is_success());
    }

    #[tokio::test]
    async fn delete_dividend_refetches_selected_company() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/dividends/company/2");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        r#"[{"id":8,"companyId":2,"dividendAmount":1.00,"dividendYield":1.00,"year":2022}]"#,
                    );
            })
            .await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/dividends/8");
                then.status(204);
            })
            .await;
        let mut dashboard = dashboard(&server);
        dashboard.select_company(2).await.expect("select");

        let notification = dashboard.delete_dividend(8).await;

        delete.assert_async().await;
        assert!(notification.is_success());
        assert_eq!(dashboard.dividends().status(), RequestStatus::Fulfilled);
    }

    #[tokio::test]
    async fn failed_refetch_does_not_fail_the_mutation() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/dividends");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"id":12}"#);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/dividends");
                then.status(500)
                    .header("content-type", "application/problem+json")
                    .body(r#"{"type":"storage_failure","title":"Internal Server Error","detail":"Internal server error"}"#);
            })
            .await;
        let mut dashboard = dashboard(&server);

        let notification = dashboard
            .add_dividend(request(1, 2023, "1.50", "2.25"))
            .await;

        assert_eq!(notification, Notification::success("Dividend added successfully!"));
        assert_eq!(dashboard.dividends().status(), RequestStatus::Rejected);
        assert_eq!(dashboard.dividends().error(), Some("Internal server error"));
        assert_eq!(dashboard.dividends().dividends()[0].id, 12);
    }

    #[tokio::test]
    async fn update_dividend_not_found_reports_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/dividends/999");
                then.status(404)
                    .header("content-type", "application/problem+json")
                    .body(r#"{"type":"not_found","title":"Not Found","detail":"Dividend with ID 999 not found."}"#);
            })
            .await;
        let mut dashboard = dashboard(&server);

        let notification = dashboard
            .update_dividend(999, request(1, 2023, "1", "1"))
            .await;

        assert_eq!(notification, Notification::error("Failed to update dividend."));
        assert_eq!(
            dashboard.dividends().error(),
            Some("Dividend with ID 999 not found.")
        );
    }
}
