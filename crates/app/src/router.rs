use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use dividend_tracker_storage::Database;
use dividend_tracker_util::EmptyListPolicy;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::companies::{self, CompanyService};
use crate::dividends::{self, DividendService};
use crate::telemetry;

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    storage: Database,
    companies: CompanyService,
    dividends: DividendService,
}

impl AppState {
    pub fn new(
        metrics: PrometheusHandle,
        storage: Database,
        empty_list_policy: EmptyListPolicy,
    ) -> Self {
        let companies = CompanyService::new(storage.companies());
        let dividends = DividendService::new(storage.dividends(), empty_list_policy);
        Self {
            metrics,
            storage,
            companies,
            dividends,
        }
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn storage(&self) -> &Database {
        &self.storage
    }

    pub fn companies(&self) -> &CompanyService {
        &self.companies
    }

    pub fn dividends(&self) -> &DividendService {
        &self.dividends
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/companies", get(companies::list).post(companies::create))
        .route(
            "/companies/:id",
            get(companies::get)
                .put(companies::update)
                .delete(companies::delete),
        )
        .route("/dividends", get(dividends::list_all).post(dividends::create))
        .route("/dividends/company/:company_id", get(dividends::list_by_company))
        .route(
            "/dividends/:id",
            put(dividends::update).delete(dividends::delete),
        )
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use dividend_tracker_storage::Database;
    use dividend_tracker_util::EmptyListPolicy;

    use super::AppState;
    use crate::telemetry;

    pub struct TestResponse {
        pub status: StatusCode,
        pub content_type: Option<String>,
        pub body: String,
    }

    impl TestResponse {
        pub fn json(&self) -> serde_json::Value {
            serde_json::from_str(&self.body).expect("response body should be json")
        }
    }

    pub async fn setup_state() -> AppState {
        setup_state_with_policy(EmptyListPolicy::default()).await
    }

    pub async fn setup_state_with_policy(policy: EmptyListPolicy) -> AppState {
        let metrics = telemetry::init_metrics().expect("metrics init");

        let database = Database::connect("sqlite::memory:")
            .await
            .expect("connect");
        database.run_migrations().await.expect("migrations");

        AppState::new(metrics, database, policy)
    }

    pub async fn send(app: Router, method: Method, uri: &str, body: Option<&str>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_owned())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = app.oneshot(request).await.expect("handler should respond");
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let collected = response
            .into_body()
            .collect()
            .await
            .expect("body should read");
        let body = String::from_utf8(collected.to_bytes().to_vec()).expect("utf-8");

        TestResponse {
            status,
            content_type,
            body,
        }
    }
}
