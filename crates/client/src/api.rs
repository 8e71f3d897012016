use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use dividend_tracker_core::{
    Acknowledgement, Company, CompanyPayload, Created, Dividend, DividendRequest, ValidationError,
};

/// Typed client for the dividend tracker HTTP API.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    /// `base_url` must end with a `/` so relative resource paths join under it.
    pub fn new(base_url: Url, http: Client) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>, ClientError> {
        let response = self.request(Method::GET, "companies")?.send().await?;
        parse_json(response).await
    }

    pub async fn get_company(&self, id: i64) -> Result<Company, ClientError> {
        let response = self
            .request(Method::GET, &format!("companies/{id}"))?
            .send()
            .await?;
        parse_json(response).await
    }

    pub async fn add_company(&self, payload: &CompanyPayload) -> Result<Created, ClientError> {
        self.send_json(Method::POST, "companies", payload).await
    }

    pub async fn update_company(
        &self,
        id: i64,
        payload: &CompanyPayload,
    ) -> Result<Acknowledgement, ClientError> {
        self.send_json(Method::PUT, &format!("companies/{id}"), payload)
            .await
    }

    pub async fn delete_company(&self, id: i64) -> Result<Acknowledgement, ClientError> {
        let response = self
            .request(Method::DELETE, &format!("companies/{id}"))?
            .send()
            .await?;
        parse_json(response).await
    }

    pub async fn list_dividends(&self) -> Result<Vec<Dividend>, ClientError> {
        let response = self.request(Method::GET, "dividends")?.send().await?;
        parse_json(response).await
    }

    pub async fn list_dividends_by_company(
        &self,
        company_id: i64,
    ) -> Result<Vec<Dividend>, ClientError> {
        let response = self
            .request(Method::GET, &format!("dividends/company/{company_id}"))?
            .send()
            .await?;
        parse_json(response).await
    }

    pub async fn add_dividend(&self, request: &DividendRequest) -> Result<Created, ClientError> {
        self.send_json(Method::POST, "dividends", request).await
    }

    pub async fn update_dividend(
        &self,
        id: i64,
        request: &DividendRequest,
    ) -> Result<Dividend, ClientError> {
        self.send_json(Method::PUT, &format!("dividends/{id}"), request)
            .await
    }

    pub async fn delete_dividend(&self, id: i64) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, &format!("dividends/{id}"))?
            .send()
            .await?;
        ensure_success(response).await.map(|_| ())
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.base_url.join(path)?;
        Ok(self.http.request(method, url))
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(method, path)?.json(body).send().await?;
        parse_json(response).await
    }
}

/// Errors produced by [`ApiClient`] and the dashboard built on it.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build url: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl ClientError {
    /// Text shown to the user: the server's detail for status errors.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ProblemBody {
    detail: Option<String>,
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status,
        message: status_message(status, &body),
    })
}

async fn parse_json<T>(response: Response) -> Result<T, ClientError>
where
    T: DeserializeOwned,
{
    let response = ensure_success(response).await?;
    Ok(response.json().await?)
}

fn status_message(status: StatusCode, body: &str) -> String {
    if let Ok(ProblemBody {
        detail: Some(detail),
    }) = serde_json::from_str::<ProblemBody>(body)
    {
        return detail;
    }

    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}
