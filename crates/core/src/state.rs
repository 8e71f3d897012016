//! Client-side state slices mirroring the `companies` and `dividends` resources.
//!
//! Each slice is a plain value updated by a pure reducer. Every async request
//! goes through the same three phases (`Pending`, then `Fulfilled` or
//! `Rejected`) and the slice tracks where the latest request stands in
//! [`RequestStatus`].

use crate::types::{Company, Dividend};

/// Lifecycle of the most recent request dispatched against a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestStatus {
    #[default]
    Idle,
    Pending,
    Fulfilled,
    Rejected,
}

/// Phase of an async request, carrying its payload once resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase<T> {
    Pending,
    Fulfilled(T),
    Rejected(String),
}

/// Actions understood by [`CompaniesState::reduce`].
#[derive(Debug, Clone, PartialEq)]
pub enum CompanyAction {
    FetchAll(Phase<Vec<Company>>),
    Add(Phase<Company>),
    Update(Phase<Company>),
    Delete(Phase<i64>),
    Select(Option<i64>),
}

/// Actions understood by [`DividendsState::reduce`].
#[derive(Debug, Clone, PartialEq)]
pub enum DividendAction {
    FetchAll(Phase<Vec<Dividend>>),
    FetchByCompany(Phase<Vec<Dividend>>),
    Add(Phase<Dividend>),
    Update(Phase<Dividend>),
    Delete(Phase<i64>),
}

/// Normalized copy of the company collection held by the dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompaniesState {
    companies: Vec<Company>,
    selected_company: Option<i64>,
    status: RequestStatus,
    error: Option<String>,
}

impl CompaniesState {
    pub fn reduce(&mut self, action: CompanyAction) {
        match action {
            CompanyAction::FetchAll(phase) => match phase {
                Phase::Pending => self.begin(true),
                Phase::Fulfilled(companies) => {
                    self.companies = companies;
                    self.status = RequestStatus::Fulfilled;
                }
                Phase::Rejected(message) => self.reject(message),
            },
            CompanyAction::Add(phase) => match phase {
                Phase::Pending => self.begin(false),
                Phase::Fulfilled(company) => {
                    self.companies.push(company);
                    self.status = RequestStatus::Fulfilled;
                }
                Phase::Rejected(message) => self.reject(message),
            },
            CompanyAction::Update(phase) => match phase {
                Phase::Pending => self.begin(false),
                Phase::Fulfilled(company) => {
                    if let Some(slot) = self.companies.iter_mut().find(|c| c.id == company.id) {
                        *slot = company;
                    }
                    self.status = RequestStatus::Fulfilled;
                }
                Phase::Rejected(message) => self.reject(message),
            },
            CompanyAction::Delete(phase) => match phase {
                Phase::Pending => self.begin(false),
                Phase::Fulfilled(id) => {
                    self.companies.retain(|company| company.id != id);
                    if self.selected_company == Some(id) {
                        self.selected_company = None;
                    }
                    self.status = RequestStatus::Fulfilled;
                }
                Phase::Rejected(message) => self.reject(message),
            },
            CompanyAction::Select(id) => self.selected_company = id,
        }
    }

    fn begin(&mut self, clear_error: bool) {
        self.status = RequestStatus::Pending;
        if clear_error {
            self.error = None;
        }
    }

    fn reject(&mut self, message: String) {
        self.status = RequestStatus::Rejected;
        self.error = Some(message);
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    pub fn selected_company(&self) -> Option<i64> {
        self.selected_company
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn loading(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Looks up a company name, used to label dividend rows.
    pub fn company_name(&self, id: i64) -> Option<&str> {
        self.companies
            .iter()
            .find(|company| company.id == id)
            .map(|company| company.name.as_str())
    }
}

/// Normalized copy of the dividend collection held by the dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DividendsState {
    dividends: Vec<Dividend>,
    status: RequestStatus,
    error: Option<String>,
}

impl DividendsState {
    pub fn reduce(&mut self, action: DividendAction) {
        match action {
            DividendAction::FetchAll(phase) | DividendAction::FetchByCompany(phase) => {
                self.replace_all(phase)
            }
            DividendAction::Add(phase) => match phase {
                Phase::Pending => self.begin(false),
                Phase::Fulfilled(dividend) => {
                    self.dividends.push(dividend);
                    self.status = RequestStatus::Fulfilled;
                }
                Phase::Rejected(message) => self.reject(message),
            },
            DividendAction::Update(phase) => match phase {
                Phase::Pending => self.begin(false),
                Phase::Fulfilled(dividend) => {
                    if let Some(slot) = self.dividends.iter_mut().find(|d| d.id == dividend.id) {
                        *slot = dividend;
                    }
                    self.status = RequestStatus::Fulfilled;
                }
                Phase::Rejected(message) => self.reject(message),
            },
            DividendAction::Delete(phase) => match phase {
                Phase::Pending => self.begin(false),
                Phase::Fulfilled(id) => {
                    self.dividends.retain(|dividend| dividend.id != id);
                    self.status = RequestStatus::Fulfilled;
                }
                Phase::Rejected(message) => self.reject(message),
            },
        }
    }

    fn replace_all(&mut self, phase: Phase<Vec<Dividend>>) {
        match phase {
            Phase::Pending => self.begin(true),
            Phase::Fulfilled(dividends) => {
                self.dividends = dividends;
                self.status = RequestStatus::Fulfilled;
            }
            Phase::Rejected(message) => self.reject(message),
        }
    }

    fn begin(&mut self, clear_error: bool) {
        self.status = RequestStatus::Pending;
        if clear_error {
            self.error = None;
        }
    }

    fn reject(&mut self, message: String) {
        self.status = RequestStatus::Rejected;
        self.error = Some(message);
    }

    pub fn dividends(&self) -> &[Dividend] {
        &self.dividends
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn loading(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
