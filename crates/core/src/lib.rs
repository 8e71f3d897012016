//! Domain types and client-side state shared by the dividend tracker crates.

pub mod charts;
pub mod state;
pub mod types;
pub mod validation;

pub use types::{Acknowledgement, Company, CompanyPayload, Created, Dividend, DividendRequest};
pub use validation::ValidationError;
