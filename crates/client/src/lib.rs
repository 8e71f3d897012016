pub mod api;
pub mod dashboard;

pub use api::{ApiClient, ClientError};
pub use dashboard::{Dashboard, Notification, NotificationKind};
