use std::{str::FromStr, time::Duration};

use rust_decimal::Decimal;
use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use thiserror::Error;

use dividend_tracker_core::types::{Company, Dividend, DividendRequest};

/// Top-level database handle that owns the SQLite connection pool.
///
/// Repositories borrow a clone of the pool; each query checks a connection
/// out and returns it as soon as the statement completes.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StorageError::Options)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle for the `Companies` table.
    pub fn companies(&self) -> CompanyRepository {
        CompanyRepository {
            pool: self.pool.clone(),
        }
    }

    /// Returns a handle for the `Dividends` table.
    pub fn dividends(&self) -> DividendRepository {
        DividendRepository {
            pool: self.pool.clone(),
        }
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid sqlite connection string: {0}")]
    Options(sqlx::Error),
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
}

/// Repository for the `Companies` table.
#[derive(Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    /// Lists every company in insertion order.
    pub async fn list_companies(&self) -> Result<Vec<Company>, CompanyStoreError> {
        let rows =
            sqlx::query_as::<_, CompanyRow>("SELECT Id AS id, Name AS name FROM Companies ORDER BY Id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(CompanyRow::into_domain).collect())
    }

    /// Loads a single company; `None` when the id is unknown.
    pub async fn get_company(&self, id: i64) -> Result<Option<Company>, CompanyStoreError> {
        let row = sqlx::query_as::<_, CompanyRow>(
            "SELECT Id AS id, Name AS name FROM Companies WHERE Id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CompanyRow::into_domain))
    }

    /// Inserts a company and returns its generated id.
    pub async fn create_company(&self, name: &str) -> Result<i64, CompanyStoreError> {
        let id: i64 = sqlx::query_scalar("INSERT INTO Companies (Name) VALUES (?) RETURNING Id")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(id)
    }

    /// Replaces the name of a company, returning the number of affected rows.
    pub async fn update_company(&self, id: i64, name: &str) -> Result<u64, CompanyStoreError> {
        let result = sqlx::query("UPDATE Companies SET Name = ? WHERE Id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes a company together with its dividends in one transaction.
    pub async fn delete_company(&self, id: i64) -> Result<CompanyDeletion, CompanyStoreError> {
        let mut tx = self.pool.begin().await?;

        let dividends = sqlx::query("DELETE FROM Dividends WHERE CompanyId = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let companies = sqlx::query("DELETE FROM Companies WHERE Id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(CompanyDeletion {
            companies,
            dividends,
        })
    }
}

/// Row counts removed by [`CompanyRepository::delete_company`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompanyDeletion {
    pub companies: u64,
    pub dividends: u64,
}

/// Errors raised by the company repository.
#[derive(Debug, Error)]
pub enum CompanyStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, sqlx::FromRow)]
struct CompanyRow {
    id: i64,
    name: String,
}

impl CompanyRow {
    fn into_domain(self) -> Company {
        Company {
            id: self.id,
            name: self.name,
        }
    }
}

/// Repository for the `Dividends` table.
#[derive(Clone)]
pub struct DividendRepository {
    pool: SqlitePool,
}

impl DividendRepository {
    /// Lists every dividend ordered by company and year.
    pub async fn list_all_dividends(&self) -> Result<Vec<Dividend>, DividendStoreError> {
        let rows = sqlx::query_as::<_, DividendRow>(
            r#"
SELECT Id AS id,
       CompanyId AS company_id,
       Year AS year,
       DividendAmount AS dividend_amount,
       DividendYield AS dividend_yield
  FROM Dividends
 ORDER BY CompanyId ASC, Year ASC, Id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DividendRow::into_domain).collect()
    }

    /// Lists the dividends of one company ordered by year.
    pub async fn list_dividends_by_company(
        &self,
        company_id: i64,
    ) -> Result<Vec<Dividend>, DividendStoreError> {
        let rows = sqlx::query_as::<_, DividendRow>(
            r#"
SELECT Id AS id,
       CompanyId AS company_id,
       Year AS year,
       DividendAmount AS dividend_amount,
       DividendYield AS dividend_yield
  FROM Dividends
 WHERE CompanyId = ?
 ORDER BY Year ASC, Id ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DividendRow::into_domain).collect()
    }

    /// Inserts a dividend and returns its generated id.
    pub async fn create_dividend(
        &self,
        request: &DividendRequest,
    ) -> Result<i64, DividendStoreError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO Dividends (CompanyId, Year, DividendAmount, DividendYield) \
             VALUES (?, ?, ?, ?) \
             RETURNING Id",
        )
        .bind(request.company_id)
        .bind(request.year)
        .bind(request.dividend_amount.to_string())
        .bind(request.dividend_yield.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Replaces every field of a dividend and returns the stored row.
    ///
    /// The write and the read happen in a single `UPDATE ... RETURNING`
    /// statement, so a concurrent delete either lands before (the update
    /// reports [`DividendStoreError::NotFound`]) or after (the caller gets the
    /// row it wrote).
    pub async fn update_dividend(
        &self,
        id: i64,
        request: &DividendRequest,
    ) -> Result<Dividend, DividendStoreError> {
        let row = sqlx::query_as::<_, DividendRow>(
            r#"
UPDATE Dividends
   SET CompanyId = ?,
       Year = ?,
       DividendAmount = ?,
       DividendYield = ?
 WHERE Id = ?
RETURNING Id AS id,
          CompanyId AS company_id,
          Year AS year,
          DividendAmount AS dividend_amount,
          DividendYield AS dividend_yield
            "#,
        )
        .bind(request.company_id)
        .bind(request.year)
        .bind(request.dividend_amount.to_string())
        .bind(request.dividend_yield.to_string())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(DividendStoreError::NotFound(id));
        };

        row.into_domain()
    }

    /// Deletes a dividend, returning `true` when a row was removed.
    pub async fn delete_dividend(&self, id: i64) -> Result<bool, DividendStoreError> {
        let result = sqlx::query("DELETE FROM Dividends WHERE Id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Errors raised by the dividend repository.
#[derive(Debug, Error)]
pub enum DividendStoreError {
    #[error("dividend {0} not found")]
    NotFound(i64),
    #[error("stored {column} value {value:?} is not a decimal: {source}")]
    Decode {
        column: &'static str,
        value: String,
        source: rust_decimal::Error,
    },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl DividendStoreError {
    /// Returns `true` for failures of the storage layer itself.
    pub fn is_storage_failure(&self) -> bool {
        !matches!(self, Self::NotFound(_))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DividendRow {
    id: i64,
    company_id: i64,
    year: i32,
    dividend_amount: String,
    dividend_yield: String,
}

impl DividendRow {
    fn into_domain(self) -> Result<Dividend, DividendStoreError> {
        Ok(Dividend {
            id: self.id,
            company_id: self.company_id,
            dividend_amount: parse_decimal("DividendAmount", self.dividend_amount)?,
            dividend_yield: parse_decimal("DividendYield", self.dividend_yield)?,
            year: self.year,
        })
    }
}

fn parse_decimal(column: &'static str, value: String) -> Result<Decimal, DividendStoreError> {
    Decimal::from_str(&value).map_err(|source| DividendStoreError::Decode {
        column,
        value,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> Database {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("connect");
        db.run_migrations().await.expect("migrations");
        db
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
    async fn migrations_apply() {
        let db = setup_db().await;

        let tables: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('Companies', 'Dividends')",
        )
        .fetch_one(db.pool())
        .await
        .expect("fetch tables");
        assert_eq!(tables.0, 2);
    }

    #[tokio::test]
    async fn each_memory_connection_is_isolated() {
        let first = setup_db().await;
        let second = setup_db().await;

        first.companies().create_company("Acme").await.expect("create");

        let listed = second.companies().list_companies().await.expect("list");
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn file_database_persists_across_connections() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}", dir.path().join("dividends.db").display());

        let db = Database::connect(&url).await.expect("connect");
        db.run_migrations().await.expect("migrations");
        let id = db.companies().create_company("Acme").await.expect("create");
        db.pool().close().await;

        let reopened = Database::connect(&url).await.expect("reconnect");
        reopened.run_migrations().await.expect("migrations are idempotent");
        let company = reopened
            .companies()
            .get_company(id)
            .await
            .expect("get")
            .expect("company persisted");
        assert_eq!(company.name, "Acme");
    }

    #[tokio::test]
    async fn company_crud_round_trip() {
        let db = setup_db().await;
        let repo = db.companies();

        let first = repo.create_company("Acme").await.expect("create");
        let second = repo.create_company("Acme").await.expect("duplicates allowed");
        assert!(second > first);

        assert_eq!(repo.update_company(first, "Acme Corp").await.expect("update"), 1);
        let listed = repo.list_companies().await.expect("list");
        assert_eq!(
            listed,
            vec![
                Company { id: first, name: "Acme Corp".to_string() },
                Company { id: second, name: "Acme".to_string() },
            ]
        );

        let deletion = repo.delete_company(second).await.expect("delete");
        assert_eq!(deletion.companies, 1);
        assert!(repo.get_company(second).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn update_and_delete_of_unknown_company_affect_no_rows() {
        let db = setup_db().await;
        let repo = db.companies();

        assert_eq!(repo.update_company(42, "Nobody").await.expect("update"), 0);
        let deletion = repo.delete_company(42).await.expect("delete");
        assert_eq!(
            deletion,
            CompanyDeletion {
                companies: 0,
                dividends: 0
            }
        );
    }

    #[tokio::test]
    async fn deleting_company_cascades_to_its_dividends() {
        let db = setup_db().await;
        let company_id = db.companies().create_company("Acme").await.expect("create");
        let other_id = db.companies().create_company("Globex").await.expect("create");
        let dividends = db.dividends();
        dividends
            .create_dividend(&request(company_id, 2021, "1.00", "2.00"))
            .await
            .expect("create");
        dividends
            .create_dividend(&request(company_id, 2022, "1.10", "2.10"))
            .await
            .expect("create");
        dividends
            .create_dividend(&request(other_id, 2022, "0.40", "1.00"))
            .await
            .expect("create");

        let deletion = db.companies().delete_company(company_id).await.expect("delete");
        assert_eq!(deletion.dividends, 2);

        let remaining = dividends.list_all_dividends().await.expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].company_id, other_id);
    }

    #[tokio::test]
    async fn dividends_are_ordered_by_company_then_year() {
        let db = setup_db().await;
        let repo = db.dividends();
        for (company_id, year) in [(2, 2021), (1, 2023), (1, 2020), (2, 2019)] {
            repo.create_dividend(&request(company_id, year, "1", "1"))
                .await
                .expect("create");
        }

        let all: Vec<(i64, i32)> = repo
            .list_all_dividends()
            .await
            .expect("list")
            .into_iter()
            .map(|d| (d.company_id, d.year))
            .collect();
        assert_eq!(all, vec![(1, 2020), (1, 2023), (2, 2019), (2, 2021)]);

        let years: Vec<i32> = repo
            .list_dividends_by_company(2)
            .await
            .expect("list")
            .into_iter()
            .map(|d| d.year)
            .collect();
        assert_eq!(years, vec![2019, 2021]);
    }

    #[tokio::test]
    async fn empty_listings_are_not_errors() {
        let db = setup_db().await;
        let repo = db.dividends();

        assert!(repo.list_all_dividends().await.expect("list").is_empty());
        assert!(repo.list_dividends_by_company(1).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn decimals_round_trip_without_drift() {
        let db = setup_db().await;
        let repo = db.dividends();

        let id = repo
            .create_dividend(&request(1, 2023, "1.50", "2.25"))
            .await
            .expect("create");
        let stored = repo.list_dividends_by_company(1).await.expect("list");

        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);
        assert_eq!(stored[0].dividend_amount.to_string(), "1.50");
        assert_eq!(stored[0].dividend_yield.to_string(), "2.25");
        assert_eq!(stored[0].year, 2023);
    }

    #[tokio::test]
    async fn update_returns_refreshed_row() {
        let db = setup_db().await;
        let repo = db.dividends();
        let id = repo
            .create_dividend(&request(1, 2023, "1.50", "2.25"))
            .await
            .expect("create");

        let updated = repo
            .update_dividend(id, &request(3, 2024, "0.75", "1.125"))
            .await
            .expect("update");

        assert_eq!(updated.id, id);
        assert_eq!(updated.company_id, 3);
        assert_eq!(updated.year, 2024);
        assert_eq!(updated.dividend_yield.to_string(), "1.125");
    }

    #[tokio::test]
    async fn update_of_missing_dividend_leaves_store_unchanged() {
        let db = setup_db().await;
        let repo = db.dividends();
        repo.create_dividend(&request(1, 2023, "1.50", "2.25"))
            .await
            .expect("create");
        let before = repo.list_all_dividends().await.expect("list");

        let err = repo
            .update_dividend(999, &request(1, 2030, "9", "9"))
            .await
            .expect_err("missing row");

        assert!(matches!(err, DividendStoreError::NotFound(999)));
        assert!(!err.is_storage_failure());
        assert_eq!(repo.list_all_dividends().await.expect("list"), before);
    }

    #[tokio::test]
    async fn update_after_concurrent_delete_reports_not_found() {
        let db = setup_db().await;
        let repo = db.dividends();
        let id = repo
            .create_dividend(&request(1, 2023, "1.50", "2.25"))
            .await
            .expect("create");

        assert!(repo.delete_dividend(id).await.expect("delete"));
        let err = repo
            .update_dividend(id, &request(1, 2023, "2", "2"))
            .await
            .expect_err("row was deleted first");

        assert!(matches!(err, DividendStoreError::NotFound(missing) if missing == id));
        assert!(repo.list_all_dividends().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let db = setup_db().await;
        let repo = db.dividends();
        let id = repo
            .create_dividend(&request(1, 2023, "1", "1"))
            .await
            .expect("create");

        assert!(repo.delete_dividend(id).await.expect("delete"));
        assert!(!repo.delete_dividend(id).await.expect("second delete"));
        assert!(!repo.delete_dividend(999).await.expect("unknown id"));
    }

    #[tokio::test]
    async fn corrupt_decimal_surfaces_as_storage_failure() {
        let db = setup_db().await;
        sqlx::query(
            "INSERT INTO Dividends (CompanyId, Year, DividendAmount, DividendYield) \
             VALUES (1, 2020, 'abc', '1.0')",
        )
        .execute(db.pool())
        .await
        .expect("insert raw row");

        let err = db
            .dividends()
            .list_all_dividends()
            .await
            .expect_err("decode should fail");

        assert!(matches!(err, DividendStoreError::Decode { column: "DividendAmount", .. }));
        assert!(err.is_storage_failure());
    }

    #[tokio::test]
    async fn closed_pool_surfaces_database_errors() {
        let db = setup_db().await;
        db.pool().close().await;

        let company_err = db.companies().list_companies().await.expect_err("closed");
        assert!(matches!(company_err, CompanyStoreError::Database(_)));

        let dividend_err = db.dividends().delete_dividend(1).await.expect_err("closed");
        assert!(matches!(dividend_err, DividendStoreError::Database(_)));
        assert!(dividend_err.is_storage_failure());
    }
}
