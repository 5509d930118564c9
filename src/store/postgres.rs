//! Postgres-backed worklist and profile table.

use super::{RecordSink, WorkSource};
use crate::error::{Result, ScrapeError};
use crate::models::{FinalRecord, WorkItem};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::{debug, error, info, instrument};

/// Connection parameters; unset values fall back to libpq `PG*` defaults.
#[derive(Clone, Default)]
pub struct DbSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub max_connections: u32,
}

impl std::fmt::Debug for DbSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl DbSettings {
    fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new();
        if let Some(host) = &self.host {
            options = options.host(host);
        }
        if let Some(port) = self.port {
            options = options.port(port);
        }
        if let Some(user) = &self.user {
            options = options.username(user);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        if let Some(database) = &self.database {
            options = options.database(database);
        }
        options
    }
}

/// Schema-qualified names of the worklist view and destination table.
#[derive(Debug, Clone)]
pub struct TableNames {
    pub schema: String,
    pub worklist_view: String,
    pub profile_table: String,
}

impl TableNames {
    /// Reject identifiers that are not plain `[A-Za-z0-9_]+`, since they are
    /// interpolated into SQL text.
    pub fn validated(self) -> Result<Self> {
        for (what, ident) in [
            ("schema", &self.schema),
            ("worklist view", &self.worklist_view),
            ("profile table", &self.profile_table),
        ] {
            let ok = !ident.is_empty()
                && ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !ok {
                return Err(ScrapeError::Config(format!(
                    "invalid {what} identifier {ident:?}"
                )));
            }
        }
        Ok(self)
    }

    pub fn worklist_sql(&self) -> String {
        format!(
            "select url, search_id::text as search_id from {}.{}",
            self.schema, self.worklist_view
        )
    }

    pub fn insert_sql(&self) -> String {
        format!(
            "insert into {}.{}(search_id, url, show_name, host_name, show_description, links, \
             reviews, rate, category, episode_description) \
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            self.schema, self.profile_table
        )
    }
}

/// Pool plus the SQL derived from [`TableNames`].
#[derive(Debug)]
pub struct PgStore {
    pool: PgPool,
    worklist_sql: String,
    insert_sql: String,
}

impl PgStore {
    /// Open the pool. Failing here is fatal for the run.
    #[instrument(level = "info", skip_all, fields(host = ?settings.host, database = ?settings.database))]
    pub async fn connect(settings: &DbSettings, tables: TableNames) -> Result<Self> {
        let tables = tables.validated()?;
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .connect_with(settings.connect_options())
            .await
            .map_err(|e| ScrapeError::Database(format!("failed to open pool: {e}")))?;
        info!("Database pool opened");

        Ok(Self {
            pool,
            worklist_sql: tables.worklist_sql(),
            insert_sql: tables.insert_sql(),
        })
    }

    /// Close the pool; called once after every item has been attempted.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

impl WorkSource for PgStore {
    #[instrument(level = "info", skip_all)]
    async fn load_work_items(&self) -> Result<Vec<WorkItem>> {
        let rows = sqlx::query(&self.worklist_sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ScrapeError::Database(format!("failed to load worklist: {e}")))?;

        let total = rows.len();
        let items: Vec<WorkItem> = rows
            .iter()
            .filter_map(|row| {
                let url = row.try_get::<Option<String>, _>("url").ok().flatten();
                let search_id = row.try_get::<Option<String>, _>("search_id").ok().flatten();
                WorkItem::from_row(url, search_id)
            })
            .collect();

        debug!(total, kept = items.len(), "Loaded worklist rows");
        Ok(items)
    }
}

impl RecordSink for PgStore {
    #[instrument(level = "info", skip_all, fields(url = %record.url))]
    async fn save(&self, record: &FinalRecord) -> Result<()> {
        let row = record.to_row();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ScrapeError::persistence(&record.url, e))?;

        let inserted = sqlx::query(&self.insert_sql)
            .bind(row.search_id)
            .bind(row.url)
            .bind(row.show_name)
            .bind(row.host_name)
            .bind(row.show_description)
            .bind(row.links)
            .bind(row.reviews)
            .bind(row.rate)
            .bind(row.category)
            .bind(row.episode_description)
            .execute(&mut *tx)
            .await;

        match inserted {
            Ok(_) => tx
                .commit()
                .await
                .map_err(|e| ScrapeError::persistence(&record.url, e)),
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    error!(error = %rollback, "Rollback failed");
                }
                Err(ScrapeError::persistence(&record.url, e))
            }
        }
    }
}
