// src/db.rs
use crate::models::{PortfolioRow, PortfolioUpsert};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info};
use scylla::{frame::response::result::CqlValue, query::Query, Session, SessionBuilder};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type DbResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Portfolio rows keyed by (user, symbol).
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    /// All rows for `user_id`, highest value first.
    async fn find_by_user(&self, user_id: &str) -> DbResult<Vec<PortfolioRow>>;

    /// Creates the row for (user, symbol), or updates balance, value and 24h
    /// change on the existing one.
    async fn upsert(&self, user_id: &str, holding: PortfolioUpsert) -> DbResult<PortfolioRow>;
}

fn by_value_desc(a: &PortfolioRow, b: &PortfolioRow) -> Ordering {
    b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal)
}

fn new_row(user_id: &str, holding: PortfolioUpsert, now: DateTime<Utc>) -> PortfolioRow {
    PortfolioRow {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        symbol: holding.symbol,
        name: holding.name,
        balance: holding.balance,
        value: holding.value,
        change_24h: holding.change_24h,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    rows: RwLock<HashMap<(String, String), PortfolioRow>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PortfolioStore for InMemoryStore {
    async fn find_by_user(&self, user_id: &str) -> DbResult<Vec<PortfolioRow>> {
        let rows = self.rows.read().await;
        let mut found: Vec<PortfolioRow> = rows
            .values()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(by_value_desc);
        Ok(found)
    }

    async fn upsert(&self, user_id: &str, holding: PortfolioUpsert) -> DbResult<PortfolioRow> {
        let now = Utc::now();
        let mut rows = self.rows.write().await;
        let key = (user_id.to_string(), holding.symbol.clone());
        let row = match rows.get_mut(&key) {
            Some(row) => {
                row.balance = holding.balance;
                row.value = holding.value;
                row.change_24h = holding.change_24h;
                row.updated_at = now;
                row.clone()
            }
            None => {
                let row = new_row(user_id, holding, now);
                rows.insert(key, row.clone());
                row
            }
        };
        Ok(row)
    }
}

pub struct ScyllaStore {
    session: Session,
}

const SELECT_COLUMNS: &str =
    "id, user_id, symbol, name, balance, current_value, change24h, created_at, updated_at";

impl ScyllaStore {
    pub async fn connect(node: &str) -> DbResult<Self> {
        let session = SessionBuilder::new().known_node(node).build().await?;

        session.query("CREATE KEYSPACE IF NOT EXISTS m4capital WITH REPLICATION = {'class': 'SimpleStrategy', 'replication_factor': 1}", &[]).await?;
        session.query("CREATE TABLE IF NOT EXISTS m4capital.portfolios (user_id TEXT, symbol TEXT, id TEXT, name TEXT, balance DOUBLE, current_value DOUBLE, change24h DOUBLE, created_at TIMESTAMP, updated_at TIMESTAMP, PRIMARY KEY (user_id, symbol))", &[]).await?;

        info!("Successfully connected to ScyllaDB at {}.", node);
        Ok(Self { session })
    }

    async fn find_one(&self, user_id: &str, symbol: &str) -> DbResult<Option<PortfolioRow>> {
        let query = Query::new(format!(
            "SELECT {} FROM m4capital.portfolios WHERE user_id = ? AND symbol = ?",
            SELECT_COLUMNS
        ));
        let result = self.session.query(query, (user_id, symbol)).await?;
        Ok(result
            .rows
            .unwrap_or_default()
            .into_iter()
            .find_map(|row| row_to_portfolio(&row.columns)))
    }
}

fn text(column: &Option<CqlValue>) -> Option<String> {
    column.as_ref().and_then(|v| v.as_text()).map(|s| s.to_string())
}

fn double(column: &Option<CqlValue>) -> Option<f64> {
    column.as_ref().and_then(|v| v.as_double())
}

fn timestamp(column: &Option<CqlValue>) -> Option<DateTime<Utc>> {
    match column.as_ref() {
        Some(CqlValue::Timestamp(ts)) => DateTime::<Utc>::from_timestamp_millis(ts.num_milliseconds()),
        _ => None,
    }
}

fn row_to_portfolio(columns: &[Option<CqlValue>]) -> Option<PortfolioRow> {
    if columns.len() < 9 {
        error!("Portfolio row has {} columns, expected 9", columns.len());
        return None;
    }
    let row = PortfolioRow {
        id: text(&columns[0])?,
        user_id: text(&columns[1])?,
        symbol: text(&columns[2])?,
        name: text(&columns[3])?,
        balance: double(&columns[4])?,
        value: double(&columns[5])?,
        change_24h: double(&columns[6])?,
        created_at: timestamp(&columns[7])?,
        updated_at: timestamp(&columns[8])?,
    };
    Some(row)
}

/// Reads the `[applied]` flag a conditional write returns as its first column.
fn lwt_applied(columns: &[Option<CqlValue>]) -> bool {
    matches!(columns.first(), Some(Some(CqlValue::Boolean(true))))
}

#[async_trait]
impl PortfolioStore for ScyllaStore {
    async fn find_by_user(&self, user_id: &str) -> DbResult<Vec<PortfolioRow>> {
        let query = Query::new(format!(
            "SELECT {} FROM m4capital.portfolios WHERE user_id = ?",
            SELECT_COLUMNS
        ));
        let result = self.session.query(query, (user_id,)).await?;
        let mut rows: Vec<PortfolioRow> = result
            .rows
            .unwrap_or_default()
            .into_iter()
            .filter_map(|row| {
                let parsed = row_to_portfolio(&row.columns);
                if parsed.is_none() {
                    error!("Skipping malformed portfolio row for user {}", user_id);
                }
                parsed
            })
            .collect();
        // Clustering is by symbol, so value order is applied here.
        rows.sort_by(by_value_desc);
        info!("Fetched {} portfolio rows for user: {}", rows.len(), user_id);
        Ok(rows)
    }

    async fn upsert(&self, user_id: &str, holding: PortfolioUpsert) -> DbResult<PortfolioRow> {
        let now = Utc::now();
        let now_millis = now.timestamp_millis();

        // The conditional insert decides the create/update race on the server.
        let row = new_row(user_id, holding, now);
        let insert = Query::new("INSERT INTO m4capital.portfolios (user_id, symbol, id, name, balance, current_value, change24h, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) IF NOT EXISTS");
        let result = self
            .session
            .query(
                insert,
                (
                    row.user_id.as_str(),
                    row.symbol.as_str(),
                    row.id.as_str(),
                    row.name.as_str(),
                    row.balance,
                    row.value,
                    row.change_24h,
                    now_millis,
                    now_millis,
                ),
            )
            .await?;
        let inserted = result
            .rows
            .as_ref()
            .and_then(|rows| rows.first())
            .map(|first| lwt_applied(&first.columns))
            .unwrap_or(false);
        if inserted {
            return Ok(row);
        }

        let update = Query::new("UPDATE m4capital.portfolios SET balance = ?, current_value = ?, change24h = ?, updated_at = ? WHERE user_id = ? AND symbol = ?");
        self.session
            .query(
                update,
                (
                    row.balance,
                    row.value,
                    row.change_24h,
                    now_millis,
                    user_id,
                    row.symbol.as_str(),
                ),
            )
            .await?;
        match self.find_one(user_id, &row.symbol).await? {
            Some(stored) => Ok(stored),
            None => Err(format!(
                "Portfolio row {} for user {} missing after update",
                row.symbol, user_id
            )
            .into()),
        }
    }
}

/// Writes the demo holdings for `user_id`, leaving existing rows alone.
pub async fn seed_portfolio(
    store: &dyn PortfolioStore,
    user_id: &str,
    holdings: Vec<PortfolioUpsert>,
) -> DbResult<usize> {
    let existing = store.find_by_user(user_id).await?;
    let mut created = 0;
    for holding in holdings {
        if existing.iter().any(|row| row.symbol == holding.symbol) {
            continue;
        }
        store.upsert(user_id, holding).await?;
        created += 1;
    }
    info!("Seeded {} portfolio rows for user {}", created, user_id);
    Ok(created)
}
