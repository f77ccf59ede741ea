//! Backend-as-a-Service access layer
//!
//! All persistence, stored procedures and edge functions live in Supabase.
//! Services talk to it through the [`Baas`] trait so the same code runs
//! against the REST client in production and the in-memory backend in tests.

pub mod memory;
mod rest;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryBaas;
pub use rest::SupabaseClient;

/// Postgres error code for unique constraint violations.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Errors returned by the backend
#[derive(Error, Debug, Clone)]
pub enum BaasError {
    #[error("Backend request failed: {0}")]
    Transport(String),

    #[error("Backend returned {status}: {message}")]
    Postgrest {
        status: u16,
        code: Option<String>,
        message: String,
        details: Option<String>,
    },

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Remote procedure {name} failed: {message}")]
    Rpc { name: String, message: String },

    #[error("Function {name} returned {status}: {body}")]
    Function {
        name: String,
        status: u16,
        body: String,
    },

    #[error("Access token rejected")]
    Unauthorized,

    #[error("Failed to decode backend response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BaasError {
    fn from(err: reqwest::Error) -> Self {
        BaasError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for BaasError {
    fn from(err: serde_json::Error) -> Self {
        BaasError::Decode(err.to_string())
    }
}

/// Identity resolved from an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Sort direction for a [`Query`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// A table read or mutation target: `table?col=eq.value&order=...&limit=...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<(String, String)>,
    pub order: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Equality filter
    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((column.into(), value.to_string()));
        self
    }

    pub fn order(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some((column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render as PostgREST query parameters
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        for (column, value) in &self.filters {
            params.push((column.clone(), format!("eq.{}", value)));
        }
        if let Some((column, direction)) = &self.order {
            let dir = match direction {
                Direction::Asc => "asc",
                Direction::Desc => "desc",
            };
            params.push(("order".to_string(), format!("{}.{}", column, dir)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

/// Operations this server performs against the hosted backend
#[async_trait]
pub trait Baas: Send + Sync {
    /// Read rows matching the query
    async fn select(&self, query: &Query) -> Result<Vec<Value>, BaasError>;

    /// Insert one row and return it as stored
    async fn insert(&self, table: &str, row: Value) -> Result<Value, BaasError>;

    /// Patch every row matching the query and return the updated rows
    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, BaasError>;

    /// Delete every row matching the query and return how many were removed
    async fn delete(&self, query: &Query) -> Result<usize, BaasError>;

    /// Invoke a stored procedure by name
    async fn rpc(&self, name: &str, params: Value) -> Result<Value, BaasError>;

    /// Invoke an edge function by name
    async fn invoke_function(&self, name: &str, body: Value) -> Result<Value, BaasError>;

    /// Resolve the user behind an access token
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BaasError>;
}

/// Decode the first row of a result set
pub fn first_row<T>(rows: Vec<Value>) -> Result<Option<T>, BaasError>
where
    T: serde::de::DeserializeOwned,
{
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

/// Decode every row of a result set
pub fn decode_rows<T>(rows: Vec<Value>) -> Result<Vec<T>, BaasError>
where
    T: serde::de::DeserializeOwned,
{
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(BaasError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params() {
        let query = Query::table("missions")
            .eq("is_active", true)
            .eq("advertiser_id", "adv-1")
            .order("created_at", Direction::Desc)
            .limit(20);

        assert_eq!(
            query.to_params(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("is_active".to_string(), "eq.true".to_string()),
                ("advertiser_id".to_string(), "eq.adv-1".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "20".to_string()),
            ]
        );
    }

    #[test]
    fn test_first_row_empty() {
        let row: Option<AuthUser> = first_row(vec![]).unwrap();
        assert!(row.is_none());
    }
}
