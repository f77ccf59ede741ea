//! In-process backend for unit and integration tests.
//!
//! Rows are plain JSON objects; equality filters compare the rendered column
//! value. Remote procedures and functions are recorded and answer with
//! whatever result was registered for their name.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::{AuthUser, Baas, BaasError, Direction, Query};

/// A recorded procedure or function invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub name: String,
    pub params: Value,
}

#[derive(Debug, Clone)]
enum CannedResult {
    Ok(Value),
    RpcError(String),
    FunctionError { status: u16, body: String },
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Value>>,
    unique: HashMap<String, Vec<Vec<String>>>,
    users: HashMap<String, AuthUser>,
    results: HashMap<String, CannedResult>,
    rpc_calls: Vec<RecordedCall>,
    function_calls: Vec<RecordedCall>,
    writes: usize,
}

/// In-memory [`Baas`] implementation
#[derive(Default)]
pub struct MemoryBaas {
    state: Mutex<State>,
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn matches(row: &Value, query: &Query) -> bool {
    query.filters.iter().all(|(column, expected)| {
        row.get(column)
            .map(|actual| render(actual) == *expected)
            .unwrap_or(false)
    })
}

impl MemoryBaas {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked mid-call.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Declare a unique constraint over `columns` of `table`
    pub fn with_unique(self, table: &str, columns: &[&str]) -> Self {
        self.lock()
            .unique
            .entry(table.to_string())
            .or_default()
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Insert a row without counting it as a write
    pub fn seed(&self, table: &str, row: Value) {
        self.lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Current contents of a table
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    /// Map an access token to a user
    pub fn register_user(&self, access_token: &str, user_id: &str) {
        self.lock().users.insert(
            access_token.to_string(),
            AuthUser {
                id: user_id.to_string(),
                email: None,
            },
        );
    }

    /// Answer calls to `name` (procedure or function) with `value`
    pub fn respond_with(&self, name: &str, value: Value) {
        self.lock()
            .results
            .insert(name.to_string(), CannedResult::Ok(value));
    }

    /// Make the procedure `name` fail with `message`
    pub fn fail_rpc(&self, name: &str, message: &str) {
        self.lock()
            .results
            .insert(name.to_string(), CannedResult::RpcError(message.to_string()));
    }

    /// Make the function `name` fail with an HTTP status and body
    pub fn fail_function(&self, name: &str, status: u16, body: &str) {
        self.lock().results.insert(
            name.to_string(),
            CannedResult::FunctionError {
                status,
                body: body.to_string(),
            },
        );
    }

    pub fn rpc_calls(&self) -> Vec<RecordedCall> {
        self.lock().rpc_calls.clone()
    }

    pub fn function_calls(&self) -> Vec<RecordedCall> {
        self.lock().function_calls.clone()
    }

    /// Number of inserts, updates and deletes that touched at least one row
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn canned(state: &State, name: &str) -> Option<CannedResult> {
        state.results.get(name).cloned()
    }
}

#[async_trait]
impl Baas for MemoryBaas {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, BaasError> {
        let state = self.lock();
        let mut rows: Vec<Value> = state
            .tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|row| matches(row, query)).cloned().collect())
            .unwrap_or_default();

        if let Some((column, direction)) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = render(a.get(column).unwrap_or(&Value::Null))
                    .cmp(&render(b.get(column).unwrap_or(&Value::Null)));
                match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Value) -> Result<Value, BaasError> {
        let mut state = self.lock();

        if let Some(object) = row.as_object_mut() {
            object
                .entry("id")
                .or_insert_with(|| json!(Uuid::new_v4().to_string()));
            object
                .entry("created_at")
                .or_insert_with(|| json!(Utc::now().to_rfc3339()));
        } else {
            return Err(BaasError::Decode("row must be a JSON object".to_string()));
        }

        let constraints = state.unique.get(table).cloned().unwrap_or_default();
        let existing = state.tables.get(table).cloned().unwrap_or_default();
        for columns in &constraints {
            let clash = existing.iter().any(|other| {
                columns
                    .iter()
                    .all(|c| other.get(c).is_some() && other.get(c) == row.get(c))
            });
            if clash {
                return Err(BaasError::UniqueViolation(format!(
                    "duplicate key value violates unique constraint on {}({})",
                    table,
                    columns.join(", ")
                )));
            }
        }

        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        state.writes += 1;
        Ok(row)
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, BaasError> {
        let mut state = self.lock();
        let patch = patch
            .as_object()
            .cloned()
            .ok_or_else(|| BaasError::Decode("patch must be a JSON object".to_string()))?;

        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(&query.table) {
            for row in rows.iter_mut().filter(|row| matches(row, query)) {
                if let Some(object) = row.as_object_mut() {
                    for (key, value) in &patch {
                        object.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        if !updated.is_empty() {
            state.writes += 1;
        }
        Ok(updated)
    }

    async fn delete(&self, query: &Query) -> Result<usize, BaasError> {
        let mut state = self.lock();
        let removed = match state.tables.get_mut(&query.table) {
            Some(rows) => {
                let before = rows.len();
                rows.retain(|row| !matches(row, query));
                before - rows.len()
            }
            None => 0,
        };
        if removed > 0 {
            state.writes += 1;
        }
        Ok(removed)
    }

    async fn rpc(&self, name: &str, params: Value) -> Result<Value, BaasError> {
        let mut state = self.lock();
        state.rpc_calls.push(RecordedCall {
            name: name.to_string(),
            params,
        });

        match Self::canned(&state, name) {
            Some(CannedResult::Ok(value)) => Ok(value),
            Some(CannedResult::RpcError(message)) => Err(BaasError::Rpc {
                name: name.to_string(),
                message,
            }),
            Some(CannedResult::FunctionError { body, .. }) => Err(BaasError::Rpc {
                name: name.to_string(),
                message: body,
            }),
            None => Ok(Value::Null),
        }
    }

    async fn invoke_function(&self, name: &str, body: Value) -> Result<Value, BaasError> {
        let mut state = self.lock();
        state.function_calls.push(RecordedCall {
            name: name.to_string(),
            params: body,
        });

        match Self::canned(&state, name) {
            Some(CannedResult::Ok(value)) => Ok(value),
            Some(CannedResult::FunctionError { status, body }) => Err(BaasError::Function {
                name: name.to_string(),
                status,
                body,
            }),
            Some(CannedResult::RpcError(message)) => Err(BaasError::Function {
                name: name.to_string(),
                status: 500,
                body: message,
            }),
            None => Ok(json!({ "success": true })),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BaasError> {
        self.lock()
            .users
            .get(access_token)
            .cloned()
            .ok_or(BaasError::Unauthorized)
    }
}
