//! Supabase REST client (PostgREST tables, RPC, edge functions, auth)

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::{AuthUser, Baas, BaasError, Query, UNIQUE_VIOLATION};
use crate::config::Config;

/// PostgREST error body
#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// Client for a Supabase project, authenticated with the service role key
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    rest_url: String,
    auth_url: String,
    functions_url: String,
    service_role_key: String,
}

impl SupabaseClient {
    pub fn new(config: &Config) -> Result<Self, BaasError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", config.supabase_url),
            auth_url: format!("{}/auth/v1", config.supabase_url),
            functions_url: config.functions_base_url.clone(),
            service_role_key: config.supabase_service_role_key.clone(),
        })
    }

    fn with_service_role(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    /// Turn a non-2xx PostgREST response into a [`BaasError`]
    async fn postgrest_error(response: Response) -> BaasError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<PostgrestError>(&body) {
            Ok(err) if err.code.as_deref() == Some(UNIQUE_VIOLATION) => {
                BaasError::UniqueViolation(err.message.unwrap_or(body))
            }
            Ok(err) => BaasError::Postgrest {
                status,
                code: err.code,
                message: err.message.unwrap_or_else(|| body.clone()),
                details: err.details.or(err.hint),
            },
            Err(_) => BaasError::Postgrest {
                status,
                code: None,
                message: body,
                details: None,
            },
        }
    }

    /// Read a JSON body, treating an empty body as `null`
    async fn json_or_null(response: Response) -> Result<Value, BaasError> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn rows(response: Response) -> Result<Vec<Value>, BaasError> {
        if !response.status().is_success() {
            return Err(Self::postgrest_error(response).await);
        }
        match Self::json_or_null(response).await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![other]),
        }
    }
}

#[async_trait]
impl Baas for SupabaseClient {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, BaasError> {
        let response = self
            .with_service_role(self.http.get(self.table_url(&query.table)))
            .query(&query.to_params())
            .send()
            .await?;

        Self::rows(response).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, BaasError> {
        let response = self
            .with_service_role(self.http.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BaasError::Decode(format!("insert into {} returned no row", table)))
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, BaasError> {
        let params: Vec<(String, String)> = query
            .to_params()
            .into_iter()
            .filter(|(key, _)| key != "order" && key != "limit")
            .collect();

        let response = self
            .with_service_role(self.http.patch(self.table_url(&query.table)))
            .header("Prefer", "return=representation")
            .query(&params)
            .json(&patch)
            .send()
            .await?;

        Self::rows(response).await
    }

    async fn delete(&self, query: &Query) -> Result<usize, BaasError> {
        let params: Vec<(String, String)> = query
            .to_params()
            .into_iter()
            .filter(|(key, _)| key != "order" && key != "limit")
            .collect();

        let response = self
            .with_service_role(self.http.delete(self.table_url(&query.table)))
            .header("Prefer", "return=representation")
            .query(&params)
            .send()
            .await?;

        Ok(Self::rows(response).await?.len())
    }

    async fn rpc(&self, name: &str, params: Value) -> Result<Value, BaasError> {
        tracing::debug!(rpc = %name, "Invoking remote procedure");

        let response = self
            .with_service_role(self.http.post(format!("{}/rpc/{}", self.rest_url, name)))
            .json(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let message = match Self::postgrest_error(response).await {
                BaasError::Postgrest {
                    message, details, ..
                } => match details {
                    Some(details) => format!("{} ({})", message, details),
                    None => message,
                },
                other => other.to_string(),
            };
            return Err(BaasError::Rpc {
                name: name.to_string(),
                message,
            });
        }

        Self::json_or_null(response).await
    }

    async fn invoke_function(&self, name: &str, body: Value) -> Result<Value, BaasError> {
        tracing::debug!(function = %name, "Invoking edge function");

        let response = self
            .with_service_role(self.http.post(format!("{}/{}", self.functions_url, name)))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BaasError::Function {
                name: name.to_string(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Self::json_or_null(response).await
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BaasError> {
        let response = self
            .http
            .get(format!("{}/user", self.auth_url))
            .header("apikey", &self.service_role_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status().as_u16() {
            200..=299 => Ok(response.json::<AuthUser>().await?),
            401 | 403 => Err(BaasError::Unauthorized),
            _ => Err(Self::postgrest_error(response).await),
        }
    }
}
