//! Supabase PostgREST remote store

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    InterruptRow, RemoteSnapshot, RemoteStore, SessionRow, INTERRUPTS_TABLE, NATURAL_KEY,
    SESSIONS_TABLE,
};
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::sync::SyncCounts;
use crate::util::{compact_text, is_http_url};

const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=minimal";

#[derive(Clone)]
pub struct PostgrestRemoteStore {
    rest_url: String,
    anon_key: String,
    client: Client,
}

impl std::fmt::Debug for PostgrestRemoteStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("PostgrestRemoteStore")
            .field("rest_url", &self.rest_url)
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

impl PostgrestRemoteStore {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>) -> Result<Self> {
        let rest_url = normalize_rest_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(Error::InvalidInput(
                "Supabase anon key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            rest_url,
            anon_key,
            client: Client::builder().build()?,
        })
    }

    fn authorized(&self, request: RequestBuilder, identity: &Identity) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&identity.access_token)
            .header("Accept", "application/json")
    }

    async fn fetch_table<T: DeserializeOwned>(
        &self,
        identity: &Identity,
        table: &str,
        order: &str,
    ) -> Result<Vec<T>> {
        let user_filter = format!("eq.{}", identity.user_id);
        let request = self.authorized(
            self.client
                .get(format!("{}/{table}", self.rest_url))
                .query(&[("select", "*"), ("user_id", user_filter.as_str()), ("order", order)]),
            identity,
        );

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!(
                "reading {table} failed: {}",
                parse_api_error(status, &body)
            )));
        }

        let rows = response.json::<Vec<Value>>().await?;
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|error| Error::Remote(format!("unrecognized {table} row: {error}")))
            })
            .collect()
    }

    async fn upsert_table<T: Serialize + Sync>(
        &self,
        identity: &Identity,
        table: &str,
        rows: &[T],
    ) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let request = self.authorized(
            self.client
                .post(format!("{}/{table}", self.rest_url))
                .query(&[("on_conflict", NATURAL_KEY)])
                .header("Prefer", UPSERT_PREFER)
                .json(rows),
            identity,
        );

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!(
                "writing {table} failed: {}",
                parse_api_error(status, &body)
            )));
        }

        Ok(rows.len())
    }
}

#[async_trait]
impl RemoteStore for PostgrestRemoteStore {
    async fn fetch_all(&self, identity: &Identity) -> Result<RemoteSnapshot> {
        let (sessions, interrupts) = tokio::join!(
            self.fetch_table(identity, SESSIONS_TABLE, "ended_at.desc"),
            self.fetch_table(identity, INTERRUPTS_TABLE, "at.desc"),
        );

        Ok(RemoteSnapshot {
            sessions: sessions?,
            interrupts: interrupts?,
        })
    }

    async fn upsert(
        &self,
        identity: &Identity,
        sessions: &[SessionRow],
        interrupts: &[InterruptRow],
    ) -> Result<SyncCounts> {
        let (sessions, interrupts) = tokio::join!(
            self.upsert_table(identity, SESSIONS_TABLE, sessions),
            self.upsert_table(identity, INTERRUPTS_TABLE, interrupts),
        );

        Ok(SyncCounts {
            sessions: sessions?,
            interrupts: interrupts?,
        })
    }
}

/// Accepts a project URL or its `/rest/v1` endpoint.
pub fn normalize_rest_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "Supabase URL must not be empty".to_string(),
        ));
    }
    if !is_http_url(trimmed) {
        return Err(Error::InvalidInput(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }
    if trimmed.ends_with("/rest/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/rest/v1"))
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<PostgrestErrorBody>(body) {
        if let Some(message) = payload.message {
            let detail = payload.details.or(payload.hint);
            return match detail {
                Some(detail) if !detail.trim().is_empty() => {
                    format!("{} - {} ({})", message.trim(), detail.trim(), status.as_u16())
                }
                _ => format!("{} ({})", message.trim(), status.as_u16()),
            };
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(trimmed), status.as_u16())
    }
}
