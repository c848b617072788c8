// Store HTTP client
//
// Wraps `reqwest::Client` with PostgREST URL construction, row decoding,
// and error-body parsing. Table-specific queries live in sibling modules
// as inherent methods so this file stays focused on transport mechanics.

use serde::de::DeserializeOwned;
use secrecy::SecretString;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::PostgrestError;
use crate::transport::{TransportConfig, api_key_headers};

/// Path prefix PostgREST is mounted under on hosted stores.
const REST_PREFIX: &str = "rest/v1";

/// Raw HTTP client for the PostgREST store.
///
/// Every query is a `GET` returning a JSON array of rows. Non-2xx answers
/// are decoded from PostgREST's `{ code, message, details, hint }` body.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: Url,
}

impl StoreClient {
    /// Create a client that authenticates every request with `api_key`.
    ///
    /// The `base_url` is the project root (e.g. `https://abc.supabase.co`);
    /// the REST prefix is appended per request.
    pub fn new(
        base_url: Url,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let headers = api_key_headers(api_key)?;
        let http = transport.build_client_with_headers(headers)?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The store base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build the URL for a table: `{base}/rest/v1/{table}`.
    pub(crate) fn table_url(&self, table: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{REST_PREFIX}/{table}",
            self.base_url.as_str().trim_end_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// `GET` a table with PostgREST query parameters and decode the rows.
    pub(crate) async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, Error> {
        let url = self.table_url(table)?;
        debug!(%url, ?query, "GET");

        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_rows(resp).await
    }

    /// Decode a row array, or turn a non-2xx answer into `Error::Api`.
    async fn parse_rows<T: DeserializeOwned>(resp: reqwest::Response) -> Result<Vec<T>, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            let (message, code) = match serde_json::from_str::<PostgrestError>(&body) {
                Ok(err) => (err.message, err.code),
                Err(_) if body.is_empty() => (status.to_string(), None),
                Err(_) => (body, None),
            };
            return Err(Error::Api {
                message,
                code,
                status: status.as_u16(),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn table_url_tolerates_trailing_slash() {
        let client = StoreClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://store.example.com/").unwrap(),
        );
        assert_eq!(
            client.table_url("machines").unwrap().as_str(),
            "https://store.example.com/rest/v1/machines"
        );
    }

    #[test]
    fn table_url_keeps_base_path() {
        let client = StoreClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://localhost:8000/store").unwrap(),
        );
        assert_eq!(
            client.table_url("production_history").unwrap().as_str(),
            "http://localhost:8000/store/rest/v1/production_history"
        );
    }
}
