//! Remote data client
//!
//! Adds the session's bearer token to every request and turns response
//! bodies into records. Every list endpoint takes `page` and `limit`; bodies
//! may be `{data, meta}` or a bare array.

use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;

use crate::api::error::{ApiError, Result};
use crate::api::models::{ListResponse, LookupOption};
use crate::api::transport::{ApiRequest, HttpTransport, Method, Transport};
use crate::core::config::Config;
use crate::core::entity::{EntityConfig, EntityKind};
use crate::core::pagination::PageMeta;
use crate::core::record::RawRecord;

/// Parameters of one list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: usize,
    pub limit: usize,
    /// Forwarded as `search` when searching server-side
    pub search: Option<String>,
}

impl ListQuery {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page,
            limit,
            search: None,
        }
    }

    pub fn with_search(mut self, term: &str) -> Self {
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self
    }
}

/// Records of one list response
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub records: Vec<RawRecord>,
    /// `None` when the endpoint returned every record as a bare array
    pub meta: Option<PageMeta>,
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("signed_in", &self.token.is_some())
            .finish()
    }
}

fn records_from(values: Vec<Value>, config: &EntityConfig) -> Vec<RawRecord> {
    values
        .into_iter()
        .filter_map(|value| {
            let record = RawRecord::from_value(value);
            if record.is_none() {
                tracing::warn!(entity = config.name, "skipping non-object list item");
            }
            record
        })
        .collect()
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            token: None,
        }
    }

    /// Client over HTTP using the configured base URL and timeout
    pub fn http(config: &Config) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    pub fn with_token(mut self, token: Option<&str>) -> Self {
        self.token = token.map(str::to_string);
        self
    }

    async fn call(&self, request: ApiRequest) -> Result<Value> {
        let method = request.method;
        let path = request.path.clone();
        let response = self
            .transport
            .send(request.bearer(self.token.as_deref()))
            .await?;
        if response.is_success() {
            Ok(response.body)
        } else {
            tracing::debug!(%method, %path, status = response.status, "request rejected");
            Err(ApiError::from_response(response.status, &response.body))
        }
    }

    /// Fetch one page of `config`'s collection
    pub async fn list_page(&self, config: &EntityConfig, query: &ListQuery) -> Result<FetchedPage> {
        let mut request = ApiRequest::new(Method::Get, config.endpoint)
            .query("page", query.page)
            .query("limit", query.limit);
        if let Some(term) = &query.search {
            request = request.query("search", term);
        }

        let body = self.call(request).await?;
        let parsed: ListResponse = serde_json::from_value(body)
            .map_err(|e| ApiError::Decode(format!("{} list: {}", config.name, e)))?;
        let (data, meta) = parsed.into_parts();
        Ok(FetchedPage {
            records: records_from(data, config),
            meta,
        })
    }

    /// Fetch a single record by id
    pub async fn get_one(&self, config: &EntityConfig, id: &str) -> Result<RawRecord> {
        let body = self
            .call(ApiRequest::new(
                Method::Get,
                format!("{}/{}", config.endpoint, id),
            ))
            .await?;
        // Some endpoints wrap the record as `{data: {...}}`
        let value = match body {
            Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
                map.remove("data").unwrap_or_default()
            }
            other => other,
        };
        RawRecord::from_value(value)
            .ok_or_else(|| ApiError::Decode(format!("{} {} is not an object", config.name, id)))
    }

    /// POST a new record; returns the server's response body
    pub async fn create(&self, config: &EntityConfig, body: &Value) -> Result<Value> {
        self.call(ApiRequest::new(Method::Post, config.endpoint).json(body.clone()))
            .await
    }

    /// PUT changes to an existing record
    pub async fn update(&self, config: &EntityConfig, id: &str, body: &Value) -> Result<Value> {
        self.call(
            ApiRequest::new(Method::Put, format!("{}/{}", config.endpoint, id)).json(body.clone()),
        )
        .await
    }

    /// Options for a select input filled from `kind`'s records
    pub async fn lookup(&self, kind: EntityKind, limit: usize) -> Result<Vec<LookupOption>> {
        let config = kind.config();
        let page = self.list_page(config, &ListQuery::new(1, limit)).await?;
        if let Some(missing) = omitted(page.meta.as_ref(), page.records.len()) {
            tracing::warn!(
                entity = config.name,
                limit,
                missing,
                "lookup truncated; raise lookup_limit to see every option"
            );
        }
        Ok(page
            .records
            .iter()
            .filter_map(|record| LookupOption::from_record(config, record))
            .collect())
    }

    /// Fetch several lookups in parallel; one failure does not affect the others
    pub async fn lookup_all(
        &self,
        kinds: &[EntityKind],
        limit: usize,
    ) -> Vec<(EntityKind, Result<Vec<LookupOption>>)> {
        let fetches = kinds.iter().map(|kind| async move {
            let result = self.lookup(*kind, limit).await;
            if let Err(e) = &result {
                tracing::warn!(entity = kind.config().name, error = %e, "lookup failed");
            }
            (*kind, result)
        });
        join_all(fetches).await
    }
}

/// Records left out of a first page that did not hold the whole collection
fn omitted(meta: Option<&PageMeta>, returned: usize) -> Option<usize> {
    let meta = meta?;
    (meta.total_pages > 1).then(|| meta.total_items.saturating_sub(returned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::ApiResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers by path and records every request
    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<ApiRequest>>,
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
            let path = request.path.clone();
            self.requests.lock().unwrap().push(request);
            Ok(match path.as_str() {
                "/department" => ApiResponse::ok(json!({
                    "data": [{"id": 1, "dptname": "A"}],
                    "meta": {"totalItems": 1, "totalPages": 1}
                })),
                "/color" => ApiResponse::ok(json!([{"id": 3, "colorname": "Red"}, 7])),
                "/department/1" => ApiResponse::ok(json!({"data": {"id": 1, "dptname": "A"}})),
                "/instrument" => ApiResponse::ok(json!({
                    "data": [{"id": 4, "instrumentname": "Analyser"}],
                    "meta": {"totalItems": 3, "totalPages": 3}
                })),
                _ => ApiResponse::new(500, json!({"message": "boom"})),
            })
        }
    }

    fn client() -> (Arc<Recorder>, ApiClient) {
        let recorder = Arc::new(Recorder::default());
        let client = ApiClient::new(recorder.clone()).with_token(Some("tok"));
        (recorder, client)
    }

    #[tokio::test]
    async fn test_list_page_sends_paging_and_token() {
        let (recorder, client) = client();
        let page = client
            .list_page(
                EntityKind::Department.config(),
                &ListQuery::new(2, 20).with_search("  haem "),
            )
            .await
            .unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.meta.map(|m| m.total_pages), Some(1));

        let sent = recorder.requests.lock().unwrap();
        assert_eq!(sent[0].method, Method::Get);
        assert_eq!(sent[0].param("page"), Some("2"));
        assert_eq!(sent[0].param("limit"), Some("20"));
        assert_eq!(sent[0].param("search"), Some("haem"));
        assert_eq!(sent[0].bearer.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_bare_array_has_no_meta() {
        let (_, client) = client();
        let page = client
            .list_page(EntityKind::Color.config(), &ListQuery::new(1, 10))
            .await
            .unwrap();
        assert!(page.meta.is_none());
        assert_eq!(page.records.len(), 1);
    }

    #[tokio::test]
    async fn test_get_one_unwraps_data() {
        let (_, client) = client();
        let record = client
            .get_one(EntityKind::Department.config(), "1")
            .await
            .unwrap();
        assert_eq!(record.id().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_lookup_all_isolates_failures() {
        let (_, client) = client();
        let results = client
            .lookup_all(&[EntityKind::Department, EntityKind::Role, EntityKind::Color], 500)
            .await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].1.as_ref().unwrap()[0].label, "A");
        assert_eq!(results[1].0, EntityKind::Role);
        assert_eq!(
            results[1].1.as_ref().unwrap_err().user_message("Failed"),
            "boom"
        );
        assert_eq!(results[2].1.as_ref().unwrap()[0].label, "Red");
    }

    #[tokio::test]
    async fn test_lookup_beyond_limit_keeps_first_page() {
        let (recorder, client) = client();
        let options = client.lookup(EntityKind::Instrument, 1).await.unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].label, "Analyser");
        assert_eq!(recorder.requests.lock().unwrap()[0].param("limit"), Some("1"));
    }

    #[test]
    fn test_omitted_counts_records_past_first_page() {
        let meta = PageMeta {
            total_items: 3,
            total_pages: 3,
        };
        assert_eq!(omitted(Some(&meta), 1), Some(2));

        let whole = PageMeta {
            total_items: 1,
            total_pages: 1,
        };
        assert_eq!(omitted(Some(&whole), 1), None);
        assert_eq!(omitted(None, 7), None);
    }
}
