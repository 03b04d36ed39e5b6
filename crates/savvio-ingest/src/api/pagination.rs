//! Page-number pagination
//!
//! Pages are requested as `?page=N&limit=P` until a page comes back empty,
//! a page cap is hit, or the server neither flags more data nor fills the
//! page.

use super::client::ApiClient;
use crate::error::{IngestError, Result};
use savvio_common::table::{json_kind, records_from_values};
use savvio_common::Record;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

/// One decoded page, matched in a fixed order
///
/// An object carrying a `data` key is a `Data` page whatever the key holds,
/// then the same for `results`. Null or empty values mean no records.
#[derive(Debug, Clone, PartialEq)]
pub enum PageBody {
    /// Bare JSON array
    List(Vec<Value>),
    /// Object with a `data` key
    Data { records: Vec<Value>, has_more: bool },
    /// Object with a `results` key
    Results { records: Vec<Value>, has_more: bool },
    /// Anything else, treated as one record
    Single(Value),
}

impl PageBody {
    /// Decode a response body
    ///
    /// Fails with `InvalidShape` when `data`/`results` holds something other
    /// than an array, null or an empty value.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => Ok(PageBody::List(items)),
            Value::Object(mut map) => {
                let has_more = more_flag(&map);
                if let Some(data) = map.remove("data") {
                    return Ok(PageBody::Data {
                        records: envelope_records("data", data)?,
                        has_more,
                    });
                }
                if let Some(results) = map.remove("results") {
                    return Ok(PageBody::Results {
                        records: envelope_records("results", results)?,
                        has_more,
                    });
                }
                Ok(PageBody::Single(Value::Object(map)))
            },
            other => Ok(PageBody::Single(other)),
        }
    }

    /// Explicit `has_more`/`hasMore` flag on an object body
    pub fn has_more(&self) -> bool {
        match self {
            PageBody::List(_) => false,
            PageBody::Data { has_more, .. } | PageBody::Results { has_more, .. } => *has_more,
            PageBody::Single(Value::Object(map)) => more_flag(map),
            PageBody::Single(_) => false,
        }
    }

    pub fn into_records(self) -> Result<Vec<Record>> {
        let items = match self {
            PageBody::List(items) => items,
            PageBody::Data { records, .. } | PageBody::Results { records, .. } => records,
            PageBody::Single(value) => vec![value],
        };
        Ok(records_from_values(items)?)
    }
}

fn envelope_records(key: &str, value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        Value::String(s) if s.is_empty() => Ok(Vec::new()),
        other => Err(IngestError::invalid_shape(format!(
            "`{}` must hold an array of records, found {}",
            key,
            json_kind(&other)
        ))),
    }
}

fn more_flag(map: &Map<String, Value>) -> bool {
    ["has_more", "hasMore"]
        .iter()
        .any(|key| map.get(*key).and_then(Value::as_bool).unwrap_or(false))
}

/// State of one paginated fetch
#[derive(Debug)]
pub struct FetchSession {
    pub page: u32,
    pub records: Vec<Record>,
    pub done: bool,
}

impl Default for FetchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchSession {
    pub fn new() -> Self {
        Self {
            page: 1,
            records: Vec::new(),
            done: false,
        }
    }

    /// Fold one page into the session and decide whether another is needed
    ///
    /// A page continues the fetch when it is flagged as having more data OR
    /// when it holds exactly `page_size` records.
    pub fn absorb(&mut self, body: PageBody, page_size: usize, max_pages: Option<u32>) -> Result<()> {
        let has_more = body.has_more();
        let records = body.into_records()?;

        if records.is_empty() {
            info!(page = self.page, "No more records");
            self.done = true;
            return Ok(());
        }

        let fetched = records.len();
        self.records.extend(records);
        info!(page = self.page, fetched, total = self.records.len(), "Fetched page");

        if max_pages.is_some_and(|max| self.page >= max) {
            info!(max_pages = ?max_pages, "Reached maximum pages limit");
            self.done = true;
        } else if !(has_more || fetched == page_size) {
            debug!(page = self.page, "No more pages available");
            self.done = true;
        } else {
            self.page += 1;
        }
        Ok(())
    }
}

impl ApiClient {
    /// Fetch every page of `endpoint` and concatenate the records in order
    ///
    /// `params` are sent with every page alongside the page and limit
    /// parameters. Each page gets its own retry budget, and the configured
    /// page delay is awaited between pages.
    pub async fn fetch_with_pagination(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        page_size: usize,
        max_pages: Option<u32>,
    ) -> Result<Vec<Record>> {
        info!(endpoint, page_size, "Fetching paginated data");
        let mut session = FetchSession::new();

        loop {
            let mut query: Vec<(String, String)> = params
                .iter()
                .filter(|(k, _)| *k != self.pagination.page_param && *k != self.pagination.limit_param)
                .cloned()
                .collect();
            query.push((self.pagination.page_param.clone(), session.page.to_string()));
            query.push((self.pagination.limit_param.clone(), page_size.to_string()));

            let page = session.page;
            let outcome = match self.get(endpoint, Some(&query)).await {
                Ok(body) => PageBody::from_value(body)
                    .and_then(|body| session.absorb(body, page_size, max_pages)),
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                error!(endpoint, page, error = %e, "Failed to fetch page {}", page);
                return Err(match e {
                    IngestError::InvalidShape(msg) => {
                        IngestError::InvalidShape(format!("{} page {}: {}", endpoint, page, msg))
                    },
                    other => other,
                });
            }

            if session.done {
                break;
            }
            tokio::time::sleep(self.pagination.page_delay).await;
        }

        info!(endpoint, total = session.records.len(), "Total records fetched");
        Ok(session.records)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_priority() {
        assert!(matches!(PageBody::from_value(json!([{"id": 1}])).unwrap(), PageBody::List(_)));
        assert!(matches!(
            PageBody::from_value(json!({"data": [], "results": [{"id": 1}]})).unwrap(),
            PageBody::Data { .. }
        ));
        assert!(matches!(
            PageBody::from_value(json!({"results": [{"id": 1}], "hasMore": true})).unwrap(),
            PageBody::Results { has_more: true, .. }
        ));
        assert!(matches!(PageBody::from_value(json!({"id": 7})).unwrap(), PageBody::Single(_)));
    }

    #[test]
    fn test_envelope_key_wins_whatever_it_holds() {
        let body = PageBody::from_value(json!({"data": null, "has_more": false})).unwrap();
        assert_eq!(body, PageBody::Data { records: vec![], has_more: false });

        let body = PageBody::from_value(json!({"results": {}, "data_version": 2})).unwrap();
        assert!(body.into_records().unwrap().is_empty());

        let err = PageBody::from_value(json!({"data": "x", "results": []})).unwrap_err();
        assert!(matches!(err, IngestError::InvalidShape(ref msg) if msg.contains("`data`")));

        let err = PageBody::from_value(json!({"results": {"id": 1}})).unwrap_err();
        assert!(matches!(err, IngestError::InvalidShape(_)));
    }

    #[test]
    fn test_single_body_is_one_record() {
        let records = PageBody::from_value(json!({"id": 7})).unwrap().into_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], json!(7));
    }

    #[test]
    fn test_non_object_records_are_rejected() {
        let err = PageBody::from_value(json!([1, 2])).unwrap().into_records().unwrap_err();
        assert!(matches!(err, IngestError::InvalidShape(_)));

        let err = PageBody::from_value(json!("text")).unwrap().into_records().unwrap_err();
        assert!(matches!(err, IngestError::InvalidShape(_)));
    }

    #[test]
    fn test_full_page_continues_without_flag() {
        let mut session = FetchSession::new();
        session
            .absorb(PageBody::from_value(json!([{"id": 1}, {"id": 2}])).unwrap(), 2, None)
            .unwrap();
        assert!(!session.done);
        assert_eq!(session.page, 2);

        session.absorb(PageBody::from_value(json!([{"id": 3}])).unwrap(), 2, None).unwrap();
        assert!(session.done);
        assert_eq!(session.records.len(), 3);
    }

    #[test]
    fn test_flag_continues_short_page() {
        let mut session = FetchSession::new();
        session
            .absorb(PageBody::from_value(json!({"data": [{"id": 1}], "has_more": true})).unwrap(), 10, None)
            .unwrap();
        assert!(!session.done);
    }

    #[test]
    fn test_max_pages_stops_session() {
        let mut session = FetchSession::new();
        session
            .absorb(PageBody::from_value(json!([{"id": 1}, {"id": 2}])).unwrap(), 2, Some(1))
            .unwrap();
        assert!(session.done);
        assert_eq!(session.page, 1);
    }

    #[test]
    fn test_empty_page_stops_session() {
        let mut session = FetchSession::new();
        session.absorb(PageBody::from_value(json!({"data": []})).unwrap(), 2, None).unwrap();
        assert!(session.done);
        assert!(session.records.is_empty());
    }
}
