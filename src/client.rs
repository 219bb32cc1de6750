//! This module provides a client to a Firestore database, through its REST API
//!
//! [`Client`] is a [`DocumentStore`] over one collection. Values are converted between plain JSON
//! (as tasks are serialized) and the typed values Firestore expects (`{"stringValue": ...}`, `{"integerValue": "42"}`...).

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

use crate::config::ClientSettings;
use crate::document::{Document, Fields};
use crate::error::{Error, Result};
use crate::filter::{Predicate, TaskField};
use crate::traits::DocumentStore;

/// How many documents are requested per page when listing a collection
const PAGE_SIZE: u32 = 300;


#[derive(Debug, Deserialize)]
struct RawDocument {
    /// `projects/{project}/databases/{database}/documents/{collection}/{id}`
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl RawDocument {
    fn decode(self) -> Result<Document> {
        let id = match self.name.rsplit('/').next() {
            Some(id) if id.is_empty() == false => id.to_string(),
            _ => return Err(Error::MalformedDocument(format!("invalid document name {:?}", self.name))),
        };
        Ok(Document::new(id, decode_fields(&self.fields)?))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    document: Option<RawDocument>,
}


/// A Firestore collection, reached over HTTP
#[derive(Debug)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    project_id: String,
    database_id: String,
    collection: String,
    api_key: Option<String>,
    access_token: Option<String>,
}

impl Client {
    /// Create a client for `collection`. This does not start a connection
    pub fn new<S: Into<String>>(settings: &ClientSettings, collection: S) -> Result<Self> {
        let base_url = settings.resolved_base_url()?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            project_id: settings.project_id.clone(),
            database_id: settings.resolved_database_id(),
            collection: collection.into(),
            api_key: settings.api_key.clone(),
            access_token: settings.access_token.clone(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The full resource name of a document, as used in `referenceValue`s
    pub fn document_name(&self, id: &str) -> String {
        format!("projects/{}/databases/{}/documents/{}/{}", self.project_id, self.database_id, self.collection, id)
    }

    fn endpoint(&self, last_segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` made sure the base URL can have path segments
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty()
                .extend(&["v1", "projects", self.project_id.as_str(), "databases", self.database_id.as_str()])
                .extend(last_segments);
        }
        url
    }

    fn collection_url(&self) -> Url {
        self.endpoint(&["documents", self.collection.as_str()])
    }

    fn document_url(&self, id: &str) -> Url {
        self.endpoint(&["documents", self.collection.as_str(), id])
    }

    fn run_query_url(&self) -> Url {
        self.endpoint(&["documents:runQuery"])
    }

    /// Send a request. A 404 is not an error, it gives `None`
    async fn send(&self, request: RequestBuilder) -> Result<Option<Response>> {
        let request = match &self.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        };
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status.is_success() == false {
            return Err(Error::Status(status));
        }
        Ok(Some(response))
    }

    /// Build the `runQuery` body for these predicates
    fn structured_query(&self, predicates: &[Predicate]) -> Value {
        let mut filters: Vec<Value> = predicates.iter()
            .map(|predicate| self.field_filter(predicate))
            .collect();

        let mut query = json!({
            "from": [{ "collectionId": self.collection }],
        });
        match filters.len() {
            0 => (),
            1 => { query["where"] = filters.remove(0); },
            _ => { query["where"] = json!({ "compositeFilter": { "op": "AND", "filters": filters } }); },
        }
        json!({ "structuredQuery": query })
    }

    fn field_filter(&self, predicate: &Predicate) -> Value {
        let op = match predicate {
            Predicate::Equal{ .. } => "EQUAL",
            Predicate::ArrayContains{ .. } => "ARRAY_CONTAINS",
        };
        let (field_path, value) = match (predicate.field(), predicate.value()) {
            // The id is not a field, it is the last part of the document name
            (TaskField::Id, Value::String(id)) => ("__name__", json!({ "referenceValue": self.document_name(id) })),
            (field, value) => (field.as_str(), encode_value(value)),
        };
        json!({
            "fieldFilter": {
                "field": { "fieldPath": field_path },
                "op": op,
                "value": value,
            }
        })
    }
}

/// Firestore accepts a single `ARRAY_CONTAINS` per query, and considers `100.0` equal to `100`.
/// Returns the predicates to send, and the ones that have to be checked on the returned documents.
fn split_predicates(predicates: &[Predicate]) -> (Vec<Predicate>, Vec<Predicate>) {
    let mut sent = Vec::new();
    let mut kept = Vec::new();
    let mut has_containment = false;
    for predicate in predicates {
        match predicate {
            Predicate::ArrayContains{ .. } if has_containment => kept.push(predicate.clone()),
            Predicate::ArrayContains{ .. } => {
                has_containment = true;
                sent.push(predicate.clone());
            },
            Predicate::Equal{ value: Value::Number(n), .. } if n.is_f64() => kept.push(predicate.clone()),
            Predicate::Equal{ .. } => sent.push(predicate.clone()),
        }
    }
    (sent, kept)
}

/// Decode a page of documents, skipping (and logging) the ones this crate can not represent
fn decode_documents<I>(raws: I) -> Vec<Document>
where
    I: IntoIterator<Item = RawDocument>,
{
    raws.into_iter()
        .filter_map(|raw| {
            let name = raw.name.clone();
            match raw.decode() {
                Ok(document) => Some(document),
                Err(err) => {
                    log::warn!("Ignoring document {}: {}", name, err);
                    None
                },
            }
        })
        .collect()
}

#[async_trait]
impl DocumentStore for Client {
    async fn add_document(&self, fields: Fields) -> Result<String> {
        let request = self.http.post(self.collection_url())
            .json(&json!({ "fields": encode_fields(&fields) }));

        match self.send(request).await? {
            None => Err(Error::Status(StatusCode::NOT_FOUND)),
            Some(response) => {
                let raw: RawDocument = response.json().await?;
                Ok(raw.decode()?.id().to_string())
            },
        }
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let request = self.http.get(self.document_url(id));
        match self.send(request).await? {
            None => Ok(None),
            Some(response) => {
                let raw: RawDocument = response.json().await?;
                Ok(Some(raw.decode()?))
            },
        }
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(self.collection_url())
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: ListResponse = match self.send(request).await? {
                None => break,
                Some(response) => response.json().await?,
            };
            documents.extend(decode_documents(page.documents));

            match page.next_page_token {
                Some(token) if token.is_empty() == false => page_token = Some(token),
                _ => break,
            }
        }

        log::debug!("Listed {} documents from {}", documents.len(), self.collection);
        Ok(documents)
    }

    async fn query_documents(&self, predicates: &[Predicate]) -> Result<Vec<Document>> {
        let (sent, kept) = split_predicates(predicates);
        let request = self.http.post(self.run_query_url())
            .json(&self.structured_query(&sent));

        let results: Vec<QueryResult> = match self.send(request).await? {
            None => return Err(Error::Status(StatusCode::NOT_FOUND)),
            Some(response) => response.json().await?,
        };

        let raws = results.into_iter().filter_map(|result| result.document);
        Ok(decode_documents(raws)
            .into_iter()
            .filter(|document| kept.iter().all(|predicate| predicate.matches(document)))
            .collect())
    }

    async fn replace_document(&self, id: &str, fields: Fields) -> Result<bool> {
        let request = self.http.patch(self.document_url(id))
            .query(&[("currentDocument.exists", "true")])
            .json(&json!({ "fields": encode_fields(&fields) }));
        Ok(self.send(request).await?.is_some())
    }

    async fn delete_document(&self, id: &str) -> Result<bool> {
        let request = self.http.delete(self.document_url(id))
            .query(&[("currentDocument.exists", "true")]);
        Ok(self.send(request).await?.is_some())
    }
}


/// Convert plain JSON into a Firestore typed value
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n })
            }
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(elements) if elements.is_empty() => json!({ "arrayValue": {} }),
        Value::Array(elements) => {
            let values: Vec<Value> = elements.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        },
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

/// Convert every field of a document into Firestore typed values
pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(fields.iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect())
}

/// Convert a Firestore typed value into plain JSON
pub fn decode_value(value: &Value) -> Result<Value> {
    let (kind, inner) = match value.as_object() {
        Some(object) if object.len() == 1 => match object.iter().next() {
            Some(entry) => entry,
            None => return Err(malformed_value(value)),
        },
        _ => return Err(malformed_value(value)),
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => match inner {
            Value::Bool(_) => Ok(inner.clone()),
            _ => Err(malformed_value(value)),
        },
        // 64-bit integers are sent as strings
        "integerValue" => match inner {
            Value::String(s) => s.parse::<i64>()
                .map(Value::from)
                .map_err(|_| malformed_value(value)),
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(inner.clone()),
            _ => Err(malformed_value(value)),
        },
        // NaN and infinities come as strings, and have no plain JSON counterpart
        "doubleValue" => match inner {
            Value::Number(_) => Ok(inner.clone()),
            Value::String(s) if ["NaN", "Infinity", "-Infinity"].contains(&s.as_str()) => {
                Err(Error::MalformedDocument(format!("non-finite number {}", s)))
            },
            _ => Err(malformed_value(value)),
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => match inner {
            Value::String(_) => Ok(inner.clone()),
            _ => Err(malformed_value(value)),
        },
        "arrayValue" => match inner.get("values") {
            None => Ok(Value::Array(Vec::new())),
            Some(Value::Array(values)) => Ok(Value::Array(values.iter()
                .map(decode_value)
                .collect::<Result<Vec<_>>>()?)),
            Some(_) => Err(malformed_value(value)),
        },
        "mapValue" => match inner.get("fields") {
            None => Ok(Value::Object(Map::new())),
            Some(Value::Object(fields)) => Ok(Value::Object(decode_fields(fields)?)),
            Some(_) => Err(malformed_value(value)),
        },
        "geoPointValue" => Ok(inner.clone()),
        _ => Err(malformed_value(value)),
    }
}

/// Convert the typed fields of a Firestore document into plain JSON
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Fields> {
    fields.iter()
        .map(|(name, value)| Ok((name.clone(), decode_value(value)?)))
        .collect()
}

fn malformed_value(value: &Value) -> Error {
    Error::MalformedDocument(format!("unsupported Firestore value {}", value))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::TaskFilter;
    use crate::task::TaskState;

    fn client() -> Client {
        let mut settings = ClientSettings::new("my-project");
        settings.base_url = Some(Url::parse("http://localhost:8080").unwrap());
        Client::new(&settings, "calendar-tasks").unwrap()
    }

    #[test]
    fn urls() {
        let client = client();
        assert!(format!("{:?}", client).contains("calendar-tasks"));
        assert_eq!(client.collection_url().as_str(),
            "http://localhost:8080/v1/projects/my-project/databases/(default)/documents/calendar-tasks");
        assert_eq!(client.document_url("abc").as_str(),
            "http://localhost:8080/v1/projects/my-project/databases/(default)/documents/calendar-tasks/abc");
        assert_eq!(client.run_query_url().as_str(),
            "http://localhost:8080/v1/projects/my-project/databases/(default)/documents:runQuery");
        assert_eq!(client.document_name("abc"),
            "projects/my-project/databases/(default)/documents/calendar-tasks/abc");
    }

    #[test]
    fn values() {
        let plain = json!({
            "name": "first task",
            "createdDate": 1643273967854i64,
            "ratio": 0.5,
            "tags": ["first", "second"],
            "empty": [],
            "done": false,
            "nothing": null,
            "nested": { "a": 1 },
        });
        let encoded = encode_fields(plain.as_object().unwrap());
        assert_eq!(encoded["name"], json!({ "stringValue": "first task" }));
        assert_eq!(encoded["createdDate"], json!({ "integerValue": "1643273967854" }));
        assert_eq!(encoded["ratio"], json!({ "doubleValue": 0.5 }));
        assert_eq!(encoded["tags"], json!({ "arrayValue": { "values": [
            { "stringValue": "first" }, { "stringValue": "second" },
        ]}}));
        assert_eq!(encoded["empty"], json!({ "arrayValue": {} }));
        assert_eq!(encoded["nested"], json!({ "mapValue": { "fields": { "a": { "integerValue": "1" } } } }));

        let decoded = decode_fields(encoded.as_object().unwrap()).unwrap();
        assert_eq!(Value::Object(decoded), plain);
    }

    #[test]
    fn invalid_values() {
        assert!(decode_value(&json!({ "integerValue": "twelve" })).is_err());
        assert!(decode_value(&json!({ "stringValue": "a", "integerValue": "1" })).is_err());
        assert!(decode_value(&json!({ "unknownValue": 1 })).is_err());
        assert!(decode_value(&json!("raw")).is_err());
    }

    #[test]
    fn undecodable_documents_are_skipped() {
        let page: ListResponse = serde_json::from_value(json!({
            "documents": [
                {
                    "name": "projects/p/databases/(default)/documents/calendar-tasks/good",
                    "fields": { "name": { "stringValue": "first task" } },
                },
                {
                    "name": "projects/p/databases/(default)/documents/calendar-tasks/nan",
                    "fields": { "ratio": { "doubleValue": "NaN" } },
                },
                {
                    "name": "projects/p/databases/(default)/documents/calendar-tasks/infinite",
                    "fields": { "ratio": { "doubleValue": "-Infinity" } },
                },
            ],
        })).unwrap();

        let documents = decode_documents(page.documents);
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id(), "good");
        assert_eq!(documents[0].fields().get("name"), Some(&json!("first task")));
    }

    #[test]
    fn document_names() {
        let raw = RawDocument {
            name: "projects/p/databases/(default)/documents/calendar-tasks/XyZ123".to_string(),
            fields: Map::new(),
        };
        assert_eq!(raw.decode().unwrap().id(), "XyZ123");

        let raw = RawDocument { name: "projects/p/".to_string(), fields: Map::new() };
        assert!(raw.decode().is_err());
    }

    #[test]
    fn queries() {
        let client = client();
        assert_eq!(client.structured_query(&[]), json!({
            "structuredQuery": { "from": [{ "collectionId": "calendar-tasks" }] }
        }));

        let single = TaskFilter::new().with_state(TaskState::Done).predicates();
        assert_eq!(client.structured_query(&single)["structuredQuery"]["where"], json!({
            "fieldFilter": {
                "field": { "fieldPath": "state" },
                "op": "EQUAL",
                "value": { "stringValue": "done" },
            }
        }));

        let several = TaskFilter::new().with_id("abc").with_tags(vec!["work"]).predicates();
        assert_eq!(client.structured_query(&several)["structuredQuery"]["where"], json!({
            "compositeFilter": { "op": "AND", "filters": [
                { "fieldFilter": {
                    "field": { "fieldPath": "__name__" },
                    "op": "EQUAL",
                    "value": { "referenceValue": "projects/my-project/databases/(default)/documents/calendar-tasks/abc" },
                }},
                { "fieldFilter": {
                    "field": { "fieldPath": "tags" },
                    "op": "ARRAY_CONTAINS",
                    "value": { "stringValue": "work" },
                }},
            ]}
        }));
    }

    #[test]
    fn only_one_containment_is_sent() {
        let predicates = TaskFilter::new()
            .with_tags(vec!["a", "b", "c"])
            .with_category("X")
            .predicates();
        let (sent, kept) = split_predicates(&predicates);
        // The category and the first tag
        assert_eq!(sent.len(), 2);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|p| matches!(p, Predicate::ArrayContains{ .. })));
    }

    #[test]
    fn doubles_are_compared_locally() {
        let predicates = TaskFilter::new()
            .with_value(TaskField::CreatedDate, 100.0)
            .with_event_date(100)
            .predicates();
        let (sent, kept) = split_predicates(&predicates);
        assert_eq!(sent, vec![Predicate::Equal{ field: TaskField::EventDate, value: json!(100) }]);
        assert_eq!(kept, vec![Predicate::Equal{ field: TaskField::CreatedDate, value: json!(100.0) }]);
    }
}
