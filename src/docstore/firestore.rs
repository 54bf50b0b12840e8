//! Cloud Firestore client (REST v1).
//!
//! DESIGN
//! ======
//! Each trait call is one HTTP round trip, except `list_all`, which follows
//! `nextPageToken` until the collection is exhausted. Partial updates send
//! an explicit `updateMask` so untouched fields survive, and
//! `move_document` is a single `documents:commit` carrying a guarded delete
//! and a guarded create, which Firestore applies atomically.
//!
//! Firestore wraps every value in a type tag (`{"stringValue": "x"}`);
//! `encode_value` / `decode_value` translate to and from plain JSON. Types
//! JSON has no native form for (timestamps, references, bytes, geo points)
//! stay wrapped in their tag on decode and pass through encode unchanged, so
//! a read-then-write copy keeps its types.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Url};
use serde_json::{Map, Value, json};
use tracing::debug;

use super::{Document, DocumentStore, Fields, StoreError, generate_document_id};
use crate::config::{FirebaseConfig, HttpTimeouts};
use crate::identity::TokenSource;

const LIST_PAGE_SIZE: &str = "300";

/// Value tags kept verbatim as single-key objects in decoded fields.
const PASSTHROUGH_TAGS: [&str; 4] = ["timestampValue", "referenceValue", "bytesValue", "geoPointValue"];

// =============================================================================
// CLIENT
// =============================================================================

pub struct FirestoreClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    /// `projects/{project}/databases/{database}`, the prefix of every resource name.
    database_path: String,
    tokens: RwLock<Option<Arc<dyn TokenSource>>>,
}

impl FirestoreClient {
    /// Build a client for the configured project and database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: &FirebaseConfig, timeouts: HttpTimeouts) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| StoreError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.firestore_base_url.clone(),
            api_key: config.api_key.clone(),
            database_path: format!("projects/{}/databases/{}", config.project_id, config.database),
            tokens: RwLock::new(None),
        })
    }

    /// Read the bearer token from `source` on every request from now on.
    /// Requests go out with only the API key while the source has no token.
    pub fn set_token_source(&self, source: Arc<dyn TokenSource>) {
        if let Ok(mut slot) = self.tokens.write() {
            *slot = Some(source);
        }
    }

    /// Resource name of a document, as used inside request bodies.
    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{collection}/{id}", self.database_path)
    }

    /// URL of `documents/<segments...>`, each segment percent-encoded.
    fn documents_url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&format!("{}/{}/documents", self.base_url, self.database_path))
            .map_err(|e| StoreError::Request(format!("invalid firestore url: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| StoreError::Request("firestore base url cannot hold a path".into()))?
            .extend(segments);
        Ok(url)
    }

    fn commit_url(&self) -> Result<Url, StoreError> {
        Url::parse(&format!("{}/{}/documents:commit", self.base_url, self.database_path))
            .map_err(|e| StoreError::Request(format!("invalid firestore url: {e}")))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url).query(&[("key", &self.api_key)]);
        let token = self
            .tokens
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().and_then(|source| source.id_token()));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and return the body of a 2xx response.
    async fn send(&self, builder: RequestBuilder, target: (&str, &str)) -> Result<String, StoreError> {
        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        debug!(collection = target.0, status, "firestore response");

        if (200..300).contains(&status) {
            Ok(text)
        } else {
            Err(status_error(status, &text, target))
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for FirestoreClient {
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let url = self.documents_url(&[collection])?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut builder = self
                .request(Method::GET, url.clone())
                .query(&[("pageSize", LIST_PAGE_SIZE)]);
            if let Some(token) = &page_token {
                builder = builder.query(&[("pageToken", token)]);
            }
            let body = self.send(builder, (collection, "")).await?;
            let page = parse_list_page(&body)?;
            documents.extend(page.documents);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    async fn insert(&self, collection: &str, fields: &Fields) -> Result<String, StoreError> {
        let url = self.documents_url(&[collection])?;
        let encoded = encode_fields(fields)?;
        let builder = self
            .request(Method::POST, url)
            .json(&json!({ "fields": encoded }));
        let body = self.send(builder, (collection, "")).await?;
        Ok(parse_document(&body)?.id)
    }

    async fn update_fields(&self, collection: &str, id: &str, patch: &Fields) -> Result<(), StoreError> {
        let url = self.documents_url(&[collection, id])?;
        // An empty mask would replace the whole document; only check it exists.
        if patch.is_empty() {
            let builder = self
                .request(Method::GET, url)
                .query(&[("mask.fieldPaths", "__name__")]);
            self.send(builder, (collection, id)).await?;
            return Ok(());
        }
        let mut query: Vec<(&str, String)> = patch
            .keys()
            .map(|key| ("updateMask.fieldPaths", field_path(key)))
            .collect();
        query.push(("currentDocument.exists", "true".into()));
        let encoded = encode_fields(patch)?;

        let builder = self
            .request(Method::PATCH, url)
            .query(&query)
            .json(&json!({ "fields": encoded }));
        self.send(builder, (collection, id)).await?;
        Ok(())
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.documents_url(&[collection, id])?;
        self.send(self.request(Method::DELETE, url), (collection, id))
            .await?;
        Ok(())
    }

    async fn move_document(&self, from: &str, id: &str, to: &str, fields: &Fields) -> Result<String, StoreError> {
        let new_id = generate_document_id();
        let body = commit_move_body(
            &self.document_name(from, id),
            &self.document_name(to, &new_id),
            fields,
        )?;
        let builder = self.request(Method::POST, self.commit_url()?).json(&body);
        self.send(builder, (from, id)).await?;
        Ok(new_id)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Deserialize)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireListResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    next_page_token: Option<String>,
}

struct ListPage {
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(serde::Deserialize)]
struct WireErrorEnvelope {
    error: WireErrorBody,
}

#[derive(serde::Deserialize)]
struct WireErrorBody {
    message: String,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_list_page(json: &str) -> Result<ListPage, StoreError> {
    let resp: WireListResponse = serde_json::from_str(json).map_err(|e| StoreError::Parse(e.to_string()))?;
    let documents = resp
        .documents
        .into_iter()
        .map(into_document)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ListPage { documents, next_page_token: resp.next_page_token })
}

fn parse_document(json: &str) -> Result<Document, StoreError> {
    let wire: WireDocument = serde_json::from_str(json).map_err(|e| StoreError::Parse(e.to_string()))?;
    into_document(wire)
}

fn into_document(wire: WireDocument) -> Result<Document, StoreError> {
    let id = document_id(&wire.name).ok_or_else(|| StoreError::Parse(format!("bad document name: {}", wire.name)))?;
    Ok(Document { id: id.to_string(), fields: decode_fields(&wire.fields)? })
}

/// Last path segment of a resource name.
fn document_id(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|id| !id.is_empty())
}

fn status_error(status: u16, body: &str, (collection, id): (&str, &str)) -> StoreError {
    let message = serde_json::from_str::<WireErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    match status {
        404 if !id.is_empty() => StoreError::NotFound { collection: collection.to_string(), id: id.to_string() },
        409 => StoreError::AlreadyExists { collection: collection.to_string(), id: id.to_string() },
        _ => StoreError::Response { status, message },
    }
}

fn commit_move_body(source_name: &str, target_name: &str, fields: &Fields) -> Result<Value, StoreError> {
    let encoded = encode_fields(fields)?;
    Ok(json!({
        "writes": [
            {
                "delete": source_name,
                "currentDocument": { "exists": true }
            },
            {
                "update": { "name": target_name, "fields": encoded },
                "currentDocument": { "exists": false }
            }
        ]
    }))
}

/// Quote a top-level key as a Firestore field path.
///
/// Plain identifiers pass through; anything else is wrapped in backticks so
/// dots and spaces are not read as nested paths.
fn field_path(key: &str) -> String {
    let mut chars = key.chars();
    let simple = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        key.to_string()
    } else {
        format!("`{}`", key.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

// =============================================================================
// VALUE ENCODING
// =============================================================================

fn encode_fields(fields: &Fields) -> Result<Map<String, Value>, StoreError> {
    fields
        .iter()
        .map(|(k, v)| Ok((k.clone(), encode_value(v)?)))
        .collect()
}

fn encode_value(value: &Value) -> Result<Value, StoreError> {
    let encoded = match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            // Firestore integers are signed 64-bit.
            None if n.is_u64() => return Err(StoreError::Encode(format!("integer out of range: {n}"))),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values = items.iter().map(encode_value).collect::<Result<Vec<_>, _>>()?;
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) if is_passthrough(map) => value.clone(),
        Value::Object(map) => {
            let fields = map
                .iter()
                .map(|(k, v)| Ok((k.clone(), encode_value(v)?)))
                .collect::<Result<Map<String, Value>, StoreError>>()?;
            json!({ "mapValue": { "fields": fields } })
        }
    };
    Ok(encoded)
}

/// A single-key object whose key is one of [`PASSTHROUGH_TAGS`].
fn is_passthrough(map: &Map<String, Value>) -> bool {
    map.len() == 1 && map.keys().all(|key| PASSTHROUGH_TAGS.contains(&key.as_str()))
}

fn decode_fields(fields: &Map<String, Value>) -> Result<Fields, StoreError> {
    fields
        .iter()
        .map(|(k, v)| Ok((k.clone(), decode_value(v)?)))
        .collect()
}

fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let Some((tag, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Err(StoreError::Parse(format!("untyped firestore value: {value}")));
    };

    match tag.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| bad_value(tag, inner)),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            parsed.map(Value::from).ok_or_else(|| bad_value(tag, inner))
        }
        "doubleValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<f64>().ok(),
                other => other.as_f64(),
            };
            parsed.map(Value::from).ok_or_else(|| bad_value(tag, inner))
        }
        "stringValue" => Ok(inner.clone()),
        tag if PASSTHROUGH_TAGS.contains(&tag) => {
            let mut wrapped = Map::new();
            wrapped.insert(tag.to_string(), inner.clone());
            Ok(Value::Object(wrapped))
        }
        "arrayValue" => {
            let items = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Array(items))
        }
        "mapValue" => {
            let decoded = match inner.get("fields").and_then(Value::as_object) {
                Some(fields) => decode_fields(fields)?,
                None => Fields::new(),
            };
            Ok(Value::Object(decoded.into_iter().collect()))
        }
        _ => Err(bad_value(tag, inner)),
    }
}

fn bad_value(tag: &str, inner: &Value) -> StoreError {
    StoreError::Parse(format!("unsupported firestore value {tag}: {inner}"))
}

#[cfg(test)]
#[path = "firestore_test.rs"]
mod tests;
