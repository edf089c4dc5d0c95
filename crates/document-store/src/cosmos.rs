//! Cosmos DB over the SQL REST API

use crate::auth::MasterKey;
use crate::error::{DocumentError, Result};
use crate::DocumentStore;
use async_trait::async_trait;
use common::connection_string::{ConnectionString, ConnectionStringError};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, Response, StatusCode};
use serde_json::{json, Value};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// REST API version used for all requests
const API_VERSION: &str = "2018-12-31";

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Addressed resource: its type, the id path used for signing, and the URL path
struct Resource {
    kind: &'static str,
    link: String,
    path: String,
}

impl Resource {
    /// The feed of `kind` under `parent`, e.g. `dbs/{db}/colls`
    fn feed(kind: &'static str, parent: &[&str]) -> Self {
        let link = join(parent, |s| s.to_string());
        let path = match parent {
            [] => kind.to_string(),
            _ => format!("{}/{}", join(parent, encode), kind),
        };
        Self { kind, link, path }
    }

    /// One resource of `kind`; `segments` is the full id path ending with its id
    fn item(kind: &'static str, segments: &[&str]) -> Self {
        Self {
            kind,
            link: join(segments, |s| s.to_string()),
            path: join(segments, encode),
        }
    }
}

fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

fn join(segments: &[&str], f: impl Fn(&str) -> String) -> String {
    segments.iter().map(|&s| f(s)).collect::<Vec<_>>().join("/")
}

/// Document store backed by a Cosmos DB account
#[derive(Debug)]
pub struct CosmosDocumentStore {
    client: reqwest::Client,
    endpoint: String,
    key: MasterKey,
}

impl CosmosDocumentStore {
    /// Build from `AccountEndpoint=...;AccountKey=...`.
    /// `accept_invalid_certs` is for the local emulator's self-signed certificate.
    pub fn from_connection_string(raw: &str, accept_invalid_certs: bool) -> Result<Self> {
        let invalid = |e: ConnectionStringError| DocumentError::InvalidConfig(e.to_string());
        let parsed = ConnectionString::parse(raw).map_err(invalid)?;
        let endpoint = parsed
            .require("AccountEndpoint")
            .map_err(invalid)?
            .trim_end_matches('/')
            .to_string();
        let key = MasterKey::new(parsed.require("AccountKey").map_err(invalid)?)?;

        if accept_invalid_certs {
            warn!("TLS certificate validation is disabled for the document store");
        }
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        info!(endpoint = %endpoint, "Document store initialized");
        Ok(Self {
            client,
            endpoint,
            key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(
        &self,
        method: Method,
        resource: &Resource,
        partition_key: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Response> {
        let date = httpdate::fmt_http_date(SystemTime::now());
        let authorization =
            self.key
                .authorization(method.as_str(), resource.kind, &resource.link, &date)?;
        let authorization = HeaderValue::from_str(&authorization)
            .map_err(|e| DocumentError::Signing(e.to_string()))?;

        let url = format!("{}/{}", self.endpoint, resource.path);
        debug!(method = %method, url = %url, "Document service request");

        let mut builder = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, authorization)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION);
        if let Some(partition_key) = partition_key {
            builder = builder.header("x-ms-documentdb-partitionkey", partition_key_header(partition_key)?);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }

    async fn check(response: Response, resource: impl FnOnce() -> String) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(status = status.as_u16(), error = %e, "Failed to read error body");
                String::new()
            }
        };
        let (code, message) = error_details(status.as_u16(), &body);
        debug!(status = status.as_u16(), code = %code, "Document service error");
        if status == StatusCode::NOT_FOUND {
            Err(DocumentError::NotFound {
                resource: resource(),
            })
        } else {
            Err(DocumentError::Remote {
                status: status.as_u16(),
                code,
                message,
            })
        }
    }

    /// Create a resource, falling back to reading it when it already exists
    async fn create_if_not_exists(
        &self,
        feed: Resource,
        existing: Resource,
        body: Value,
        describe: impl Fn() -> String,
    ) -> Result<Value> {
        let response = self.send(Method::POST, &feed, None, Some(&body)).await?;
        if response.status() == StatusCode::CONFLICT {
            debug!(resource = %describe(), "Already exists, reading it");
            let response = self.send(Method::GET, &existing, None, None).await?;
            let response = Self::check(response, &describe).await?;
            return json_body(response).await;
        }

        let response = Self::check(response, &describe).await?;
        info!(resource = %describe(), "Created");
        json_body(response).await
    }
}

#[async_trait]
impl DocumentStore for CosmosDocumentStore {
    async fn create_database(&self, database: &str) -> Result<Value> {
        self.create_if_not_exists(
            Resource::feed("dbs", &[]),
            Resource::item("dbs", &["dbs", database]),
            json!({ "id": database }),
            || format!("database '{}'", database),
        )
        .await
    }

    async fn delete_database(&self, database: &str) -> Result<()> {
        let resource = Resource::item("dbs", &["dbs", database]);
        let response = self.send(Method::DELETE, &resource, None, None).await?;
        Self::check(response, || format!("database '{}'", database)).await?;
        info!(database = ?database, "Deleted database");
        Ok(())
    }

    async fn create_container(
        &self,
        database: &str,
        container: &str,
        partition_key_path: &str,
    ) -> Result<Value> {
        if !partition_key_path.starts_with('/') {
            return Err(DocumentError::InvalidRequest(format!(
                "partition key path '{}' must start with '/'",
                partition_key_path
            )));
        }

        self.create_if_not_exists(
            Resource::feed("colls", &["dbs", database]),
            Resource::item("colls", &["dbs", database, "colls", container]),
            json!({
                "id": container,
                "partitionKey": { "paths": [partition_key_path], "kind": "Hash", "version": 2 }
            }),
            || format!("container '{}/{}'", database, container),
        )
        .await
    }

    async fn create_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &str,
        item: &Value,
    ) -> Result<Value> {
        let id = item_id(item)?;
        let resource = Resource::feed("docs", &["dbs", database, "colls", container]);
        let response = self
            .send(Method::POST, &resource, Some(partition_key), Some(item))
            .await?;
        let response =
            Self::check(response, || format!("container '{}/{}'", database, container)).await?;
        info!(container = ?container, id = ?id, "Created item");
        json_body(response).await
    }

    async fn read_item(
        &self,
        database: &str,
        container: &str,
        id: &str,
        partition_key: &str,
    ) -> Result<Option<Value>> {
        let resource = Resource::item("docs", &["dbs", database, "colls", container, "docs", id]);
        let response = self
            .send(Method::GET, &resource, Some(partition_key), None)
            .await?;

        match Self::check(response, || format!("item '{}'", id)).await {
            Ok(response) => Ok(Some(json_body(response).await?)),
            Err(DocumentError::NotFound { resource }) => {
                warn!(container = ?container, "{} not found", resource);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn create_stored_procedure(
        &self,
        database: &str,
        container: &str,
        procedure: &str,
        body: &str,
    ) -> Result<Value> {
        let resource = Resource::feed("sprocs", &["dbs", database, "colls", container]);
        let definition = json!({ "id": procedure, "body": body });
        let response = self
            .send(Method::POST, &resource, None, Some(&definition))
            .await?;
        let response =
            Self::check(response, || format!("container '{}/{}'", database, container)).await?;
        info!(container = ?container, procedure = ?procedure, "Created stored procedure");
        json_body(response).await
    }

    async fn execute_stored_procedure(
        &self,
        database: &str,
        container: &str,
        procedure: &str,
        partition_key: &str,
        items: &[Value],
    ) -> Result<Value> {
        let resource = Resource::item(
            "sprocs",
            &["dbs", database, "colls", container, "sprocs", procedure],
        );
        let parameters = json!([items]);
        let response = self
            .send(Method::POST, &resource, Some(partition_key), Some(&parameters))
            .await?;
        let response =
            Self::check(response, || format!("stored procedure '{}'", procedure)).await?;
        let result = json_body(response).await?;
        info!(procedure = ?procedure, items = items.len(), "Executed stored procedure");
        Ok(result)
    }
}

/// Items must be JSON objects with a non-blank string `id`
fn item_id(item: &Value) -> Result<&str> {
    item.get("id")
        .and_then(Value::as_str)
        .filter(|id| !common::names::is_blank(id))
        .ok_or_else(|| {
            DocumentError::InvalidRequest("item must be a JSON object with a string 'id'".to_string())
        })
}

fn partition_key_header(partition_key: &str) -> Result<String> {
    Ok(serde_json::to_string(&[partition_key])?)
}

async fn json_body(response: Response) -> Result<Value> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

/// Error code and first line of the message from a `{"code", "message"}` body
fn error_details(status: u16, body: &str) -> (String, String) {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let code = field("code").unwrap_or_else(|| status.to_string());
    let message = field("message")
        .and_then(|m| m.lines().next().map(|l| l.trim().to_string()))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| match body.trim() {
            "" => format!("status {}", status),
            other => other.to_string(),
        });
    (code, message)
}
