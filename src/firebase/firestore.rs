use super::value::{decode_fields, encode_fields};
use super::{describe_error, AuthProvider, FirebaseAuth, FirebaseOptions};
use crate::error::{config_error, firestore_error, AppResult};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Page size used when listing a collection
const LIST_PAGE_SIZE: &str = "300";

/// A document read from the store, with its fields decoded to plain JSON
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
            create_time: None,
            update_time: None,
        }
    }

    /// Deserialize the fields, with the document id available as `id`
    pub fn decode<T: DeserializeOwned>(&self) -> AppResult<T> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields)).map_err(|e| {
            firestore_error(&format!("Failed to decode document {}: {}", self.id, e))
        })
    }
}

/// Point reads and writes against a schemaless document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document; `None` when it does not exist
    async fn get_document(&self, collection: &str, id: &str) -> AppResult<Option<Document>>;

    async fn delete_document(&self, collection: &str, id: &str) -> AppResult<()>;

    /// Create a document with a store-generated id and return that id
    async fn add_document(&self, collection: &str, fields: Map<String, Value>) -> AppResult<String>;

    /// Overwrite the given fields of an existing document, leaving the rest untouched
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> AppResult<()>;

    async fn list_documents(&self, collection: &str) -> AppResult<Vec<Document>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
    create_time: Option<String>,
    update_time: Option<String>,
}

impl RawDocument {
    fn into_document(self) -> AppResult<Document> {
        let id = self
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| firestore_error(&format!("Invalid document name: {}", self.name)))?
            .to_string();

        Ok(Document {
            id,
            fields: decode_fields(&self.fields)?,
            create_time: self.create_time,
            update_time: self.update_time,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

/// Cloud Firestore over its REST API
pub struct Firestore {
    options: FirebaseOptions,
    client: Client,
    auth: Arc<FirebaseAuth>,
}

impl std::fmt::Debug for Firestore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Firestore")
            .field("project_id", &self.options.project_id)
            .finish()
    }
}

impl Firestore {
    pub(crate) fn new(options: FirebaseOptions, client: Client, auth: Arc<FirebaseAuth>) -> Self {
        Self {
            options,
            client,
            auth,
        }
    }

    /// URL of a path below the default database's `documents` root
    fn documents_url(&self, path: &[&str]) -> AppResult<Url> {
        let mut url = Url::parse(&self.options.endpoints.firestore)?;
        url.path_segments_mut()
            .map_err(|_| config_error("Firestore endpoint cannot be a base URL"))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                self.options.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
            ])
            .extend(path);
        Ok(url)
    }

    /// Request with the API key and, when signed in, the user's ID token
    async fn request(&self, method: Method, url: Url) -> AppResult<RequestBuilder> {
        let mut builder = self
            .client
            .request(method, url)
            .query(&[("key", self.options.api_key.as_str())]);

        if let Some(token) = self.auth.id_token().await? {
            builder = builder.bearer_auth(token);
        }

        Ok(builder)
    }
}

#[async_trait]
impl DocumentStore for Firestore {
    async fn get_document(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        let url = self.documents_url(&[collection, id])?;
        let response = self.request(Method::GET, url).await?.send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Document {}/{} does not exist", collection, id);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(firestore_error(&format!(
                "Failed to read {}/{}: {}",
                collection,
                id,
                describe_error(response).await
            )));
        }

        let raw: RawDocument = response.json().await?;
        raw.into_document().map(Some)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> AppResult<()> {
        let url = self.documents_url(&[collection, id])?;
        let response = self.request(Method::DELETE, url).await?.send().await?;

        if !response.status().is_success() {
            return Err(firestore_error(&format!(
                "Failed to delete {}/{}: {}",
                collection,
                id,
                describe_error(response).await
            )));
        }

        debug!("Deleted document {}/{}", collection, id);
        Ok(())
    }

    async fn add_document(&self, collection: &str, fields: Map<String, Value>) -> AppResult<String> {
        let url = self.documents_url(&[collection])?;
        let response = self
            .request(Method::POST, url)
            .await?
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(firestore_error(&format!(
                "Failed to create document in {}: {}",
                collection,
                describe_error(response).await
            )));
        }

        let raw: RawDocument = response.json().await?;
        let document = raw.into_document()?;
        debug!("Created document {}/{}", collection, document.id);
        Ok(document.id)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> AppResult<()> {
        let url = self.documents_url(&[collection, id])?;

        // Only the listed fields are written, and the document must already exist
        let mut params: Vec<(&str, &str)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();
        params.push(("currentDocument.exists", "true"));

        let response = self
            .request(Method::PATCH, url)
            .await?
            .query(&params)
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(firestore_error(&format!(
                "Failed to update {}/{}: {}",
                collection,
                id,
                describe_error(response).await
            )));
        }

        debug!("Updated document {}/{}", collection, id);
        Ok(())
    }

    async fn list_documents(&self, collection: &str) -> AppResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = self.documents_url(&[collection])?;
            let mut builder = self
                .request(Method::GET, url)
                .await?
                .query(&[("pageSize", LIST_PAGE_SIZE)]);
            if let Some(token) = &page_token {
                builder = builder.query(&[("pageToken", token.as_str())]);
            }

            let response = builder.send().await?;
            if !response.status().is_success() {
                return Err(firestore_error(&format!(
                    "Failed to list {}: {}",
                    collection,
                    describe_error(response).await
                )));
            }

            let page: ListResponse = response.json().await?;
            for raw in page.documents {
                documents.push(raw.into_document()?);
            }

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Listed {} documents in {}", documents.len(), collection);
        Ok(documents)
    }
}
