//! Eagle (Library) API client
//!
//! Eagle wraps every payload as `{"status": "success", "data": ...}`; any
//! other status is reported as an upstream error even on HTTP 200.

use std::path::PathBuf;

use async_trait::async_trait;
use ieas_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{default_http_client, AuthClient, Credential};
use crate::catalog::LibraryCatalog;
use crate::models::{ImportRequest, LibraryFolder, LibraryItem};

/// Upper bound passed to `/item/list`; the library is listed in one call
const ITEM_LIST_LIMIT: &str = "1000000";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

impl<T> Envelope<T> {
    fn into_result(self, path: &str) -> Result<Option<T>> {
        if self.status == "success" {
            Ok(self.data)
        } else {
            Err(Error::Upstream {
                status: 200,
                body: format!(
                    "{} answered status {:?}: {}",
                    path,
                    self.status,
                    self.message.unwrap_or_default()
                ),
            })
        }
    }

    fn into_data(self, path: &str) -> Result<T> {
        self.into_result(path)?
            .ok_or_else(|| Error::Decode(format!("{}: missing data", path)))
    }
}

#[derive(Debug, Deserialize)]
struct LibraryInfo {
    library: LibraryLocation,
}

#[derive(Debug, Deserialize)]
struct LibraryLocation {
    path: PathBuf,
}

/// Eagle API client (token passed as query parameter / body field)
#[derive(Debug, Clone)]
pub struct LibraryClient {
    client: AuthClient,
}

impl LibraryClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        Ok(Self::with_client(AuthClient::new(
            default_http_client()?,
            base_url,
            Credential::query_token(token),
        )))
    }

    pub fn with_client(client: AuthClient) -> Self {
        Self { client }
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let envelope: Envelope<T> = self.client.get(path, query).await?;
        envelope.into_data(path)
    }

    async fn post_ack(&self, path: &str, body: Value) -> Result<()> {
        let envelope: Envelope<Value> = self.client.post(path, body).await?;
        envelope.into_result(path).map(|_| ())
    }
}

#[async_trait]
impl LibraryCatalog for LibraryClient {
    async fn list_folders(&self) -> Result<Vec<LibraryFolder>> {
        self.get_data("/folder/list", &[]).await
    }

    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<LibraryFolder> {
        let mut body = json!({ "folderName": name });
        if let Some(parent) = parent {
            body["parent"] = json!(parent);
        }

        let envelope: Envelope<LibraryFolder> = self.client.post("/folder/create", body).await?;
        let folder = envelope.into_data("/folder/create")?;
        tracing::info!(folder_id = %folder.id, name = %folder.name, "Created library folder");
        Ok(folder)
    }

    async fn list_items(&self) -> Result<Vec<LibraryItem>> {
        self.get_data("/item/list", &[("limit", ITEM_LIST_LIMIT)]).await
    }

    async fn add_from_url(&self, request: &ImportRequest) -> Result<()> {
        self.post_ack("/item/addFromURL", serde_json::to_value(request)?)
            .await
    }

    async fn move_to_trash(&self, item_ids: &[String]) -> Result<()> {
        self.post_ack("/item/moveToTrash", json!({ "itemIds": item_ids }))
            .await
    }

    async fn library_path(&self) -> Result<PathBuf> {
        let info: LibraryInfo = self.get_data("/library/info", &[]).await?;
        Ok(info.library.path)
    }
}
