//! Immich (Server) API client
//!
//! Authenticates with the `x-api-key` header. Bulk asset listing asks for
//! the total first, then fetches every page concurrently and flattens them
//! in page order.

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use ieas_common::{Error, Result};
use reqwest::{Method, Response};
use serde::Deserialize;
use serde_json::json;

use super::{default_http_client, streaming_http_client, AuthClient, Credential};
use crate::catalog::ServerCatalog;
use crate::models::{RemoteAlbum, RemoteAsset};

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Deserialize)]
struct AssetStatistics {
    total: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    assets: SearchPage,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    items: Vec<RemoteAsset>,
}

/// Number of pages needed to list `total` assets
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Immich API client
#[derive(Debug, Clone)]
pub struct ServerClient {
    client: AuthClient,
    concurrency: usize,
}

impl ServerClient {
    /// Client for catalog listing and album mutation
    ///
    /// `concurrency` bounds parallel page fetches.
    pub fn new(base_url: &str, api_key: &str, concurrency: usize) -> Result<Self> {
        let credential = Credential::header(API_KEY_HEADER, api_key)?;
        Ok(Self::with_client(
            AuthClient::new(default_http_client()?, base_url, credential),
            concurrency,
        ))
    }

    /// Client for the bridge proxy: no pooled connections, no body timeout
    pub fn for_streaming(base_url: &str, api_key: &str) -> Result<Self> {
        let credential = Credential::header(API_KEY_HEADER, api_key)?;
        Ok(Self::with_client(
            AuthClient::new(streaming_http_client()?, base_url, credential),
            1,
        ))
    }

    pub fn with_client(client: AuthClient, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// API base URL, e.g. `http://immich:2283/api`
    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    /// Total number of assets reported by the server
    pub async fn asset_count(&self) -> Result<usize> {
        let stats: AssetStatistics = self.client.get("/assets/statistics", &[]).await?;
        Ok(stats.total)
    }

    /// One page of visible assets; `page` is zero-based
    pub async fn fetch_page(&self, page: usize, page_size: usize) -> Result<Vec<RemoteAsset>> {
        let body = json!({
            "page": page + 1,
            "size": page_size,
            "isVisible": true,
        });
        let response: SearchResponse = self.client.post("/search/metadata", body).await?;
        Ok(response.assets.items)
    }

    /// Every visible asset, in server page order
    ///
    /// Any failing page aborts the whole listing.
    pub async fn fetch_all(&self, page_size: usize) -> Result<Vec<RemoteAsset>> {
        if page_size == 0 {
            return Err(Error::InvalidInput("page size must be positive".to_string()));
        }

        let total = self.asset_count().await?;
        let pages = page_count(total, page_size);
        tracing::debug!(total, pages, page_size, "Fetching server assets");

        let mut results: Vec<Vec<RemoteAsset>> = vec![Vec::new(); pages];

        let fetched: Vec<(usize, Vec<RemoteAsset>)> = stream::iter(0..pages)
            .map(|page| async move {
                self.fetch_page(page, page_size)
                    .await
                    .map(|items| (page, items))
            })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        for (page, items) in fetched {
            results[page] = items;
        }

        Ok(results.into_iter().flatten().collect())
    }

    /// Thumbnail bytes for an image asset, status not interpreted
    pub async fn fetch_thumbnail(&self, asset_id: &str) -> Result<Response> {
        let path = format!("/assets/{}/thumbnail", asset_id);
        self.client
            .send(Method::GET, &path, &[("size", "thumbnail")], None)
            .await
    }

    /// Playback stream for a video asset, status not interpreted
    pub async fn fetch_playback(&self, asset_id: &str) -> Result<Response> {
        let path = format!("/assets/{}/video/playback", asset_id);
        self.client.send(Method::GET, &path, &[], None).await
    }
}

#[async_trait]
impl ServerCatalog for ServerClient {
    async fn fetch_all_assets(&self, page_size: usize) -> Result<Vec<RemoteAsset>> {
        let assets = self.fetch_all(page_size).await?;
        let listed = assets.len();
        let assets: Vec<RemoteAsset> = assets
            .into_iter()
            .filter(|a| a.asset_type.is_syncable())
            .collect();

        if assets.len() != listed {
            tracing::debug!(
                skipped = listed - assets.len(),
                "Ignoring server assets that are neither images nor videos"
            );
        }
        Ok(assets)
    }

    async fn list_albums(&self) -> Result<Vec<RemoteAlbum>> {
        self.client.get("/albums", &[]).await
    }

    async fn get_album(&self, album_id: &str) -> Result<RemoteAlbum> {
        self.client.get(&format!("/albums/{}", album_id), &[]).await
    }

    async fn create_album(
        &self,
        name: &str,
        description: &str,
        asset_ids: &[String],
    ) -> Result<RemoteAlbum> {
        let body = json!({
            "albumName": name,
            "description": description,
            "assetIds": asset_ids,
        });
        self.client.post("/albums", body).await
    }

    async fn delete_album(&self, album_id: &str) -> Result<()> {
        self.client
            .delete(&format!("/albums/{}", album_id), None)
            .await
    }

    async fn rename_album(&self, album_id: &str, name: &str) -> Result<()> {
        self.client
            .patch(&format!("/albums/{}", album_id), json!({ "albumName": name }))
            .await
    }

    async fn add_album_assets(&self, album_id: &str, asset_ids: &[String]) -> Result<()> {
        self.client
            .put(
                &format!("/albums/{}/assets", album_id),
                json!({ "ids": asset_ids }),
            )
            .await
    }

    async fn remove_album_assets(&self, album_id: &str, asset_ids: &[String]) -> Result<()> {
        self.client
            .delete(
                &format!("/albums/{}/assets", album_id),
                Some(json!({ "ids": asset_ids })),
            )
            .await
    }
}
