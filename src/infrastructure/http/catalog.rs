//! Typed artist and album endpoints.

use std::sync::Arc;

use tracing::debug;

use super::gateway::{ApiRequest, HttpGateway};
use crate::domain::entities::{
    Album, AlbumFilter, AlbumId, AlbumRequest, Artist, ArtistId, ArtistRequest, CoverId, Page,
    PageQuery,
};
use crate::domain::errors::ApiError;

const ARTISTS_PATH: &str = "/api/v1/artists";
const ALBUMS_PATH: &str = "/api/v1/albums";
const ARTIST_SORT: &str = "name,asc";
const ALBUM_SORT: &str = "title,asc";

fn paged(path: &str, query: &PageQuery, default_sort: &str) -> ApiRequest {
    ApiRequest::get(path)
        .query("page", query.page)
        .query("size", query.size)
        .query("sort", query.sort_or(default_sort))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Artist CRUD over the gateway.
#[derive(Clone)]
pub struct ArtistsApi {
    gateway: Arc<HttpGateway>,
}

impl ArtistsApi {
    #[must_use]
    pub const fn new(gateway: Arc<HttpGateway>) -> Self {
        Self { gateway }
    }

    /// Lists artists, optionally filtered by name.
    ///
    /// # Errors
    /// Returns the gateway error.
    pub async fn list(&self, query: &PageQuery, name: Option<&str>) -> Result<Page<Artist>, ApiError> {
        debug!(page = query.page, size = query.size, ?name, "Listing artists");
        let request = paged(ARTISTS_PATH, query, ARTIST_SORT).query_opt("name", non_blank(name));
        self.gateway.send(request).await
    }

    /// # Errors
    /// Returns the gateway error.
    pub async fn get(&self, id: ArtistId) -> Result<Artist, ApiError> {
        self.gateway
            .send(ApiRequest::get(format!("{ARTISTS_PATH}/{id}")))
            .await
    }

    /// # Errors
    /// Returns the gateway error.
    pub async fn create(&self, request: &ArtistRequest) -> Result<Artist, ApiError> {
        self.gateway
            .send(ApiRequest::post(ARTISTS_PATH).json(request)?)
            .await
    }

    /// # Errors
    /// Returns the gateway error.
    pub async fn update(&self, id: ArtistId, request: &ArtistRequest) -> Result<Artist, ApiError> {
        self.gateway
            .send(ApiRequest::put(format!("{ARTISTS_PATH}/{id}")).json(request)?)
            .await
    }

    /// # Errors
    /// Returns the gateway error.
    pub async fn delete(&self, id: ArtistId) -> Result<(), ApiError> {
        self.gateway
            .send_empty(ApiRequest::delete(format!("{ARTISTS_PATH}/{id}")))
            .await
    }

    /// Links an existing album to the artist.
    ///
    /// # Errors
    /// Returns the gateway error.
    pub async fn add_album(&self, artist: ArtistId, album: AlbumId) -> Result<Artist, ApiError> {
        self.gateway
            .send(ApiRequest::post(format!("{ARTISTS_PATH}/{artist}/albums/{album}")))
            .await
    }

    /// # Errors
    /// Returns the gateway error.
    pub async fn remove_album(&self, artist: ArtistId, album: AlbumId) -> Result<Artist, ApiError> {
        self.gateway
            .send(ApiRequest::delete(format!("{ARTISTS_PATH}/{artist}/albums/{album}")))
            .await
    }
}

/// Album CRUD over the gateway.
#[derive(Clone)]
pub struct AlbumsApi {
    gateway: Arc<HttpGateway>,
}

impl AlbumsApi {
    #[must_use]
    pub const fn new(gateway: Arc<HttpGateway>) -> Self {
        Self { gateway }
    }

    /// Lists albums. The server applies one filter, preferring artist id,
    /// then artist name, then title.
    ///
    /// # Errors
    /// Returns the gateway error.
    pub async fn list(&self, query: &PageQuery, filter: &AlbumFilter) -> Result<Page<Album>, ApiError> {
        debug!(page = query.page, size = query.size, ?filter, "Listing albums");
        let request = paged(ALBUMS_PATH, query, ALBUM_SORT)
            .query_opt("title", non_blank(filter.title.as_deref()))
            .query_opt("artistName", non_blank(filter.artist_name.as_deref()))
            .query_opt("artistId", filter.artist_id);
        self.gateway.send(request).await
    }

    /// # Errors
    /// Returns the gateway error.
    pub async fn get(&self, id: AlbumId) -> Result<Album, ApiError> {
        self.gateway
            .send(ApiRequest::get(format!("{ALBUMS_PATH}/{id}")))
            .await
    }

    /// # Errors
    /// Returns the gateway error.
    pub async fn create(&self, request: &AlbumRequest) -> Result<Album, ApiError> {
        self.gateway
            .send(ApiRequest::post(ALBUMS_PATH).json(request)?)
            .await
    }

    /// # Errors
    /// Returns the gateway error.
    pub async fn update(&self, id: AlbumId, request: &AlbumRequest) -> Result<Album, ApiError> {
        self.gateway
            .send(ApiRequest::put(format!("{ALBUMS_PATH}/{id}")).json(request)?)
            .await
    }

    /// # Errors
    /// Returns the gateway error.
    pub async fn delete(&self, id: AlbumId) -> Result<(), ApiError> {
        self.gateway
            .send_empty(ApiRequest::delete(format!("{ALBUMS_PATH}/{id}")))
            .await
    }

    /// # Errors
    /// Returns the gateway error.
    pub async fn delete_cover(&self, album: AlbumId, cover: CoverId) -> Result<(), ApiError> {
        self.gateway
            .send_empty(ApiRequest::delete(format!("{ALBUMS_PATH}/{album}/covers/{cover}")))
            .await
    }

    /// Marks one cover as the album's primary image.
    ///
    /// # Errors
    /// Returns the gateway error.
    pub async fn set_primary_cover(&self, album: AlbumId, cover: CoverId) -> Result<(), ApiError> {
        self.gateway
            .send_empty(ApiRequest::put(format!(
                "{ALBUMS_PATH}/{album}/covers/{cover}/primary"
            )))
            .await
    }
}
