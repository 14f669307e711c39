//! Catalog API HTTP client.

mod auth_client;
mod catalog;
mod dto;
mod gateway;

pub use auth_client::CatalogAuthClient;
pub use catalog::{AlbumsApi, ArtistsApi};
pub use gateway::{ApiRequest, HttpGateway, REFRESH_PATH};
