//! Domain entity definitions.

mod auth;
mod catalog;
mod token;
mod user;

pub use auth::{LoginCredentials, Registration, StoredSession, TokenGrant};
pub use catalog::{
    Album, AlbumCover, AlbumFilter, AlbumId, AlbumRequest, AlbumSummary, Artist, ArtistId,
    ArtistRequest, ArtistSummary, CoverId, Page, PageQuery,
};
pub use token::{Credential, CredentialPair};
pub use user::{UserId, UserProfile};
