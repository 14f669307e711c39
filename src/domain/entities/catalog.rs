//! Artist and album catalog entities.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::serde_utils::{local_datetime, null_as_default};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtistId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverId(pub i64);

macro_rules! id_display {
    ($($ty:ty),*) => {
        $(
            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    std::fmt::Display::fmt(&self.0, f)
                }
            }

            impl From<i64> for $ty {
                fn from(value: i64) -> Self {
                    Self(value)
                }
            }
        )*
    };
}

id_display!(ArtistId, AlbumId, CoverId);

/// Artist as listed inside an album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSummary {
    pub id: ArtistId,
    pub name: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub album_count: Option<u32>,
}

/// Album as listed inside an artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumSummary {
    pub id: AlbumId,
    pub title: String,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub primary_cover_url: Option<String>,
}

/// Stored album cover image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumCover {
    pub id: CoverId,
    pub file_name: String,
    pub object_key: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub is_primary: Option<bool>,
    #[serde(default)]
    pub presigned_url: Option<String>,
    #[serde(default, with = "local_datetime::option")]
    pub created_at: Option<NaiveDateTime>,
}

impl AlbumCover {
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.is_primary.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub formation_year: Option<i32>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub album_count: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub albums: Vec<AlbumSummary>,
    #[serde(default, with = "local_datetime::option")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "local_datetime::option")]
    pub updated_at: Option<NaiveDateTime>,
}

/// Full album, also carried as the snapshot inside album notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub record_label: Option<String>,
    #[serde(default)]
    pub total_tracks: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artists: Vec<ArtistSummary>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub covers: Vec<AlbumCover>,
    #[serde(default, with = "local_datetime::option")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "local_datetime::option")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Album {
    #[must_use]
    pub fn primary_cover(&self) -> Option<&AlbumCover> {
        self.covers.iter().find(|cover| cover.is_primary())
    }

    /// Comma separated artist names.
    #[must_use]
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub size: u32,
    pub number: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
    #[serde(default)]
    pub empty: bool,
}

impl<T> Page<T> {
    #[must_use]
    pub fn has_next(&self) -> bool {
        !self.last && self.number + 1 < self.total_pages
    }
}

/// Body of artist create and update calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formation_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub album_ids: Vec<AlbumId>,
}

impl ArtistRequest {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Body of album create and update calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tracks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub artist_ids: Vec<ArtistId>,
}

impl AlbumRequest {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_artists(mut self, artist_ids: impl IntoIterator<Item = ArtistId>) -> Self {
        self.artist_ids = artist_ids.into_iter().collect();
        self
    }
}

/// Page position and ordering of a listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub size: u32,
    pub sort: Option<String>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: Self::DEFAULT_SIZE,
            sort: None,
        }
    }
}

impl PageQuery {
    pub const DEFAULT_SIZE: u32 = 10;

    #[must_use]
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.max(1),
            sort: None,
        }
    }

    /// Sort expression such as `name,desc`.
    #[must_use]
    pub fn sorted_by(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Sort expression, falling back to `default` when unset.
    #[must_use]
    pub fn sort_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.sort.as_deref().unwrap_or(default)
    }
}

/// Server-side filters of the album listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumFilter {
    pub title: Option<String>,
    pub artist_name: Option<String>,
    pub artist_id: Option<ArtistId>,
}

impl AlbumFilter {
    #[must_use]
    pub fn by_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_artist_name(artist_name: impl Into<String>) -> Self {
        Self {
            artist_name: Some(artist_name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn by_artist(artist_id: ArtistId) -> Self {
        Self {
            title: None,
            artist_name: None,
            artist_id: Some(artist_id),
        }
    }
}
