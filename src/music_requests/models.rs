//! Music request data models: the shared catalog entries, the payloads users
//! submit and their validated form.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::sqlite_persistence::{
    REQUESTED_ALBUM_TABLE_V_0, REQUESTED_ARTIST_TABLE_V_0, REQUESTED_SONG_TABLE_V_0,
    USER_REQUESTED_ALBUM_TABLE_V_0, USER_REQUESTED_ARTIST_TABLE_V_0,
    USER_REQUESTED_SONG_TABLE_V_0,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicRequestKind {
    Artist,
    Album,
    Song,
}

impl MusicRequestKind {
    /// The shared catalog table holding entries of this kind.
    pub fn catalog_table(&self) -> &'static str {
        match self {
            MusicRequestKind::Artist => REQUESTED_ARTIST_TABLE_V_0.name,
            MusicRequestKind::Album => REQUESTED_ALBUM_TABLE_V_0.name,
            MusicRequestKind::Song => REQUESTED_SONG_TABLE_V_0.name,
        }
    }

    /// The table linking users to catalog entries of this kind.
    pub fn association_table(&self) -> &'static str {
        match self {
            MusicRequestKind::Artist => USER_REQUESTED_ARTIST_TABLE_V_0.name,
            MusicRequestKind::Album => USER_REQUESTED_ALBUM_TABLE_V_0.name,
            MusicRequestKind::Song => USER_REQUESTED_SONG_TABLE_V_0.name,
        }
    }

    /// The association table column referencing the catalog entry.
    pub fn association_column(&self) -> &'static str {
        match self {
            MusicRequestKind::Artist => "artist_id",
            MusicRequestKind::Album => "album_id",
            MusicRequestKind::Song => "song_id",
        }
    }
}

impl fmt::Display for MusicRequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MusicRequestKind::Artist => write!(f, "artist"),
            MusicRequestKind::Album => write!(f, "album"),
            MusicRequestKind::Song => write!(f, "song"),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestedArtist {
    pub id: usize,
    pub name: String,
    pub url: String,
    pub image_url: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestedAlbum {
    pub id: usize,
    pub name: String,
    pub url: String,
    pub image_url: Option<String>,
    pub artist: RequestedArtist,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestedSong {
    pub id: usize,
    pub name: String,
    pub url: String,
    pub artist: RequestedArtist,
}

/// The artist an album or song submission refers to.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArtistReference {
    pub name: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArtistRequestBody {
    pub name: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AlbumRequestBody {
    pub name: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub artist: Option<ArtistReference>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SongRequestBody {
    pub name: Option<String>,
    pub url: Option<String>,
    pub artist: Option<ArtistReference>,
}

/// A validated artist. `name` is only optional when the artist is nested in
/// an album or song, an existing entry then keeps its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistSubmission {
    pub name: Option<String>,
    pub url: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumSubmission {
    pub name: String,
    pub url: String,
    pub image_url: Option<String>,
    pub artist: ArtistSubmission,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongSubmission {
    pub name: String,
    pub url: String,
    pub artist: ArtistSubmission,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicSubmission {
    Artist(ArtistSubmission),
    Album(AlbumSubmission),
    Song(SongSubmission),
}

impl MusicSubmission {
    pub fn kind(&self) -> MusicRequestKind {
        match self {
            MusicSubmission::Artist(_) => MusicRequestKind::Artist,
            MusicSubmission::Album(_) => MusicRequestKind::Album,
            MusicSubmission::Song(_) => MusicRequestKind::Song,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            MusicSubmission::Artist(artist) => &artist.url,
            MusicSubmission::Album(album) => &album.url,
            MusicSubmission::Song(song) => &song.url,
        }
    }
}

/// Used and maximum number of requests of one kind.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaUsage {
    pub used: usize,
    pub max: usize,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaOverview {
    pub artists: QuotaUsage,
    pub albums: QuotaUsage,
    pub songs: QuotaUsage,
}
