//! The three kinds of music requests share one workflow; what differs between
//! them (payload shape, validation and the entity handed back) lives behind
//! [`RequestKind`].

use super::models::*;
use super::music_request_store::MusicRequestStore;
use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

pub trait RequestKind: Send + Sync + 'static {
    const KIND: MusicRequestKind;

    /// The JSON body users submit.
    type Payload: DeserializeOwned + Send + 'static;

    /// The catalog entry returned to users.
    type Entity: Serialize + Send + 'static;

    /// Checks the payload shape, returning a message for the user on failure.
    fn validate(payload: Self::Payload) -> Result<MusicSubmission, String>;

    fn load(store: &dyn MusicRequestStore, catalog_id: usize) -> Result<Option<Self::Entity>>;

    fn list(store: &dyn MusicRequestStore, user_id: usize) -> Result<Vec<Self::Entity>>;
}

pub struct ArtistRequests;
pub struct AlbumRequests;
pub struct SongRequests;

fn required_field(field: &str, value: Option<String>) -> Result<String, String> {
    match value.map(|v| v.trim().to_owned()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("The {} field is required and cannot be empty", field)),
    }
}

fn optional_field(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn nested_artist(artist: Option<ArtistReference>) -> Result<ArtistSubmission, String> {
    let artist = artist.ok_or_else(|| "The artist field is required".to_string())?;
    Ok(ArtistSubmission {
        name: optional_field(artist.name),
        url: required_field("artist.url", artist.url)?,
        image_url: optional_field(artist.image_url),
    })
}

impl RequestKind for ArtistRequests {
    const KIND: MusicRequestKind = MusicRequestKind::Artist;
    type Payload = ArtistRequestBody;
    type Entity = RequestedArtist;

    fn validate(payload: ArtistRequestBody) -> Result<MusicSubmission, String> {
        Ok(MusicSubmission::Artist(ArtistSubmission {
            name: Some(required_field("name", payload.name)?),
            url: required_field("url", payload.url)?,
            image_url: optional_field(payload.image_url),
        }))
    }

    fn load(store: &dyn MusicRequestStore, catalog_id: usize) -> Result<Option<RequestedArtist>> {
        store.get_artist(catalog_id)
    }

    fn list(store: &dyn MusicRequestStore, user_id: usize) -> Result<Vec<RequestedArtist>> {
        store.list_artists(user_id)
    }
}

impl RequestKind for AlbumRequests {
    const KIND: MusicRequestKind = MusicRequestKind::Album;
    type Payload = AlbumRequestBody;
    type Entity = RequestedAlbum;

    fn validate(payload: AlbumRequestBody) -> Result<MusicSubmission, String> {
        Ok(MusicSubmission::Album(AlbumSubmission {
            name: required_field("name", payload.name)?,
            url: required_field("url", payload.url)?,
            image_url: optional_field(payload.image_url),
            artist: nested_artist(payload.artist)?,
        }))
    }

    fn load(store: &dyn MusicRequestStore, catalog_id: usize) -> Result<Option<RequestedAlbum>> {
        store.get_album(catalog_id)
    }

    fn list(store: &dyn MusicRequestStore, user_id: usize) -> Result<Vec<RequestedAlbum>> {
        store.list_albums(user_id)
    }
}

impl RequestKind for SongRequests {
    const KIND: MusicRequestKind = MusicRequestKind::Song;
    type Payload = SongRequestBody;
    type Entity = RequestedSong;

    fn validate(payload: SongRequestBody) -> Result<MusicSubmission, String> {
        Ok(MusicSubmission::Song(SongSubmission {
            name: required_field("name", payload.name)?,
            url: required_field("url", payload.url)?,
            artist: nested_artist(payload.artist)?,
        }))
    }

    fn load(store: &dyn MusicRequestStore, catalog_id: usize) -> Result<Option<RequestedSong>> {
        store.get_song(catalog_id)
    }

    fn list(store: &dyn MusicRequestStore, user_id: usize) -> Result<Vec<RequestedSong>> {
        store.list_songs(user_id)
    }
}
