//! Music requests: users ask for artists, albums and songs to be played.
//! Catalog entries are shared and deduplicated by url, each user only owns
//! the association to them.

pub mod kinds;
pub mod models;
mod music_request_manager;
mod music_request_store;
mod sqlite_music_request_store;

pub use kinds::{AlbumRequests, ArtistRequests, RequestKind, SongRequests};
pub use music_request_manager::{
    MusicRequestError, MusicRequestManager, MAX_MUSIC_REQUESTS_PER_USER,
};
pub use music_request_store::{AssociationOutcome, MusicRequestStore};
pub use sqlite_music_request_store::SqliteMusicRequestStore;
