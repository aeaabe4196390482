use super::models::{
    MusicRequestKind, MusicSubmission, RequestedAlbum, RequestedArtist, RequestedSong,
};
use anyhow::Result;

/// The result of trying to associate a submission with a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationOutcome {
    /// The association was created; carries the catalog entry id.
    Created(usize),
    /// The user reached the quota for this kind, nothing was written.
    QuotaExceeded,
    /// The user already requested this catalog entry, nothing was written.
    AlreadyRequested,
}

pub trait MusicRequestStore: Send + Sync {
    /// Returns the id of the catalog entry of the given kind with this url.
    fn find_by_url(&self, kind: MusicRequestKind, url: &str) -> Result<Option<usize>>;

    /// Inserts the catalog entry or refreshes the existing one with the same
    /// url, nested artists first. Returns the entry id, which never changes
    /// for a given url.
    fn upsert_by_url(&self, submission: &MusicSubmission) -> Result<usize>;

    /// Links the user to a catalog entry.
    /// Returns Ok(false) if the association already existed.
    fn create_association(
        &self,
        user_id: usize,
        kind: MusicRequestKind,
        catalog_id: usize,
    ) -> Result<bool>;

    /// Removes the link between the user and a catalog entry, never the entry
    /// itself. Returns Ok(false) if there was no such association.
    fn delete_association(
        &self,
        user_id: usize,
        kind: MusicRequestKind,
        catalog_id: usize,
    ) -> Result<bool>;

    fn count_associations(&self, user_id: usize, kind: MusicRequestKind) -> Result<usize>;

    /// Upserts the catalog entry, checks the user quota and creates the
    /// association in a single transaction. Any outcome other than
    /// `Created` leaves the database untouched.
    fn associate(
        &self,
        user_id: usize,
        submission: &MusicSubmission,
        max_per_user: usize,
    ) -> Result<AssociationOutcome>;

    fn get_artist(&self, artist_id: usize) -> Result<Option<RequestedArtist>>;
    fn get_album(&self, album_id: usize) -> Result<Option<RequestedAlbum>>;
    fn get_song(&self, song_id: usize) -> Result<Option<RequestedSong>>;

    /// The user's requested entries, ordered by catalog id.
    fn list_artists(&self, user_id: usize) -> Result<Vec<RequestedArtist>>;
    fn list_albums(&self, user_id: usize) -> Result<Vec<RequestedAlbum>>;
    fn list_songs(&self, user_id: usize) -> Result<Vec<RequestedSong>>;
}
