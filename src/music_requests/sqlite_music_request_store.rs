use super::models::*;
use super::music_request_store::{AssociationOutcome, MusicRequestStore};
use crate::sqlite_persistence::{
    SharedConnection, REQUESTED_ALBUM_TABLE_V_0, REQUESTED_ARTIST_TABLE_V_0,
    REQUESTED_SONG_TABLE_V_0,
};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

#[derive(Clone)]
pub struct SqliteMusicRequestStore {
    conn: SharedConnection,
}

impl SqliteMusicRequestStore {
    pub fn new(conn: SharedConnection) -> Self {
        SqliteMusicRequestStore { conn }
    }
}

fn artist_from_row(row: &Row, offset: usize) -> rusqlite::Result<RequestedArtist> {
    Ok(RequestedArtist {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        url: row.get(offset + 2)?,
        image_url: row.get(offset + 3)?,
    })
}

fn album_from_row(row: &Row) -> rusqlite::Result<RequestedAlbum> {
    Ok(RequestedAlbum {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        image_url: row.get(3)?,
        artist: artist_from_row(row, 4)?,
    })
}

fn song_from_row(row: &Row) -> rusqlite::Result<RequestedSong> {
    Ok(RequestedSong {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        artist: artist_from_row(row, 3)?,
    })
}

fn artist_query() -> String {
    format!(
        "SELECT ar.id, ar.name, ar.url, ar.image_url FROM {} ar",
        REQUESTED_ARTIST_TABLE_V_0.name
    )
}

fn album_query() -> String {
    format!(
        "SELECT al.id, al.name, al.url, al.image_url, ar.id, ar.name, ar.url, ar.image_url \
         FROM {} al JOIN {} ar ON ar.id = al.artist_id",
        REQUESTED_ALBUM_TABLE_V_0.name, REQUESTED_ARTIST_TABLE_V_0.name
    )
}

fn song_query() -> String {
    format!(
        "SELECT so.id, so.name, so.url, ar.id, ar.name, ar.url, ar.image_url \
         FROM {} so JOIN {} ar ON ar.id = so.artist_id",
        REQUESTED_SONG_TABLE_V_0.name, REQUESTED_ARTIST_TABLE_V_0.name
    )
}

fn find_by_url(conn: &Connection, kind: MusicRequestKind, url: &str) -> Result<Option<usize>> {
    Ok(conn
        .query_row(
            &format!("SELECT id FROM {} WHERE url = ?1", kind.catalog_table()),
            params![url],
            |row| row.get::<usize, usize>(0),
        )
        .optional()?)
}

fn upsert_artist(conn: &Connection, artist: &ArtistSubmission) -> Result<usize> {
    // A nested artist without a name keeps the stored one, or falls back to its url.
    conn.execute(
        &format!(
            "INSERT INTO {} (name, url, image_url) VALUES (COALESCE(?1, ?2), ?2, ?3) \
             ON CONFLICT(url) DO UPDATE SET name = COALESCE(?1, name), \
             image_url = COALESCE(excluded.image_url, image_url)",
            REQUESTED_ARTIST_TABLE_V_0.name
        ),
        params![artist.name, artist.url, artist.image_url],
    )?;
    find_by_url(conn, MusicRequestKind::Artist, &artist.url)?
        .with_context(|| format!("Artist {} missing after upsert", artist.url))
}

/// Albums and songs found by url keep their artist, so the nested artist is
/// only written when a new entry is created.
fn upsert(conn: &Connection, submission: &MusicSubmission) -> Result<usize> {
    match submission {
        MusicSubmission::Artist(artist) => upsert_artist(conn, artist),
        MusicSubmission::Album(album) => {
            if let Some(album_id) = find_by_url(conn, MusicRequestKind::Album, &album.url)? {
                conn.execute(
                    &format!(
                        "UPDATE {} SET name = ?1, image_url = COALESCE(?2, image_url) WHERE id = ?3",
                        REQUESTED_ALBUM_TABLE_V_0.name
                    ),
                    params![album.name, album.image_url, album_id],
                )?;
                return Ok(album_id);
            }
            let artist_id = upsert_artist(conn, &album.artist)?;
            conn.execute(
                &format!(
                    "INSERT INTO {} (name, url, image_url, artist_id) VALUES (?1, ?2, ?3, ?4)",
                    REQUESTED_ALBUM_TABLE_V_0.name
                ),
                params![album.name, album.url, album.image_url, artist_id],
            )?;
            Ok(conn.last_insert_rowid() as usize)
        }
        MusicSubmission::Song(song) => {
            if let Some(song_id) = find_by_url(conn, MusicRequestKind::Song, &song.url)? {
                conn.execute(
                    &format!(
                        "UPDATE {} SET name = ?1 WHERE id = ?2",
                        REQUESTED_SONG_TABLE_V_0.name
                    ),
                    params![song.name, song_id],
                )?;
                return Ok(song_id);
            }
            let artist_id = upsert_artist(conn, &song.artist)?;
            conn.execute(
                &format!(
                    "INSERT INTO {} (name, url, artist_id) VALUES (?1, ?2, ?3)",
                    REQUESTED_SONG_TABLE_V_0.name
                ),
                params![song.name, song.url, artist_id],
            )?;
            Ok(conn.last_insert_rowid() as usize)
        }
    }
}

fn count_associations(conn: &Connection, user_id: usize, kind: MusicRequestKind) -> Result<usize> {
    Ok(conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} WHERE user_id = ?1",
            kind.association_table()
        ),
        params![user_id],
        |row| row.get::<usize, usize>(0),
    )?)
}

fn create_association(
    conn: &Connection,
    user_id: usize,
    kind: MusicRequestKind,
    catalog_id: usize,
) -> Result<bool> {
    let inserted = conn.execute(
        &format!(
            "INSERT OR IGNORE INTO {} (user_id, {}) VALUES (?1, ?2)",
            kind.association_table(),
            kind.association_column()
        ),
        params![user_id, catalog_id],
    )?;
    Ok(inserted > 0)
}

impl MusicRequestStore for SqliteMusicRequestStore {
    fn find_by_url(&self, kind: MusicRequestKind, url: &str) -> Result<Option<usize>> {
        find_by_url(&self.conn.lock().unwrap(), kind, url)
    }

    fn upsert_by_url(&self, submission: &MusicSubmission) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let id = upsert(&tx, submission)?;
        tx.commit()?;
        Ok(id)
    }

    fn create_association(
        &self,
        user_id: usize,
        kind: MusicRequestKind,
        catalog_id: usize,
    ) -> Result<bool> {
        create_association(&self.conn.lock().unwrap(), user_id, kind, catalog_id)
    }

    fn delete_association(
        &self,
        user_id: usize,
        kind: MusicRequestKind,
        catalog_id: usize,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!(
                "DELETE FROM {} WHERE user_id = ?1 AND {} = ?2",
                kind.association_table(),
                kind.association_column()
            ),
            params![user_id, catalog_id],
        )?;
        Ok(deleted > 0)
    }

    fn count_associations(&self, user_id: usize, kind: MusicRequestKind) -> Result<usize> {
        count_associations(&self.conn.lock().unwrap(), user_id, kind)
    }

    fn associate(
        &self,
        user_id: usize,
        submission: &MusicSubmission,
        max_per_user: usize,
    ) -> Result<AssociationOutcome> {
        let kind = submission.kind();
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let catalog_id = upsert(&tx, submission)?;

        let used = count_associations(&tx, user_id, kind)?;
        if used >= max_per_user {
            debug!(
                "User {} reached the {} quota ({}/{}), rolling back",
                user_id, kind, used, max_per_user
            );
            return Ok(AssociationOutcome::QuotaExceeded);
        }

        if !create_association(&tx, user_id, kind, catalog_id)? {
            debug!(
                "User {} already requested {} {}, rolling back",
                user_id, kind, catalog_id
            );
            return Ok(AssociationOutcome::AlreadyRequested);
        }

        tx.commit()?;
        Ok(AssociationOutcome::Created(catalog_id))
    }

    fn get_artist(&self, artist_id: usize) -> Result<Option<RequestedArtist>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("{} WHERE ar.id = ?1", artist_query()),
                params![artist_id],
                |row| artist_from_row(row, 0),
            )
            .optional()?)
    }

    fn get_album(&self, album_id: usize) -> Result<Option<RequestedAlbum>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("{} WHERE al.id = ?1", album_query()),
                params![album_id],
                album_from_row,
            )
            .optional()?)
    }

    fn get_song(&self, song_id: usize) -> Result<Option<RequestedSong>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("{} WHERE so.id = ?1", song_query()),
                params![song_id],
                song_from_row,
            )
            .optional()?)
    }

    fn list_artists(&self, user_id: usize) -> Result<Vec<RequestedArtist>> {
        let kind = MusicRequestKind::Artist;
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "{} JOIN {} ura ON ura.{} = ar.id WHERE ura.user_id = ?1 ORDER BY ar.id",
            artist_query(),
            kind.association_table(),
            kind.association_column()
        ))?;
        let artists = stmt
            .query_map(params![user_id], |row| artist_from_row(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    fn list_albums(&self, user_id: usize) -> Result<Vec<RequestedAlbum>> {
        let kind = MusicRequestKind::Album;
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "{} JOIN {} ura ON ura.{} = al.id WHERE ura.user_id = ?1 ORDER BY al.id",
            album_query(),
            kind.association_table(),
            kind.association_column()
        ))?;
        let albums = stmt
            .query_map(params![user_id], album_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(albums)
    }

    fn list_songs(&self, user_id: usize) -> Result<Vec<RequestedSong>> {
        let kind = MusicRequestKind::Song;
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "{} JOIN {} urs ON urs.{} = so.id WHERE urs.user_id = ?1 ORDER BY so.id",
            song_query(),
            kind.association_table(),
            kind.association_column()
        ))?;
        let songs = stmt
            .query_map(params![user_id], song_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }
}
