use crate::sqlite_persistence::{
    system_time_from_column, system_time_to_column, SharedConnection, AUTH_TOKEN_TABLE_V_0,
    PARTY_TABLE_V_0, USER_PASSWORD_CREDENTIALS_TABLE_V_0, USER_TABLE_V_0,
};
use crate::user::*;
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use std::str::FromStr;
use tracing::{debug, warn};

use super::auth::CredentialsHasher;

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: SharedConnection,
}

impl SqliteUserStore {
    pub fn new(conn: SharedConnection) -> Self {
        SqliteUserStore { conn }
    }
}

fn auth_token_from_row(row: &Row) -> rusqlite::Result<AuthToken> {
    Ok(AuthToken {
        user_id: row.get(0)?,
        value: AuthTokenValue(row.get(1)?),
        created: system_time_from_column(row.get(2)?),
        last_used: row.get::<usize, Option<i64>>(3)?.map(system_time_from_column),
    })
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        handle: row.get(1)?,
        party_id: row.get(2)?,
    })
}

fn party_from_row(row: &Row) -> rusqlite::Result<Party> {
    Ok(Party {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

impl UserStore for SqliteUserStore {
    fn create_party(&self, name: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!("INSERT INTO {} (name) VALUES (?1)", PARTY_TABLE_V_0.name),
            params![name],
        )
        .with_context(|| format!("Failed to create party {}", name))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_party(&self, party_id: usize) -> Result<Option<Party>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("SELECT id, name FROM {} WHERE id = ?1", PARTY_TABLE_V_0.name),
                params![party_id],
                party_from_row,
            )
            .optional()?)
    }

    fn get_party_by_name(&self, name: &str) -> Result<Option<Party>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT id, name FROM {} WHERE name = ?1",
                    PARTY_TABLE_V_0.name
                ),
                params![name],
                party_from_row,
            )
            .optional()?)
    }

    fn get_all_parties(&self) -> Result<Vec<Party>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name FROM {} ORDER BY id",
            PARTY_TABLE_V_0.name
        ))?;
        let parties = stmt
            .query_map([], party_from_row)?
            .collect::<Result<Vec<Party>, _>>()?;
        Ok(parties)
    }

    fn create_user(&self, user_handle: &str, party_id: usize) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (handle, party_id) VALUES (?1, ?2)",
                USER_TABLE_V_0.name
            ),
            params![user_handle, party_id],
        )
        .with_context(|| format!("Failed to create user {}", user_handle))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user(&self, user_id: usize) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT id, handle, party_id FROM {} WHERE id = ?1",
                    USER_TABLE_V_0.name
                ),
                params![user_id],
                user_from_row,
            )
            .optional()?)
    }

    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("SELECT id FROM {} WHERE handle = ?1", USER_TABLE_V_0.name),
                params![user_handle],
                |row| row.get::<usize, usize>(0),
            )
            .optional()?)
    }

    fn get_party_members(&self, party_id: usize) -> Result<Vec<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, handle, party_id FROM {} WHERE party_id = ?1 ORDER BY id",
            USER_TABLE_V_0.name
        ))?;
        let members = stmt
            .query_map(params![party_id], user_from_row)?
            .collect::<Result<Vec<User>, _>>()?;
        Ok(members)
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_user_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!(
                    "SELECT user_id, value, created, last_used FROM {} WHERE value = ?1",
                    AUTH_TOKEN_TABLE_V_0.name
                ),
                params![value.0],
                auth_token_from_row,
            )
            .optional()?)
    }

    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let token = match self.get_user_auth_token(token)? {
            Some(token) => token,
            None => return Ok(None),
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "DELETE FROM {} WHERE value = ?1",
                AUTH_TOKEN_TABLE_V_0.name
            ),
            params![token.value.0],
        )?;
        Ok(Some(token))
    }

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "UPDATE {} SET last_used = cast(strftime('%s','now') as int) WHERE value = ?1",
                AUTH_TOKEN_TABLE_V_0.name
            ),
            params![token.0],
        )?;
        Ok(())
    }

    fn add_user_auth_token(&self, token: AuthToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (value, user_id, created) VALUES (?1, ?2, ?3)",
                AUTH_TOKEN_TABLE_V_0.name
            ),
            params![
                token.value.0,
                token.user_id,
                system_time_to_column(&token.created)
            ],
        )?;
        Ok(())
    }

    fn get_all_user_auth_tokens(&self, user_handle: &str) -> Result<Vec<AuthToken>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT user_id, value, created, last_used FROM {} \
             WHERE user_id = (SELECT id FROM {} WHERE handle = ?1)",
            AUTH_TOKEN_TABLE_V_0.name, USER_TABLE_V_0.name
        ))?;
        let tokens = stmt
            .query_map(params![user_handle], auth_token_from_row)?
            .collect::<Result<Vec<AuthToken>, _>>()?;
        Ok(tokens)
    }

    fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let cutoff_secs = (unused_for_days * 24 * 60 * 60) as i64;
        let deleted = conn.execute(
            &format!(
                "DELETE FROM {} WHERE COALESCE(last_used, created) < cast(strftime('%s','now') as int) - ?1",
                AUTH_TOKEN_TABLE_V_0.name
            ),
            params![cutoff_secs],
        )?;
        debug!("Pruned {} auth tokens unused for {} days", deleted, unused_for_days);
        Ok(deleted)
    }
}

impl UserAuthCredentialsStore for SqliteUserStore {
    fn get_user_auth_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>> {
        let user_id = match self.get_user_id(user_handle)? {
            Some(id) => id,
            None => return Ok(None),
        };
        let conn = self.conn.lock().unwrap();

        let password_credentials = conn
            .query_row(
                &format!(
                    "SELECT user_id, salt, hash, hasher, created, last_tried, last_used FROM {} WHERE user_id = ?1",
                    USER_PASSWORD_CREDENTIALS_TABLE_V_0.name
                ),
                params![user_id],
                |row| {
                    let hasher_name = row.get::<usize, String>(3)?;
                    let hasher = match CredentialsHasher::from_str(&hasher_name) {
                        Ok(x) => x,
                        Err(_) => {
                            warn!("Invalid hasher {} for user {}", hasher_name, user_id);
                            return Err(rusqlite::Error::InvalidQuery);
                        }
                    };
                    Ok(UsernamePasswordCredentials {
                        user_id: row.get(0)?,
                        salt: row.get(1)?,
                        hash: row.get(2)?,
                        hasher,
                        created: system_time_from_column(row.get(4)?),
                        last_tried: row.get::<usize, Option<i64>>(5)?.map(system_time_from_column),
                        last_used: row.get::<usize, Option<i64>>(6)?.map(system_time_from_column),
                    })
                },
            )
            .optional()?;

        Ok(Some(UserAuthCredentials {
            user_id,
            username_password: password_credentials,
        }))
    }

    fn update_user_auth_credentials(&self, credentials: UserAuthCredentials) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let user_id = credentials.user_id;
        match credentials.username_password.as_ref() {
            Some(password_credentials) => {
                conn.execute(
                    &format!(
                        "INSERT INTO {} (user_id, salt, hash, hasher, created, last_tried, last_used) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
                         ON CONFLICT(user_id) DO UPDATE SET salt = excluded.salt, hash = excluded.hash, \
                         hasher = excluded.hasher, last_tried = excluded.last_tried, last_used = excluded.last_used",
                        USER_PASSWORD_CREDENTIALS_TABLE_V_0.name
                    ),
                    params![
                        user_id,
                        password_credentials.salt,
                        password_credentials.hash,
                        password_credentials.hasher.to_string(),
                        system_time_to_column(&password_credentials.created),
                        password_credentials.last_tried.as_ref().map(system_time_to_column),
                        password_credentials.last_used.as_ref().map(system_time_to_column),
                    ],
                )?;
            }
            None => {
                conn.execute(
                    &format!(
                        "DELETE FROM {} WHERE user_id = ?1",
                        USER_PASSWORD_CREDENTIALS_TABLE_V_0.name
                    ),
                    params![user_id],
                )?;
            }
        };
        Ok(())
    }
}
