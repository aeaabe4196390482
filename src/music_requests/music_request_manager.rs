use super::kinds::RequestKind;
use super::models::{MusicRequestKind, QuotaOverview, QuotaUsage};
use super::music_request_store::{AssociationOutcome, MusicRequestStore};
use crate::sqlite_persistence::is_storable_id;
use anyhow::anyhow;
use thiserror::Error;
use tracing::info;

pub const MAX_MUSIC_REQUESTS_PER_USER: usize = 10;

#[derive(Error, Debug)]
pub enum MusicRequestError {
    #[error("{0}")]
    Validation(String),

    #[error("Reached the maximum of {max} {kind} requests")]
    QuotaExceeded { kind: MusicRequestKind, max: usize },

    #[error("This {0} was already requested")]
    AlreadyRequested(MusicRequestKind),

    #[error("No requested {kind} with id {id}")]
    NotFound { kind: MusicRequestKind, id: usize },

    #[error("Storage error: {0}")]
    Store(#[from] anyhow::Error),
}

pub struct MusicRequestManager {
    store: Box<dyn MusicRequestStore>,
    max_requests_per_user: usize,
}

impl MusicRequestManager {
    pub fn new(store: Box<dyn MusicRequestStore>, max_requests_per_user: usize) -> Self {
        Self {
            store,
            max_requests_per_user,
        }
    }

    pub fn max_requests_per_user(&self) -> usize {
        self.max_requests_per_user
    }

    /// Validates the payload, finds or creates the catalog entry and links it
    /// to the user, within the user quota.
    pub fn request<K: RequestKind>(
        &self,
        user_id: usize,
        payload: K::Payload,
    ) -> Result<K::Entity, MusicRequestError> {
        let submission = K::validate(payload).map_err(MusicRequestError::Validation)?;

        match self
            .store
            .associate(user_id, &submission, self.max_requests_per_user)?
        {
            AssociationOutcome::Created(catalog_id) => {
                info!(
                    "User {} requested {} {} ({})",
                    user_id,
                    K::KIND,
                    catalog_id,
                    submission.url()
                );
                K::load(self.store.as_ref(), catalog_id)?.ok_or_else(|| {
                    MusicRequestError::Store(anyhow!(
                        "Requested {} {} vanished",
                        K::KIND,
                        catalog_id
                    ))
                })
            }
            AssociationOutcome::QuotaExceeded => Err(MusicRequestError::QuotaExceeded {
                kind: K::KIND,
                max: self.max_requests_per_user,
            }),
            AssociationOutcome::AlreadyRequested => {
                Err(MusicRequestError::AlreadyRequested(K::KIND))
            }
        }
    }

    /// Removes the user's request, the catalog entry stays.
    pub fn withdraw<K: RequestKind>(
        &self,
        user_id: usize,
        catalog_id: usize,
    ) -> Result<(), MusicRequestError> {
        if is_storable_id(catalog_id)
            && self
                .store
                .delete_association(user_id, K::KIND, catalog_id)?
        {
            info!("User {} withdrew {} {}", user_id, K::KIND, catalog_id);
            Ok(())
        } else {
            Err(MusicRequestError::NotFound {
                kind: K::KIND,
                id: catalog_id,
            })
        }
    }

    pub fn list<K: RequestKind>(&self, user_id: usize) -> Result<Vec<K::Entity>, MusicRequestError> {
        Ok(K::list(self.store.as_ref(), user_id)?)
    }

    pub fn count_requests(
        &self,
        user_id: usize,
        kind: MusicRequestKind,
    ) -> Result<usize, MusicRequestError> {
        Ok(self.store.count_associations(user_id, kind)?)
    }

    pub fn quota(&self, user_id: usize) -> Result<QuotaOverview, MusicRequestError> {
        let usage = |kind: MusicRequestKind| -> Result<QuotaUsage, MusicRequestError> {
            Ok(QuotaUsage {
                used: self.count_requests(user_id, kind)?,
                max: self.max_requests_per_user,
            })
        };
        Ok(QuotaOverview {
            artists: usage(MusicRequestKind::Artist)?,
            albums: usage(MusicRequestKind::Album)?,
            songs: usage(MusicRequestKind::Song)?,
        })
    }
}
