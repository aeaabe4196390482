use super::{
    user_models::{Party, PartyOverview, UserProfile},
    AuthToken, AuthTokenValue, UserAuthCredentials, UserStore, UsernamePasswordCredentials,
};
use anyhow::{bail, Context, Result};
use std::time::SystemTime;
use tracing::{debug, info};

pub struct UserManager {
    user_store: Box<dyn UserStore>,
}

impl UserManager {
    pub fn new(user_store: Box<dyn UserStore>) -> Self {
        Self { user_store }
    }

    pub fn add_party<T: AsRef<str>>(&self, name: T) -> Result<usize> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            bail!("The party name cannot be empty.")
        }
        if self.user_store.get_party_by_name(name)?.is_some() {
            bail!("Party {} already exists.", name);
        }
        let party_id = self.user_store.create_party(name)?;
        info!("Created party {} with id {}", name, party_id);
        Ok(party_id)
    }

    pub fn add_user<T: AsRef<str>>(&self, user_handle: T, party_id: usize) -> Result<usize> {
        let user_handle = user_handle.as_ref();
        if user_handle.is_empty() {
            bail!("The user handle cannot be empty.")
        }

        if self.user_store.get_user_id(user_handle)?.is_some() {
            bail!("User handle already exists.");
        }

        if self.user_store.get_party(party_id)?.is_none() {
            bail!("Party with id {} does not exist.", party_id);
        }

        self.user_store.create_user(user_handle, party_id)
    }

    pub fn get_parties(&self) -> Result<Vec<Party>> {
        self.user_store.get_all_parties()
    }

    pub fn get_party_by_name(&self, name: &str) -> Result<Option<Party>> {
        self.user_store.get_party_by_name(name)
    }

    pub fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        self.user_store.get_user_id(user_handle)
    }

    pub fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        self.user_store.get_user_auth_token(value)
    }

    pub fn touch_auth_token(&self, value: &AuthTokenValue) -> Result<()> {
        self.user_store
            .update_user_auth_token_last_used_timestamp(value)
    }

    pub fn create_password_credentials(&self, user_handle: &str, password: &str) -> Result<()> {
        let mut credentials = self
            .user_store
            .get_user_auth_credentials(user_handle)?
            .with_context(|| format!("User with handle {} not found.", user_handle))?;
        if credentials.username_password.is_some() {
            bail!(
                "User with handle {} already has password credentials. Maybe you want to modify them?",
                user_handle
            );
        }
        credentials.username_password = Some(UsernamePasswordCredentials::new(
            credentials.user_id,
            password,
        )?);
        self.user_store.update_user_auth_credentials(credentials)
    }

    pub fn update_password_credentials(&self, user_handle: &str, password: &str) -> Result<()> {
        let mut credentials = self
            .user_store
            .get_user_auth_credentials(user_handle)?
            .with_context(|| format!("User with handle {} not found.", user_handle))?;
        if credentials.username_password.is_none() {
            bail!(
                "Cannot update password of user with handle {} since it never had one.",
                user_handle
            );
        }
        credentials.username_password = Some(UsernamePasswordCredentials::new(
            credentials.user_id,
            password,
        )?);
        self.user_store.update_user_auth_credentials(credentials)
    }

    pub fn delete_password_credentials(&self, user_handle: &str) -> Result<()> {
        let mut credentials = self
            .user_store
            .get_user_auth_credentials(user_handle)?
            .with_context(|| format!("User with handle {} not found.", user_handle))?;
        credentials.username_password = None;
        self.user_store.update_user_auth_credentials(credentials)
    }

    /// Verifies the password of `user_handle` and issues a new auth token.
    /// Returns Ok(None) when the user is unknown, has no password or the
    /// password does not match.
    pub fn login(&self, user_handle: &str, password: &str) -> Result<Option<AuthToken>> {
        let credentials = match self.user_store.get_user_auth_credentials(user_handle)? {
            Some(credentials) => credentials,
            None => {
                debug!("Login attempt for unknown user {}", user_handle);
                return Ok(None);
            }
        };
        let Some(mut password_credentials) = credentials.username_password.clone() else {
            debug!("User {} has no password credentials", user_handle);
            return Ok(None);
        };

        let now = SystemTime::now();
        password_credentials.last_tried = Some(now);
        let verified = password_credentials.verify(password)?;
        if verified {
            password_credentials.last_used = Some(now);
        }
        self.user_store
            .update_user_auth_credentials(UserAuthCredentials {
                user_id: credentials.user_id,
                username_password: Some(password_credentials),
            })?;

        if !verified {
            return Ok(None);
        }

        let token = AuthToken {
            user_id: credentials.user_id,
            value: AuthTokenValue::generate(),
            created: now,
            last_used: None,
        };
        self.user_store.add_user_auth_token(token.clone())?;
        Ok(Some(token))
    }

    /// Deletes the token, provided it belongs to `user_id`.
    pub fn logout(&self, user_id: usize, token_value: &AuthTokenValue) -> Result<()> {
        let token = self
            .user_store
            .get_user_auth_token(token_value)?
            .with_context(|| format!("Did not find auth token {}", token_value.0))?;
        if token.user_id != user_id {
            bail!(
                "Tried to delete auth token of user {}, but the authenticated user is {}.",
                token.user_id,
                user_id
            );
        }
        self.user_store.delete_user_auth_token(token_value)?;
        Ok(())
    }

    pub fn get_user_tokens(&self, user_handle: &str) -> Result<Vec<AuthToken>> {
        self.user_store.get_all_user_auth_tokens(user_handle)
    }

    pub fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> Result<usize> {
        self.user_store.prune_unused_auth_tokens(unused_for_days)
    }

    pub fn get_profile(&self, user_id: usize) -> Result<Option<UserProfile>> {
        let Some(user) = self.user_store.get_user(user_id)? else {
            return Ok(None);
        };
        let party = self
            .user_store
            .get_party(user.party_id)?
            .with_context(|| format!("Party {} of user {} not found", user.party_id, user.id))?;
        Ok(Some(UserProfile {
            id: user.id,
            handle: user.handle,
            party,
        }))
    }

    pub fn get_party_overview(&self, user_id: usize) -> Result<Option<PartyOverview>> {
        let Some(profile) = self.get_profile(user_id)? else {
            return Ok(None);
        };
        let members = self
            .user_store
            .get_party_members(profile.party.id)?
            .into_iter()
            .map(|user| user.handle)
            .collect();
        Ok(Some(PartyOverview {
            id: profile.party.id,
            name: profile.party.name,
            members,
        }))
    }

    /// Returns the party id of the given user.
    pub fn get_user_party_id(&self, user_id: usize) -> Result<Option<usize>> {
        Ok(self.user_store.get_user(user_id)?.map(|user| user.party_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite_persistence::open_database;
    use crate::user::SqliteUserStore;
    use tempfile::TempDir;

    fn make_manager() -> (UserManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let conn = open_database(temp_dir.path().join("party.db")).unwrap();
        (
            UserManager::new(Box::new(SqliteUserStore::new(conn))),
            temp_dir,
        )
    }

    #[test]
    fn onboards_party_and_users() {
        let (manager, _temp_dir) = make_manager();

        let party_id = manager.add_party("smiths").unwrap();
        assert!(manager.add_party("smiths").is_err());
        assert!(manager.add_party("  ").is_err());

        let alice = manager.add_user("alice", party_id).unwrap();
        manager.add_user("bob", party_id).unwrap();
        assert!(manager.add_user("alice", party_id).is_err());
        assert!(manager.add_user("", party_id).is_err());
        assert!(manager.add_user("carol", 1234).is_err());

        let profile = manager.get_profile(alice).unwrap().unwrap();
        assert_eq!(profile.handle, "alice");
        assert_eq!(profile.party.name, "smiths");

        let overview = manager.get_party_overview(alice).unwrap().unwrap();
        assert_eq!(overview.members, vec!["alice", "bob"]);
        assert!(manager.get_profile(999).unwrap().is_none());
    }

    #[test]
    fn logs_in_with_password() {
        let (manager, _temp_dir) = make_manager();
        let party_id = manager.add_party("smiths").unwrap();
        let alice = manager.add_user("alice", party_id).unwrap();

        assert!(manager.login("alice", "pw").unwrap().is_none());
        assert!(manager.update_password_credentials("alice", "pw").is_err());

        manager.create_password_credentials("alice", "pw").unwrap();
        assert!(manager.create_password_credentials("alice", "pw").is_err());

        assert!(manager.login("alice", "wrong").unwrap().is_none());
        assert!(manager.login("nobody", "pw").unwrap().is_none());

        let token = manager.login("alice", "pw").unwrap().unwrap();
        assert_eq!(token.user_id, alice);
        assert!(manager.get_auth_token(&token.value).unwrap().is_some());

        manager.update_password_credentials("alice", "pw2").unwrap();
        assert!(manager.login("alice", "pw").unwrap().is_none());
        assert!(manager.login("alice", "pw2").unwrap().is_some());

        manager.delete_password_credentials("alice").unwrap();
        assert!(manager.login("alice", "pw2").unwrap().is_none());
    }

    #[test]
    fn logout_requires_token_owner() {
        let (manager, _temp_dir) = make_manager();
        let party_id = manager.add_party("smiths").unwrap();
        let alice = manager.add_user("alice", party_id).unwrap();
        let bob = manager.add_user("bob", party_id).unwrap();
        manager.create_password_credentials("alice", "pw").unwrap();

        let token = manager.login("alice", "pw").unwrap().unwrap();
        assert!(manager.logout(bob, &token.value).is_err());
        assert!(manager.get_auth_token(&token.value).unwrap().is_some());

        manager.logout(alice, &token.value).unwrap();
        assert!(manager.get_auth_token(&token.value).unwrap().is_none());
        assert!(manager.logout(alice, &token.value).is_err());
    }
}
