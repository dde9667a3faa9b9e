//! Platform users and their link to an actor.

use oc_types::{ActorKind, Bucket, ConnectRequest, User};
use tracing::{debug, info};

use crate::actor::{Actor, AnyActor};
use crate::database::Database;
use crate::error::{DbError, DbResult};

/// Required length of a stored password hash (hex-encoded SHA3-512).
pub const PWHASH_LEN: usize = 128;

/// One change to a user account, applied by [`Database::update_user`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserUpdate {
    Email(String),
    Pwhash(String),
    Username(String),
}

fn check_pwhash(pwhash: &str) -> DbResult<()> {
    if pwhash.len() == PWHASH_LEN {
        Ok(())
    } else {
        Err(DbError::InvalidUser(format!(
            "pwhash must be {PWHASH_LEN} characters, got {}",
            pwhash.len()
        )))
    }
}

impl Database {
    /// Register a user linked to the actor named `entity_name`.
    ///
    /// `entity_type` is an actor tag; `entity_parent` scopes the name lookup
    /// for kinds that have a parent and is ignored otherwise. Usernames are
    /// unique, also across concurrent registrations.
    pub fn new_user(
        &self,
        username: &str,
        pwhash: &str,
        email: &str,
        entity_type: &str,
        entity_name: &str,
        entity_parent: Option<&str>,
    ) -> DbResult<User> {
        check_pwhash(pwhash)?;
        if entity_type.is_empty() {
            return Err(DbError::InvalidUser("entity type not specified".into()));
        }

        let entity = self.resolve_actor_by_name(entity_type, entity_name, entity_parent)?;
        let mut user = User {
            username: username.to_string(),
            email: email.to_string(),
            pwhash: pwhash.to_string(),
            entity_type: entity.kind().to_string(),
            entity_id: entity.actor_id(),
            ..User::default()
        };
        self.save_checked(&mut user, |u| self.ensure_username_free(&u.username, u.index))?;
        info!(id = user.index, username, entity_type, "user created");
        Ok(user)
    }

    /// Apply one change to the account identified by `username` and `pwhash`.
    ///
    /// The credentials must match the stored user. A new hash must be
    /// [`PWHASH_LEN`] characters and a new username must not belong to
    /// another user. Returns the saved user.
    pub fn update_user(
        &self,
        username: &str,
        pwhash: &str,
        update: UserUpdate,
    ) -> DbResult<User> {
        let mut user = self.validate_user(username, pwhash)?;
        match update {
            UserUpdate::Email(email) => user.email = email,
            UserUpdate::Pwhash(new_hash) => {
                check_pwhash(&new_hash)?;
                user.pwhash = new_hash;
            }
            UserUpdate::Username(new_name) => {
                if new_name.is_empty() {
                    return Err(DbError::InvalidUser("username must not be empty".into()));
                }
                user.username = new_name;
            }
        }

        self.save_checked(&mut user, |u| {
            // The account may have changed since the credential check.
            let stored = self.retrieve::<User>(u.index)?;
            if stored.username != username || stored.pwhash != pwhash {
                return Err(DbError::InvalidCredentials {
                    username: username.to_string(),
                });
            }
            self.ensure_username_free(&u.username, u.index)
        })?;
        info!(id = user.index, username = %user.username, "user updated");
        Ok(user)
    }

    fn find_user(&self, username: &str) -> DbResult<Option<User>> {
        Ok(self
            .retrieve_all::<User>()?
            .into_iter()
            .find(|u| u.username == username))
    }

    fn ensure_username_free(&self, username: &str, own_id: u64) -> DbResult<()> {
        match self.find_user(username)? {
            Some(other) if other.index != own_id => Err(DbError::InvalidUser(format!(
                "username {username:?} is taken"
            ))),
            _ => Ok(()),
        }
    }

    pub fn retrieve_user_by_username(&self, username: &str) -> DbResult<User> {
        self.find_user(username)?
            .ok_or_else(|| DbError::NameNotFound {
                bucket: Bucket::User,
                name: username.to_string(),
                parent: None,
            })
    }

    /// The user with this username and password hash.
    ///
    /// A wrong hash and an unknown username fail the same way.
    pub fn validate_user(&self, username: &str, pwhash: &str) -> DbResult<User> {
        match self.find_user(username)? {
            Some(user) if user.pwhash == pwhash => Ok(user),
            _ => {
                debug!(username, "credential check failed");
                Err(DbError::InvalidCredentials {
                    username: username.to_string(),
                })
            }
        }
    }

    /// Remove a user. Connect requests filed by the user are kept.
    pub fn delete_user(&self, id: u64) -> DbResult<()> {
        self.delete::<User>(id)
    }

    /// The actor a user is linked to.
    pub fn user_actor(&self, user: &User) -> DbResult<AnyActor> {
        self.resolve_actor(&user.entity_type, user.entity_id)
    }

    /// File a request to connect `user` to an existing actor.
    pub fn request_connection(
        &self,
        user: &User,
        kind: ActorKind,
        actor_id: u64,
    ) -> DbResult<ConnectRequest> {
        self.retrieve_actor(kind, actor_id)?;
        self.retrieve::<User>(user.index)?;

        let mut request = ConnectRequest::new(user.index, kind, actor_id);
        self.save(&mut request)?;
        debug!(id = request.index, user = user.index, %kind, actor_id, "connect request filed");
        Ok(request)
    }

    /// Approve a pending request and link its user to the requested actor.
    ///
    /// The user becomes a verified member of that actor. Approving twice is
    /// a no-op.
    pub fn approve_request(&self, id: u64) -> DbResult<ConnectRequest> {
        let mut request = self.retrieve::<ConnectRequest>(id)?;
        if request.approved {
            return Ok(request);
        }

        let mut user = self.retrieve::<User>(request.user_id)?;
        user.entity_type = request.actor_kind.to_string();
        user.entity_id = request.actor_id;
        user.verified = true;
        self.save(&mut user)?;

        request.approved = true;
        self.save(&mut request)?;
        info!(id, user = user.index, "connect request approved");
        Ok(request)
    }

    /// Requests not yet approved, oldest first.
    pub fn pending_requests(&self) -> DbResult<Vec<ConnectRequest>> {
        Ok(self
            .retrieve_all::<ConnectRequest>()?
            .into_iter()
            .filter(|r| !r.approved)
            .collect())
    }
}
