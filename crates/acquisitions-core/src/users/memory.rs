use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::authorize::{guard_admin_demotion, guard_last_admin};
use crate::error::{CoreError, CoreResult};
use crate::identity::{Identity, UserId};

use super::{NewUser, UserChanges, UserStore};

struct StoredUser {
    identity: Identity,
    password_hash: String,
}

struct Inner {
    next_id: i64,
    users: BTreeMap<UserId, StoredUser>,
}

impl Inner {
    fn email_in_use(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.identity.email == email && Some(u.identity.id) != except)
    }

    fn admin_count(&self) -> usize {
        self.users.values().filter(|u| u.identity.is_admin()).count()
    }
}

/// In-process [`UserStore`] backed by an ordered map.
///
/// Ids are assigned sequentially from 1 and never reused. Emails are
/// stored lower-cased so uniqueness is case-insensitive.
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                users: BTreeMap::new(),
            }),
        }
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_user_by_id(&self, id: UserId) -> CoreResult<Identity> {
        let inner = self.inner.read().await;
        inner
            .users
            .get(&id)
            .map(|u| u.identity.clone())
            .ok_or(CoreError::UserNotFound(id))
    }

    async fn get_users(&self) -> CoreResult<Vec<Identity>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().map(|u| u.identity.clone()).collect())
    }

    async fn count_admins(&self) -> CoreResult<usize> {
        Ok(self.inner.read().await.admin_count())
    }

    async fn find_credentials(&self, email: &str) -> CoreResult<Option<(Identity, String)>> {
        let email = normalize_email(email);
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.identity.email == email)
            .map(|u| (u.identity.clone(), u.password_hash.clone())))
    }

    async fn create_user(&self, user: NewUser) -> CoreResult<Identity> {
        let email = normalize_email(&user.email);
        let mut inner = self.inner.write().await;
        if inner.email_in_use(&email, None) {
            return Err(CoreError::EmailTaken(email));
        }

        let id = UserId::new(inner.next_id);
        inner.next_id += 1;

        let now = Utc::now();
        let identity = Identity {
            id,
            name: user.name.trim().to_string(),
            email,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(
            id,
            StoredUser {
                identity: identity.clone(),
                password_hash: user.password_hash,
            },
        );

        tracing::info!(user_id = %id, role = %identity.role, "user created");
        Ok(identity)
    }

    async fn update_user(&self, id: UserId, changes: UserChanges) -> CoreResult<Identity> {
        let mut inner = self.inner.write().await;
        let admins = inner.admin_count();
        let current = inner
            .users
            .get(&id)
            .ok_or(CoreError::UserNotFound(id))?;
        guard_admin_demotion(&current.identity, changes.role, admins)?;

        let email = changes.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            if inner.email_in_use(email, Some(id)) {
                return Err(CoreError::EmailTaken(email.clone()));
            }
        }

        let stored = inner
            .users
            .get_mut(&id)
            .ok_or(CoreError::UserNotFound(id))?;
        if let Some(name) = changes.name {
            stored.identity.name = name.trim().to_string();
        }
        if let Some(email) = email {
            stored.identity.email = email;
        }
        if let Some(hash) = changes.password_hash {
            stored.password_hash = hash;
        }
        if let Some(role) = changes.role {
            stored.identity.role = role;
        }
        stored.identity.updated_at = Utc::now();

        tracing::info!(user_id = %id, "user updated");
        Ok(stored.identity.clone())
    }

    async fn delete_user(&self, actor: &Identity, id: UserId) -> CoreResult<Identity> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&id) {
            return Err(CoreError::UserNotFound(id));
        }
        // Judge the actor by their stored role, not the request-time snapshot.
        let acting = inner.users.get(&actor.id).map_or(actor, |u| &u.identity);
        guard_last_admin(acting, id, inner.admin_count())?;

        let removed = inner
            .users
            .remove(&id)
            .ok_or(CoreError::UserNotFound(id))?;
        tracing::info!(user_id = %id, actor_id = %actor.id, "user deleted");
        Ok(removed.identity)
    }
}
