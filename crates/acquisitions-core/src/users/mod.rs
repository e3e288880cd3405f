//! User store collaborator.
//!
//! The Authentication Gate resolves credential subjects through
//! [`UserStore::get_user_by_id`]. Handlers use the remaining operations for
//! account CRUD. Implementations must apply the last-admin rules inside
//! the same critical section as the write they protect.

mod memory;

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::identity::{Identity, Role, UserId};

pub use memory::MemoryUserStore;

/// Fields required to register an account. `password_hash` is already
/// hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// A partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`CoreError::UserNotFound`](crate::CoreError::UserNotFound) when absent.
    async fn get_user_by_id(&self, id: UserId) -> CoreResult<Identity>;

    /// All users, ordered by id.
    async fn get_users(&self) -> CoreResult<Vec<Identity>>;

    async fn count_admins(&self) -> CoreResult<usize> {
        let users = self.get_users().await?;
        Ok(users.iter().filter(|u| u.is_admin()).count())
    }

    /// Looks up an account by email for sign-in, returning the stored
    /// password hash alongside the identity.
    async fn find_credentials(&self, email: &str) -> CoreResult<Option<(Identity, String)>>;

    async fn create_user(&self, user: NewUser) -> CoreResult<Identity>;

    /// Fails with `InvalidOperation` when the change would demote the last
    /// admin (see [`guard_admin_demotion`](crate::guard_admin_demotion)).
    async fn update_user(&self, id: UserId, changes: UserChanges) -> CoreResult<Identity>;

    /// Removes the account on behalf of `actor` and returns its last
    /// snapshot. An admin removing themselves while no other admin exists
    /// is refused (see [`guard_last_admin`](crate::guard_last_admin)).
    async fn delete_user(&self, actor: &Identity, id: UserId) -> CoreResult<Identity>;
}
