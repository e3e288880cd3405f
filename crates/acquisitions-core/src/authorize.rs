//! Authorization Gate policies.
//!
//! Every check here is a pure function of the identity attached to the
//! request and the target of the operation. A missing identity is always
//! reported as [`AuthFailure::MissingIdentity`], never as forbidden.

use crate::error::{AuthFailure, CoreError, CoreResult};
use crate::identity::{Identity, Role, UserId};
use crate::users::UserChanges;

/// Outcome of an authorization check: `Ok(())` allows, `Err` denies.
pub type Decision = CoreResult<()>;

/// Operations guarded by the self-or-admin ownership rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnedAction {
    Update,
    Delete,
}

impl OwnedAction {
    fn denial(self) -> &'static str {
        match self {
            OwnedAction::Update => "Access denied. You can only update your own information.",
            OwnedAction::Delete => "Access denied. You can only delete your own account.",
        }
    }
}

fn authenticated(identity: Option<&Identity>) -> CoreResult<&Identity> {
    identity.ok_or(CoreError::Unauthenticated(AuthFailure::MissingIdentity))
}

pub fn require_role(identity: Option<&Identity>, role: Role) -> Decision {
    let identity = authenticated(identity)?;
    if identity.role == role {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Access denied. {role} role required."
        )))
    }
}

pub fn require_any_role(identity: Option<&Identity>, roles: &[Role]) -> Decision {
    let identity = authenticated(identity)?;
    if roles.contains(&identity.role) {
        return Ok(());
    }
    let accepted: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
    Err(CoreError::Forbidden(format!(
        "Access denied. One of the following roles required: {}",
        accepted.join(", ")
    )))
}

/// Allows when the caller owns `target` or is an admin.
pub fn require_self_or_admin(
    identity: Option<&Identity>,
    target: UserId,
    action: OwnedAction,
) -> Decision {
    let identity = authenticated(identity)?;
    if identity.id == target || identity.is_admin() {
        Ok(())
    } else {
        Err(CoreError::Forbidden(action.denial().to_string()))
    }
}

/// Applies the field-level rule for role changes.
///
/// Admins may set any role. A non-admin updating their own record has
/// the `role` field dropped and the rest of the update proceeds. A
/// non-admin touching another record's role is refused outright.
pub fn restrict_self_update(
    actor: &Identity,
    target: UserId,
    mut changes: UserChanges,
) -> CoreResult<UserChanges> {
    if actor.is_admin() || changes.role.is_none() {
        return Ok(changes);
    }
    if actor.id != target {
        return Err(CoreError::Forbidden(
            "Access denied. Only admins can change user roles.".to_string(),
        ));
    }
    tracing::debug!(user_id = %actor.id, "dropping role change from non-admin self-update");
    changes.role = None;
    Ok(changes)
}

/// Refuses an admin's self-deletion while they are the only admin left.
pub fn guard_last_admin(actor: &Identity, target: UserId, admin_count: usize) -> Decision {
    if actor.id == target && actor.is_admin() && admin_count <= 1 {
        return Err(CoreError::InvalidOperation(
            "Cannot delete the last admin account.".to_string(),
        ));
    }
    Ok(())
}

/// Refuses taking the admin role away from the only remaining admin.
pub fn guard_admin_demotion(target: &Identity, new_role: Option<Role>, admin_count: usize) -> Decision {
    match new_role {
        Some(role) if target.is_admin() && role != Role::Admin && admin_count <= 1 => {
            Err(CoreError::InvalidOperation(
                "Cannot remove the admin role from the last admin account.".to_string(),
            ))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn identity(id: i64, role: Role) -> Identity {
        let now = Utc::now();
        Identity {
            id: UserId::new(id),
            name: format!("user{id}"),
            email: format!("user{id}@example.com"),
            role,
            created_at: now,
            updated_at: now,
        }
    }

    fn forbidden_message(decision: Decision) -> String {
        match decision {
            Err(CoreError::Forbidden(msg)) => msg,
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    // --- require_role ---

    #[test]
    fn require_role_allows_matching_role() {
        let admin = identity(1, Role::Admin);
        assert!(require_role(Some(&admin), Role::Admin).is_ok());
    }

    #[test]
    fn require_role_rejects_other_roles() {
        let user = identity(2, Role::User);
        let msg = forbidden_message(require_role(Some(&user), Role::Admin));
        assert_eq!(msg, "Access denied. admin role required.");
    }

    #[test]
    fn require_role_without_identity_is_unauthenticated() {
        assert!(matches!(
            require_role(None, Role::Admin),
            Err(CoreError::Unauthenticated(AuthFailure::MissingIdentity))
        ));
    }

    // --- require_any_role ---

    #[test]
    fn require_any_role_allows_member() {
        let user = identity(2, Role::User);
        assert!(require_any_role(Some(&user), &[Role::User, Role::Admin]).is_ok());
    }

    #[test]
    fn require_any_role_lists_accepted_roles() {
        let guest = identity(3, Role::Guest);
        let msg = forbidden_message(require_any_role(Some(&guest), &[Role::User, Role::Admin]));
        assert_eq!(
            msg,
            "Access denied. One of the following roles required: user, admin"
        );
    }

    #[test]
    fn require_any_role_without_identity_is_unauthenticated() {
        assert!(matches!(
            require_any_role(None, &[Role::User]),
            Err(CoreError::Unauthenticated(AuthFailure::MissingIdentity))
        ));
    }

    // --- require_self_or_admin ---

    #[test]
    fn owner_may_act_on_self() {
        let user = identity(5, Role::User);
        assert!(require_self_or_admin(Some(&user), UserId::new(5), OwnedAction::Update).is_ok());
    }

    #[test]
    fn admin_may_act_on_anyone() {
        let admin = identity(1, Role::Admin);
        assert!(require_self_or_admin(Some(&admin), UserId::new(9), OwnedAction::Delete).is_ok());
    }

    #[test]
    fn non_owner_is_forbidden_with_action_specific_message() {
        let user = identity(5, Role::User);
        let update = forbidden_message(require_self_or_admin(
            Some(&user),
            UserId::new(6),
            OwnedAction::Update,
        ));
        assert_eq!(
            update,
            "Access denied. You can only update your own information."
        );
        let delete = forbidden_message(require_self_or_admin(
            Some(&user),
            UserId::new(6),
            OwnedAction::Delete,
        ));
        assert_eq!(delete, "Access denied. You can only delete your own account.");
    }

    #[test]
    fn ownership_check_is_deterministic() {
        let user = identity(5, Role::User);
        for target in [5, 6] {
            let first = require_self_or_admin(Some(&user), UserId::new(target), OwnedAction::Update);
            let second = require_self_or_admin(Some(&user), UserId::new(target), OwnedAction::Update);
            assert_eq!(first.is_ok(), second.is_ok());
            assert_eq!(format!("{first:?}"), format!("{second:?}"));
        }
    }

    #[test]
    fn ownership_without_identity_is_unauthenticated() {
        assert!(matches!(
            require_self_or_admin(None, UserId::new(1), OwnedAction::Update),
            Err(CoreError::Unauthenticated(AuthFailure::MissingIdentity))
        ));
    }

    // --- restrict_self_update ---

    #[test]
    fn non_admin_self_update_drops_role() {
        let user = identity(5, Role::User);
        let changes = UserChanges {
            name: Some("New".to_string()),
            role: Some(Role::Admin),
            ..Default::default()
        };
        let restricted = restrict_self_update(&user, UserId::new(5), changes).unwrap();
        assert_eq!(restricted.role, None);
        assert_eq!(restricted.name.as_deref(), Some("New"));
    }

    #[test]
    fn admin_keeps_role_change() {
        let admin = identity(1, Role::Admin);
        let changes = UserChanges {
            role: Some(Role::Admin),
            ..Default::default()
        };
        let restricted = restrict_self_update(&admin, UserId::new(5), changes).unwrap();
        assert_eq!(restricted.role, Some(Role::Admin));
    }

    #[test]
    fn non_admin_changing_someone_elses_role_is_forbidden() {
        let user = identity(5, Role::User);
        let changes = UserChanges {
            role: Some(Role::Admin),
            ..Default::default()
        };
        let msg = forbidden_message(
            restrict_self_update(&user, UserId::new(6), changes).map(|_| ()),
        );
        assert_eq!(msg, "Access denied. Only admins can change user roles.");
    }

    // --- guard_last_admin ---

    #[test]
    fn last_admin_cannot_delete_self() {
        let admin = identity(1, Role::Admin);
        let err = guard_last_admin(&admin, UserId::new(1), 1).unwrap_err();
        assert!(
            matches!(err, CoreError::InvalidOperation(ref m) if m == "Cannot delete the last admin account.")
        );
    }

    #[test]
    fn admin_may_delete_self_when_another_admin_exists() {
        let admin = identity(1, Role::Admin);
        assert!(guard_last_admin(&admin, UserId::new(1), 2).is_ok());
    }

    #[test]
    fn guard_ignores_other_targets_and_non_admins() {
        let admin = identity(1, Role::Admin);
        assert!(guard_last_admin(&admin, UserId::new(4), 1).is_ok());
        let user = identity(4, Role::User);
        assert!(guard_last_admin(&user, UserId::new(4), 0).is_ok());
    }

    // --- guard_admin_demotion ---

    #[test]
    fn last_admin_cannot_be_demoted() {
        let admin = identity(1, Role::Admin);
        let err = guard_admin_demotion(&admin, Some(Role::User), 1).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidOperation(ref m)
                if m == "Cannot remove the admin role from the last admin account."
        ));
    }

    #[test]
    fn demotion_allowed_while_other_admins_remain() {
        let admin = identity(1, Role::Admin);
        assert!(guard_admin_demotion(&admin, Some(Role::User), 2).is_ok());
        assert!(guard_admin_demotion(&admin, Some(Role::Admin), 1).is_ok());
        assert!(guard_admin_demotion(&admin, None, 1).is_ok());
        let user = identity(2, Role::User);
        assert!(guard_admin_demotion(&user, Some(Role::User), 0).is_ok());
    }
}
