use crate::models::user::{User, UserRole};

/// Visibility boundary applied to ownership-sensitive lookups.
///
/// Administrators see every user's records, regular users only their own.
/// Repositories take a `Scope` so the role-to-visibility mapping lives in one
/// place instead of being re-derived inside every service method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Lookups constrained to resources owned by this user id
    SelfOnly(i64),
    /// Unconstrained lookups across all users
    Unrestricted,
}

impl Scope {
    /// Derive the scope an actor operates under
    pub fn of(actor: &User) -> Self {
        match actor.role {
            UserRole::Admin => Scope::Unrestricted,
            UserRole::User => Scope::SelfOnly(actor.id),
        }
    }

    /// Whether a resource owned by `user_id` is visible under this scope
    pub fn allows(&self, user_id: i64) -> bool {
        match self {
            Scope::SelfOnly(id) => *id == user_id,
            Scope::Unrestricted => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_role(id: i64, role: UserRole) -> User {
        User {
            id,
            username: format!("user{}", id),
            display_name: format!("User {}", id),
            role,
            password_hash: "hash".to_string(),
            refresh_token: None,
            logout_timestamp: None,
        }
    }

    #[test]
    fn test_admin_scope_is_unrestricted() {
        let admin = user_with_role(1, UserRole::Admin);
        assert_eq!(Scope::of(&admin), Scope::Unrestricted);
        assert!(Scope::of(&admin).allows(42));
    }

    #[test]
    fn test_user_scope_is_self_only() {
        let user = user_with_role(2, UserRole::User);
        assert_eq!(Scope::of(&user), Scope::SelfOnly(2));
        assert!(Scope::of(&user).allows(2));
        assert!(!Scope::of(&user).allows(3));
    }
}
