use crate::domain::entities::UserId;

/// AdminPolicy trait - decides who may use admin commands.
///
/// The default deployment is a single static id, but the dispatcher only
/// sees this predicate, so role lists or multiple admins can replace it.
pub trait AdminPolicy: Send + Sync {
    fn is_admin(&self, user: UserId) -> bool;

    /// Whether any admin is configured at all. An unconfigured policy
    /// degrades admin commands without crashing the bot.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Single static admin identifier, loaded from config or `ADMIN_ID`.
pub struct StaticAdmin {
    admin_id: Option<UserId>,
}

impl StaticAdmin {
    pub fn new(admin_id: Option<UserId>) -> Self {
        Self { admin_id }
    }
}

impl AdminPolicy for StaticAdmin {
    fn is_admin(&self, user: UserId) -> bool {
        self.admin_id == Some(user)
    }

    fn is_configured(&self) -> bool {
        self.admin_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_admin_matches_only_configured_id() {
        let policy = StaticAdmin::new(Some(42));
        assert!(policy.is_admin(42));
        assert!(!policy.is_admin(43));
        assert!(policy.is_configured());
    }

    #[test]
    fn unconfigured_policy_denies_everyone() {
        let policy = StaticAdmin::new(None);
        assert!(!policy.is_admin(42));
        assert!(!policy.is_configured());
    }
}
