//! Tier precedence.

use access_tier_sdk::{AccessTier, RoleSet};

/// Combine the settled signals into exactly one tier.
///
/// Admin role wins over everything, then a paid entitlement, then free-tier
/// eligibility. Degraded signals arrive here already replaced by their most
/// restrictive value, so any failure can only lower the result.
#[must_use]
pub fn decide_tier(roles: &RoleSet, entitled: bool, eligible: bool) -> AccessTier {
    if roles.is_admin() {
        AccessTier::Admin
    } else if entitled {
        AccessTier::Premium
    } else if eligible {
        AccessTier::Free
    } else {
        AccessTier::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(labels: &[&str]) -> RoleSet {
        labels.iter().copied().collect()
    }

    #[test]
    fn precedence_table() {
        let admin = roles(&["admin"]);
        let plain = roles(&["user"]);
        let cases = [
            (&admin, false, false, AccessTier::Admin),
            (&admin, true, false, AccessTier::Admin),
            (&admin, false, true, AccessTier::Admin),
            (&admin, true, true, AccessTier::Admin),
            (&plain, true, false, AccessTier::Premium),
            (&plain, true, true, AccessTier::Premium),
            (&plain, false, true, AccessTier::Free),
            (&plain, false, false, AccessTier::None),
        ];
        for (roles, entitled, eligible, expected) in cases {
            assert_eq!(
                decide_tier(roles, entitled, eligible),
                expected,
                "roles={roles:?} entitled={entitled} eligible={eligible}"
            );
        }
    }

    #[test]
    fn moderator_gets_no_override() {
        let moderator = roles(&["moderator"]);
        assert_eq!(decide_tier(&moderator, false, false), AccessTier::None);
        assert_eq!(decide_tier(&moderator, false, true), AccessTier::Free);
    }

    #[test]
    fn empty_roles_fall_through_to_entitlement() {
        assert_eq!(decide_tier(&RoleSet::empty(), true, false), AccessTier::Premium);
    }
}
