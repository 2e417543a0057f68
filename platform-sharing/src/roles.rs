//! Role resolution
//!
//! Converts roles as requested by the caller into canonical [`SharedRole`]
//! records. Resolution is a pure mapping: existence of the role or audience
//! is checked by the propagation engine, not here.

use crate::error::{SharingError, SharingResult};
use crate::models::{RoleAudienceSpec, SharedRole};

/// Resolve requested roles into shared roles.
///
/// Produces exactly one [`SharedRole`] per input, in input order, without
/// de-duplication.
///
/// # Errors
///
/// [`SharingError::InvalidRole`] for the first role that has no audience, a
/// blank display name, or a blank audience display name.
///
/// # Examples
///
/// ```
/// use platform_sharing::{resolve_roles, AudienceType, RoleAudienceSpec};
///
/// let roles = vec![RoleAudienceSpec::new("auditor", "Acme", AudienceType::Organization)];
/// let shared = resolve_roles(&roles).unwrap();
/// assert_eq!(shared[0].role_name, "auditor");
/// assert_eq!(shared[0].audience_name, "Acme");
/// ```
pub fn resolve_roles(roles: &[RoleAudienceSpec]) -> SharingResult<Vec<SharedRole>> {
    roles.iter().map(resolve_role).collect()
}

fn resolve_role(role: &RoleAudienceSpec) -> SharingResult<SharedRole> {
    if role.display_name.trim().is_empty() {
        return Err(invalid(role, "role display name is blank"));
    }

    let audience = role
        .audience
        .as_ref()
        .ok_or_else(|| invalid(role, "audience is missing"))?;

    if audience.display.trim().is_empty() {
        return Err(invalid(role, "audience display name is blank"));
    }

    Ok(SharedRole {
        role_name: role.display_name.clone(),
        audience_name: audience.display.clone(),
        audience_type: audience.audience_type,
    })
}

fn invalid(role: &RoleAudienceSpec, reason: &str) -> SharingError {
    SharingError::InvalidRole {
        role: role.display_name.clone(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Audience, AudienceType};

    #[test]
    fn test_resolve_preserves_order_and_cardinality() {
        let roles = vec![
            RoleAudienceSpec::new("editor", "Console", AudienceType::Application),
            RoleAudienceSpec::new("viewer", "Acme", AudienceType::Organization),
            RoleAudienceSpec::new("editor", "Console", AudienceType::Application),
        ];

        let shared = resolve_roles(&roles).unwrap();

        assert_eq!(shared.len(), 3);
        assert_eq!(
            shared[0],
            SharedRole {
                role_name: "editor".to_string(),
                audience_name: "Console".to_string(),
                audience_type: AudienceType::Application,
            }
        );
        assert_eq!(shared[1].role_name, "viewer");
        assert_eq!(shared[1].audience_type, AudienceType::Organization);
        assert_eq!(shared[0], shared[2]);
    }

    #[test]
    fn test_resolve_empty() {
        assert!(resolve_roles(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_missing_audience_is_invalid_role() {
        let roles = vec![
            RoleAudienceSpec::new("editor", "Console", AudienceType::Application),
            RoleAudienceSpec {
                display_name: "orphan".to_string(),
                audience: None,
            },
        ];

        let err = resolve_roles(&roles).unwrap_err();
        assert_eq!(
            err,
            SharingError::InvalidRole {
                role: "orphan".to_string(),
                reason: "audience is missing".to_string(),
            }
        );
    }

    #[test]
    fn test_blank_names_are_invalid() {
        let blank_role = RoleAudienceSpec::new(" ", "Console", AudienceType::Application);
        assert!(matches!(
            resolve_roles(&[blank_role]),
            Err(SharingError::InvalidRole { .. })
        ));

        let blank_audience = RoleAudienceSpec {
            display_name: "editor".to_string(),
            audience: Some(Audience::new("", AudienceType::Organization)),
        };
        assert!(matches!(
            resolve_roles(&[blank_audience]),
            Err(SharingError::InvalidRole { .. })
        ));
    }
}
