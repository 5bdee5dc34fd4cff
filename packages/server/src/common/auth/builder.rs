use super::{AdminCapability, AuthError};

/// Entry point for authorization checks
///
/// Usage:
/// ```text
/// Actor::new(user_id, is_admin)
///     .can(AdminCapability::RunLeadJobs)
///     .check(deps)?;
/// ```
pub struct Actor {
    actor_id: String,
    is_admin: bool,
}

impl Actor {
    /// Create a new actor for authorization checks
    ///
    /// # Arguments
    /// * `actor_id` - The subject (user id) of the actor
    /// * `is_admin` - Admin flag from the verified JWT
    pub fn new(actor_id: impl Into<String>, is_admin: bool) -> Self {
        Self {
            actor_id: actor_id.into(),
            is_admin,
        }
    }

    /// Specify what capability the actor needs
    pub fn can(self, capability: AdminCapability) -> CapabilityBuilder {
        CapabilityBuilder {
            actor_id: self.actor_id,
            is_admin: self.is_admin,
            capability,
        }
    }
}

/// Builder after specifying capability
pub struct CapabilityBuilder {
    actor_id: String,
    is_admin: bool,
    capability: AdminCapability,
}

impl CapabilityBuilder {
    /// Perform the authorization check
    pub fn check<D>(self, deps: &D) -> Result<(), AuthError>
    where
        D: HasAuthContext,
    {
        check_admin_permission(&self.actor_id, self.is_admin, self.capability, deps)
    }
}

/// Trait for dependencies that can perform auth checks
pub trait HasAuthContext: Send + Sync {
    fn admin_identifiers(&self) -> &[String];
}

/// Core permission check function
///
/// The `is_admin` flag comes from the verified JWT, where it was set at
/// issuance by checking the subject against the admin identifier set. The
/// subject is re-checked against the current set here, so a token issued
/// before an operator was removed from the role set stops working without
/// waiting for expiry.
fn check_admin_permission<D>(
    actor_id: &str,
    is_admin: bool,
    capability: AdminCapability,
    deps: &D,
) -> Result<(), AuthError>
where
    D: HasAuthContext,
{
    if !capability.requires_admin() {
        return Ok(());
    }

    if !is_admin {
        return Err(AuthError::AdminRequired);
    }

    if !deps.admin_identifiers().iter().any(|id| id == actor_id) {
        return Err(AuthError::AdminRequired);
    }

    Ok(())
}
