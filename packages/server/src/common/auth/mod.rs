/// Authorization module for LeadScout
///
/// Provides a fluent API for authorization checks in handler code:
///
/// ```text
/// use crate::common::auth::{Actor, AdminCapability};
///
/// // In a handler:
/// Actor::new(&user.user_id, user.is_admin)
///     .can(AdminCapability::RunLeadJobs)
///     .check(deps.as_ref())?;
/// ```
///
/// This pattern keeps authorization logic next to the operation it guards,
/// not spread through the routing layer.

mod errors;
mod capability;
mod builder;

pub use errors::AuthError;
pub use capability::AdminCapability;
pub use builder::{Actor, CapabilityBuilder, HasAuthContext};
