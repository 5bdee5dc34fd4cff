/// Capabilities in the LeadScout platform
///
/// The lead discovery pipeline is an admin-only surface: discovery jobs hit
/// external APIs and third-party websites, so only operators may trigger them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCapability {
    /// Start lead discovery jobs
    RunLeadJobs,

    /// Export discovered leads as CSV
    ExportLeads,

    /// Full admin access to all operations
    FullAdmin,
}

impl AdminCapability {
    /// Check if this capability requires admin access
    pub fn requires_admin(&self) -> bool {
        // All capabilities in this system require admin access
        true
    }
}
