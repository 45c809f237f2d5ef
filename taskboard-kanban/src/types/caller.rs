//! Request caller identity

use super::ids::{ActorId, OrganizationId};
use serde::{Deserialize, Serialize};

/// Who is issuing a request, and on behalf of which organization.
///
/// Authentication happens upstream; by the time a caller reaches the engine
/// its identity is trusted and only used for tenant scoping and audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub actor: ActorId,
    pub organization: OrganizationId,
}

impl Caller {
    pub fn new(actor: impl Into<ActorId>, organization: impl Into<OrganizationId>) -> Self {
        Self {
            actor: actor.into(),
            organization: organization.into(),
        }
    }
}
