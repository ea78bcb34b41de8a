//! Caller identity carried alongside a request.

use uuid::Uuid;

/// Who is making a request, as resolved by the transport layer.
///
/// The orchestration service copies these values into the audit fields of the
/// flights it creates. An anonymous context leaves them empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Authenticated user, if any
    pub user_id: Option<Uuid>,
    /// Organization the user acts on behalf of, if any
    pub organization_id: Option<Uuid>,
}

impl RequestContext {
    /// A context with no caller identity.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            user_id: None,
            organization_id: None,
        }
    }

    /// A context for an authenticated user.
    #[must_use]
    pub const fn for_user(user_id: Uuid, organization_id: Option<Uuid>) -> Self {
        Self {
            user_id: Some(user_id),
            organization_id,
        }
    }
}
