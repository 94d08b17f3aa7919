//! Request context carrying the authenticated caller.

use serde::{Deserialize, Serialize};

use medialib_core::types::UserId;

/// Context for the current, already-authorized request.
///
/// Passed into service methods so that every mutation knows *who* is
/// acting. Constructing one asserts that authorization has succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user's ID.
    pub user_id: UserId,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}
