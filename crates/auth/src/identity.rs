use echoes_core::UserId;

/// The authenticated caller for a request.
///
/// Only ever built by [`crate::TokenVerifier`] (or tests); handlers take it from
/// request extensions and never from client input.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    user_id: UserId,
}

impl Identity {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}
