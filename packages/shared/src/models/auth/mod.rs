pub mod responses;

/// The verified identity behind a token: who is acting and how to show them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub user_id: String,
    pub display_name: String,
}

impl AuthenticatedIdentity {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        AuthenticatedIdentity {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}
