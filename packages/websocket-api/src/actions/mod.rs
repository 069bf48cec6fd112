pub mod connect;
pub mod default;
pub mod disconnect;

use shared::models::game_room::ConnectionSender;

/// What the socket loop remembers about an accepted connection.
#[derive(Debug, Clone)]
pub struct ConnectedSession {
    pub connection_id: String,
    pub user_id: String,
    pub game_id: Option<String>,
    pub sender: ConnectionSender,
}

impl ConnectedSession {
    pub fn is_lobby(&self) -> bool {
        self.game_id.is_none()
    }
}
