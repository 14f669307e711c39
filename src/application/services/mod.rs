mod notification_buffer;
mod session_manager;
mod token_store;

pub use notification_buffer::NotificationBuffer;
pub use session_manager::SessionManager;
pub use token_store::{AuthorizationSnapshot, TokenStore};
