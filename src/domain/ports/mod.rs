mod auth_port;
mod credential_storage_port;
mod notifier_port;

pub use auth_port::AuthPort;
pub use credential_storage_port::CredentialStoragePort;
pub use notifier_port::DesktopNotifierPort;

#[cfg(test)]
pub use notifier_port::MockDesktopNotifierPort;

#[cfg(test)]
pub mod mocks {
    pub use super::auth_port::mock::MockAuthPort;
    pub use super::credential_storage_port::mock::{
        FailingCredentialStorage, MockCredentialStorage,
    };
}
