//! Credential storage adapters.

#[cfg(feature = "keyring")]
mod keyring_storage;
mod memory_storage;
mod record;

#[cfg(feature = "keyring")]
pub use keyring_storage::KeyringCredentialStorage;
pub use memory_storage::MemoryCredentialStorage;
pub use record::SessionRecord;
