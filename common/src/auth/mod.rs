pub mod credential_store;
pub mod gate;

pub use credential_store::CredentialStore;
pub use gate::AccessGate;
