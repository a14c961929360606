use std::sync::Arc;

use crate::error::AppError;

use super::credential_store::CredentialStore;

/// Fronts every operation with the appropriate identity check.
///
/// Tenant calls authenticate against the credential store; administrative
/// calls compare a shared secret. The two grants are independent.
pub struct AccessGate {
    credentials: Arc<CredentialStore>,
    admin_secret: String,
}

impl AccessGate {
    pub fn new(credentials: Arc<CredentialStore>, admin_secret: impl Into<String>) -> Self {
        Self {
            credentials,
            admin_secret: admin_secret.into(),
        }
    }

    /// Refusal is uniform: an unknown username and a wrong password produce
    /// the same error.
    pub async fn authorize_tenant(&self, username: &str, password: &str) -> Result<(), AppError> {
        if self.credentials.verify(username, password).await? {
            Ok(())
        } else {
            Err(AppError::InvalidCredentials)
        }
    }

    pub fn authorize_admin(&self, secret: &str) -> Result<(), AppError> {
        if secret == self.admin_secret {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn gate_with_user() -> (tempfile::TempDir, AccessGate) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CredentialStore::open(dir.path().join("users.json"))
            .await
            .expect("store");
        store.add_user("alice", "pw1").await.expect("add");
        (dir, AccessGate::new(Arc::new(store), "topsecret"))
    }

    #[tokio::test]
    async fn tenant_authorization_follows_credentials() {
        let (_dir, gate) = gate_with_user().await;

        assert!(gate.authorize_tenant("alice", "pw1").await.is_ok());

        let wrong_password = gate.authorize_tenant("alice", "nope").await.unwrap_err();
        let unknown_user = gate.authorize_tenant("mallory", "pw1").await.unwrap_err();
        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_user, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn admin_authorization_is_exact_match() {
        let (_dir, gate) = gate_with_user().await;

        assert!(gate.authorize_admin("topsecret").is_ok());
        assert!(matches!(
            gate.authorize_admin("TOPSECRET").unwrap_err(),
            AppError::Forbidden
        ));
    }

    #[tokio::test]
    async fn grants_are_independent() {
        let (_dir, gate) = gate_with_user().await;

        // Knowing the admin secret grants no tenant access and vice versa.
        assert!(gate.authorize_tenant("alice", "topsecret").await.is_err());
        assert!(gate.authorize_admin("pw1").is_err());
    }
}
