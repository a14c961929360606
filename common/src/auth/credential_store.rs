use std::{
    collections::BTreeMap,
    io::Write,
    path::{Path, PathBuf},
};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::AppError;

/// Durable username -> password-hash mapping backing all authentication.
///
/// The whole mapping is read, modified and rewritten on every mutation. The
/// mutex serializes those cycles and every write lands through a temp file
/// plus rename, so a concurrent reader never observes a half-written file.
pub struct CredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CredentialStore {
    /// Opens the store, creating an empty mapping file if none exists yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let store = Self {
            path,
            lock: Mutex::new(()),
        };

        let _guard = store.lock.lock().await;
        if !tokio::fs::try_exists(&store.path).await? {
            store.write_map(&BTreeMap::new()).await?;
        }
        drop(_guard);

        Ok(store)
    }

    pub async fn add_user(&self, username: &str, password: &str) -> Result<(), AppError> {
        let hash = hash_password(password).await?;

        let _guard = self.lock.lock().await;
        let mut users = self.read_map().await?;
        if users.contains_key(username) {
            return Err(AppError::AlreadyExists(format!("user '{username}'")));
        }
        users.insert(username.to_owned(), hash);
        self.write_map(&users).await?;

        info!(%username, "stored credentials for new user");
        Ok(())
    }

    pub async fn delete_user(&self, username: &str) -> Result<(), AppError> {
        let _guard = self.lock.lock().await;
        let mut users = self.read_map().await?;
        if users.remove(username).is_none() {
            return Err(AppError::NotFound(format!("user '{username}'")));
        }
        self.write_map(&users).await?;

        info!(%username, "removed user credentials");
        Ok(())
    }

    /// Returns false for unknown usernames as well as wrong passwords, so
    /// callers cannot tell the two apart.
    pub async fn verify(&self, username: &str, password: &str) -> Result<bool, AppError> {
        let stored = {
            let _guard = self.lock.lock().await;
            self.read_map().await?.remove(username)
        };

        match stored {
            Some(hash) => verify_password(password, hash).await,
            None => Ok(false),
        }
    }

    pub async fn list_users(&self) -> Result<Vec<String>, AppError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_map().await?.into_keys().collect())
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>, AppError> {
        let raw = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn write_map(&self, users: &BTreeMap<String, String>) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(users)?;
        let path = self.path.clone();
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<(), AppError> {
            let mut file = tempfile::NamedTempFile::new_in(&dir)?;
            file.write_all(&json)?;
            file.persist(&path).map_err(|err| AppError::Io(err.error))?;
            Ok(())
        })
        .await??;

        Ok(())
    }
}

async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| AppError::Internal(format!("password hashing failed: {err}")))
    })
    .await?
}

async fn verify_password(password: &str, stored: String) -> Result<bool, AppError> {
    let password = password.to_owned();
    let matches = tokio::task::spawn_blocking(move || {
        PasswordHash::new(&stored)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    })
    .await?;

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> (tempfile::TempDir, CredentialStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CredentialStore::open(dir.path().join("users.json"))
            .await
            .expect("store should open");
        (dir, store)
    }

    #[tokio::test]
    async fn open_creates_empty_mapping_file() {
        let (dir, _store) = temp_store().await;
        let raw = tokio::fs::read_to_string(dir.path().join("users.json"))
            .await
            .expect("file should exist");
        assert_eq!(raw.trim(), "{}");
    }

    #[tokio::test]
    async fn add_then_verify_roundtrip() {
        let (_dir, store) = temp_store().await;

        store.add_user("alice", "pw1").await.expect("add");
        assert!(store.verify("alice", "pw1").await.unwrap());
        assert!(!store.verify("alice", "wrong").await.unwrap());
        assert!(!store.verify("nobody", "pw1").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_add_keeps_original_hash() {
        let (_dir, store) = temp_store().await;

        store.add_user("alice", "pw1").await.expect("add");
        let err = store.add_user("alice", "pw2").await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));

        // The first password still authenticates, the rejected one does not.
        assert!(store.verify("alice", "pw1").await.unwrap());
        assert!(!store.verify("alice", "pw2").await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_user_and_second_delete_is_not_found() {
        let (_dir, store) = temp_store().await;

        store.add_user("alice", "pw1").await.expect("add");
        store.add_user("bob", "pw2").await.expect("add");

        store.delete_user("alice").await.expect("delete");
        assert_eq!(store.list_users().await.unwrap(), vec!["bob".to_string()]);
        assert!(!store.verify("alice", "pw1").await.unwrap());

        let err = store.delete_user("alice").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn mapping_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("users.json");

        let store = CredentialStore::open(path.clone()).await.expect("open");
        store.add_user("alice", "pw1").await.expect("add");
        drop(store);

        let reopened = CredentialStore::open(path.clone()).await.expect("reopen");
        assert!(reopened.verify("alice", "pw1").await.unwrap());
        assert_eq!(
            reopened.list_users().await.unwrap(),
            vec!["alice".to_string()]
        );
    }
}
