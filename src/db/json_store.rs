// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Whole-document JSON store.
//!
//! The file is one object keyed by username, plus the reserved
//! [`keys::GROUPS`] entry. Every mutation goes through [`JsonStore::update`],
//! which applies the change to a draft copy, writes it to a temporary file,
//! renames it over the original and only then publishes the draft. All of
//! this happens under one write lock, so concurrent requests in this process
//! never overwrite each other's changes.

use super::keys;
use crate::models::{Group, Role, User};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed data file: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// In-memory view of the data file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    pub users: BTreeMap<String, User>,
    pub groups: BTreeMap<String, Group>,
}

impl Serialize for Store {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.users.len() + 1))?;
        for (username, user) in &self.users {
            map.serialize_entry(username, user)?;
        }
        map.serialize_entry(keys::GROUPS, &self.groups)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Store {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut raw = Map::<String, Value>::deserialize(deserializer)?;

        let groups = match raw.remove(keys::GROUPS) {
            Some(value) => serde_json::from_value(value).map_err(D::Error::custom)?,
            None => BTreeMap::new(),
        };

        let mut users = BTreeMap::new();
        for (username, value) in raw {
            let user: User = serde_json::from_value(value)
                .map_err(|e| D::Error::custom(format!("user {username}: {e}")))?;
            users.insert(username, user);
        }

        Ok(Store { users, groups })
    }
}

impl Store {
    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    pub fn user_mut(&mut self, username: &str) -> Option<&mut User> {
        self.users.get_mut(username)
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn group_mut(&mut self, id: &str) -> Option<&mut Group> {
        self.groups.get_mut(id)
    }

    /// Find a username by email, ignoring case.
    pub fn username_by_email(&self, email: &str) -> Option<&str> {
        let wanted = email.trim().to_lowercase();
        self.users
            .iter()
            .find(|(_, u)| u.email.to_lowercase() == wanted)
            .map(|(name, _)| name.as_str())
    }

    /// Find a teacher by class code, ignoring case.
    pub fn teacher_by_code(&self, code: &str) -> Option<&str> {
        let wanted = code.trim().to_uppercase();
        self.users
            .iter()
            .find(|(_, u)| {
                u.role == Role::Teacher
                    && u
                        .class_code
                        .as_deref()
                        .is_some_and(|c| c.to_uppercase() == wanted)
            })
            .map(|(name, _)| name.as_str())
    }

    /// All student accounts.
    pub fn students(&self) -> impl Iterator<Item = (&String, &User)> {
        self.users.iter().filter(|(_, u)| u.is_student())
    }

    /// Students who opted in to public leaderboards.
    pub fn leaderboard_students(&self) -> impl Iterator<Item = (&String, &User)> {
        self.students().filter(|(_, u)| u.show_on_leaderboards)
    }
}

/// Load the data file. A missing file is an empty store.
pub fn load(path: &Path) -> Result<Store, StoreError> {
    match std::fs::read(path) {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Store::default()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Store::default()),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Serialize the whole store and atomically replace the data file.
pub async fn save(path: &Path, store: &Store) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(store)?;
    let tmp = temp_path(path);

    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|e| StoreError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "fittrack_users.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Shared handle to the data file.
pub struct JsonStore {
    path: PathBuf,
    state: RwLock<Store>,
}

impl JsonStore {
    /// Open the store at `path`, loading existing data.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let store = load(&path)?;
        tracing::info!(
            path = %path.display(),
            users = store.users.len(),
            groups = store.groups.len(),
            "Data file loaded"
        );
        Ok(Self {
            path,
            state: RwLock::new(store),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a read-only closure against the current state.
    pub async fn read<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        let guard = self.state.read().await;
        f(&guard)
    }

    /// Clone of the current state.
    pub async fn snapshot(&self) -> Store {
        self.state.read().await.clone()
    }

    /// Apply a mutation and persist it.
    ///
    /// The closure works on a draft. If it returns an error, or the write
    /// fails, the draft is dropped and the published state is unchanged.
    pub async fn update<R, E>(&self, f: impl FnOnce(&mut Store) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut guard = self.state.write().await;
        let mut draft = guard.clone();
        let result = f(&mut draft)?;

        save(&self.path, &draft).await?;
        *guard = draft;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseEntry, VerificationStatus};
    use std::sync::Arc;

    fn sample_store() -> Store {
        let mut store = Store::default();
        let mut alice = User {
            email: "alice@school.sg".to_string(),
            password: "secret1".to_string(),
            name: "Alice".to_string(),
            gender: "f".to_string(),
            total_points: 120,
            house: Some("red".to_string()),
            friends: vec!["ghost".to_string()],
            ..Default::default()
        };
        alice.exercises.push(ExerciseEntry {
            name: "Push-Ups".to_string(),
            date: "2026-03-01".to_string(),
            duration: 10,
            verification_status: VerificationStatus::Mock,
            ..Default::default()
        });
        alice
            .extra
            .insert("nickname".to_string(), Value::String("Al".to_string()));
        store.users.insert("alice".to_string(), alice);
        store.groups.insert(
            "group_alice_20260301120000".to_string(),
            Group {
                id: "group_alice_20260301120000".to_string(),
                name: "Runners".to_string(),
                admin: "alice".to_string(),
                members: vec!["alice".to_string()],
                max_members: 10,
                ..Default::default()
            },
        );
        store
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = load(&dir.path().join("absent.json")).unwrap();
        assert!(store.users.is_empty());
        assert!(store.groups.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_reproduces_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        let store = sample_store();

        save(&path, &store).await.unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded, store);
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_groups_live_under_reserved_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        save(&path, &sample_store()).await.unwrap();

        let raw: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(raw["app_groups"]["group_alice_20260301120000"].is_object());
        assert_eq!(raw["alice"]["nickname"], "Al");
    }

    #[tokio::test]
    async fn test_failed_update_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("users.json")).unwrap();

        let result: Result<(), crate::error::AppError> = store
            .update(|s| {
                s.users.insert("bob".to_string(), User::default());
                Err(crate::error::AppError::bad_request("nope"))
            })
            .await;

        assert!(result.is_err());
        assert!(store.read(|s| s.users.is_empty()).await);
    }

    #[tokio::test]
    async fn test_concurrent_updates_do_not_lose_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::open(dir.path().join("users.json")).unwrap());
        store
            .update(|s| {
                s.users.insert("alice".to_string(), User::default());
                Ok::<_, StoreError>(())
            })
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update(|s| {
                        if let Some(u) = s.user_mut("alice") {
                            u.total_points += 5;
                        }
                        Ok::<_, StoreError>(())
                    })
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let on_disk = load(store.path()).unwrap();
        assert_eq!(on_disk.users["alice"].total_points, 100);
    }
}
