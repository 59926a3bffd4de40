//! In-memory [`RepositoryClient`] used by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use github_client::{
    reason_phrase, DirectoryEntry, EntryKind, Error as ClientError, Identity, Repository,
    RepositoryClient, NOT_APPLICABLE,
};

use crate::traversal::{FileHandle, PendingUpload};
use crate::NetDiskResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedUpload {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub content: Vec<u8>,
    pub message: Option<String>,
}

#[derive(Default)]
pub(crate) struct FakeClient {
    pub identity: Option<Identity>,
    pub repositories: Vec<Repository>,
    pub repositories_status: Option<u16>,
    pub listings: Mutex<HashMap<(String, String), Vec<DirectoryEntry>>>,
    pub failing_listings: HashSet<(String, String)>,
    /// Absolute path -> (status, message)
    pub upload_failures: HashMap<String, (u16, String)>,
    pub create_status: Option<(u16, String)>,
    pub uploads: Mutex<Vec<RecordedUpload>>,
    pub listing_calls: Mutex<Vec<(String, String)>>,
}

impl FakeClient {
    pub fn with_identity(mut self, login: &str) -> Self {
        self.identity = Some(Identity {
            id: 1,
            login: login.to_string(),
            avatar_url: String::new(),
        });
        self
    }

    pub fn with_repository(mut self, id: u64, name: &str) -> Self {
        self.repositories.push(repository(id, name));
        self
    }

    pub fn with_listing(self, repo: &str, path: &str, entries: Vec<DirectoryEntry>) -> Self {
        self.listings
            .lock()
            .unwrap()
            .insert((repo.to_string(), path.to_string()), entries);
        self
    }

    pub fn with_failing_listing(mut self, repo: &str, path: &str) -> Self {
        self.failing_listings
            .insert((repo.to_string(), path.to_string()));
        self
    }

    pub fn with_upload_failure(mut self, path: &str, status: u16, message: &str) -> Self {
        self.upload_failures
            .insert(path.to_string(), (status, message.to_string()));
        self
    }

    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.path.clone())
            .collect()
    }

    pub fn listing_calls(&self) -> Vec<(String, String)> {
        self.listing_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositoryClient for FakeClient {
    async fn fetch_current_user(&self) -> Result<Identity, ClientError> {
        self.identity
            .clone()
            .ok_or_else(|| ClientError::AuthError("Bad credentials".to_string()))
    }

    async fn list_repositories(&self) -> Result<Vec<Repository>, ClientError> {
        match self.repositories_status {
            Some(status) => Err(ClientError::remote(status, None)),
            None => Ok(self.repositories.clone()),
        }
    }

    async fn list_directory(
        &self,
        _owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<DirectoryEntry>, ClientError> {
        let key = (repo.to_string(), path.to_string());
        self.listing_calls.lock().unwrap().push(key.clone());
        if self.failing_listings.contains(&key) {
            return Err(ClientError::remote(500, None));
        }
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_repository(
        &self,
        name: &str,
        description: &str,
        is_private: bool,
        _auto_init: bool,
    ) -> Result<Repository, ClientError> {
        if let Some((status, message)) = &self.create_status {
            if *status == 422 {
                return Err(ClientError::Validation(message.clone()));
            }
            return Err(ClientError::remote(*status, Some(message.clone())));
        }
        let mut repo = repository(1000, name);
        repo.description = description.to_string();
        repo.private = is_private;
        Ok(repo)
    }

    async fn upload_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        content: &[u8],
        commit_message: Option<&str>,
    ) -> Result<(), ClientError> {
        self.uploads.lock().unwrap().push(RecordedUpload {
            owner: owner.to_string(),
            repo: repo.to_string(),
            path: path.to_string(),
            content: content.to_vec(),
            message: commit_message.map(str::to_string),
        });
        if let Some((status, message)) = self.upload_failures.get(path) {
            return Err(ClientError::Upload {
                path: path.to_string(),
                status_code: *status,
                status_text: reason_phrase(*status).to_string(),
                message: message.clone(),
            });
        }
        Ok(())
    }
}

pub(crate) fn repository(id: u64, name: &str) -> Repository {
    Repository {
        id,
        name: name.to_string(),
        description: String::new(),
        private: false,
        language: "Text".to_string(),
        updated_at: "2024-05-01T10:00:00Z".to_string(),
        html_url: format!("https://github.com/octocat/{name}"),
        default_branch: "main".to_string(),
    }
}

pub(crate) fn folder(path: &str) -> DirectoryEntry {
    entry(path, EntryKind::Folder)
}

pub(crate) fn file(path: &str) -> DirectoryEntry {
    entry(path, EntryKind::File)
}

fn entry(path: &str, kind: EntryKind) -> DirectoryEntry {
    let name = path.rsplit('/').next().unwrap_or(path).to_string();
    DirectoryEntry {
        id: format!("sha-{path}"),
        name,
        kind,
        size: NOT_APPLICABLE.to_string(),
        modified: NOT_APPLICABLE.to_string(),
        path: path.to_string(),
    }
}

pub(crate) struct StaticFile {
    pub name: String,
    pub data: Vec<u8>,
}

#[async_trait]
impl FileHandle for StaticFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> NetDiskResult<Vec<u8>> {
        Ok(self.data.clone())
    }
}

pub(crate) fn pending(relative_path: &str) -> PendingUpload {
    let name = relative_path
        .rsplit('/')
        .next()
        .unwrap_or(relative_path)
        .to_string();
    PendingUpload {
        content: Arc::new(StaticFile {
            data: relative_path.as_bytes().to_vec(),
            name,
        }),
        relative_path: relative_path.to_string(),
    }
}
