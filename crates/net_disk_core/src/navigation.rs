//! Navigation and view state.
//!
//! [`ViewState`] is what a front end renders: who is logged in, their
//! repositories, the selected repository, where in it the user is, and the
//! listing of that folder. Every change of location reloads the listing from
//! the remote; a failed reload leaves an empty listing rather than an error.

use std::sync::Arc;

use github_client::{DirectoryEntry, Identity, Repository, RepositoryClient};
use tracing::{debug, info, instrument, warn};

use crate::errors::{Error, NetDiskResult};
use crate::traversal::{collect_uploads, DropPayload};
use crate::upload::{BatchUploader, UploadPolicy, UploadSummary, UploadTarget};

#[cfg(test)]
#[path = "navigation_tests.rs"]
mod tests;

pub struct ViewState {
    client: Arc<dyn RepositoryClient>,
    identity: Option<Identity>,
    repositories: Vec<Repository>,
    selected: Option<Repository>,
    path: Vec<String>,
    listing: Vec<DirectoryEntry>,
    loading: bool,
    policy: UploadPolicy,
}

impl ViewState {
    /// Creates an empty, logged-out view over `client`.
    pub fn new(client: Arc<dyn RepositoryClient>) -> Self {
        Self {
            client,
            identity: None,
            repositories: Vec::new(),
            selected: None,
            path: Vec::new(),
            listing: Vec::new(),
            loading: false,
            policy: UploadPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Logs in: resolves the identity behind the client's credential, then
    /// loads the repository list.
    ///
    /// # Errors
    ///
    /// Fails with the client's `AuthError` when the identity cannot be
    /// fetched, and with its `Remote` error when the repositories cannot be
    /// listed.
    #[instrument(skip(client))]
    pub async fn connect(client: Arc<dyn RepositoryClient>) -> NetDiskResult<Self> {
        let mut state = Self::new(client);
        let identity = state.client.fetch_current_user().await?;
        info!(login = identity.login.as_str(), "Logged in");
        state.identity = Some(identity);
        state.refresh_repositories().await?;
        Ok(state)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Login of the authenticated user, used as the owner of every repository.
    pub fn owner(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.login.as_str())
    }

    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    pub fn selected_repository(&self) -> Option<&Repository> {
        self.selected.as_ref()
    }

    pub fn path_segments(&self) -> &[String] {
        &self.path
    }

    /// The current location as a `/`-joined path, empty at the root.
    pub fn current_path(&self) -> String {
        self.path.join("/")
    }

    pub fn listing(&self) -> &[DirectoryEntry] {
        &self.listing
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn policy(&self) -> UploadPolicy {
        self.policy
    }

    /// Finds a repository by name among the loaded ones.
    pub fn find_repository(&self, name: &str) -> Option<&Repository> {
        self.repositories.iter().find(|r| r.name == name)
    }

    /// Reloads the repository list.
    pub async fn refresh_repositories(&mut self) -> NetDiskResult<()> {
        self.repositories = self.client.list_repositories().await?;
        debug!(count = self.repositories.len(), "Repositories loaded");
        Ok(())
    }

    /// Selects a repository. Switching to a different repository resets the
    /// location to its root and reloads; selecting the current one does
    /// nothing.
    pub async fn select_repository(&mut self, repository: Repository) {
        if self.selected.as_ref().map(|r| r.id) == Some(repository.id) {
            debug!(repo = repository.name.as_str(), "Repository already selected");
            return;
        }

        info!(repo = repository.name.as_str(), "Selecting repository");
        self.selected = Some(repository);
        self.path.clear();
        self.reload().await;
    }

    /// Leaves the selected repository and returns to the repository list.
    pub fn deselect_repository(&mut self) {
        self.selected = None;
        self.path.clear();
        self.listing.clear();
    }

    /// Enters the folder `name` below the current location.
    pub async fn descend(&mut self, name: &str) {
        self.path.push(name.to_string());
        self.reload().await;
    }

    /// Moves up to the breadcrumb at `index`, keeping segments `0..=index`.
    pub async fn ascend_to(&mut self, index: usize) {
        self.path.truncate(index + 1);
        self.reload().await;
    }

    /// Jumps to a folder given as a `/`-separated path from the repository
    /// root. Empty segments are dropped, so `""` and `"/"` mean the root.
    pub async fn navigate_to(&mut self, path: &str) {
        self.path = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        self.reload().await;
    }

    pub async fn reset_to_root(&mut self) {
        self.path.clear();
        self.reload().await;
    }

    /// Replaces the listing with a fresh copy of the current folder.
    ///
    /// Failures are logged and leave the listing empty.
    pub async fn reload(&mut self) {
        let location = self
            .owner()
            .zip(self.selected.as_ref())
            .map(|(owner, repo)| (owner.to_string(), repo.name.clone()));
        let Some((owner, repo)) = location else {
            self.listing.clear();
            return;
        };
        let path = self.current_path();

        self.loading = true;
        self.listing = match self.client.list_directory(&owner, &repo, &path).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(owner = owner.as_str(), repo = repo.as_str(), path = path.as_str(), error = %e, "Failed to load directory");
                Vec::new()
            }
        };
        self.loading = false;
    }

    /// Renames an entry of the current listing in memory only. Blank names
    /// and unknown ids are ignored. Returns whether an entry changed.
    pub fn rename_entry(&mut self, id: &str, new_name: &str) -> bool {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return false;
        }

        let parent = self.current_path();
        let Some(entry) = self.listing.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        entry.name = new_name.to_string();
        entry.path = if parent.is_empty() {
            new_name.to_string()
        } else {
            format!("{}/{}", parent, new_name)
        };
        true
    }

    /// Creates a repository, puts it first in the list, and opens it at its
    /// root.
    pub async fn create_repository(
        &mut self,
        name: &str,
        description: &str,
        is_private: bool,
        auto_init: bool,
    ) -> NetDiskResult<&Repository> {
        let repository = self
            .client
            .create_repository(name, description, is_private, auto_init)
            .await?;
        info!(repo = repository.name.as_str(), "Repository created");

        self.repositories.insert(0, repository.clone());
        self.selected = Some(repository);
        self.path.clear();
        self.reload().await;

        self.selected.as_ref().ok_or(Error::NoRepositorySelected)
    }

    /// Uploads a drop into the current folder of the selected repository.
    ///
    /// The target is captured before anything is read, so the files land
    /// where the user was when the drop happened. The listing is reloaded
    /// after every session that ran. Returns `None` when nothing was uploaded
    /// because the drop was empty or the confirmation was declined.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoRepositorySelected` when no repository is open.
    pub async fn upload<F>(
        &mut self,
        payload: DropPayload,
        commit_message: Option<String>,
        confirm: F,
    ) -> NetDiskResult<Option<UploadSummary>>
    where
        F: FnOnce(usize) -> bool,
    {
        let (Some(owner), Some(repo)) = (self.owner(), self.selected.as_ref()) else {
            return Err(Error::NoRepositorySelected);
        };
        let target = UploadTarget::new(owner, repo.name.clone(), self.path.clone());

        let items = collect_uploads(payload).await;
        let summary = BatchUploader::new(self.client.as_ref(), self.policy)
            .with_commit_message(commit_message)
            .run(&target, items, confirm)
            .await;

        if summary.is_some() {
            self.reload().await;
        }
        Ok(summary)
    }
}
