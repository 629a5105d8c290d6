//! Bucket provisioning
//!
//! Creates the Spaces bucket that backs a knowledge base, moves it into the
//! deployment's project and fills it from a local folder.

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::api::types::SpacesKeyRequest;
use crate::config::settings::pause;
use crate::ledger::ResourceKind;
use crate::platform::Platform;
use crate::storage::spaces::{BucketTarget, SpacesCredentials};

pub struct BucketProvisioner<'a> {
    platform: &'a Platform,
    project_id: String,
    target: BucketTarget,
    generated_key: bool,
}

impl<'a> BucketProvisioner<'a> {
    /// Prepare credentials for a new bucket.
    ///
    /// With no key pair given, a full-access key is created for the run.
    /// Giving only half of a key pair is an error.
    pub async fn new(
        platform: &'a Platform,
        project_id: &str,
        bucket: &str,
        region: &str,
        access_key: Option<String>,
        secret_key: Option<String>,
    ) -> Result<BucketProvisioner<'a>> {
        let (credentials, generated_key) = match (access_key, secret_key) {
            (Some(access_key), Some(secret_key)) => (
                SpacesCredentials {
                    access_key,
                    secret_key,
                },
                false,
            ),
            (None, None) => {
                info!("Creating access keys for the new bucket since no key was provided");
                let request =
                    SpacesKeyRequest::full_access(&format!("Agent template key for {}", bucket));
                let key = platform
                    .api
                    .create_spaces_key(&request)
                    .await
                    .context("Failed to create Spaces access key")?;
                let (Some(access_key), Some(secret_key)) = (key.access_key, key.secret_key) else {
                    bail!("Spaces key response did not include both access and secret key");
                };
                platform
                    .ledger
                    .record_with_note(ResourceKind::SpacesKey, &access_key, request.name);
                (
                    SpacesCredentials {
                        access_key,
                        secret_key,
                    },
                    true,
                )
            }
            _ => bail!(
                "Only one of the Spaces access key and secret key was given. \
                 Provide both, or neither to generate a new key"
            ),
        };

        Ok(Self {
            platform,
            project_id: project_id.to_string(),
            target: BucketTarget {
                region: region.to_string(),
                bucket: bucket.to_string(),
                credentials,
            },
            generated_key,
        })
    }

    pub fn credentials(&self) -> &SpacesCredentials {
        &self.target.credentials
    }

    pub fn generated_key(&self) -> bool {
        self.generated_key
    }

    /// Create the bucket and move it into the project.
    ///
    /// New buckets always land in the default project.
    pub async fn create_bucket(&self) -> Result<()> {
        info!(bucket = %self.target.bucket, region = %self.target.region, "Creating bucket");
        self.platform.storage.create_bucket(&self.target).await?;
        self.platform
            .ledger
            .record(ResourceKind::Bucket, &self.target.bucket);

        pause(self.platform.pacing.bucket_settle()).await;

        info!(project_id = %self.project_id, "Moving bucket into project");
        self.platform
            .api
            .assign_resources(&self.project_id, &[self.target.urn()])
            .await
            .with_context(|| {
                format!(
                    "Failed to move bucket {} into project {}",
                    self.target.bucket, self.project_id
                )
            })?;
        Ok(())
    }

    /// Upload every file below `folder`. Returns the number of files uploaded.
    pub async fn upload_folder(&self, folder: &Path, prefix: &str) -> Result<usize> {
        let files = collect_uploads(folder, prefix)?;
        if files.is_empty() {
            bail!("No files found to upload in {}", folder.display());
        }

        for (path, key) in &files {
            info!(
                file = %path.display(),
                destination = %format!("s3://{}/{}", self.target.bucket, key),
                "Uploading"
            );
            self.platform
                .storage
                .upload_file(&self.target, key, path)
                .await?;
        }
        Ok(files.len())
    }

    /// Delete the key created by `new`, if any
    pub async fn delete_generated_key(&self) -> Result<()> {
        if !self.generated_key {
            return Ok(());
        }
        info!("Deleting Spaces key generated during deployment");
        let access_key = &self.target.credentials.access_key;
        self.platform
            .api
            .delete_spaces_key(access_key)
            .await
            .context("Failed to delete generated Spaces key")?;
        self.platform
            .ledger
            .release(ResourceKind::SpacesKey, access_key);
        Ok(())
    }
}

/// Local files under `folder` paired with their object keys.
///
/// Keys are relative to `folder`, `/`-separated, behind the optional prefix.
/// Sorted for a stable upload order. Symlinks to files are uploaded with the
/// target's contents; symlinked directories are not entered.
pub fn collect_uploads(folder: &Path, prefix: &str) -> Result<Vec<(std::path::PathBuf, String)>> {
    if !folder.is_dir() {
        bail!("{} does not exist or is not a directory", folder.display());
    }

    let mut uploads = Vec::new();
    for entry in WalkDir::new(folder).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read {}", folder.display()))?;
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(folder)
            .context("Walked outside the upload folder")?;
        let relative: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let relative = relative.join("/");

        let prefix = prefix.trim_matches('/');
        let key = if prefix.is_empty() {
            relative
        } else {
            format!("{}/{}", prefix, relative)
        };
        debug!(key = %key, "Queued for upload");
        uploads.push((entry.path().to_path_buf(), key));
    }
    Ok(uploads)
}
