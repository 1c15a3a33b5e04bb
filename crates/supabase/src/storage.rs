//! Object storage (`/storage/v1`): upload, list, signed and public URLs.

use chantier_core::STORAGE_LIST_LIMIT;
use reqwest::Method;

use crate::client::SupabaseClient;
use crate::error::SupabaseError;
use crate::wire::{ListRequest, SignRequest, SignedUrl, SortBy, StorageObject, UploadResponse};

impl SupabaseClient {
    /// Upload `bytes` at `path`; never overwrites an existing object.
    pub async fn upload_object(
        &self,
        access_token: &str,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, SupabaseError> {
        let url = self.endpoint(&["storage/v1/object", bucket, path])?;
        let size = bytes.len();
        let request = self
            .request(Method::POST, url, Some(access_token))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .header("cache-control", "max-age=3600")
            .body(bytes);
        let response = self.send(request).await?;
        let uploaded: UploadResponse = Self::parse_json(response, "upload").await?;
        tracing::info!(bucket, path, size, "object uploaded");
        Ok(uploaded.key.unwrap_or_else(|| format!("{bucket}/{path}")))
    }

    /// One folder level under `prefix`, every page.
    pub async fn list_objects(
        &self,
        access_token: &str,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<StorageObject>, SupabaseError> {
        let url = self.endpoint(&["storage/v1/object/list", bucket])?;
        let mut objects = Vec::new();
        let mut offset = 0;
        loop {
            let body = ListRequest {
                prefix,
                limit: STORAGE_LIST_LIMIT,
                offset,
                sort_by: SortBy { column: "name", order: "asc" },
                search: "",
            };
            let response = self
                .send_idempotent("list objects", || {
                    self.request(Method::POST, url.clone(), Some(access_token)).json(&body)
                })
                .await?;
            let page: Vec<StorageObject> = Self::parse_json(response, "object list").await?;
            let count = page.len();
            objects.extend(page);
            if count < STORAGE_LIST_LIMIT {
                break;
            }
            offset += count;
        }
        Ok(objects)
    }

    /// Signed URLs for `paths`, one batched call. Returned URLs are absolute.
    ///
    /// Replayed on transient failures like a read.
    pub async fn create_signed_urls(
        &self,
        access_token: &str,
        bucket: &str,
        paths: &[String],
        expires_in: u64,
    ) -> Result<Vec<SignedUrl>, SupabaseError> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.endpoint(&["storage/v1/object/sign", bucket])?;
        let body = SignRequest { expires_in, paths };
        let response = self
            .send_idempotent("sign urls", || {
                self.request(Method::POST, url.clone(), Some(access_token)).json(&body)
            })
            .await?;
        let mut signed: Vec<SignedUrl> = Self::parse_json(response, "signed urls").await?;
        for entry in &mut signed {
            if let Some(relative) = entry.signed_url.take() {
                entry.signed_url = Some(self.storage_url(&relative));
            }
        }
        Ok(signed)
    }

    /// Permanent URL of an object in a public bucket.
    #[must_use]
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        self.endpoint(&["storage/v1/object/public", bucket, path])
            .map(String::from)
            .unwrap_or_else(|_| format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url))
    }

    /// Absolute form of a URL the storage API returns relative to `/storage/v1`.
    fn storage_url(&self, relative: &str) -> String {
        if relative.starts_with("http://") || relative.starts_with("https://") {
            return relative.to_owned();
        }
        format!("{}/storage/v1/{}", self.base_url, relative.trim_start_matches('/'))
    }
}
