use std::collections::HashMap;
use std::sync::Arc;

use chantier_core::{
    AppConfig, AuthSession, MAX_LISTING_DEPTH, StoredDocument, UPLOAD_CONTENT_TYPE, UploadFile,
    UploadReport, UrlMode, check_upload, display_name, project_folder, sort_newest_first,
    storage_key,
};
use chantier_supabase::{StorageObject, SupabaseClient};
use chrono::NaiveDate;
use serde::Serialize;

use crate::ServiceError;

/// Storage-side settings, taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct DocumentSettings {
    pub bucket: String,
    pub max_upload_mb: u64,
    pub url_mode: UrlMode,
    pub pv_log_table: Option<String>,
}

impl From<&AppConfig> for DocumentSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            bucket: config.bucket.clone(),
            max_upload_mb: config.max_upload_mb,
            url_mode: config.url_mode,
            pv_log_table: config.pv_log_table.clone(),
        }
    }
}

/// Row written to the auxiliary upload log table.
#[derive(Debug, Serialize)]
struct PvFileLog<'a> {
    project_id: &'a str,
    storage_path: &'a str,
    file_name: &'a str,
    uploaded_by: &'a str,
}

pub struct DocumentService {
    client: Arc<SupabaseClient>,
    settings: DocumentSettings,
}

impl DocumentService {
    #[must_use]
    pub fn new(client: Arc<SupabaseClient>, settings: DocumentSettings) -> Self {
        Self { client, settings }
    }

    /// Upload a batch of PV documents under `{project_id}/{today UTC}/`.
    pub async fn upload_files(
        &self,
        session: &AuthSession,
        project_id: &str,
        files: Vec<UploadFile>,
    ) -> Result<UploadReport, ServiceError> {
        self.upload_files_on(session, project_id, files, chrono::Utc::now().date_naive()).await
    }

    /// Same as [`Self::upload_files`] with an explicit folder day.
    ///
    /// Each file is validated and uploaded on its own; a failure becomes a warning
    /// in the report and the batch goes on.
    pub async fn upload_files_on(
        &self,
        session: &AuthSession,
        project_id: &str,
        files: Vec<UploadFile>,
        day: NaiveDate,
    ) -> Result<UploadReport, ServiceError> {
        if project_id.trim().is_empty() {
            return Err(ServiceError::InvalidInput("no project selected".to_owned()));
        }
        let mut report = UploadReport::default();

        for file in files {
            if let Err(rejection) = check_upload(&file, self.settings.max_upload_mb) {
                tracing::info!(file = %file.name, %rejection, "upload rejected");
                report.warn(&file.name, rejection);
                continue;
            }

            let random = uuid::Uuid::new_v4().simple().to_string();
            let path = storage_key(project_id, day, &random, &file.name);
            let UploadFile { name, bytes } = file;
            match self
                .client
                .upload_object(&session.access_token, &self.settings.bucket, &path, bytes, UPLOAD_CONTENT_TYPE)
                .await
            {
                Ok(_) => {
                    report.uploaded += 1;
                    self.log_upload(session, project_id, &path, &name, &mut report).await;
                    report.paths.push(path);
                },
                Err(e) => {
                    tracing::warn!(file = %name, %path, error = %e, "upload failed");
                    report.warn(&name, e);
                },
            }
        }

        Ok(report)
    }

    async fn log_upload(
        &self,
        session: &AuthSession,
        project_id: &str,
        path: &str,
        file_name: &str,
        report: &mut UploadReport,
    ) {
        let Some(table) = self.settings.pv_log_table.as_deref() else {
            return;
        };
        let row = PvFileLog { project_id, storage_path: path, file_name, uploaded_by: session.user_id() };
        if let Err(e) = self.client.insert_row(&session.access_token, table, &row).await {
            tracing::warn!(table, path, error = %e, "upload log insert failed");
            report.warn(file_name, format!("journal {table} non mis à jour ({e})"));
        }
    }

    /// Every document stored for a project, newest first, with a usable URL.
    ///
    /// Walks the project folder and its date sub-folders, then resolves URLs in one
    /// batched call (signed mode) or locally (public mode).
    pub async fn list_signed_pv(
        &self,
        session: &AuthSession,
        project_id: &str,
        expires_secs: u64,
    ) -> Result<Vec<StoredDocument>, ServiceError> {
        let objects = self.list_recursive(session, &project_folder(project_id)).await?;
        if objects.is_empty() {
            return Ok(Vec::new());
        }

        let urls: HashMap<String, String> = match self.settings.url_mode {
            UrlMode::Public => objects
                .iter()
                .map(|(path, _)| (path.clone(), self.client.public_url(&self.settings.bucket, path)))
                .collect(),
            UrlMode::Signed => {
                let paths: Vec<String> = objects.iter().map(|(path, _)| path.clone()).collect();
                self.client
                    .create_signed_urls(&session.access_token, &self.settings.bucket, &paths, expires_secs)
                    .await?
                    .into_iter()
                    .filter_map(|signed| {
                        if let Some(error) = signed.error.as_deref() {
                            tracing::debug!(path = ?signed.path, error, "object could not be signed");
                        }
                        Some((signed.path?, signed.signed_url?))
                    })
                    .collect()
            },
        };

        let mut documents: Vec<StoredDocument> = objects
            .into_iter()
            .map(|(path, object)| StoredDocument {
                display_name: display_name(&object.name),
                url: urls.get(&path).cloned(),
                uploaded_at: object.created_at.or(object.updated_at),
                file_name: object.name,
                path,
            })
            .collect();
        sort_newest_first(&mut documents);
        Ok(documents)
    }

    /// Files under `root`, with their full keys. Folders are entries without an id.
    async fn list_recursive(
        &self,
        session: &AuthSession,
        root: &str,
    ) -> Result<Vec<(String, StorageObject)>, ServiceError> {
        let mut files = Vec::new();
        let mut pending = vec![(root.to_owned(), 0_usize)];

        while let Some((prefix, depth)) = pending.pop() {
            let entries = self
                .client
                .list_objects(&session.access_token, &self.settings.bucket, &prefix)
                .await?;
            for entry in entries {
                // Supabase keeps an empty placeholder object in otherwise empty folders.
                if entry.name == ".emptyFolderPlaceholder" {
                    continue;
                }
                let full = format!("{prefix}{}", entry.name);
                if entry.is_folder() {
                    if depth + 1 < MAX_LISTING_DEPTH {
                        pending.push((format!("{full}/"), depth + 1));
                    } else {
                        tracing::debug!(folder = %full, "listing depth reached, folder skipped");
                    }
                } else {
                    files.push((full, entry));
                }
            }
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client, session};
    use wiremock::matchers::{body_partial_json, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings() -> DocumentSettings {
        DocumentSettings {
            bucket: "pv-chantier".to_owned(),
            max_upload_mb: 1,
            url_mode: UrlMode::Signed,
            pv_log_table: None,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    #[tokio::test]
    async fn test_upload_batch_keeps_going_after_rejections() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/pv-chantier/7/20240502/[0-9a-f]{32}_proces-verbal\.pdf$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"Key": "k"})))
            .expect(1)
            .mount(&server)
            .await;

        let files = vec![
            UploadFile::new("photo.jpg", vec![1; 10]),
            UploadFile::new("procès-verbal.pdf", vec![1; 10]),
            UploadFile::new("énorme.docx", vec![1; 1024 * 1024 + 1]),
            UploadFile::new("vide.doc", Vec::new()),
        ];
        let report = DocumentService::new(client(&server), settings())
            .upload_files_on(&session(), "7", files, day())
            .await
            .unwrap();

        assert_eq!(report.uploaded, 1);
        assert_eq!(report.paths.len(), 1);
        assert!(report.paths[0].starts_with("7/20240502/"));
        assert!(report.paths[0].ends_with("_proces-verbal.pdf"));
        assert_eq!(report.warnings.len(), 3);
        assert_eq!(report.warnings[0], "photo.jpg: extension non autorisée.");
        assert_eq!(report.warnings[1], "énorme.docx: dépasse 1 Mo.");
        assert_eq!(report.warnings[2], "vide.doc: fichier vide.");
    }

    #[tokio::test]
    async fn test_upload_failure_becomes_warning() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/pv-chantier/7/.*_a\.pdf$"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "statusCode": "403", "error": "Unauthorized", "message": "new row violates row-level security policy"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/pv-chantier/7/.*_b\.pdf$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"Key": "k"})))
            .mount(&server)
            .await;

        let files = vec![UploadFile::new("a.pdf", vec![1]), UploadFile::new("b.pdf", vec![1])];
        let report = DocumentService::new(client(&server), settings())
            .upload_files_on(&session(), "7", files, day())
            .await
            .unwrap();

        assert_eq!(report.uploaded, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("a.pdf: "));
        assert!(report.warnings[0].contains("row-level security"));
    }

    #[tokio::test]
    async fn test_upload_logs_to_table_when_enabled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/pv-chantier/7/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"Key": "k"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/pv_files"))
            .and(body_partial_json(serde_json::json!({
                "project_id": "7", "file_name": "pv.pdf", "uploaded_by": "user-1"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([{"id": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let mut settings = settings();
        settings.pv_log_table = Some("pv_files".to_owned());
        let report = DocumentService::new(client(&server), settings)
            .upload_files_on(&session(), "7", vec![UploadFile::new("pv.pdf", vec![1])], day())
            .await
            .unwrap();
        assert_eq!(report.uploaded, 1);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_upload_log_failure_is_warning_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/pv-chantier/7/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"Key": "k"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/pv_files"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "relation \"public.pv_files\" does not exist"
            })))
            .mount(&server)
            .await;

        let mut settings = settings();
        settings.pv_log_table = Some("pv_files".to_owned());
        let report = DocumentService::new(client(&server), settings)
            .upload_files_on(&session(), "7", vec![UploadFile::new("pv.pdf", vec![1])], day())
            .await
            .unwrap();
        assert_eq!(report.uploaded, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("pv_files"));
    }

    #[tokio::test]
    async fn test_upload_requires_project() {
        let server = MockServer::start().await;
        let err = DocumentService::new(client(&server), settings())
            .upload_files_on(&session(), "", vec![UploadFile::new("pv.pdf", vec![1])], day())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    async fn mount_listing(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/list/pv-chantier"))
            .and(body_partial_json(serde_json::json!({"prefix": "7/"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "20240502", "id": null},
                {"name": "legacy.pdf", "id": "o-0", "created_at": "2023-12-01T09:00:00Z"}
            ])))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/list/pv-chantier"))
            .and(body_partial_json(serde_json::json!({"prefix": "7/20240502/"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": ".emptyFolderPlaceholder", "id": "o-p", "created_at": "2024-05-02T07:00:00Z"},
                {"name": "0123456789abcdef0123456789abcdef_pv.pdf", "id": "o-1",
                 "created_at": "2024-05-02T08:00:00Z"}
            ])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_list_signed_pv_walks_folders_and_sorts() {
        let server = MockServer::start().await;
        mount_listing(&server).await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/sign/pv-chantier"))
            .and(body_partial_json(serde_json::json!({"expiresIn": 600})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"path": "7/20240502/0123456789abcdef0123456789abcdef_pv.pdf",
                 "signedURL": "/object/sign/pv-chantier/7/20240502/0123456789abcdef0123456789abcdef_pv.pdf?token=a",
                 "error": null},
                {"path": "7/legacy.pdf", "signedURL": null, "error": "Either the object does not exist or you do not have access to it"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let documents = DocumentService::new(client(&server), settings())
            .list_signed_pv(&session(), "7", 600)
            .await
            .unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].path, "7/20240502/0123456789abcdef0123456789abcdef_pv.pdf");
        assert_eq!(documents[0].display_name, "pv.pdf");
        assert!(documents[0].url.as_deref().is_some_and(|u| u.ends_with("?token=a")));
        assert_eq!(documents[1].file_name, "legacy.pdf");
        assert_eq!(documents[1].url, None);
    }

    #[tokio::test]
    async fn test_list_public_mode_skips_signing() {
        let server = MockServer::start().await;
        mount_listing(&server).await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/sign/pv-chantier"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut settings = settings();
        settings.url_mode = UrlMode::Public;
        let documents = DocumentService::new(client(&server), settings)
            .list_signed_pv(&session(), "7", 600)
            .await
            .unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(
            documents[1].url.as_deref(),
            Some(format!("{}/storage/v1/object/public/pv-chantier/7/legacy.pdf", server.uri()).as_str())
        );
    }

    #[tokio::test]
    async fn test_list_stops_at_depth_limit() {
        let server = MockServer::start().await;
        for (prefix, body) in [
            ("7/", serde_json::json!([{"name": "a", "id": null}, {"name": "top.pdf", "id": "o-1"}])),
            ("7/a/", serde_json::json!([{"name": "b", "id": null}, {"name": "a.pdf", "id": "o-2"}])),
            ("7/a/b/", serde_json::json!([{"name": "c", "id": null}])),
            ("7/a/b/c/", serde_json::json!([{"name": "d", "id": null}, {"name": "deep.pdf", "id": "o-3"}])),
        ] {
            Mock::given(method("POST"))
                .and(path("/storage/v1/object/list/pv-chantier"))
                .and(body_partial_json(serde_json::json!({"prefix": prefix})))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .expect(1)
                .mount(&server)
                .await;
        }
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/list/pv-chantier"))
            .and(body_partial_json(serde_json::json!({"prefix": "7/a/b/c/d/"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "too-deep.pdf", "id": "o-4"}
            ])))
            .expect(0)
            .mount(&server)
            .await;

        let mut settings = settings();
        settings.url_mode = UrlMode::Public;
        let documents = DocumentService::new(client(&server), settings)
            .list_signed_pv(&session(), "7", 600)
            .await
            .unwrap();

        let mut paths: Vec<&str> = documents.iter().map(|d| d.path.as_str()).collect();
        paths.sort_unstable();
        assert_eq!(paths, ["7/a/a.pdf", "7/a/b/c/deep.pdf", "7/top.pdf"]);
        assert_eq!(MAX_LISTING_DEPTH, 4);
    }

    #[tokio::test]
    async fn test_list_empty_project() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/list/pv-chantier"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let documents = DocumentService::new(client(&server), settings())
            .list_signed_pv(&session(), "7", 600)
            .await
            .unwrap();
        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn test_list_failure_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/list/pv-chantier"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "statusCode": "404", "error": "Bucket not found", "message": "Bucket not found"
            })))
            .mount(&server)
            .await;

        let result = DocumentService::new(client(&server), settings())
            .list_signed_pv(&session(), "7", 600)
            .await;
        assert!(result.is_err());
    }
}
