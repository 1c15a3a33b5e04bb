#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::client::SupabaseClient;
    use crate::error::SupabaseError;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SupabaseClient {
        SupabaseClient::new(server.uri(), "anon-key")
            .unwrap()
            .with_retry_delays(vec![Duration::ZERO; 3])
    }

    #[tokio::test]
    async fn test_read_retried_on_503_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/projects"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "name": "Gare"}
            ])))
            .mount(&server)
            .await;

        let projects = client(&server).select_projects("access-1").await.unwrap();
        assert_eq!(projects.len(), 1);
    }

    #[tokio::test]
    async fn test_read_not_retried_on_401() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/projects"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "message": "JWT expired"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).select_projects("stale").await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_read_retries_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/projects"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .expect(4)
            .mount(&server)
            .await;

        let err = client(&server).select_projects("access-1").await.unwrap_err();
        assert!(matches!(err, SupabaseError::RetriesExhausted(_)));
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn test_write_never_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/project_updates"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .insert_row("access-1", "project_updates", &serde_json::json!({"project_id": "1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, SupabaseError::HttpStatus { code: 503, .. }));
    }

    #[tokio::test]
    async fn test_signed_urls_retried_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/sign/pv-chantier"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/sign/pv-chantier"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"path": "7/20240502/a_pv.pdf", "signedURL": "/object/sign/pv-chantier/7/20240502/a_pv.pdf?token=t"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let paths = vec!["7/20240502/a_pv.pdf".to_owned()];
        let signed = client(&server)
            .create_signed_urls("access-1", "pv-chantier", &paths, 60)
            .await
            .unwrap();
        assert_eq!(signed.len(), 1);
    }

    #[tokio::test]
    async fn test_health_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/health"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let status = client(&server).health().await.unwrap();
        assert_eq!(status.status, 503);
        assert!(!status.is_expected());
    }
}
