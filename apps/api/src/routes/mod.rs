pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis_handlers;
use crate::analysis::orchestrator::MAX_UPLOAD_BYTES;
use crate::auth::handlers as auth_handlers;
use crate::job_descriptions::handlers as jd_handlers;
use crate::llm::handlers as model_handlers;
use crate::resumes::handlers as resume_handlers;
use crate::state::AppState;
use crate::templates;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis pipeline
        .route(
            "/api/analyze",
            post(analysis_handlers::handle_analyze)
                // Allow headroom for multipart framing around the 5 MB file cap.
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        )
        .route("/api/analyses", get(analysis_handlers::handle_list_analyses))
        .route(
            "/api/analyses/:id",
            get(analysis_handlers::handle_get_analysis),
        )
        // Model catalog
        .route("/api/models", get(model_handlers::handle_list_models))
        .route(
            "/api/models/refresh",
            post(model_handlers::handle_refresh_models),
        )
        // Resumes
        .route("/api/resumes", get(resume_handlers::handle_list_resumes))
        .route(
            "/api/resumes/:id",
            get(resume_handlers::handle_get_resume)
                .put(resume_handlers::handle_update_resume)
                .delete(resume_handlers::handle_delete_resume),
        )
        .route(
            "/api/resumes/:id/versions",
            get(resume_handlers::handle_list_versions),
        )
        .route(
            "/api/resumes/:id/preview",
            get(resume_handlers::handle_preview).post(resume_handlers::handle_preview_draft),
        )
        .route(
            "/api/resumes/:id/export/pdf",
            get(resume_handlers::handle_export_pdf),
        )
        .route(
            "/api/resumes/:id/export/word",
            get(resume_handlers::handle_export_docx),
        )
        // Job descriptions
        .route(
            "/api/job-descriptions",
            get(jd_handlers::handle_list).post(jd_handlers::handle_create),
        )
        .route(
            "/api/job-descriptions/:id",
            get(jd_handlers::handle_get)
                .put(jd_handlers::handle_update)
                .delete(jd_handlers::handle_delete),
        )
        // Templates
        .route("/api/templates", get(templates::handle_list_templates))
        // Auth
        .route("/api/auth/register", post(auth_handlers::handle_register))
        .route("/api/auth/login", post(auth_handlers::handle_login))
        .route("/api/auth/refresh", post(auth_handlers::handle_refresh))
        .route("/api/auth/me", get(auth_handlers::handle_me))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::JwtService;
    use crate::config::Config;
    use crate::llm::catalog::ModelCatalog;
    use crate::llm::LlmGateway;
    use crate::models::user::User;

    fn test_state() -> AppState {
        let config = Config {
            database_url: "postgres://localhost/unused".to_string(),
            database_max_connections: 1,
            openrouter_api_key: "test-key".to_string(),
            openrouter_base_url: "http://localhost:0".to_string(),
            default_model: "provider/model:free".to_string(),
            jwt_secret: "test-secret".to_string(),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 604800,
            port: 0,
            rust_log: "info".to_string(),
        };
        // Lazy pool: valid URL, never connected by these tests.
        let db = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let llm = LlmGateway::new(
            config.openrouter_base_url.clone(),
            config.openrouter_api_key.clone(),
            config.default_model.clone(),
        );
        let catalog = Arc::new(ModelCatalog::new(Arc::new(llm.clone())));
        let jwt = JwtService::new(
            &config.jwt_secret,
            config.access_token_ttl_secs,
            config.refresh_token_ttl_secs,
        );
        AppState {
            db,
            llm,
            catalog,
            jwt,
            config,
        }
    }

    fn bearer(state: &AppState) -> String {
        let user = User {
            id: Uuid::new_v4(),
            email: "caller@example.com".to_string(),
            password_hash: String::new(),
            first_name: None,
            last_name: None,
            tier: "free".to_string(),
            resumes_created: 0,
            created_at: chrono::Utc::now(),
            last_login_at: None,
        };
        let pair = state.jwt.issue_pair(&user).unwrap();
        format!("Bearer {}", pair.access_token)
    }

    fn multipart_upload(boundary: &str, payload_len: usize) -> Vec<u8> {
        let mut body = Vec::with_capacity(payload_len + 256);
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"resume\"; \
                 filename=\"resume.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.resize(body.len() + payload_len, b'a');
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        body
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected_with_error_envelope() {
        let state = test_state();
        let auth = bearer(&state);
        let app = build_router(state);

        let boundary = "test-boundary";
        let body = multipart_upload(boundary, MAX_UPLOAD_BYTES + 256 * 1024);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/analyze")
                    .header(header::AUTHORIZATION, &auth)
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_analyze_without_token_rejected() {
        let app = build_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/analyze")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
