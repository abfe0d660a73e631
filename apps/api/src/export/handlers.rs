//! Axum route handlers for downloading the session's generated content.

use axum::{
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
};

use super::{render_docx, DOCX_MIME};
use crate::errors::AppError;
use crate::models::GeneratedContent;
use crate::session::Session;
use crate::state::AppState;

fn current_content(state: &AppState, session: &Session) -> Result<GeneratedContent, AppError> {
    state
        .results
        .get(session.id)
        .ok_or_else(|| AppError::NotFound("No generated content in this session".to_string()))
}

fn attachment(filename: &str) -> String {
    format!("attachment; filename=\"{filename}\"")
}

/// GET /download-docx
pub async fn handle_download_docx(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let content = current_content(&state, &session)?;
    let filename = format!("{}.docx", content.file_stem());
    let bytes = tokio::task::spawn_blocking(move || render_docx(&content))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    tracing::info!("Exported {filename} ({} bytes)", bytes.len());
    Ok((
        session,
        [
            (CONTENT_TYPE, DOCX_MIME.to_string()),
            (CONTENT_DISPOSITION, attachment(&filename)),
        ],
        bytes,
    ))
}

/// GET /download-txt
pub async fn handle_download_txt(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let content = current_content(&state, &session)?;
    let filename = format!("{}.txt", content.file_stem());
    Ok((
        session,
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, attachment(&filename)),
        ],
        content.text,
    ))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::extraction::extract_docx;
    use crate::models::GeneratedContent;
    use crate::session::{sign, SESSION_COOKIE};
    use crate::test_support::test_app;

    fn stored(app: &crate::test_support::TestApp) -> String {
        let id = uuid::Uuid::new_v4();
        app.state.results.put(
            id,
            GeneratedContent {
                text: "Line one\n\nLine two".to_string(),
                format_key: "blog_500".to_string(),
                format_description: "500-word blog post".to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 1, 2, 15, 30, 0).unwrap(),
            },
        );
        format!(
            "{SESSION_COOKIE}={}",
            sign(app.state.config.secret_key.as_bytes(), id).unwrap()
        )
    }

    #[tokio::test]
    async fn test_download_docx() {
        let app = test_app("unused");
        let cookie = stored(&app);

        let response = app
            .router
            .oneshot(
                Request::get("/download-docx")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], super::DOCX_MIME);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"blog_500-20240102-1530.docx\""
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(extract_docx(&bytes).unwrap(), "Line one\n\nLine two");
    }

    #[tokio::test]
    async fn test_download_txt() {
        let app = test_app("unused");
        let cookie = stored(&app);

        let response = app
            .router
            .oneshot(
                Request::get("/download-txt")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"Line one\n\nLine two");
    }

    #[tokio::test]
    async fn test_download_without_content_is_not_found() {
        let app = test_app("unused");
        let response = app
            .router
            .oneshot(Request::get("/download-docx").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
