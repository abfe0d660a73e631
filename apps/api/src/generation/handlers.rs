//! Axum route handler for content generation.

use axum::{
    extract::{Multipart, State},
    http::{header::ACCEPT, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::generation::generator::{generate_content, GenerationRequest};
use crate::models::{Category, GeneratedContent};
use crate::pages::render_error;
use crate::session::Session;
use crate::state::AppState;
use crate::uploads::handlers::multipart_error;

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub content: GeneratedContent,
}

/// Form fields of a generation submission. Files are held in memory until
/// the text fields have been validated.
#[derive(Debug, Default)]
struct GenerateForm {
    brief: String,
    format: String,
    custom_word_count: Option<String>,
    files: Vec<(Category, String, Bytes)>,
}

async fn read_form(multipart: &mut Multipart) -> Result<GenerateForm, AppError> {
    let mut form = GenerateForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "brief" => form.brief = field.text().await.map_err(multipart_error)?,
            "format" => form.format = field.text().await.map_err(multipart_error)?,
            "custom_word_count" => {
                let value = field.text().await.map_err(multipart_error)?;
                if !value.trim().is_empty() {
                    form.custom_word_count = Some(value);
                }
            }
            other => {
                let Ok(category) = other.parse::<Category>() else {
                    continue;
                };
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                // Browsers send an empty part for file inputs left blank.
                if filename.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.files.push((category, filename, bytes));
            }
        }
    }

    Ok(form)
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

/// Validates the form, stores its files under the session, then generates
/// from every file the session holds.
async fn generate(
    state: &AppState,
    session: &Session,
    multipart: &mut Multipart,
) -> Result<GeneratedContent, AppError> {
    let form = read_form(multipart).await?;

    let mut request = GenerationRequest {
        brief: form.brief,
        format_key: form.format,
        custom_word_count: form.custom_word_count,
        files: Vec::new(),
    };
    request.validate()?;

    for (category, filename, bytes) in form.files {
        state.uploads.save(session.id, category, &filename, bytes).await?;
    }
    request.files = state.uploads.list_all(session.id).await?;

    let content = generate_content(
        state.generator.as_ref(),
        &state.config.claude_model,
        state.config.max_tokens,
        &request,
    )
    .await?;

    info!(
        "Generated {} words of {} for session {}",
        content.word_count(),
        content.format_key,
        session.id
    );
    state.results.put(session.id, content.clone());
    Ok(content)
}

/// POST /generate
///
/// Every response carries the session cookie, since files may have been
/// stored under a new session before a later step failed. Browser form posts
/// get a redirect or an HTML error page; JSON clients get JSON either way.
pub async fn handle_generate(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let json = wants_json(&headers);

    match generate(&state, &session, &mut multipart).await {
        Ok(content) if json => (
            session,
            Json(GenerateResponse {
                success: true,
                content,
            }),
        )
            .into_response(),
        Ok(_) => (session, Redirect::to("/result")).into_response(),
        Err(e) if json => (session, e).into_response(),
        Err(e) => {
            let page = render_error(&e.public_message());
            (e.status(), session, Html(page)).into_response()
        }
    }
}
