//! Server-rendered HTML pages.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use quick_xml::escape::escape;

use crate::generation::formats::FORMATS;
use crate::models::Category;
use crate::retention::spawn_background_sweep;
use crate::session::Session;
use crate::state::AppState;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");
const RESULT_TEMPLATE: &str = include_str!("../../templates/result.html");
const ERROR_TEMPLATE: &str = include_str!("../../templates/error.html");

fn category_title(category: Category) -> &'static str {
    match category {
        Category::Style => "Writing style examples",
        Category::Past => "Past examples",
        Category::Competitive => "Competitive examples",
    }
}

fn format_options() -> String {
    FORMATS
        .iter()
        .map(|f| {
            format!(
                "        <option value=\"{}\">{} (~{} words)</option>",
                f.key, f.description, f.word_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn category_sections() -> String {
    Category::ALL
        .iter()
        .map(|c| {
            format!(
                "    <fieldset>\n      <legend>{title}</legend>\n      \
                 <input type=\"file\" name=\"{key}\" data-category=\"{key}\" accept=\".txt,.pdf,.docx\" multiple>\n      \
                 <ul class=\"files\" id=\"files-{key}\"></ul>\n    </fieldset>",
                title = category_title(*c),
                key = c.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_index(max_files: usize, retention_days: u32) -> String {
    INDEX_TEMPLATE
        .replace("{{format_options}}", &format_options())
        .replace("{{category_sections}}", &category_sections())
        .replace("{{max_files}}", &max_files.to_string())
        .replace("{{retention_days}}", &retention_days.to_string())
}

/// Error page for form posts from the browser.
pub fn render_error(message: &str) -> String {
    ERROR_TEMPLATE.replace("{{message}}", &escape(message))
}

/// GET /
///
/// Also starts a background retention sweep.
pub async fn handle_index(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    spawn_background_sweep(&state);
    (
        session,
        Html(render_index(
            state.uploads.max_files_per_category(),
            state.config.file_retention_days,
        )),
    )
}

/// GET /result
pub async fn handle_result(State(state): State<AppState>, session: Session) -> Response {
    let Some(content) = state.results.get(session.id) else {
        return (session, Redirect::to("/")).into_response();
    };

    // The generated text goes in last so it is never scanned for placeholders.
    let page = RESULT_TEMPLATE
        .replace("{{format_description}}", &escape(content.format_description.as_str()))
        .replace("{{word_count}}", &content.word_count().to_string())
        .replace("{{content}}", &escape(content.text.as_str()));
    (session, Html(page)).into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::Utc;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::models::GeneratedContent;
    use crate::session::{sign, SESSION_COOKIE};
    use crate::test_support::test_app;

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_index_lists_every_format_and_category() {
        let page = render_index(3, 7);
        for format in FORMATS {
            assert!(page.contains(&format!("<option value=\"{}\">", format.key)));
        }
        for category in Category::ALL {
            assert!(page.contains(&format!("id=\"files-{category}\"")));
        }
        assert!(page.contains("Up to 3 files per category"));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn test_error_page_escapes_message() {
        let page = render_error("Bad <input> & more");
        assert!(page.contains("Bad &lt;input&gt; &amp; more"));
        assert!(page.contains("href=\"/\""));
    }

    #[tokio::test]
    async fn test_index_issues_session_cookie() {
        let app = test_app("unused");
        let response = app
            .router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::SET_COOKIE));
    }

    #[tokio::test]
    async fn test_result_without_content_redirects_home() {
        let app = test_app("unused");
        let response = app
            .router
            .oneshot(Request::get("/result").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn test_result_escapes_generated_text() {
        let app = test_app("unused");
        let id = uuid::Uuid::new_v4();
        app.state.results.put(
            id,
            GeneratedContent {
                text: "<script>alert(1)</script> {{content}}".to_string(),
                format_key: "linkedin".to_string(),
                format_description: "LinkedIn post".to_string(),
                created_at: Utc::now(),
            },
        );
        let cookie = format!("{SESSION_COOKIE}={}", sign(app.state.config.secret_key.as_bytes(), id).unwrap());

        let response = app
            .router
            .oneshot(
                Request::get("/result")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt; {{content}}"));
        assert!(!page.contains("<script>alert(1)"));
        assert!(page.contains("<h1>LinkedIn post</h1>"));
    }
}
