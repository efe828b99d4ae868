use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::compose::{self, Composed};
use crate::config::SiteConfig;
use crate::fetch::{PageFetcher, PageSource};
use crate::fragment::FragmentKind;
use crate::styles::{StyleBundle, StyleTopic};

#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn PageSource>,
    config: Arc<SiteConfig>,
}

impl AppState {
    pub fn new(source: Arc<dyn PageSource>, config: SiteConfig) -> Self {
        Self {
            source,
            config: Arc::new(config),
        }
    }
}

/// Response body for the boundary: the composed value plus a generic error
/// label when the remote was unavailable.
#[derive(Debug, Serialize)]
struct Boundary<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
    #[serde(flatten)]
    value: T,
}

fn boundary_response<T: Serialize>(composed: Composed<T>, unavailable: &'static str) -> Response {
    let (status, error) = if composed.is_fetch_failure() {
        (StatusCode::INTERNAL_SERVER_ERROR, Some(unavailable))
    } else {
        (StatusCode::OK, None)
    };
    let body = Boundary {
        error,
        value: composed.value,
    };
    (status, Json(body)).into_response()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/wordpress/header", get(header_handler))
        .route("/api/wordpress/footer", get(footer_handler))
        .route("/api/wordpress/styles", get(styles_handler))
        .route("/api/wordpress/styles.css", get(styles_css_handler))
        .route("/api/wordpress/menus", get(menus_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(addr: SocketAddr, config: SiteConfig) -> anyhow::Result<()> {
    let fetcher = PageFetcher::new(&config).context("build page fetcher")?;
    tracing::info!(site = %config.root_url(), "using remote site");
    let app = router(AppState::new(Arc::new(fetcher), config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {addr}: {err}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(?err, "ctrl-c handler failed; shutdown signal disabled");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn header_handler(State(state): State<AppState>) -> Response {
    let composed =
        compose::fetch_fragment(state.source.as_ref(), &state.config, FragmentKind::Header).await;
    boundary_response(composed, "Failed to fetch header")
}

async fn footer_handler(State(state): State<AppState>) -> Response {
    let composed =
        compose::fetch_fragment(state.source.as_ref(), &state.config, FragmentKind::Footer).await;
    boundary_response(composed, "Failed to fetch footer")
}

#[derive(Debug, Deserialize)]
struct StylesQuery {
    topic: Option<String>,
}

impl StylesQuery {
    fn topic(&self) -> Option<StyleTopic> {
        match self.topic.as_deref() {
            Some(raw) => StyleTopic::parse(raw),
            None => Some(StyleTopic::default()),
        }
    }
}

const UNKNOWN_TOPIC: &str = "Unknown style topic";

async fn styles_handler(
    State(state): State<AppState>,
    Query(q): Query<StylesQuery>,
) -> Response {
    let Some(topic) = q.topic() else {
        tracing::debug!(topic = ?q.topic, "rejecting unknown style topic");
        let body = Boundary {
            error: Some(UNKNOWN_TOPIC),
            value: StyleBundle::default(),
        };
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    };
    let composed = compose::fetch_styles(state.source.as_ref(), &state.config, topic).await;
    boundary_response(composed, "Failed to fetch styles")
}

async fn styles_css_handler(
    State(state): State<AppState>,
    Query(q): Query<StylesQuery>,
) -> Response {
    let (status, css) = match q.topic() {
        Some(topic) => {
            let composed =
                compose::fetch_styles(state.source.as_ref(), &state.config, topic).await;
            let status = if composed.is_fetch_failure() {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            };
            (status, composed.value.layered_css())
        }
        None => (StatusCode::BAD_REQUEST, StyleBundle::default().layered_css()),
    };

    let mut resp = (status, css).into_response();
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/css; charset=utf-8"),
    );
    resp
}

async fn menus_handler() -> impl IntoResponse {
    Json(crate::menu::default_menu())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Utc;
    use http_body_util::BodyExt as _;
    use tower::ServiceExt as _;
    use url::Url;

    use super::*;
    use crate::fetch::{FetchFailure, RemotePage};

    struct FixtureSource {
        markup: Option<&'static str>,
    }

    #[async_trait::async_trait]
    impl PageSource for FixtureSource {
        async fn fetch(&self, url: &Url) -> Result<RemotePage, FetchFailure> {
            match self.markup {
                Some(markup) => Ok(RemotePage {
                    url: url.clone(),
                    markup: markup.to_string(),
                    fetched_at: Utc::now(),
                }),
                None => Err(FetchFailure::Status {
                    url: url.to_string(),
                    status: 503,
                }),
            }
        }
    }

    fn app(markup: Option<&'static str>) -> Router {
        let config = SiteConfig::parse("https://example.com").unwrap();
        router(AppState::new(Arc::new(FixtureSource { markup }), config))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    const PAGE: &str = r#"<html><head>
<style>.elementor-location-header .menu{display:flex}</style>
<link rel="stylesheet" href="http://example.com/wp-content/themes/hello/style.css">
</head><body>
<header class="site-header"><a href="https://example.com/">Home</a></header>
<main>content</main>
<footer>© copyright</footer>
</body></html>"#;

    #[tokio::test]
    async fn header_endpoint_returns_rewritten_fragment() {
        let (status, _, body) = get(app(Some(PAGE)), "/api/wordpress/header").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            json["content"],
            r#"<header class="site-header"><a href="/">Home</a></header>"#
        );
        assert_eq!(json["styles"], ".elementor-location-header .menu{display:flex}");
        assert_eq!(json["hasContent"], true);
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn fragment_outage_is_a_500_with_empty_shape() {
        let (status, _, body) = get(app(None), "/api/wordpress/footer").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "error": "Failed to fetch footer",
                "content": "",
                "styles": "",
                "hasContent": false,
            })
        );
    }

    #[tokio::test]
    async fn styles_endpoint_shapes() {
        let (status, _, body) = get(app(Some(PAGE)), "/api/wordpress/styles?topic=header").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            json["stylesheets"],
            serde_json::json!(["https://example.com/wp-content/themes/hello/style.css"])
        );
        assert_eq!(json["elementorConfig"], serde_json::Value::Null);
        assert!(!json["elementorBase"].as_str().unwrap().is_empty());

        let (status, _, body) = get(app(None), "/api/wordpress/styles").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"], "Failed to fetch styles");
        assert_eq!(json["styles"], "");
        assert_eq!(json["stylesheets"], serde_json::json!([]));
        assert_eq!(json["rootVars"], "");
        assert_eq!(json["customCss"], "");
        assert!(!json["elementorBase"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_topic_is_rejected_with_bundle_shape() {
        let (status, content_type, body) =
            get(app(Some(PAGE)), "/api/wordpress/styles?topic=sidebar").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"], "Unknown style topic");
        assert_eq!(json["styles"], "");
        assert_eq!(json["stylesheets"], serde_json::json!([]));
        assert_eq!(json["elementorConfig"], serde_json::Value::Null);
        assert!(!json["elementorBase"].as_str().unwrap().is_empty());

        let (status, _, _) = get(app(Some(PAGE)), "/api/wordpress/styles.css?topic=sidebar").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) = get(app(Some(PAGE)), "/api/wordpress/styles?topic=FOOTER").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn layered_stylesheet_is_served_as_css() {
        let (status, content_type, body) =
            get(app(Some(PAGE)), "/api/wordpress/styles.css?topic=header").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/css; charset=utf-8"));
        let base = body.find("Elementor base styles").unwrap();
        let inline = body.find(".elementor-location-header .menu").unwrap();
        assert!(base < inline);
    }

    #[tokio::test]
    async fn menus_and_health() {
        let (status, _, body) = get(app(None), "/api/wordpress/menus").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["type"], "default");
        assert_eq!(json["menu"].as_array().map(Vec::len), Some(4));

        let (status, _, body) = get(app(None), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok\n");
    }
}
