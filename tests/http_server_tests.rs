use anyhow::Result;
use axum::response::Response;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tabsight::chart::MockRenderer;
use tabsight::http::app_server::{AppServer, PATH_ANALYZE, PATH_HEALTH, PATH_UPLOADS};
use tabsight::http::identity::USER_ID_HEADER;
use tabsight::AnalysisEngine;
use tempfile::TempDir;
use tower::util::ServiceExt;

const SALES_CSV: &str = "region,sales,units\nA,10,1\nA,20,2\nB,5,3\nC,7,4\nB,9,5\n";

struct TestServer {
    router: Router,
    renderer: Arc<MockRenderer>,
    _dir: TempDir,
}

/// Create test router backed by a temp images dir and the recording renderer
fn setup_test() -> Result<TestServer> {
    let dir = tempfile::tempdir()?;
    let renderer = Arc::new(MockRenderer::new());
    let engine = AnalysisEngine::builder()
        .images_dir(dir.path().join("images"))
        .renderer(renderer.clone())
        .build()?;

    Ok(TestServer {
        router: AppServer::new(engine).router,
        renderer,
        _dir: dir,
    })
}

async fn send(router: &Router, request: Request<Body>) -> Result<Response> {
    Ok(router.clone().oneshot(request).await?)
}

async fn json_body(response: Response) -> Result<Value> {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&body)?)
}

fn upload_request(
    user: Option<&str>,
    filename: &str,
    body: impl Into<Body>,
) -> Result<Request<Body>> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("{}?filename={}", PATH_UPLOADS, filename))
        .header(header::CONTENT_TYPE, "application/octet-stream");
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    Ok(builder.body(body.into())?)
}

fn analyze_request(user: Option<&str>, body: Value) -> Result<Request<Body>> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(PATH_ANALYZE)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    Ok(builder.body(Body::from(serde_json::to_vec(&body)?))?)
}

/// Upload the sales fixture as `user` and return the new session id
async fn upload_sales(router: &Router, user: &str) -> Result<String> {
    let response = send(router, upload_request(Some(user), "sales.csv", SALES_CSV)?).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await?;
    Ok(json["session_id"].as_str().unwrap().to_string())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_endpoint() -> Result<()> {
    let server = setup_test()?;
    let request = Request::builder().uri(PATH_HEALTH).body(Body::empty())?;

    let response = send(&server.router, request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await?;
    assert_eq!(json["status"], "ok");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_returns_profile() -> Result<()> {
    let server = setup_test()?;

    let response = send(
        &server.router,
        upload_request(Some("alice"), "sales.csv", SALES_CSV)?,
    )
    .await?;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await?;
    assert_eq!(json["success"], true);
    assert_eq!(json["filename"], "sales.csv");
    assert_eq!(json["columns"], json!(["region", "sales", "units"]));
    assert_eq!(json["stats"]["rows"], 5);
    assert_eq!(json["stats"]["columns"], 3);
    assert_eq!(json["preview"].as_array().unwrap().len(), 5);
    assert_eq!(json["preview"][0]["region"], "A");
    assert!(json["session_id"].as_str().unwrap().starts_with("sess"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_xlsx_workbook() -> Result<()> {
    let server = setup_test()?;
    let workbook: &'static [u8] = include_bytes!("fixtures/sales.xlsx");

    let response = send(
        &server.router,
        upload_request(Some("alice"), "sales.xlsx", workbook)?,
    )
    .await?;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await?;
    assert_eq!(
        json["columns"],
        json!(["region", "sales", "units", "Unnamed: 3", "region.1", "flag"])
    );
    assert_eq!(json["kinds"]["sales"], "numeric");
    assert_eq!(json["kinds"]["region"], "text");
    assert_eq!(json["stats"]["rows"], 3);
    assert_eq!(json["stats"]["missing_values"]["units"], 1);
    assert_eq!(json["preview"][1]["sales"], 20.5);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_requires_identity() -> Result<()> {
    let server = setup_test()?;

    let response = send(&server.router, upload_request(None, "sales.csv", SALES_CSV)?).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await?;
    assert_eq!(json["error"]["code"], "UNAUTHORIZED");
    assert_eq!(json["redirect"], "/login");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_rejects_bad_input() -> Result<()> {
    let server = setup_test()?;

    let response = send(
        &server.router,
        upload_request(Some("alice"), "notes.txt", SALES_CSV)?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await?;
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Unsupported file format"));

    let response = send(&server.router, upload_request(Some("alice"), "sales.csv", "")?).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&server.router, upload_request(Some("alice"), "", SALES_CSV)?).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_analyze_summary() -> Result<()> {
    let server = setup_test()?;
    let session_id = upload_sales(&server.router, "alice").await?;

    let response = send(
        &server.router,
        analyze_request(
            Some("alice"),
            json!({"session_id": session_id, "analysis_type": "summary"}),
        )?,
    )
    .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await?;
    assert_eq!(json["success"], true);
    assert_eq!(json["analysis_type"], "summary");
    assert_eq!(json["summary"]["sales"]["count"], 5);
    assert_eq!(json["summary"]["sales"]["max"], 20.0);
    assert!(json["summary"].get("region").is_none());
    assert_eq!(server.renderer.render_count(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_analyze_histogram_publishes_image() -> Result<()> {
    let server = setup_test()?;
    let session_id = upload_sales(&server.router, "alice").await?;

    let response = send(
        &server.router,
        analyze_request(
            Some("alice"),
            json!({"session_id": session_id, "analysis_type": "histogram", "column": "sales"}),
        )?,
    )
    .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await?;
    let plot_url = json["plot_url"].as_str().unwrap().to_string();
    assert_eq!(
        plot_url,
        format!("/static/images/{}_histogram.png", session_id)
    );
    assert_eq!(json["counts"].as_array().unwrap().len(), 30);

    let image = send(
        &server.router,
        Request::builder().uri(&plot_url).body(Body::empty())?,
    )
    .await?;
    assert_eq!(image.status(), StatusCode::OK);
    assert_eq!(image.headers()[header::CONTENT_TYPE], "image/png");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_analyze_category_chart_defaults_to_bar() -> Result<()> {
    let server = setup_test()?;
    let session_id = upload_sales(&server.router, "alice").await?;

    let response = send(
        &server.router,
        analyze_request(
            Some("alice"),
            json!({
                "session_id": session_id,
                "analysis_type": "bar",
                "category_column": "region",
                "value_column": "sales",
                "chart_type": "donut",
            }),
        )?,
    )
    .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await?;
    assert_eq!(json["chart_type"], "bar");
    assert_eq!(json["categories"][0], "A");
    assert_eq!(json["means"][0], 15.0);
    assert!(json["plot_url"]
        .as_str()
        .unwrap()
        .ends_with("_bar_chart.png"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_analyze_access_control() -> Result<()> {
    let server = setup_test()?;
    let session_id = upload_sales(&server.router, "alice").await?;
    let body = json!({"session_id": session_id, "analysis_type": "summary"});

    let response = send(&server.router, analyze_request(None, body.clone())?).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&server.router, analyze_request(Some("bob"), body)?).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = json_body(response).await?;
    assert_eq!(json["error"]["message"], "Unauthorized access to this data");

    let response = send(
        &server.router,
        analyze_request(
            Some("alice"),
            json!({"session_id": "sess_missing", "analysis_type": "summary"}),
        )?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_analyze_checks_identity_before_body() -> Result<()> {
    let server = setup_test()?;
    let garbage = || {
        Request::builder()
            .method("POST")
            .uri(PATH_ANALYZE)
            .header(header::CONTENT_TYPE, "text/plain")
    };

    let response = send(&server.router, garbage().body(Body::from("not json"))?).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await?;
    assert_eq!(json["redirect"], "/login");

    let response = send(
        &server.router,
        garbage()
            .header(USER_ID_HEADER, "alice")
            .body(Body::from("not json"))?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await?;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_analyze_validation_errors() -> Result<()> {
    let server = setup_test()?;
    let session_id = upload_sales(&server.router, "alice").await?;

    let cases = [
        json!({"session_id": session_id, "analysis_type": "regression"}),
        json!({"session_id": session_id, "analysis_type": "histogram"}),
        json!({"session_id": session_id, "analysis_type": "histogram", "column": "nope"}),
        json!({"session_id": session_id, "analysis_type": "histogram", "column": "region"}),
        json!({"session_id": session_id, "analysis_type": "scatter", "x_column": "sales"}),
    ];
    for body in cases {
        let response = send(&server.router, analyze_request(Some("alice"), body.clone())?).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }
    assert_eq!(server.renderer.render_count(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_analyze_render_failure_is_server_error() -> Result<()> {
    let server = setup_test()?;
    let session_id = upload_sales(&server.router, "alice").await?;
    server.renderer.set_fail_render(true);

    let response = send(
        &server.router,
        analyze_request(
            Some("alice"),
            json!({"session_id": session_id, "analysis_type": "correlation"}),
        )?,
    )
    .await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_image_endpoint_errors() -> Result<()> {
    let server = setup_test()?;

    let response = send(
        &server.router,
        Request::builder()
            .uri("/static/images/sess_nothing_histogram.png")
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &server.router,
        Request::builder()
            .uri("/static/images/notes.txt")
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
