use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use dashboard::client::ReadingsClient;
use dashboard::errors::Error;
use dashboard::metrics::{self, POLL_OVERLAPS_TOTAL};
use dashboard::model::ReadingId;
use dashboard::poller::{poll_once, run_poller};
use dashboard::projection::{latest, DashboardView, PumpStatus};
use dashboard::rest::create_router;
use dashboard::state::{self, LOAD_ERROR_MESSAGE};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{sleep, timeout};

fn fixture() -> Value {
    json!([
        {"id": 1, "leitura": 20.0, "status": "Normal", "bombaLigada": "Não", "timestamp": "2024-06-01T08:00:00"},
        {"id": 2, "leitura": 40.0, "status": "Alto", "bombaLigada": "Sim", "timestamp": "01/06/2024 09:30:00"},
        {"id": 3, "leitura": 30.0, "status": "Normal", "bombaLigada": "Não", "timestamp": "invalid"}
    ])
}

async fn readings() -> Json<Value> {
    Json(fixture())
}

async fn object_body() -> Json<Value> {
    Json(json!({"message": "no data"}))
}

async fn garbage() -> impl IntoResponse {
    (StatusCode::OK, "<html>oops</html>")
}

async fn broken() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn slow() -> Json<Value> {
    sleep(Duration::from_millis(400)).await;
    Json(fixture())
}

async fn spawn_sensor_api() -> SocketAddr {
    let app = Router::new()
        .route("/leituras", get(readings))
        .route("/object", get(object_body))
        .route("/garbage", get(garbage))
        .route("/broken", get(broken))
        .route("/slow", get(slow));

    serve(app).await
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr, path: &str) -> ReadingsClient {
    ReadingsClient::new(&format!("http://{}{}", addr, path), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fetch_and_project_readings() {
    let addr = spawn_sensor_api().await;
    let client = client_for(addr, "/leituras");

    let readings = client.fetch().await.unwrap();
    assert_eq!(readings.len(), 3);
    assert_eq!(latest(&readings).unwrap().id, ReadingId::Number(2));
}

#[tokio::test]
async fn test_non_array_body_is_empty_set() {
    let addr = spawn_sensor_api().await;
    let client = client_for(addr, "/object");

    assert!(client.fetch().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failures_share_one_error_class() {
    let addr = spawn_sensor_api().await;

    let status_err = client_for(addr, "/broken").fetch().await.unwrap_err();
    assert!(matches!(status_err, Error::Status(500)));

    let body_err = client_for(addr, "/garbage").fetch().await.unwrap_err();
    assert!(matches!(body_err, Error::Json(_)));

    let missing = client_for(addr, "/nope").fetch().await.unwrap_err();
    assert!(matches!(missing, Error::Status(404)));
}

#[tokio::test]
async fn test_failed_poll_keeps_readings_until_next_success() {
    let addr = spawn_sensor_api().await;
    let good = client_for(addr, "/leituras");
    let bad = client_for(addr, "/broken");
    let (tx, rx) = state::channel();

    assert!(poll_once(&good, &tx).await);
    assert!(rx.borrow().error.is_none());
    assert_eq!(rx.borrow().readings.len(), 3);

    assert!(!poll_once(&bad, &tx).await);
    {
        let snapshot = rx.borrow();
        assert_eq!(snapshot.error, Some(LOAD_ERROR_MESSAGE));
        assert_eq!(snapshot.readings.len(), 3);
        assert!(!snapshot.loading);
    }

    assert!(poll_once(&good, &tx).await);
    assert!(rx.borrow().error.is_none());
}

#[tokio::test]
async fn test_first_failure_ends_loading() {
    let addr = spawn_sensor_api().await;
    let (tx, rx) = state::channel();

    poll_once(&client_for(addr, "/broken"), &tx).await;

    let view = DashboardView::project(&rx.borrow());
    assert!(!view.loading);
    assert_eq!(view.error, Some(LOAD_ERROR_MESSAGE));
    assert_eq!(view.count, 0);
}

#[tokio::test]
async fn test_poller_publishes_snapshots_and_stops() {
    let addr = spawn_sensor_api().await;
    let client = client_for(addr, "/leituras");
    let (tx, mut rx) = state::channel();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(run_poller(
        client,
        Duration::from_millis(50),
        tx,
        async {
            let _ = stop_rx.await;
        },
    ));

    timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("no snapshot published")
        .unwrap();

    let view = DashboardView::project(&rx.borrow_and_update());
    assert_eq!(view.count, 3);
    assert_eq!(view.pump, PumpStatus::On);
    assert_eq!(view.history[0].id, ReadingId::Number(2));
    assert_eq!(view.history[2].id, ReadingId::Number(3));

    stop_tx.send(()).unwrap();
    timeout(Duration::from_secs(5), handle)
        .await
        .expect("poller did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_slow_endpoint_overlaps_are_not_prevented() {
    metrics::init_metrics().unwrap();
    let addr = spawn_sensor_api().await;
    let client = client_for(addr, "/slow");
    let (tx, mut rx) = state::channel();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let overlaps_before = POLL_OVERLAPS_TOTAL.get();

    let handle = tokio::spawn(run_poller(
        client,
        Duration::from_millis(50),
        tx,
        async {
            let _ = stop_rx.await;
        },
    ));

    sleep(Duration::from_millis(250)).await;
    assert!(POLL_OVERLAPS_TOTAL.get() > overlaps_before);

    stop_tx.send(()).unwrap();
    handle.await.unwrap();

    // Fetches started before shutdown still complete and publish.
    timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("in-flight fetch was cancelled")
        .unwrap();
    assert_eq!(rx.borrow().readings.len(), 3);
}

#[tokio::test]
async fn test_status_server_serves_dashboard_view() {
    metrics::init_metrics().unwrap();
    let sensor = spawn_sensor_api().await;
    let (tx, rx) = state::channel();
    let status = serve(create_router(rx)).await;

    let http = reqwest::Client::new();
    let initial: Value = http
        .get(format!("http://{}/api/v1/dashboard", status))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(initial["loading"], true);

    poll_once(&client_for(sensor, "/leituras"), &tx).await;

    let view: Value = http
        .get(format!("http://{}/api/v1/dashboard", status))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["loading"], false);
    assert_eq!(view["count"], 3);
    assert_eq!(view["average"], 30.0);
    assert_eq!(view["latest"]["id"], 2);
    assert_eq!(view["pump"], "Ligada");

    let metrics_text = http
        .get(format!("http://{}/metrics", status))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics_text.contains("dashboard_polls_total"));
}
