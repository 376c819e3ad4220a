//! Managed-service lifecycle: cooperative stop vs transport fault.

use std::net::TcpListener;
use std::time::Duration;

use axum::{routing::get, Router};
use servicekit::lifecycle::Coordinator;
use servicekit::net::{HttpService, ServiceError, ServiceState};

fn health_router() -> Router {
    Router::new().route("/health", get(|| async { "ok" }))
}

async fn wait_until_serving(base: &str) {
    for _ in 0..50 {
        if reqwest::get(format!("{base}/health")).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("service never came up at {base}");
}

#[tokio::test]
async fn cooperative_stop_is_not_an_error() {
    let coordinator = Coordinator::new();
    let mut service = HttpService::new("api", health_router());
    coordinator.register(&mut service);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(async move { service.serve(listener).await });

    wait_until_serving(&base).await;
    coordinator.request_shutdown();
    coordinator.wait_for_termination().await;

    // Stopping because of cancellation must not surface as an error.
    assert!(server.await.unwrap().is_ok());
}

#[tokio::test]
async fn bind_failure_is_a_startup_error() {
    // Occupy a port, then ask the service to bind the same one.
    let occupied = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = occupied.local_addr().unwrap().to_string();

    let mut service = HttpService::new("api", health_router());
    let err = service.start(&addr).await.unwrap_err();
    assert!(matches!(err, ServiceError::Bind { .. }));
}

#[tokio::test]
async fn malformed_address_is_a_bind_error() {
    let mut service = HttpService::new("api", health_router());
    let err = service.start("not-an-address").await.unwrap_err();
    assert!(matches!(err, ServiceError::Bind { .. }));
}

#[cfg(unix)]
#[tokio::test]
async fn serve_fault_is_distinguished_from_cooperative_stop() {
    use std::os::unix::io::{FromRawFd, IntoRawFd};

    let coordinator = Coordinator::new();
    let mut service = HttpService::new("api", health_router());
    coordinator.register(&mut service);

    // A listener whose descriptor is not a socket makes the serve
    // loop fail on its own, with no cancellation involved.
    let file = std::fs::File::open("/dev/null").unwrap();
    let listener = unsafe { std::net::TcpListener::from_raw_fd(file.into_raw_fd()) };

    let err = service.serve(listener).await.unwrap_err();
    assert!(matches!(err, ServiceError::Serve(_)));
    assert!(!coordinator.is_shutting_down());

    // The fault released the barrier slot, so termination cannot
    // hang on the dead service.
    assert_eq!(coordinator.outstanding(), 0);
    coordinator.request_shutdown();
    tokio::time::timeout(Duration::from_secs(1), coordinator.wait_for_termination())
        .await
        .expect("termination hung on a service that already failed");
}

#[tokio::test]
async fn state_reaches_stopped_after_drain() {
    let coordinator = Coordinator::new();
    let mut service = HttpService::new("api", health_router());
    coordinator.register(&mut service);
    assert_eq!(service.state(), ServiceState::Idle);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(async move {
        let result = service.serve(listener).await;
        (result, service.state())
    });

    wait_until_serving(&base).await;
    coordinator.request_shutdown();
    coordinator.wait_for_termination().await;

    let (result, state) = server.await.unwrap();
    result.unwrap();
    assert_eq!(state, ServiceState::Stopped);
}

#[tokio::test]
async fn unregistered_service_serves_standalone() {
    let mut service = HttpService::new("standalone", health_router());

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(async move { service.serve(listener).await });

    wait_until_serving(&base).await;
    let body = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "ok");

    // No coordination was installed; the service owns its lifetime.
    server.abort();
}
