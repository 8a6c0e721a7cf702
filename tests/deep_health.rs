//! Deep health checks against a mock records backend.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use service_monitor::config::{CheckKind, DeepHealthConfig, MonitorConfig, ServiceDescriptor};
use service_monitor::health::HealthChecker;

mod common;

use common::{page, stamp_ago, MockRequest};

const AUTH_PATH: &str = "/api/collections/users/auth-with-password";

fn descriptor(backend: &str) -> ServiceDescriptor {
    ServiceDescriptor {
        name: "collector".into(),
        kind: CheckKind::DeepHealth,
        url: backend.to_string(),
        group: "ops".into(),
        deep_health: Some(DeepHealthConfig {
            backend_url: backend.to_string(),
            collection: "heartbeats".into(),
            time_field: "updated".into(),
            status_field: None,
            error_collection: None,
            error_level_field: None,
            metrics_collection: None,
        }),
    }
}

fn checker() -> HealthChecker {
    HealthChecker::from_config(&MonitorConfig::default()).unwrap()
}

/// Backend with fixed collections; counts logins and hands out `tok-N`.
async fn backend<F>(logins: Arc<AtomicU32>, records: F) -> String
where
    F: Fn(&MockRequest) -> (u16, String) + Send + Sync + 'static,
{
    let addr = common::start_programmable_backend(move |req| {
        if req.method == "POST" && req.path == AUTH_PATH {
            let n = logins.fetch_add(1, Ordering::SeqCst) + 1;
            return (200, json!({ "token": format!("tok-{}", n) }).to_string());
        }
        records(req)
    })
    .await;
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_fresh_record_is_healthy() {
    let logins = Arc::new(AtomicU32::new(0));
    let url = backend(logins.clone(), |req| {
        assert_eq!(req.path, "/api/collections/heartbeats/records");
        assert_eq!(req.query.get("sort").map(String::as_str), Some("-updated"));
        assert_eq!(req.query.get("perPage").map(String::as_str), Some("1"));
        assert_eq!(req.header("authorization"), Some("tok-1"));
        (200, page(json!([{ "updated": stamp_ago(10) }])))
    })
    .await;

    let checker = checker();
    let result = checker.check(&descriptor(&url)).await;
    assert!(result.ok, "{}", result.message);
    assert_eq!(result.message, "healthy (last record 0 minutes ago)");

    // The cached token is reused.
    let result = checker.check(&descriptor(&url)).await;
    assert!(result.ok);
    assert_eq!(logins.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_once() {
    let logins = Arc::new(AtomicU32::new(0));
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let url = backend(logins.clone(), move |_| {
        if c.fetch_add(1, Ordering::SeqCst) == 0 {
            (401, json!({ "message": "expired" }).to_string())
        } else {
            (200, page(json!([{ "updated": stamp_ago(30) }])))
        }
    })
    .await;

    let checker = checker();
    let result = checker.check(&descriptor(&url)).await;
    assert!(result.ok, "{}", result.message);
    assert_eq!(logins.load(Ordering::SeqCst), 2);
    assert!(checker.tokens().contains(&url));
}

#[tokio::test]
async fn test_second_rejection_fails_and_clears_token() {
    let logins = Arc::new(AtomicU32::new(0));
    let url = backend(logins.clone(), |_| (401, json!({ "message": "nope" }).to_string())).await;

    let checker = checker();
    let result = checker.check(&descriptor(&url)).await;
    assert!(!result.ok);
    assert!(result.message.contains("authentication failed"), "{}", result.message);
    assert_eq!(logins.load(Ordering::SeqCst), 2);
    assert!(!checker.tokens().contains(&url));
}

#[tokio::test]
async fn test_stale_record_reports_minutes() {
    let url = backend(Arc::new(AtomicU32::new(0)), |_| {
        (200, page(json!([{ "updated": stamp_ago(2000) }])))
    })
    .await;

    let result = checker().check(&descriptor(&url)).await;
    assert!(!result.ok);
    assert!(result.message.starts_with("no response for 33 minutes"), "{}", result.message);
}

#[tokio::test]
async fn test_empty_collection_fails() {
    let url = backend(Arc::new(AtomicU32::new(0)), |_| (200, page(json!([])))).await;

    let result = checker().check(&descriptor(&url)).await;
    assert!(!result.ok);
    assert_eq!(result.message, "heartbeats has no data");
}

#[tokio::test]
async fn test_stopped_status_fails() {
    let url = backend(Arc::new(AtomicU32::new(0)), |_| {
        (200, page(json!([{ "updated": stamp_ago(5), "state": "stopped" }])))
    })
    .await;

    let mut service = descriptor(&url);
    if let Some(deep) = service.deep_health.as_mut() {
        deep.status_field = Some("state".into());
    }

    let result = checker().check(&service).await;
    assert!(!result.ok);
    assert_eq!(result.message, "status: stopped");
}

#[tokio::test]
async fn test_recent_error_log_fails() {
    let url = backend(Arc::new(AtomicU32::new(0)), |req| match req.path.as_str() {
        "/api/collections/logs/records" => {
            assert_eq!(
                req.query.get("filter").map(String::as_str),
                Some("level=\"ERROR\" || level=\"error\"")
            );
            assert_eq!(req.query.get("sort").map(String::as_str), Some("-created"));
            (200, page(json!([{ "created": stamp_ago(60), "message": "database unreachable" }])))
        }
        _ => (200, page(json!([{ "updated": stamp_ago(5) }]))),
    })
    .await;

    let mut service = descriptor(&url);
    if let Some(deep) = service.deep_health.as_mut() {
        deep.error_collection = Some("logs".into());
        deep.error_level_field = Some("level".into());
    }

    let result = checker().check(&service).await;
    assert!(!result.ok);
    assert_eq!(result.message, "recent error: database unreachable");
}

#[tokio::test]
async fn test_old_error_log_is_ignored() {
    let url = backend(Arc::new(AtomicU32::new(0)), |req| match req.path.as_str() {
        "/api/collections/logs/records" => {
            (200, page(json!([{ "created": stamp_ago(3600), "message": "old" }])))
        }
        _ => (200, page(json!([{ "updated": stamp_ago(5) }]))),
    })
    .await;

    let mut service = descriptor(&url);
    if let Some(deep) = service.deep_health.as_mut() {
        deep.error_collection = Some("logs".into());
        deep.error_level_field = Some("level".into());
    }

    let result = checker().check(&service).await;
    assert!(result.ok, "{}", result.message);
}

fn snapshot(failing: &[(&str, &str)]) -> Value {
    let results: Vec<Value> = failing
        .iter()
        .map(|(d, e)| json!({ "district": d, "success": false, "error_message": e }))
        .chain(std::iter::once(json!({ "district": "Z", "success": true })))
        .collect();
    json!({ "district_results": results })
}

#[tokio::test]
async fn test_persistent_partition_failures_fail() {
    let url = backend(Arc::new(AtomicU32::new(0)), |req| match req.path.as_str() {
        "/api/collections/metrics/records" => (
            200,
            page(json!([
                snapshot(&[("B", "timeout"), ("A", "parse error")]),
                snapshot(&[("A", "old error"), ("B", "timeout"), ("C", "flaky")]),
            ])),
        ),
        _ => (200, page(json!([{ "updated": stamp_ago(5) }]))),
    })
    .await;

    let mut service = descriptor(&url);
    if let Some(deep) = service.deep_health.as_mut() {
        deep.metrics_collection = Some("metrics".into());
    }

    let result = checker().check(&service).await;
    assert!(!result.ok);
    assert_eq!(
        result.message,
        "persistent partition failures: A(parse error); B(timeout)"
    );
}

#[tokio::test]
async fn test_single_failing_snapshot_is_healthy() {
    let url = backend(Arc::new(AtomicU32::new(0)), |req| match req.path.as_str() {
        "/api/collections/metrics/records" => (
            200,
            page(json!([snapshot(&[("A", "boom")]), snapshot(&[])])),
        ),
        _ => (200, page(json!([{ "updated": stamp_ago(5) }]))),
    })
    .await;

    let mut service = descriptor(&url);
    if let Some(deep) = service.deep_health.as_mut() {
        deep.metrics_collection = Some("metrics".into());
    }

    let result = checker().check(&service).await;
    assert!(result.ok, "{}", result.message);
}

#[tokio::test]
async fn test_unavailable_error_log_skips_stage() {
    let url = backend(Arc::new(AtomicU32::new(0)), |req| match req.path.as_str() {
        "/api/collections/logs/records" => (500, json!({ "message": "boom" }).to_string()),
        _ => (200, page(json!([{ "updated": stamp_ago(5) }]))),
    })
    .await;

    let mut service = descriptor(&url);
    if let Some(deep) = service.deep_health.as_mut() {
        deep.error_collection = Some("logs".into());
        deep.error_level_field = Some("level".into());
    }

    let result = checker().check(&service).await;
    assert!(result.ok, "{}", result.message);
    assert!(result.message.starts_with("healthy"));
}

#[tokio::test]
async fn test_unavailable_metrics_skips_stage() {
    let url = backend(Arc::new(AtomicU32::new(0)), |req| match req.path.as_str() {
        "/api/collections/metrics/records" => (500, json!({ "message": "boom" }).to_string()),
        _ => (200, page(json!([{ "updated": stamp_ago(5) }]))),
    })
    .await;

    let mut service = descriptor(&url);
    if let Some(deep) = service.deep_health.as_mut() {
        deep.metrics_collection = Some("metrics".into());
    }

    let result = checker().check(&service).await;
    assert!(result.ok, "{}", result.message);
}

#[tokio::test]
async fn test_unavailable_latest_record_still_fails() {
    let url = backend(Arc::new(AtomicU32::new(0)), |_| {
        (500, json!({ "message": "boom" }).to_string())
    })
    .await;

    let result = checker().check(&descriptor(&url)).await;
    assert!(!result.ok);
    assert_eq!(result.message, "heartbeats fetch failed: HTTP 500");
}
