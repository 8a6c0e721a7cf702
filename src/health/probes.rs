//! Probe strategies.
//!
//! # Strategies
//! - Reachability: GET the service URL, 2xx/3xx is healthy
//! - AdminSurface: GET `{url}/_/`, only 200 is healthy
//! - DeepHealth: staged inspection of backend records
//!
//! # DeepHealth stages
//! ```text
//! newest record ──▶ timestamp fresh? ──▶ not stopped? ──▶ no recent error log?
//!                                                              │
//!                                         ok ◀── no persistent partition failures
//! ```
//! The first failing stage decides the result. Only the newest-record fetch
//! is mandatory; an unavailable error log or metrics collection skips its stage.

use chrono::{DateTime, FixedOffset, Utc};
use reqwest::Client;
use serde_json::Value;

use crate::config::{CheckConfig, DeepHealthConfig, ServiceDescriptor};
use crate::health::auth::TokenSource;
use crate::health::partitions::{persistent_failures, MetricSnapshot};
use crate::health::records::{list_records, RecordQuery};
use crate::health::time::parse_timestamp;
use crate::health::types::ProbeResult;

const ERROR_MESSAGE_LIMIT: usize = 80;
const PARTITION_ERROR_LIMIT: usize = 50;

/// GET the service URL; any 2xx or 3xx after redirects is healthy.
pub async fn reachability(client: &Client, service: &ServiceDescriptor) -> ProbeResult {
    match client.get(&service.url).send().await {
        Ok(response) => {
            let status = response.status();
            let message = format!("HTTP {}", status.as_u16());
            if (200..400).contains(&status.as_u16()) {
                ProbeResult::healthy(&service.name, message)
            } else {
                tracing::warn!(service = %service.name, status = %status, "Reachability check failed");
                ProbeResult::failed(&service.name, message)
            }
        }
        Err(e) => {
            tracing::warn!(service = %service.name, error = %e, "Reachability check failed: connection error");
            ProbeResult::failed(&service.name, format!("connection failed: {}", e))
        }
    }
}

/// GET the admin surface; exactly 200 is healthy.
pub async fn admin_surface(client: &Client, service: &ServiceDescriptor) -> ProbeResult {
    let url = admin_url(&service.url);
    match client.get(&url).send().await {
        Ok(response) if response.status().as_u16() == 200 => {
            ProbeResult::healthy(&service.name, "admin OK")
        }
        Ok(response) => {
            let status = response.status().as_u16();
            tracing::warn!(service = %service.name, status, "Admin surface check failed");
            ProbeResult::failed(&service.name, format!("admin HTTP {}", status))
        }
        Err(e) => {
            tracing::warn!(service = %service.name, error = %e, "Admin surface check failed: connection error");
            ProbeResult::failed(&service.name, format!("admin connection failed: {}", e))
        }
    }
}

fn admin_url(base: &str) -> String {
    format!("{}/_/", base.trim_end_matches('/'))
}

/// Run the staged deep health check.
pub async fn deep_health<T: TokenSource>(
    client: &Client,
    tokens: &T,
    settings: &CheckConfig,
    service: &ServiceDescriptor,
) -> ProbeResult {
    let Some(deep) = &service.deep_health else {
        return ProbeResult::failed(&service.name, "deep health settings missing");
    };

    match run_stages(client, tokens, settings, deep, &service.name).await {
        Ok(message) => ProbeResult::healthy(&service.name, message),
        Err(message) => ProbeResult::failed(&service.name, message),
    }
}

async fn run_stages<T: TokenSource>(
    client: &Client,
    tokens: &T,
    settings: &CheckConfig,
    deep: &DeepHealthConfig,
    service: &str,
) -> Result<String, String> {
    let local = settings.local_offset();
    let backend = deep.backend_url.as_str();

    let sort = format!("-{}", deep.time_field);
    let latest = list_records(
        client,
        tokens,
        backend,
        &RecordQuery { collection: deep.collection.as_str(), sort: sort.as_str(), per_page: 1, filter: None },
    )
    .await
    .map_err(|e| {
        tracing::warn!(service, stage = "latest_record", error = %e, "Deep health fetch failed");
        format!("{} fetch failed: {}", deep.collection, e)
    })?;

    let record = latest
        .first()
        .ok_or_else(|| format!("{} has no data", deep.collection))?;

    let now = Utc::now();
    let freshness = check_freshness(record, &deep.time_field, now, settings.staleness_timeout_secs, local)
        .inspect_err(|message| tracing::warn!(service, stage = "freshness", %message, "Deep health stage failed"))?;

    if let Some(field) = &deep.status_field {
        check_not_stopped(record, field)?;
    }

    if let (Some(collection), Some(level_field)) = (&deep.error_collection, &deep.error_level_field) {
        let filter = format!("{0}=\"ERROR\" || {0}=\"error\"", level_field);
        let query = RecordQuery { collection: collection.as_str(), sort: "-created", per_page: 2, filter: Some(filter) };
        match list_records(client, tokens, backend, &query).await {
            Ok(errors) => check_recent_errors(&errors, now, settings.recent_error_window_secs, local)?,
            Err(e) => {
                tracing::warn!(service, stage = "error_log", error = %e, "Error log unavailable, stage skipped");
            }
        }
    }

    if let Some(collection) = &deep.metrics_collection {
        let query = RecordQuery { collection: collection.as_str(), sort: "-created", per_page: 2, filter: None };
        match list_records(client, tokens, backend, &query).await {
            Ok(snapshots) => check_partitions(&snapshots)?,
            Err(e) => {
                tracing::warn!(service, stage = "partition_metrics", error = %e, "Partition metrics unavailable, stage skipped");
            }
        }
    }

    Ok(format!("healthy (last record {} minutes ago)", freshness.elapsed_minutes))
}

/// Age of the newest record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Freshness {
    pub elapsed_secs: f64,
    pub elapsed_minutes: i64,
    pub last_seen: DateTime<FixedOffset>,
}

/// Stage 2: the newest record must be younger than the staleness timeout.
pub fn check_freshness(
    record: &Value,
    time_field: &str,
    now: DateTime<Utc>,
    timeout_secs: u64,
    local: FixedOffset,
) -> Result<Freshness, String> {
    let raw = record.get(time_field).and_then(Value::as_str).unwrap_or_default();
    let last = parse_timestamp(raw, local).map_err(|_| format!("{} unparseable: '{}'", time_field, raw))?;

    let elapsed_secs = (now - last.with_timezone(&Utc)).num_milliseconds() as f64 / 1000.0;
    let elapsed_minutes = (elapsed_secs / 60.0).floor() as i64;
    let last_seen = last.with_timezone(&local);

    if elapsed_secs > timeout_secs as f64 {
        return Err(format!(
            "no response for {} minutes (last seen {})",
            elapsed_minutes,
            last_seen.format("%H:%M")
        ));
    }

    Ok(Freshness { elapsed_secs, elapsed_minutes, last_seen })
}

/// Stage 3: an explicit `stopped` status fails the check.
pub fn check_not_stopped(record: &Value, status_field: &str) -> Result<(), String> {
    match record.get(status_field).and_then(Value::as_str) {
        Some("stopped") => Err("status: stopped".to_string()),
        _ => Ok(()),
    }
}

/// Stage 4: an error-level log entry inside the window fails the check.
///
/// `errors` is newest first; only the newest entry matters.
pub fn check_recent_errors(
    errors: &[Value],
    now: DateTime<Utc>,
    window_secs: u64,
    local: FixedOffset,
) -> Result<(), String> {
    let Some(newest) = errors.first() else {
        return Ok(());
    };

    let raw = newest.get("created").and_then(Value::as_str).unwrap_or_default();
    let created = match parse_timestamp(raw, local) {
        Ok(created) => created,
        // An error entry we cannot date does not prove a current failure.
        Err(_) => return Ok(()),
    };

    let age_secs = (now - created.with_timezone(&Utc)).num_milliseconds() as f64 / 1000.0;
    if age_secs < window_secs as f64 {
        let message = newest.get("message").and_then(Value::as_str).unwrap_or_default();
        return Err(format!("recent error: {}", truncate(message, ERROR_MESSAGE_LIMIT)));
    }
    Ok(())
}

/// Stage 5: partitions failing in both recent snapshots fail the check.
pub fn check_partitions(records: &[Value]) -> Result<(), String> {
    let snapshots: Vec<MetricSnapshot> = records.iter().map(MetricSnapshot::from_record).collect();
    let failures = persistent_failures(&snapshots);
    if failures.is_empty() {
        return Ok(());
    }

    let parts: Vec<String> = failures
        .iter()
        .map(|f| format!("{}({})", f.partition, truncate(&f.error, PARTITION_ERROR_LIMIT)))
        .collect();
    Err(format!("persistent partition failures: {}", parts.join("; ")))
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
