//! Fan-out across adapters and post-processing of merged results.
//!
//! A call against [`PlatformTarget::All`] starts one future per registered
//! adapter and joins them. The join is all-or-nothing: the first adapter
//! failure drops the remaining futures and fails the whole call with
//! [`AppError::Aggregate`].

use crate::adapters::{AdapterRegistry, AdapterResult, PlatformAdapter};
use crate::error::{AppError, Result};
use crate::models::{PlatformStatus, PlatformTarget};
use futures::future::try_join_all;
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Rank used for anything that is not a known priority label.
const UNKNOWN_PRIORITY_RANK: u8 = 99;

/// Run `op` against the adapters addressed by `target` and concatenate the
/// per-adapter lists in registry order.
pub async fn fan_out<T, F, Fut>(
    registry: &AdapterRegistry,
    target: PlatformTarget,
    op: F,
) -> Result<Vec<T>>
where
    F: Fn(Arc<dyn PlatformAdapter>) -> Fut,
    Fut: Future<Output = AdapterResult<Vec<T>>>,
{
    match target {
        PlatformTarget::One(platform) => {
            let adapter = registry.get(platform)?;
            Ok(op(adapter).await?)
        }
        PlatformTarget::All => {
            let start = Instant::now();
            let adapters = registry.resolve(PlatformTarget::All)?;
            let width = adapters.len();

            let per_adapter = try_join_all(adapters.into_iter().map(|adapter| op(adapter)))
                .await
                .map_err(|err| {
                    tracing::warn!(
                        failed_platform = %err.platform(),
                        error = %err,
                        "Fan-out member failed, aborting"
                    );
                    AppError::Aggregate(err)
                })?;

            let elapsed_ms = start.elapsed().as_millis() as u64;
            tracing::debug!(width, elapsed_ms, "Fan-out joined");
            metrics::histogram!("gateway_fanout_latency_ms").record(elapsed_ms as f64);

            Ok(per_adapter.into_iter().flatten().collect())
        }
    }
}

/// Drop repeated `(platform, status, detail)` entries, keeping first occurrences in order.
pub fn dedup_statuses(statuses: Vec<PlatformStatus>) -> Vec<PlatformStatus> {
    let mut seen = HashSet::new();
    statuses
        .into_iter()
        .filter(|s| seen.insert((s.platform, s.status.clone(), s.detail.clone())))
        .collect()
}

pub fn priority_rank(label: Option<&str>) -> u8 {
    match label {
        Some("urgent") => 0,
        Some("normal") => 1,
        Some("low") => 2,
        _ => UNKNOWN_PRIORITY_RANK,
    }
}

/// Stable sort of message-like objects by their `priority` field.
///
/// Absent or unrecognised priorities sort last; equal ranks keep their input order.
pub fn rank_by_priority(mut items: Vec<Value>) -> Vec<Value> {
    items.sort_by_key(|item| priority_rank(item.get("priority").and_then(Value::as_str)));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StubAdapter;
    use crate::error::AdapterError;
    use crate::models::Platform;
    use serde_json::json;

    fn status(platform: Platform, status: &str, detail: Option<&str>) -> PlatformStatus {
        PlatformStatus {
            platform,
            connected: true,
            status: status.to_string(),
            detail: detail.map(str::to_string),
        }
    }

    fn stub_registry() -> AdapterRegistry {
        AdapterRegistry::new(
            Platform::ALL
                .into_iter()
                .map(|p| Arc::new(StubAdapter::new(p)) as Arc<dyn PlatformAdapter>)
                .collect(),
        )
    }

    #[test]
    fn test_rank_is_stable() {
        let items = vec![
            json!({"id": "a", "priority": "low"}),
            json!({"id": "b", "priority": "urgent"}),
            json!({"id": "c", "priority": "normal"}),
            json!({"id": "d", "priority": "urgent"}),
        ];

        let ids: Vec<String> = rank_by_priority(items)
            .iter()
            .map(|m| m["id"].as_str().unwrap().to_string())
            .collect();

        assert_eq!(ids, vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_rank_puts_unknown_and_missing_last() {
        let items = vec![
            json!({"id": "a"}),
            json!({"id": "b", "priority": "someday"}),
            json!({"id": "c", "priority": "low"}),
            json!({"id": "d", "priority": 3}),
        ];

        let ids: Vec<String> = rank_by_priority(items)
            .iter()
            .map(|m| m["id"].as_str().unwrap().to_string())
            .collect();

        assert_eq!(ids, vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let merged = vec![
            status(Platform::Email, "healthy", Some("x")),
            status(Platform::Slack, "stub", None),
            status(Platform::Email, "healthy", Some("x")),
            status(Platform::Email, "healthy", Some("y")),
            status(Platform::Email, "healthy", Some("x")),
        ];

        let deduped = dedup_statuses(merged);

        assert_eq!(
            deduped,
            vec![
                status(Platform::Email, "healthy", Some("x")),
                status(Platform::Slack, "stub", None),
                status(Platform::Email, "healthy", Some("y")),
            ]
        );
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let once = dedup_statuses(vec![
            status(Platform::Email, "healthy", None),
            status(Platform::Email, "healthy", None),
            status(Platform::Whatsapp, "stub", Some("d")),
        ]);
        let twice = dedup_statuses(once.clone());
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_fan_out_merges_in_registry_order() {
        let registry = stub_registry();

        let statuses = fan_out(&registry, PlatformTarget::All, |adapter| async move {
            adapter.get_platforms("tok").await
        })
        .await
        .unwrap();

        let platforms: Vec<Platform> = statuses.iter().map(|s| s.platform).collect();
        assert_eq!(platforms, Platform::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_fan_out_aborts_on_first_failure() {
        let registry = stub_registry();

        let err = fan_out(&registry, PlatformTarget::All, |adapter| async move {
            if adapter.platform() == Platform::Slack {
                Err(AdapterError::Transport {
                    platform: Platform::Slack,
                    detail: "down".to_string(),
                })
            } else {
                adapter.get_platforms("tok").await
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Aggregate(e) if e.platform() == Platform::Slack));
    }

    #[tokio::test]
    async fn test_single_platform_error_is_not_aggregate() {
        let registry = stub_registry();

        let err = fan_out(&registry, PlatformTarget::One(Platform::Email), |adapter| async move {
            adapter.mark_as_read("tok", "m1").await.map(|m| vec![m])
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Adapter(AdapterError::NotImplemented { .. })));
    }
}
