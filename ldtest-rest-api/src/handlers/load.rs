//! `POST /load`: on-demand load runs with result memoization

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use ldtest_core::{Fingerprint, LoadTestConfig, Target, TargetStats};
use ldtest_engine::{rollup_by_host, Engine};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    context::LoadContext,
    errors::{RestError, RestResult},
    models::{LoadResponse, TargetItem},
    overrides::{self, LoadQuery},
};

/// Load test a list of URLs.
///
/// Targets with a cached, non-zero recommendation for the same configuration are
/// answered from the cache. The rest run for at most the stress test timeout; their
/// results (partial if the budget ran out) are returned and written back to the cache.
pub async fn load_handler(
    State(ctx): State<LoadContext>,
    headers: HeaderMap,
    Query(query): Query<LoadQuery>,
    body: Bytes,
) -> RestResult<Json<LoadResponse>> {
    let config = overrides::resolve(&headers, &query)?.apply(&ctx.base_config);
    let group_by_host = query.group_by_host()?;
    let targets = parse_targets(&body)?;
    let fingerprint = config.fingerprint()?;

    let mut results = BTreeMap::new();
    let mut pending = Vec::new();
    for target in targets {
        match ctx.cache.get(&target, &fingerprint) {
            Some(stats) if stats.recommended_concurrency > 0 => {
                results.insert(target, stats);
            }
            _ => pending.push(target),
        }
    }

    info!(
        "Load request: {} cached, {} to test, method {}",
        results.len(),
        pending.len(),
        config.method
    );

    if !pending.is_empty() {
        let fresh = run_fresh(&ctx, &config, &fingerprint, &pending).await?;
        results.extend(fresh);
    }

    let data = if group_by_host {
        rollup_by_host(&results)
    } else {
        results
            .iter()
            .map(|(target, stats)| (target.url().to_string(), *stats))
            .collect()
    };

    Ok(Json(LoadResponse::success(config, data)))
}

fn parse_targets(body: &[u8]) -> RestResult<Vec<Target>> {
    let items: Vec<TargetItem> = serde_json::from_slice(body)
        .map_err(|e| RestError::bad_request(format!("invalid request body: {}", e)))?;

    items
        .iter()
        .map(|item| Target::parse(item.url()).map_err(RestError::from))
        .collect()
}

async fn run_fresh(
    ctx: &LoadContext,
    config: &LoadTestConfig,
    fingerprint: &Fingerprint,
    targets: &[Target],
) -> RestResult<BTreeMap<Target, TargetStats>> {
    let cancel = ctx.shutdown.child_token();
    // Cancels the run if the client goes away and the handler future is dropped
    let _run_guard = cancel.clone().drop_guard();
    spawn_deadline(cancel.clone(), ctx.stress_test_timeout);

    let engine = Engine::new(config.clone(), ctx.executors.clone());
    let report = engine.run(targets, &cancel).await?;

    for (target, stats) in &report.stats {
        ctx.cache
            .put(target.clone(), fingerprint.clone(), *stats, ctx.cache_ttl);
    }
    debug!("Cached {} fresh results", report.stats.len());

    Ok(report.stats)
}

/// Cancel `token` once `budget` elapses, unless it is cancelled first
fn spawn_deadline(token: CancellationToken, budget: Duration) {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(budget) => {
                debug!("Stress test budget of {:?} exhausted", budget);
                token.cancel();
            }
        }
    });
}
