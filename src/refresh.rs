use std::{sync::Arc, time::Duration};

use anyhow::Result;
use parking_lot::RwLock;
use serde::Serialize;

use crate::{
    fetcher::{MetricsFetcher, SourceKind},
    render::SharedDashboard,
};

pub fn now_ts() -> f64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    now.as_secs_f64()
}

/// Outcome of the most recent refresh cycles, served at `/api/health`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshStatus {
    pub cycles_ok: u64,
    pub cycles_failed: u64,
    pub last_source: Option<SourceKind>,
    pub last_success_ts: Option<f64>,
    pub last_error: Option<String>,
    pub last_error_ts: Option<f64>,
}

pub type SharedStatus = Arc<RwLock<RefreshStatus>>;

impl RefreshStatus {
    pub fn shared() -> SharedStatus {
        Arc::new(RwLock::new(Self::default()))
    }

    fn record_ok(&mut self, source: SourceKind, ts: f64) {
        self.cycles_ok += 1;
        self.last_source = Some(source);
        self.last_success_ts = Some(ts);
    }

    fn record_failure(&mut self, err: &anyhow::Error, ts: f64) {
        self.cycles_failed += 1;
        self.last_error = Some(format!("{err:#}"));
        self.last_error_ts = Some(ts);
    }
}

/// One fetch -> normalize -> render -> chart cycle. The only await is the
/// fetch; the render runs under the write lock in one step.
pub async fn refresh_once(fetcher: &MetricsFetcher, dashboard: &SharedDashboard) -> Result<SourceKind> {
    let fetched = fetcher.fetch().await?;
    dashboard.write().update_dashboard(&fetched.doc)?;
    Ok(fetched.source)
}

/// [`refresh_once`] plus bookkeeping. Failures are logged and recorded; the
/// next tick is the retry.
pub async fn run_cycle(
    fetcher: &MetricsFetcher,
    dashboard: &SharedDashboard,
    status: &SharedStatus,
) -> Result<SourceKind> {
    match refresh_once(fetcher, dashboard).await {
        Ok(source) => {
            status.write().record_ok(source, now_ts());
            log::info!("refresh.ok source={}", source.as_str());
            Ok(source)
        }
        Err(e) => {
            status.write().record_failure(&e, now_ts());
            log::error!("refresh.failed err={:#}", e);
            Err(e)
        }
    }
}

/// Runs one cycle immediately, then one per `period`, forever. Cycles are
/// strictly sequential; ticks that come due while a cycle is still waiting on
/// the network are skipped rather than queued.
pub async fn run(
    fetcher: MetricsFetcher,
    dashboard: SharedDashboard,
    status: SharedStatus,
    period: Duration,
) -> Result<()> {
    log::info!(
        "refresh.start primary={} fallback={} period_secs={}",
        fetcher.primary_url(),
        fetcher.fallback(),
        period.as_secs()
    );
    let mut tick = tokio::time::interval(period);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tick.tick().await;
        let _ = run_cycle(&fetcher, &dashboard, &status).await;
    }
}
