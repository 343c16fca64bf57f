//! The primary-failure warning goes through the `log` facade. This binary
//! installs its own logger, so it holds a single test.

use std::io::Write;

use axum::{http::StatusCode, routing::get, Router};
use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

use pulseboard::fetcher::{FallbackSource, MetricsFetcher, SourceKind};

struct Capture {
    lines: Mutex<Vec<(Level, String)>>,
}

impl Log for Capture {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.lines
            .lock()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture {
    lines: parking_lot::const_mutex(Vec::new()),
};

#[tokio::test]
async fn primary_failure_logs_warning_then_uses_fallback() {
    log::set_logger(&CAPTURE).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let app = Router::new().route(
        "/api/metrics",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"status": "offline"}}"#).unwrap();

    let primary = format!("http://{addr}/api/metrics");
    let fetcher =
        MetricsFetcher::new(&primary, FallbackSource::File(file.path().to_path_buf())).unwrap();
    let fetched = fetcher.fetch().await.unwrap();
    assert_eq!(fetched.source, SourceKind::Fallback);

    let lines = CAPTURE.lines.lock();
    let warning = lines
        .iter()
        .find(|(level, msg)| *level == Level::Warn && msg.starts_with("metrics.primary_failed"))
        .unwrap_or_else(|| panic!("no primary_failed warning in {lines:?}"));
    assert!(warning.1.contains(&primary), "{}", warning.1);
    assert!(warning.1.contains("503"), "{}", warning.1);
}
