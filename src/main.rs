use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use pulseboard::{
    config::Settings,
    dashboard,
    fetcher::MetricsFetcher,
    refresh::{self, RefreshStatus},
    render::Dashboard,
};

#[derive(Debug, Parser)]
#[command(name = "pulseboard", version)]
struct Cli {
    /// Override METRICS_URL (primary metrics endpoint)
    #[arg(long)]
    metrics_url: Option<String>,

    /// Override METRICS_FALLBACK (url or file path)
    #[arg(long)]
    fallback: Option<String>,

    /// Override REFRESH_SECS
    #[arg(long)]
    refresh_secs: Option<u64>,

    /// Run a single refresh cycle, print the rendered view as JSON and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(url) = cli.metrics_url {
        settings.metrics_url = url;
    }
    if let Some(fb) = cli.fallback {
        settings.fallback = fb;
    }
    if let Some(secs) = cli.refresh_secs {
        settings.refresh_secs = secs;
    }
    settings.validate()?;

    let fetcher = MetricsFetcher::from_settings(&settings)?;
    let board = Dashboard::default().shared();
    let status = RefreshStatus::shared();

    log::info!(
        "app.start primary={} fallback={} refresh_secs={} dashboard={}",
        settings.metrics_url,
        settings.fallback,
        settings.refresh_secs,
        settings.dashboard_enabled
    );

    if cli.once {
        let source = refresh::run_cycle(&fetcher, &board, &status).await?;
        let d = board.read();
        let out = serde_json::json!({
            "source": source,
            "page": d.page(),
            "charts": {
                "series": d.charts().series(),
                "breakdown": d.charts().breakdown(),
            },
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    // View server runs alongside the refresh loop for the process lifetime.
    if settings.dashboard_enabled {
        let st = settings.clone();
        let db = board.clone();
        let rs = status.clone();
        let url = format!("http://{}/", st.dashboard_addr());
        tokio::spawn(async move {
            if let Err(e) = dashboard::serve_dashboard(st, db, rs).await {
                log::error!("dashboard.error {}", e);
            }
        });

        if settings.dashboard_open_browser {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(650)).await;
                let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
            });
        }
    }

    refresh::run(
        fetcher,
        board,
        status,
        Duration::from_secs(settings.refresh_secs),
    )
    .await
}
