use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;

use crate::{
    config::Settings,
    page::{self, Page},
    refresh::{now_ts, SharedStatus},
    render::SharedDashboard,
};

#[derive(Clone)]
pub struct DashboardState {
    pub settings: Settings,
    pub dashboard: SharedDashboard,
    pub status: SharedStatus,
}

pub fn router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/view", get(api_view))
        .route("/api/charts", get(api_charts))
        .route("/api/health", get(api_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve_dashboard(
    settings: Settings,
    dashboard: SharedDashboard,
    status: SharedStatus,
) -> Result<()> {
    let addr: SocketAddr = settings
        .dashboard_addr()
        .parse()
        .with_context(|| format!("dashboard addr {}", settings.dashboard_addr()))?;
    let app = router(DashboardState {
        settings,
        dashboard,
        status,
    });

    log::info!("dashboard.start url=http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index(State(st): State<DashboardState>) -> impl IntoResponse {
    let page = st.dashboard.read().page().clone();
    Html(render_index_html(&page, st.settings.refresh_secs))
}

async fn api_view(State(st): State<DashboardState>) -> impl IntoResponse {
    let page = st.dashboard.read().page().clone();
    Json(page)
}

async fn api_charts(State(st): State<DashboardState>) -> impl IntoResponse {
    let d = st.dashboard.read();
    Json(serde_json::json!({
        "series": d.charts().series(),
        "breakdown": d.charts().breakdown(),
    }))
}

async fn api_health(State(st): State<DashboardState>) -> impl IntoResponse {
    let refresh = st.status.read().clone();
    Json(serde_json::json!({
        "ts": now_ts(),
        "primary": st.settings.metrics_url,
        "fallback": st.settings.fallback,
        "refresh": refresh,
    }))
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<span id=.. class=..>text</span>` for one page element, or an empty span
/// if the page lacks it.
fn span(page: &Page, id: &str) -> String {
    let (text, classes) = page
        .element(id)
        .map(|e| (e.text.as_str(), e.classes.join(" ")))
        .unwrap_or(("", String::new()));
    format!(
        r#"<span id="{}" class="{}">{}</span>"#,
        escape_html(id),
        escape_html(&classes),
        escape_html(text)
    )
}

fn row(page: &Page, label: &str, id: &str) -> String {
    format!(
        r#"<div class="row"><span class="lbl">{}</span>{}</div>"#,
        escape_html(label),
        span(page, id)
    )
}

fn render_index_html(page: &Page, refresh_secs: u64) -> String {
    let system = [
        row(page, "Status", page::BOT_STATUS),
        row(page, "Uptime", page::BOT_UPTIME),
        row(page, "Scheduled tasks", page::TASKS_COUNT),
        row(page, "Errors", page::ERROR_COUNT),
    ]
    .join("\n");
    let trades = [
        row(page, "Trades (24h)", page::TRADE_COUNT),
        row(page, "Win rate", page::WIN_RATE),
        row(page, "Last trade", page::LAST_TRADE),
    ]
    .join("\n");
    let features = [
        row(page, "Whale detection", page::WHALE_DETECTION),
        row(page, "MACD analysis", page::MACD_STATUS),
        row(page, "Position sizing", page::POSITION_SIZING),
        row(page, "Pre-market scanning", page::PRE_MARKET_SCANNING),
    ]
    .join("\n");
    let api = [
        row(page, "Exchange connection", page::BINANCE_STATUS),
        row(page, "Authentication", page::AUTH_STATUS),
        row(page, "Rate limit", page::RATE_LIMIT),
    ]
    .join("\n");
    let last_updated = span(page, page::LAST_UPDATED);
    let poll_ms = refresh_secs.saturating_mul(1000);
    let series_canvas = page::PORTFOLIO_CANVAS;
    let breakdown_canvas = page::ALLOCATION_CANVAS;

    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Pulseboard • Bot Metrics</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
    <style>
      body {{ margin: 0; font-family: ui-sans-serif, system-ui, Segoe UI, Roboto, Arial; background: #0b1220; color: rgba(255,255,255,0.92); }}
      .wrap {{ max-width: 1180px; margin: 0 auto; padding: 22px 18px 42px; }}
      .grid {{ display: grid; gap: 14px; grid-template-columns: repeat(auto-fit, minmax(260px, 1fr)); margin-top: 14px; }}
      .card {{ border: 1px solid rgba(255,255,255,0.12); border-radius: 16px; background: rgba(255,255,255,0.06); padding: 12px 14px; }}
      .card h3 {{ margin: 0 0 10px; font-size: 14px; }}
      .row {{ display: flex; justify-content: space-between; padding: 5px 0; font-size: 13px; }}
      .lbl {{ color: rgba(255,255,255,0.65); }}
      .fw-bold {{ font-weight: 800; }}
      .text-success {{ color: #33d17a; }}
      .text-danger {{ color: #ff4d4d; }}
      .text-secondary {{ color: rgba(255,255,255,0.65); }}
      .badge {{ padding: 2px 8px; border-radius: 999px; font-size: 12px; }}
      .badge-online {{ background: rgba(51,209,122,0.25); }}
      .badge-offline {{ background: rgba(255,77,77,0.25); }}
      .badge-warning {{ background: rgba(255,204,0,0.25); }}
      .badge-unknown {{ background: rgba(255,255,255,0.10); }}
      .chart {{ height: 320px; }}
      .footer {{ margin-top: 14px; color: rgba(255,255,255,0.65); font-size: 12px; }}
    </style>
  </head>
  <body>
    <div class="wrap">
      <div class="grid">
        <div class="card"><h3>System</h3>
{system}
        </div>
        <div class="card"><h3>Trading</h3>
{trades}
        </div>
        <div class="card"><h3>Enhanced features</h3>
{features}
        </div>
        <div class="card"><h3>API connectivity</h3>
{api}
        </div>
      </div>
      <div class="grid">
        <div class="card"><h3>Portfolio value</h3><div class="chart"><canvas id="{series_canvas}"></canvas></div></div>
        <div class="card"><h3>Asset allocation</h3><div class="chart"><canvas id="{breakdown_canvas}"></canvas></div></div>
      </div>
      <div class="footer">Last updated: {last_updated}</div>
    </div>
    <script>
      const charts = {{}};

      function paintView(view) {{
        for (const [id, el] of Object.entries(view.elements || {{}})) {{
          const node = document.getElementById(id);
          if (!node) continue;
          node.textContent = el.text;
          node.className = (el.classes || []).join(" ");
        }}
      }}

      function paintChart(cfg) {{
        if (!cfg || typeof Chart === "undefined") return;
        const existing = charts[cfg.canvas];
        if (existing) {{
          if (existing.revision === cfg.revision) return;
          existing.chart.data.labels = cfg.data.labels;
          existing.chart.data.datasets[0].data = cfg.data.datasets[0].data;
          existing.chart.data.datasets[0].backgroundColor = cfg.data.datasets[0].backgroundColor;
          existing.chart.update();
          existing.revision = cfg.revision;
          return;
        }}
        const ctx = document.getElementById(cfg.canvas).getContext("2d");
        charts[cfg.canvas] = {{
          revision: cfg.revision,
          chart: new Chart(ctx, {{ type: cfg.type, data: cfg.data, options: cfg.options }}),
        }};
      }}

      async function refresh() {{
        try {{
          const [view, cfgs] = await Promise.all([
            fetch("/api/view", {{ cache: "no-store" }}).then(r => r.json()),
            fetch("/api/charts", {{ cache: "no-store" }}).then(r => r.json()),
          ]);
          paintView(view);
          paintChart(cfgs.series);
          paintChart(cfgs.breakdown);
        }} catch (e) {{
          console.warn("view refresh failed:", e.message);
        }}
      }}

      refresh();
      setInterval(refresh, {poll_ms});
    </script>
  </body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<b a="1">&'</b>"#), "&lt;b a=&quot;1&quot;&gt;&amp;&#39;&lt;/b&gt;");
    }

    #[test]
    fn index_contains_current_values() {
        let mut page = Page::standard();
        page.element_mut(page::WIN_RATE).unwrap().set_text("50%");
        page.element_mut(page::BOT_STATUS).unwrap().set_text("<Online>");
        let html = render_index_html(&page, 60);
        assert!(html.contains(r#"<span id="win-rate" class="">50%</span>"#));
        assert!(html.contains("&lt;Online&gt;"));
        assert!(html.contains(r#"<canvas id="portfolioValueChart">"#));
        assert!(html.contains("setInterval(refresh, 60000)"));
    }
}
