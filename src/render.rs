use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Local};
use parking_lot::RwLock;

use crate::{
    badge::apply_badge,
    charts::Charts,
    format::format_local,
    metrics::{DashboardView, MetricsDocument},
    page::{self, Page},
};

/// Owns the display surface and both chart handles. Nothing else mutates them.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    page: Page,
    charts: Charts,
}

pub type SharedDashboard = Arc<RwLock<Dashboard>>;

impl Dashboard {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            charts: Charts::default(),
        }
    }

    pub fn shared(self) -> SharedDashboard {
        Arc::new(RwLock::new(self))
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn charts(&self) -> &Charts {
        &self.charts
    }

    pub fn update_dashboard(&mut self, doc: &MetricsDocument) -> Result<()> {
        self.update_dashboard_at(doc, Local::now())
    }

    /// Renders into scratch copies and commits only if every target was found,
    /// so a failed cycle leaves the previous state on display.
    pub fn update_dashboard_at(&mut self, doc: &MetricsDocument, now: DateTime<Local>) -> Result<()> {
        let view = DashboardView::from_document(doc);

        let mut page = self.page.clone();
        let mut charts = self.charts.clone();
        render_fields(&mut page, &view)?;
        charts.update_series(&page, view.series_labels, view.series_values)?;
        charts.update_breakdown(&page, view.breakdown_labels, view.breakdown_values)?;
        page.element_mut(page::LAST_UPDATED)?
            .set_text(format_local(&now));

        self.page = page;
        self.charts = charts;
        Ok(())
    }
}

fn render_fields(page: &mut Page, view: &DashboardView) -> Result<()> {
    let status = page.element_mut(page::BOT_STATUS)?;
    status.set_text(view.status.text.as_str());
    status.clear_classes();
    status.add_class("fw-bold");
    status.add_class(view.status.class);

    page.element_mut(page::BOT_UPTIME)?.set_text(view.uptime.as_str());
    page.element_mut(page::TASKS_COUNT)?
        .set_text(view.scheduled_tasks.as_str());
    page.element_mut(page::ERROR_COUNT)?
        .set_text(view.error_count.as_str());
    page.element_mut(page::TRADE_COUNT)?
        .set_text(view.trades_last_24h.as_str());
    page.element_mut(page::WIN_RATE)?.set_text(view.win_rate.as_str());
    page.element_mut(page::LAST_TRADE)?.set_text(view.last_trade.as_str());

    for slot in &view.badges {
        apply_badge(page.element_mut(slot.element)?, slot.status);
    }
    Ok(())
}
