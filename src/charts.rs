//! Persistent chart state. Each chart is bound to its canvas on first use and
//! mutated in place afterwards; the browser keeps one Chart.js instance per
//! canvas and copies `data` across on every revision.

use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::page::{Page, ALLOCATION_CANVAS, PORTFOLIO_CANVAS};

pub const PALETTE: &[&str] = &[
    "#0d6efd", "#198754", "#dc3545", "#ffc107", "#6610f2", "#6f42c1", "#d63384",
];

const LINE_BORDER: &str = "rgba(13, 110, 253, 0.8)";
const LINE_FILL: &str = "rgba(13, 110, 253, 0.3)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Doughnut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Paint {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<Option<f64>>,
    pub border_color: Paint,
    pub background_color: Paint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub canvas: String,
    /// Fixed for the chart's lifetime.
    pub instance: u64,
    /// Bumped by every in-place update.
    pub revision: u64,
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: ChartData,
    pub options: JsonValue,
}

impl Chart {
    fn line(instance: u64, canvas: &str) -> Self {
        Self {
            canvas: canvas.to_string(),
            instance,
            revision: 0,
            kind: ChartKind::Line,
            data: ChartData {
                labels: Vec::new(),
                datasets: vec![Dataset {
                    label: Some("Portfolio Value (USD)".to_string()),
                    data: Vec::new(),
                    border_color: Paint::One(LINE_BORDER.to_string()),
                    background_color: Paint::One(LINE_FILL.to_string()),
                    fill: Some(true),
                    tension: Some(0.2),
                    border_width: None,
                }],
            },
            options: serde_json::json!({
                "responsive": true,
                "maintainAspectRatio": false,
                "scales": {
                    "x": { "title": { "display": true, "text": "Time" } },
                    "y": { "title": { "display": true, "text": "Value (USD)" }, "beginAtZero": false }
                }
            }),
        }
    }

    fn doughnut(instance: u64, canvas: &str) -> Self {
        Self {
            canvas: canvas.to_string(),
            instance,
            revision: 0,
            kind: ChartKind::Doughnut,
            data: ChartData {
                labels: Vec::new(),
                datasets: vec![Dataset {
                    label: None,
                    data: Vec::new(),
                    border_color: Paint::One("#fff".to_string()),
                    background_color: Paint::Many(Vec::new()),
                    fill: None,
                    tension: None,
                    border_width: Some(1),
                }],
            },
            options: serde_json::json!({
                "responsive": true,
                "maintainAspectRatio": false,
                "plugins": { "legend": { "position": "right" } }
            }),
        }
    }

    fn replace(&mut self, labels: Vec<String>, values: Vec<Option<f64>>) {
        self.data.labels = labels;
        if let Some(ds) = self.data.datasets.first_mut() {
            ds.data = values;
        }
        self.revision += 1;
    }
}

/// Cycles the palette when there are more categories than colors.
pub fn palette_for(n: usize) -> Vec<String> {
    PALETTE.iter().cycle().take(n).map(|c| c.to_string()).collect()
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Charts {
    series: Option<Chart>,
    breakdown: Option<Chart>,
    #[serde(skip)]
    next_instance: u64,
}

fn bind<'a>(
    slot: &'a mut Option<Chart>,
    next_instance: &mut u64,
    page: &Page,
    canvas: &str,
    build: fn(u64, &str) -> Chart,
) -> Result<&'a mut Chart> {
    if slot.is_none() {
        if !page.has_canvas(canvas) {
            bail!("charts.missing_canvas id={canvas}");
        }
        *next_instance += 1;
        log::debug!("charts.created canvas={canvas} instance={}", *next_instance);
    }
    let id = *next_instance;
    Ok(slot.get_or_insert_with(|| build(id, canvas)))
}

impl Charts {
    pub fn series(&self) -> Option<&Chart> {
        self.series.as_ref()
    }

    pub fn breakdown(&self) -> Option<&Chart> {
        self.breakdown.as_ref()
    }

    /// Time-series chart: one filled line, y axis not forced to zero.
    pub fn update_series(
        &mut self,
        page: &Page,
        labels: Vec<String>,
        values: Vec<Option<f64>>,
    ) -> Result<&Chart> {
        let chart = bind(
            &mut self.series,
            &mut self.next_instance,
            page,
            PORTFOLIO_CANVAS,
            Chart::line,
        )?;
        chart.replace(labels, values);
        Ok(chart)
    }

    /// Breakdown chart: one slice per category, colors recomputed to match.
    pub fn update_breakdown(
        &mut self,
        page: &Page,
        labels: Vec<String>,
        values: Vec<Option<f64>>,
    ) -> Result<&Chart> {
        let chart = bind(
            &mut self.breakdown,
            &mut self.next_instance,
            page,
            ALLOCATION_CANVAS,
            Chart::doughnut,
        )?;
        let colors = palette_for(labels.len());
        if let Some(ds) = chart.data.datasets.first_mut() {
            ds.background_color = Paint::Many(colors);
        }
        chart.replace(labels, values);
        Ok(chart)
    }
}
