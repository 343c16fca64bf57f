//! In-process display surface: a fixed set of named text elements plus the two
//! chart canvases. The HTTP view publishes it verbatim.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::Serialize;

pub const BOT_STATUS: &str = "bot-status";
pub const BOT_UPTIME: &str = "bot-uptime";
pub const TASKS_COUNT: &str = "tasks-count";
pub const ERROR_COUNT: &str = "error-count";
pub const TRADE_COUNT: &str = "trade-count";
pub const WIN_RATE: &str = "win-rate";
pub const LAST_TRADE: &str = "last-trade";
pub const LAST_UPDATED: &str = "last-updated";

pub const WHALE_DETECTION: &str = "whale-detection";
pub const MACD_STATUS: &str = "macd-status";
pub const POSITION_SIZING: &str = "position-sizing";
pub const PRE_MARKET_SCANNING: &str = "pre-market-scanning";
pub const BINANCE_STATUS: &str = "binance-status";
pub const AUTH_STATUS: &str = "auth-status";
pub const RATE_LIMIT: &str = "rate-limit";

pub const PORTFOLIO_CANVAS: &str = "portfolioValueChart";
pub const ALLOCATION_CANVAS: &str = "assetAllocationChart";

const TEXT_ELEMENTS: &[&str] = &[
    BOT_STATUS,
    BOT_UPTIME,
    TASKS_COUNT,
    ERROR_COUNT,
    TRADE_COUNT,
    WIN_RATE,
    LAST_TRADE,
    LAST_UPDATED,
];

pub const BADGE_ELEMENTS: &[&str] = &[
    WHALE_DETECTION,
    MACD_STATUS,
    POSITION_SIZING,
    PRE_MARKET_SCANNING,
    BINANCE_STATUS,
    AUTH_STATUS,
    RATE_LIMIT,
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Element {
    pub text: String,
    pub classes: Vec<String>,
}

impl Element {
    pub fn with_classes(text: &str, classes: &[&str]) -> Self {
        Self {
            text: text.to_string(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn clear_classes(&mut self) {
        self.classes.clear();
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn remove_classes(&mut self, classes: &[&str]) {
        self.classes.retain(|c| !classes.contains(&c.as_str()));
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    elements: BTreeMap<String, Element>,
    canvases: Vec<String>,
}

impl Page {
    /// An empty surface; elements must be added before rendering into it.
    pub fn empty() -> Self {
        Self {
            elements: BTreeMap::new(),
            canvases: Vec::new(),
        }
    }

    /// The dashboard's full markup: every element and canvas the renderer needs.
    pub fn standard() -> Self {
        let mut page = Self::empty();
        for id in TEXT_ELEMENTS {
            page.insert(id, Element::with_classes("–", &[]));
        }
        for id in BADGE_ELEMENTS {
            page.insert(id, Element::with_classes("Unknown", &["badge", "badge-unknown"]));
        }
        page.add_canvas(PORTFOLIO_CANVAS);
        page.add_canvas(ALLOCATION_CANVAS);
        page
    }

    pub fn insert(&mut self, id: &str, el: Element) {
        self.elements.insert(id.to_string(), el);
    }

    pub fn remove(&mut self, id: &str) -> Option<Element> {
        self.elements.remove(id)
    }

    pub fn add_canvas(&mut self, id: &str) {
        if !self.has_canvas(id) {
            self.canvases.push(id.to_string());
        }
    }

    pub fn has_canvas(&self, id: &str) -> bool {
        self.canvases.iter().any(|c| c == id)
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Missing targets are markup defects, not data issues, so they fail loudly.
    pub fn element_mut(&mut self, id: &str) -> Result<&mut Element> {
        match self.elements.get_mut(id) {
            Some(el) => Ok(el),
            None => bail!("page.missing_element id={id}"),
        }
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.element(id).map(|e| e.text.as_str())
    }

    pub fn elements(&self) -> &BTreeMap<String, Element> {
        &self.elements
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::standard()
    }
}
