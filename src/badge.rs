use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::page::Element;

/// Every class a badge may carry from any earlier render.
const BADGE_CLASSES: &[&str] = &[
    "badge-online",
    "badge-offline",
    "badge-unknown",
    "badge-warning",
    "bg-primary",
    "bg-success",
    "bg-secondary",
    "bg-danger",
    "bg-warning",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeStatus {
    Online,
    Offline,
    Warning,
    Unknown,
}

impl BadgeStatus {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "online" | "connected" | "valid" => BadgeStatus::Online,
            "offline" | "disconnected" | "invalid" => BadgeStatus::Offline,
            "warning" => BadgeStatus::Warning,
            _ => BadgeStatus::Unknown,
        }
    }

    /// Strings go through [`from_raw`](Self::from_raw); any other value,
    /// booleans and `null` included, is unknown.
    pub fn from_value(v: Option<&JsonValue>) -> Self {
        match v {
            Some(JsonValue::String(s)) => Self::from_raw(s),
            _ => BadgeStatus::Unknown,
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            BadgeStatus::Online => "badge-online",
            BadgeStatus::Offline => "badge-offline",
            BadgeStatus::Warning => "badge-warning",
            BadgeStatus::Unknown => "badge-unknown",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BadgeStatus::Online => "Online",
            BadgeStatus::Offline => "Offline",
            BadgeStatus::Warning => "Warning",
            BadgeStatus::Unknown => "Unknown",
        }
    }
}

pub fn apply_badge(el: &mut Element, status: BadgeStatus) {
    el.remove_classes(BADGE_CLASSES);
    el.add_class(status.class());
    el.set_text(status.label());
}

pub fn set_badge(el: &mut Element, raw_status: &str) {
    apply_badge(el, BadgeStatus::from_raw(raw_status));
}
