use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{
    badge::BadgeStatus,
    format::{
        as_number, display_value, format_local, format_uptime, format_win_rate, is_truthy,
        parse_timestamp, PLACEHOLDER,
    },
    page,
};

/// Metrics as published by the bot backend. The shape is not ours: every field
/// is optional and kept as raw JSON so a wrong-typed field never rejects the
/// whole document. `null` and absent are the same thing here. Keys outside
/// this set are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_tasks: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_count: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trades_last_24h: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_rate: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_trade_time: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_features: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_status: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_history: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_allocation: Option<JsonValue>,
}

impl MetricsDocument {
    /// Anything that is not a JSON object reads as an empty document.
    pub fn from_value(v: JsonValue) -> Self {
        if !v.is_object() {
            return Self::default();
        }
        serde_json::from_value(v).unwrap_or_default()
    }
}

/// `enhanced_features` key -> badge element.
pub const FEATURE_BADGES: &[(&str, &str)] = &[
    ("whale_detection", page::WHALE_DETECTION),
    ("macd_analysis", page::MACD_STATUS),
    ("position_sizing", page::POSITION_SIZING),
    ("pre_market_scanning", page::PRE_MARKET_SCANNING),
];

/// `api_status` key -> badge element.
pub const API_BADGES: &[(&str, &str)] = &[
    ("binance_connection", page::BINANCE_STATUS),
    ("auth_status", page::AUTH_STATUS),
    ("rate_limit_status", page::RATE_LIMIT),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub text: String,
    pub class: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BadgeSlot {
    pub element: &'static str,
    pub status: BadgeStatus,
}

/// A metrics document with every default applied. Rendering reads only this.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub status: StatusLine,
    pub uptime: String,
    pub scheduled_tasks: String,
    pub error_count: String,
    pub trades_last_24h: String,
    pub win_rate: String,
    pub last_trade: String,
    /// Only groups present in the document contribute slots.
    pub badges: Vec<BadgeSlot>,
    pub series_labels: Vec<String>,
    pub series_values: Vec<Option<f64>>,
    pub breakdown_labels: Vec<String>,
    pub breakdown_values: Vec<Option<f64>>,
}

impl DashboardView {
    pub fn from_document(doc: &MetricsDocument) -> Self {
        let (series_labels, series_values) = portfolio_series(doc.portfolio_history.as_ref());
        let (breakdown_labels, breakdown_values) = allocation(doc.asset_allocation.as_ref());

        let mut badges = Vec::new();
        badge_group(doc.enhanced_features.as_ref(), FEATURE_BADGES, &mut badges);
        badge_group(doc.api_status.as_ref(), API_BADGES, &mut badges);

        Self {
            status: status_line(doc.status.as_ref()),
            uptime: uptime_text(doc.uptime.as_ref()),
            scheduled_tasks: counter(doc.scheduled_tasks.as_ref()),
            error_count: counter(doc.error_count.as_ref()),
            trades_last_24h: counter(doc.trades_last_24h.as_ref()),
            win_rate: format_win_rate(doc.win_rate.as_ref()),
            last_trade: last_trade_text(doc.last_trade_time.as_ref()),
            badges,
            series_labels,
            series_values,
            breakdown_labels,
            breakdown_values,
        }
    }
}

fn status_line(v: Option<&JsonValue>) -> StatusLine {
    let raw = match v {
        Some(JsonValue::String(s)) if !s.is_empty() => s.as_str(),
        _ => "unknown",
    };
    let class = match raw {
        "online" => "text-success",
        "offline" => "text-danger",
        _ => "text-secondary",
    };
    StatusLine {
        text: capitalize(raw),
        class,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn uptime_text(v: Option<&JsonValue>) -> String {
    match v {
        Some(JsonValue::Number(n)) => n
            .as_f64()
            .map(format_uptime)
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        Some(other) if is_truthy(other) => {
            display_value(other).unwrap_or_else(|| PLACEHOLDER.to_string())
        }
        _ => PLACEHOLDER.to_string(),
    }
}

fn counter(v: Option<&JsonValue>) -> String {
    v.and_then(display_value)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn last_trade_text(v: Option<&JsonValue>) -> String {
    v.filter(|x| is_truthy(x))
        .and_then(parse_timestamp)
        .map(|dt| format_local(&dt))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn badge_group(
    group: Option<&JsonValue>,
    keys: &[(&str, &'static str)],
    out: &mut Vec<BadgeSlot>,
) {
    let Some(group) = group.filter(|g| is_truthy(g)) else {
        return;
    };
    for &(key, element) in keys {
        out.push(BadgeSlot {
            element,
            status: BadgeStatus::from_value(group.get(key)),
        });
    }
}

fn chart_value(v: &JsonValue) -> Option<f64> {
    match v {
        JsonValue::Number(_) | JsonValue::String(_) => as_number(v),
        _ => None,
    }
}

fn portfolio_series(v: Option<&JsonValue>) -> (Vec<String>, Vec<Option<f64>>) {
    let field = |name: &str| -> Vec<JsonValue> {
        v.and_then(|h| h.get(name))
            .and_then(|x| x.as_array())
            .cloned()
            .unwrap_or_default()
    };

    let labels = field("timestamps")
        .iter()
        .map(|ts| {
            if !is_truthy(ts) {
                return String::new();
            }
            parse_timestamp(ts)
                .map(|dt| format_local(&dt))
                .unwrap_or_default()
        })
        .collect();
    let values = field("values").iter().map(chart_value).collect();
    (labels, values)
}

fn allocation(v: Option<&JsonValue>) -> (Vec<String>, Vec<Option<f64>>) {
    match v.and_then(|x| x.as_object()) {
        Some(map) => map
            .iter()
            .map(|(k, val)| (k.clone(), chart_value(val)))
            .unzip(),
        None => (Vec::new(), Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn view(v: JsonValue) -> DashboardView {
        DashboardView::from_document(&MetricsDocument::from_value(v))
    }

    #[test]
    fn empty_document_is_all_placeholders() {
        let v = view(json!({}));
        assert_eq!(v.status.text, "Unknown");
        assert_eq!(v.status.class, "text-secondary");
        assert_eq!(v.uptime, PLACEHOLDER);
        assert_eq!(v.scheduled_tasks, PLACEHOLDER);
        assert_eq!(v.error_count, PLACEHOLDER);
        assert_eq!(v.trades_last_24h, PLACEHOLDER);
        assert_eq!(v.win_rate, PLACEHOLDER);
        assert_eq!(v.last_trade, PLACEHOLDER);
        assert!(v.badges.is_empty());
        assert!(v.series_labels.is_empty() && v.series_values.is_empty());
        assert!(v.breakdown_labels.is_empty() && v.breakdown_values.is_empty());
    }

    #[test]
    fn non_object_document_reads_as_empty() {
        assert_eq!(MetricsDocument::from_value(json!([1, 2])), MetricsDocument::default());
        assert_eq!(MetricsDocument::from_value(json!("online")), MetricsDocument::default());
    }

    #[test]
    fn status_is_capitalized_and_classed() {
        let v = view(json!({"status": "online"}));
        assert_eq!(v.status, StatusLine { text: "Online".into(), class: "text-success" });
        let v = view(json!({"status": "offline"}));
        assert_eq!(v.status, StatusLine { text: "Offline".into(), class: "text-danger" });
        let v = view(json!({"status": "degraded"}));
        assert_eq!(v.status, StatusLine { text: "Degraded".into(), class: "text-secondary" });
        let v = view(json!({"status": ""}));
        assert_eq!(v.status.text, "Unknown");
        let v = view(json!({"status": 7}));
        assert_eq!(v.status.text, "Unknown");
    }

    #[test]
    fn uptime_numeric_or_raw() {
        assert_eq!(view(json!({"uptime": 65})).uptime, "1m 5s");
        assert_eq!(view(json!({"uptime": "3 days"})).uptime, "3 days");
        assert_eq!(view(json!({"uptime": ""})).uptime, PLACEHOLDER);
        assert_eq!(view(json!({"uptime": null})).uptime, PLACEHOLDER);
        assert_eq!(view(json!({"uptime": 0})).uptime, "0s");
    }

    #[test]
    fn counters_show_zero() {
        let v = view(json!({"scheduled_tasks": 0, "error_count": 3, "trades_last_24h": null}));
        assert_eq!(v.scheduled_tasks, "0");
        assert_eq!(v.error_count, "3");
        assert_eq!(v.trades_last_24h, PLACEHOLDER);
    }

    #[test]
    fn win_rate_cases() {
        assert_eq!(view(json!({"win_rate": 0.5})).win_rate, "50%");
        assert_eq!(view(json!({"win_rate": 0})).win_rate, "0%");
        assert_eq!(view(json!({"win_rate": null})).win_rate, PLACEHOLDER);
        assert_eq!(view(json!({})).win_rate, PLACEHOLDER);
    }

    #[test]
    fn last_trade_formats_or_placeholder() {
        let v = view(json!({"last_trade_time": 1_700_000_000_000i64}));
        let want = format_local(&parse_timestamp(&json!(1_700_000_000_000i64)).unwrap());
        assert_eq!(v.last_trade, want);
        assert_eq!(view(json!({"last_trade_time": 0})).last_trade, PLACEHOLDER);
        assert_eq!(view(json!({"last_trade_time": "not a date"})).last_trade, PLACEHOLDER);
        assert_eq!(
            view(json!({"last_trade_time": "01/15/2025, 02:32:10 PM"})).last_trade,
            "1/15/2025, 2:32:10 PM"
        );
    }

    #[test]
    fn badge_groups_skip_when_absent_and_default_missing_keys() {
        let v = view(json!({
            "enhanced_features": {"whale_detection": "online", "macd_analysis": true},
        }));
        assert_eq!(v.badges.len(), FEATURE_BADGES.len());
        assert_eq!(v.badges[0], BadgeSlot { element: page::WHALE_DETECTION, status: BadgeStatus::Online });
        assert_eq!(v.badges[1].status, BadgeStatus::Unknown, "boolean flags are not statuses");
        assert_eq!(v.badges[2].status, BadgeStatus::Unknown);
        assert!(v.badges.iter().all(|b| b.element != page::BINANCE_STATUS));

        let v = view(json!({
            "api_status": {"binance_connection": "connected", "auth_status": "invalid", "rate_limit_status": "normal"},
        }));
        let statuses: Vec<_> = v.badges.iter().map(|b| b.status).collect();
        assert_eq!(
            statuses,
            vec![BadgeStatus::Online, BadgeStatus::Offline, BadgeStatus::Unknown]
        );
    }

    #[test]
    fn series_labels_blank_for_bad_timestamps() {
        let v = view(json!({
            "portfolio_history": {
                "timestamps": [1_700_000_000_000i64, null, "garbage", "2024-01-02T03:04:05Z", "10/16/2026, 03:04:05 PM"],
                "values": [100.5, "101", null, 99, 98]
            }
        }));
        assert_eq!(v.series_labels.len(), 5);
        assert_eq!(v.series_labels[4], "10/16/2026, 3:04:05 PM");
        assert!(!v.series_labels[0].is_empty());
        assert_eq!(v.series_labels[1], "");
        assert_eq!(v.series_labels[2], "");
        assert!(!v.series_labels[3].is_empty());
        assert_eq!(
            v.series_values,
            vec![Some(100.5), Some(101.0), None, Some(99.0), Some(98.0)]
        );
    }

    #[test]
    fn allocation_keeps_document_order() {
        let v = view(json!({"asset_allocation": {"USDT": 40, "BTC": 35.5, "ETH": 24.5}}));
        assert_eq!(v.breakdown_labels, vec!["USDT", "BTC", "ETH"]);
        assert_eq!(v.breakdown_values, vec![Some(40.0), Some(35.5), Some(24.5)]);

        let v = view(json!({"asset_allocation": "oops"}));
        assert!(v.breakdown_labels.is_empty());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let doc = MetricsDocument::from_value(json!({"status": "online", "build": "abc"}));
        assert_eq!(doc, MetricsDocument::from_value(json!({"status": "online"})));
    }
}
