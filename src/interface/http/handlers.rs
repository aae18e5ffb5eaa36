use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use serde::Serialize;

use crate::application::ForecastStore;
use crate::domain::{Forecast, Outlook};

const INDEX_TEMPLATE: &str = include_str!("assets/index.html");

const MOODS: [&str; 3] = ["thinking", "angry", "thonking"];

/// Page titles paired with an index into `MOODS`
const TITLES: [(usize, &str); 9] = [
    (0, "When Will Godot {release} Release?"),
    (0, "Godot {release}?"),
    (0, "How Long To Wait For Godot?"),
    (1, "GIVE ME GODOT {release}!!!11"),
    (1, "GODOT. {release}. WHEN."),
    (1, "I Want Godot {release}!"),
    (2, "Will Godot {release} Ever Be Finished?"),
    (2, "I Think Godot {release} Is An Illusion"),
    (2, "Godot {release}? What's That?"),
];

/// Static text shown alongside the forecast
#[derive(Debug, Clone)]
pub struct PageInfo {
    pub release: String,
    /// Sampling interval, formatted for humans
    pub timespan: String,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub forecasts: Arc<ForecastStore>,
    pub page: Arc<PageInfo>,
    /// Page views so far; picks the next title
    pub views: Arc<AtomicUsize>,
}

/// Response for /api/forecast
#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub timestamp: String,
    pub status: &'static str,
    pub opened_per_interval: u64,
    pub closed_per_interval: u64,
    pub interval: String,
    pub estimate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate_seconds: Option<u64>,
    pub target_date: String,
}

impl ForecastResponse {
    fn new(forecast: &Forecast, page: &PageInfo) -> Self {
        let (status, estimate_seconds) = match forecast.outlook {
            Outlook::Resolved { estimate_seconds, .. } => ("resolved", Some(estimate_seconds)),
            Outlook::Unresolved => ("unresolved", None),
        };

        Self {
            timestamp: forecast.timestamp.to_rfc3339(),
            status,
            opened_per_interval: forecast.issue_rates.opened,
            closed_per_interval: forecast.issue_rates.closed,
            interval: page.timespan.clone(),
            estimate: forecast.estimate_label(),
            estimate_seconds,
            target_date: forecast.date_label(),
        }
    }
}

/// Handler for GET /api/health
pub async fn health_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": "godotwhen"
        })),
    )
}

/// Handler for GET /api/forecast
pub async fn forecast_handler(State(state): State<AppState>) -> Json<ForecastResponse> {
    let forecast = state.forecasts.snapshot();
    Json(ForecastResponse::new(&forecast, &state.page))
}

/// Handler for GET /date (plain text)
pub async fn date_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.forecasts.snapshot().date_label()
}

/// Handler for GET /
pub async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let forecast = state.forecasts.snapshot();
    let view = state.views.fetch_add(1, Ordering::Relaxed);
    Html(render_index(&forecast, &state.page, view))
}

fn render_index(forecast: &Forecast, page: &PageInfo, view: usize) -> String {
    let (mood, title) = TITLES[view % TITLES.len()];
    let release = escape_html(&page.release);

    INDEX_TEMPLATE
        .replace("{{title}}", &title.replace("{release}", &release))
        .replace("{{mood}}", MOODS[mood])
        .replace("{{timespan}}", &escape_html(&page.timespan))
        .replace("{{opened}}", &forecast.issue_rates.opened.to_string())
        .replace("{{closed}}", &forecast.issue_rates.closed.to_string())
        .replace("{{release}}", &release)
        .replace("{{estimate}}", &forecast.estimate_label())
        .replace("{{date}}", &forecast.date_label())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecast::IssueRates;
    use chrono::{TimeZone, Utc};

    fn page() -> PageInfo {
        PageInfo {
            release: "4.0".to_string(),
            timespan: "6 hours".to_string(),
        }
    }

    #[test]
    fn test_render_unresolved_index() {
        let forecast = Forecast::unresolved(Utc::now());
        let html = render_index(&forecast, &page(), 0);

        assert!(html.contains("<title>When Will Godot 4.0 Release?</title>"));
        assert!(html.contains("Every 6 hours, about 0 issues are opened and 0 are closed."));
        assert!(html.contains("<strong>∞</strong>"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_titles_rotate_with_mood() {
        let forecast = Forecast::unresolved(Utc::now());

        let angry = render_index(&forecast, &page(), 3);
        assert!(angry.contains("<h1>GIVE ME GODOT 4.0!!!11</h1>"));
        assert!(angry.contains(r#"<body class="angry">"#));

        let wrapped = render_index(&forecast, &page(), TITLES.len() + 2);
        assert!(wrapped.contains("<h1>How Long To Wait For Godot?</h1>"));
        assert!(wrapped.contains(r#"<body class="thinking">"#));
    }

    #[test]
    fn test_release_is_escaped_in_title() {
        let page = PageInfo {
            release: "<4.0>".to_string(),
            timespan: "1 day".to_string(),
        };
        let html = render_index(&Forecast::unresolved(Utc::now()), &page, 0);

        assert!(html.contains("When Will Godot &lt;4.0&gt; Release?"));
        assert!(!html.contains("<4.0>"));
    }

    #[test]
    fn test_forecast_response_resolved() {
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let forecast = Forecast {
            timestamp,
            issue_rates: IssueRates { opened: 1, closed: 3 },
            outlook: Outlook::Resolved {
                estimate_seconds: 3 * 86_400,
                target_date: Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap(),
            },
        };

        let response = ForecastResponse::new(&forecast, &page());
        assert_eq!(response.status, "resolved");
        assert_eq!(response.estimate, "3 days");
        assert_eq!(response.estimate_seconds, Some(259_200));
        assert_eq!(response.target_date, "March 04 2024");
        assert_eq!(response.interval, "6 hours");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<4.0 & \"beta\">"), "&lt;4.0 &amp; &quot;beta&quot;&gt;");
    }
}
