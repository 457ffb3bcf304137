use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io::Stdout;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use chrono::NaiveDate;
use serde::Serialize;

use crate::api::ClimateApi;
use crate::app::{handle_input, ApiEvent, App, AppScreen, Overlay};
use crate::cli::CliArgs;
use crate::domain::{parse_api_date, DateBounds, GeoPoint, LayerQuery, PointQuery};
use crate::timeseries::build_series;
use crate::ui;
use crate::ui::screens::explorer::explorer_layout;

/// What a headless run should fetch
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessRequest {
    pub dataset: String,
    pub variable: Option<String>,
    pub point: Option<GeoPoint>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl HeadlessRequest {
    pub fn from_args(args: &CliArgs, dataset: &str) -> Result<Self> {
        let parse = |value: &Option<String>, name: &str| -> Result<Option<NaiveDate>> {
            value
                .as_deref()
                .map(|text| {
                    parse_api_date(text).ok_or_else(|| eyre!("--{name} must be YYYY-MM-DD, got {text}"))
                })
                .transpose()
        };

        Ok(Self {
            dataset: dataset.to_string(),
            variable: args.variable.clone(),
            point: args.lat.zip(args.lng).map(|(lat, lng)| GeoPoint::new(lat, lng)),
            start: parse(&args.start, "start")?,
            end: parse(&args.end, "end")?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HeadlessReport {
    pub dataset: String,
    pub variables: Vec<String>,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub time_series: Option<HeadlessSeries>,
}

#[derive(Debug, Serialize)]
pub struct HeadlessSeries {
    pub variable: String,
    pub lat: f64,
    pub lng: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Empty when the service found no points
    pub points: Vec<HeadlessPoint>,
}

#[derive(Debug, Serialize)]
pub struct HeadlessPoint {
    pub date: String,
    pub value: f64,
}

/// Fetches the dataset metadata and, for a point request, its time series
pub async fn build_headless_report(
    api: &dyn ClimateApi,
    token: &str,
    request: &HeadlessRequest,
) -> Result<HeadlessReport> {
    let dataset = request.dataset.as_str();

    let variables = api
        .get_dataset_variables(dataset, token)
        .await?
        .into_result()
        .map_err(|failure| eyre!("Could not load variables for {dataset}: {}", failure.message()))?
        .variables;

    let range = api
        .get_time_period_range(dataset, token)
        .await?
        .into_result()
        .map_err(|failure| eyre!("Could not load dates for {dataset}: {}", failure.message()))?;
    let bounds = DateBounds::parse(&range.min, &range.max)
        .ok_or_else(|| eyre!("{dataset} reported an invalid date range"))?;

    let time_series = match request.point {
        Some(point) => {
            let variable = request
                .variable
                .clone()
                .or_else(|| variables.first().cloned())
                .ok_or_else(|| eyre!("{dataset} has no variables to chart"))?;
            let start = bounds.clamp(request.start.unwrap_or(bounds.max));
            let end = bounds.clamp(request.end.unwrap_or(bounds.max));
            let (start, end) = if start <= end { (start, end) } else { (end, start) };

            let query = PointQuery {
                point,
                layer: LayerQuery {
                    dataset: dataset.to_string(),
                    variable: variable.clone(),
                    start,
                    end,
                },
            };
            debug!(point = %point.label(), "fetching headless time series");
            let payload = api.get_time_series(&query, token).await?;
            let points = build_series(&payload, &variable)
                .unwrap_or_default()
                .into_iter()
                .map(|p| HeadlessPoint {
                    date: p.label,
                    value: p.value,
                })
                .collect();

            Some(HeadlessSeries {
                variable,
                lat: point.lat,
                lng: point.lng,
                start,
                end,
                points,
            })
        }
        None => None,
    };

    Ok(HeadlessReport {
        dataset: dataset.to_string(),
        variables,
        min_date: bounds.min,
        max_date: bounds.max,
        time_series,
    })
}

/// Run the application in headless mode (no UI)
pub async fn run_headless(
    api: &dyn ClimateApi,
    token: &str,
    request: &HeadlessRequest,
    json: bool,
) -> Result<()> {
    let report = build_headless_report(api, token, request).await?;
    info!(dataset = %report.dataset, "headless report ready");

    if json {
        let json = serde_json::to_string_pretty(&report)?;
        println!("{json}");
    } else {
        render_headless_text(&report);
    }
    Ok(())
}

fn render_headless_text(report: &HeadlessReport) {
    println!("\nClimate Engine dataset {}", report.dataset);
    println!("==========================");
    println!("Dates: {} to {}", report.min_date, report.max_date);

    println!("\nVariables:");
    for variable in &report.variables {
        println!("- {variable}");
    }

    if let Some(series) = &report.time_series {
        println!(
            "\nTime series of {} at {}, {} ({} to {}):",
            series.variable, series.lat, series.lng, series.start, series.end
        );
        if series.points.is_empty() {
            println!("No points found");
        }
        for point in &series.points {
            println!("- {} | {}", point.date, point.value);
        }
    }
}

/// Run the main application event loop
pub async fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    events: &mut UnboundedReceiver<ApiEvent>,
) -> Result<()> {
    // Configure event poll timeout (ms)
    const EVENT_POLL_TIMEOUT: u64 = 50;

    loop {
        // Apply responses that arrived since the last frame
        while let Ok(response) = events.try_recv() {
            app.handle_api_event(response).await;
        }

        app.update();

        terminal
            .draw(|f| ui::ui(app, f))
            .wrap_err("Terminal draw error")?;

        if !matches!(
            event::poll(std::time::Duration::from_millis(EVENT_POLL_TIMEOUT)),
            Ok(true)
        ) {
            continue;
        }

        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    app.running = false;
                } else {
                    handle_input(app, key.code).await;
                }
                if !app.running {
                    break;
                }
            }
            Ok(Event::Mouse(mouse)) => {
                if mouse.kind != MouseEventKind::Down(MouseButton::Left)
                    || app.screen() != AppScreen::Explorer
                    || app.overlay != Overlay::None
                    || app.map.chart().is_some()
                {
                    continue;
                }
                let size = terminal.size()?;
                let layout = explorer_layout(Rect::new(0, 0, size.width, size.height));
                app.handle_map_click(layout.map_canvas, mouse.column, mouse.row);
            }
            Ok(Event::Resize(_, _)) => {
                // Force a redraw after resize
                if terminal.draw(|f| ui::ui(app, f)).is_err() {
                    // Non-fatal redraw error
                }
            }
            Ok(Event::Key(_) | Event::FocusGained | Event::FocusLost | Event::Paste(_)) | Err(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::actions::tests::FakeApi;
    use clap::Parser;
    use serde_json::json;

    fn request(args: &[&str]) -> Result<HeadlessRequest> {
        let args = CliArgs::try_parse_from(args)?;
        HeadlessRequest::from_args(&args, "LANDSAT8_SR")
    }

    #[tokio::test]
    async fn test_report_without_point() -> Result<()> {
        let api = FakeApi::landsat();
        let report =
            build_headless_report(&api, "good-key", &request(&["climate-engine", "--headless"])?)
                .await?;

        assert_eq!(report.variables, vec!["NDVI", "NDWI"]);
        assert_eq!(report.max_date, parse_api_date("2023-01-01").unwrap_or_default());
        assert!(report.time_series.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_report_with_point_clamps_dates() -> Result<()> {
        let api = FakeApi::landsat();
        if let Ok(mut body) = api.time_series.lock() {
            *body = Some(json!([[{"Date": "2023-01-01", "NDWI": -9999}]]));
        }
        let request = request(&[
            "climate-engine",
            "--headless",
            "--lat",
            "39.5",
            "--lng",
            "-119.8",
            "--variable",
            "NDWI",
            "--start",
            "1990-01-01",
        ])?;

        let report = build_headless_report(&api, "good-key", &request).await?;
        let series = report.time_series.ok_or_else(|| eyre!("missing series"))?;
        assert_eq!(series.variable, "NDWI");
        assert_eq!(series.start, parse_api_date("2013-01-01").unwrap_or_default());
        assert_eq!(series.end, parse_api_date("2023-01-01").unwrap_or_default());
        assert_eq!(series.points.len(), 1);
        assert!(series.points[0].value.abs() < f64::EPSILON);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_dataset_is_an_error() -> Result<()> {
        let api = FakeApi::landsat();
        let mut request = request(&["climate-engine", "--headless"])?;
        request.dataset = "NOPE".to_string();

        let err = build_headless_report(&api, "good-key", &request).await;
        assert!(err.is_err_and(|e| e.to_string().contains("Dataset not found")));
        Ok(())
    }

    #[test]
    fn test_bad_date_argument_is_rejected() {
        assert!(request(&["climate-engine", "--start", "yesterday"]).is_err());
    }
}
