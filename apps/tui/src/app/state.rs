use std::time::Instant;

use color_eyre::Result;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use ratatui::layout::Rect;
use tracing::{debug, info, warn};

use crate::api::ApiPayload;
use crate::app::actions::RequestDispatcher;
use crate::app::controller::{ControllerContext, LayerRefreshController};
use crate::app::events::{ApiEvent, RequestToken};
use crate::app::selection::DatasetSelectionState;
use crate::app::session::SessionStore;
use crate::config::AppConfig;
use crate::db::create_database_pool;
use crate::domain::{format_api_date, parse_api_date};
use crate::map::{HostMapAdapter, TerminalMap};

/// Which view is composed; derived from the credential, never stored
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AppScreen {
    Login,
    Explorer,
}

/// Popups layered over the explorer
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Overlay {
    None,
    DatasetPicker,
    DateRange,
    Help,
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub input: String,
    pub error: Option<String>,
    pub pending: Option<RequestToken>,
}

impl LoginForm {
    pub const fn is_validating(&self) -> bool {
        self.pending.is_some()
    }

    /// Key shown masked except for the last four characters
    pub fn masked_input(&self) -> String {
        let visible = self.input.chars().count().saturating_sub(4);
        self.input
            .chars()
            .enumerate()
            .map(|(i, c)| if i < visible { '•' } else { c })
            .collect()
    }
}

/// Dataset catalogue filtered with a fuzzy query
#[derive(Debug, Default)]
pub struct DatasetPicker {
    pub query: String,
    pub selected: usize,
}

impl DatasetPicker {
    /// Catalogue entries matching the query, best match first
    pub fn matches<'a>(&self, datasets: &'a [String]) -> Vec<&'a str> {
        if self.query.trim().is_empty() {
            return datasets.iter().map(String::as_str).collect();
        }

        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(i64, &str)> = datasets
            .iter()
            .filter_map(|dataset| {
                matcher
                    .fuzzy_match(dataset, self.query.trim())
                    .map(|score| (score, dataset.as_str()))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored.into_iter().map(|(_, dataset)| dataset).collect()
    }

    pub fn reset(&mut self) {
        self.query.clear();
        self.selected = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Start,
    End,
}

/// Text entry for the start and end dates
#[derive(Debug)]
pub struct DatePrompt {
    pub field: DateField,
    pub start: String,
    pub end: String,
    pub error: Option<String>,
}

impl Default for DatePrompt {
    fn default() -> Self {
        Self {
            field: DateField::Start,
            start: String::new(),
            end: String::new(),
            error: None,
        }
    }
}

impl DatePrompt {
    pub fn active_input(&mut self) -> &mut String {
        match self.field {
            DateField::Start => &mut self.start,
            DateField::End => &mut self.end,
        }
    }

    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            DateField::Start => DateField::End,
            DateField::End => DateField::Start,
        };
    }
}

pub struct App {
    pub running: bool,
    pub config: AppConfig,
    pub session: SessionStore,
    pub selection: DatasetSelectionState,
    pub controller: LayerRefreshController,
    pub map: TerminalMap,
    pub dispatcher: RequestDispatcher,
    pub login: LoginForm,
    pub overlay: Overlay,
    pub picker: DatasetPicker,
    pub dates: DatePrompt,
    pub status_message: String,
    pub last_update: Instant,
}

impl App {
    pub fn new(config: AppConfig, dispatcher: RequestDispatcher) -> Self {
        let selection = DatasetSelectionState::new(&config.default_dataset);
        Self {
            running: true,
            config,
            session: SessionStore::default(),
            selection,
            controller: LayerRefreshController::new(),
            map: TerminalMap::new(),
            dispatcher,
            login: LoginForm::default(),
            overlay: Overlay::None,
            picker: DatasetPicker::default(),
            dates: DatePrompt::default(),
            status_message: String::new(),
            last_update: Instant::now(),
        }
    }

    pub const fn screen(&self) -> AppScreen {
        if self.session.is_authenticated() {
            AppScreen::Explorer
        } else {
            AppScreen::Login
        }
    }

    /// Opens the credential store and restores a remembered key. A missing
    /// database only costs persistence.
    pub async fn initialize(&mut self) -> Result<()> {
        match create_database_pool(&self.config.database_url).await {
            Ok(pool) => self.session.attach_pool(pool),
            Err(e) => {
                warn!(error = %e, "credential database unavailable, key will not be remembered");
                self.status_message = "Database unavailable: the API key will not be remembered"
                    .to_string();
            }
        }

        if self.session.get_credential().await?.is_some() {
            info!("restored stored API key");
            self.enter_explorer();
        }
        Ok(())
    }

    /// Runs `f` with the controller and a context over the app's state.
    /// Nothing happens while logged out.
    fn drive<R>(
        &mut self,
        f: impl FnOnce(&mut LayerRefreshController, &mut ControllerContext<'_>) -> R,
    ) -> Option<R> {
        let credential = self.session.credential()?;
        let mut ctx = ControllerContext {
            selection: &mut self.selection,
            dispatcher: &self.dispatcher,
            map: &mut self.map,
            credential,
        };
        Some(f(&mut self.controller, &mut ctx))
    }

    fn enter_explorer(&mut self) {
        self.drive(|controller, ctx| controller.mount(ctx));
        self.status_message = format!("Loading {}", self.selection.dataset());
    }

    pub fn submit_login(&mut self) {
        let token = self.login.input.trim().to_string();
        if token.is_empty() {
            self.login.error = Some("Please enter an API key".to_string());
            return;
        }

        self.login.error = None;
        self.login.pending = Some(self.dispatcher.validate_token(&token));
        self.status_message = "Validating API key".to_string();
    }

    /// Routes a remote response to the login form or the layer controller
    pub async fn handle_api_event(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::TokenValidated {
                request,
                token,
                result,
            } => {
                if self.login.pending != Some(request) {
                    debug!(%request, "ignoring stale key validation");
                    return;
                }
                self.login.pending = None;

                match result {
                    Ok(ApiPayload::Success(_)) => {
                        if let Err(e) = self.session.set_credential(&token).await {
                            warn!(error = %e, "could not persist API key");
                        }
                        self.login = LoginForm::default();
                        self.status_message = "Logged in".to_string();
                        self.enter_explorer();
                    }
                    Ok(ApiPayload::Failure(failure)) => {
                        info!(detail = %failure.message(), "API key rejected");
                        self.login.error = Some(failure.message());
                        self.status_message.clear();
                    }
                    Err(e) => {
                        warn!(error = %e, "key validation failed");
                        self.login.error = Some(format!("Could not reach the climate service: {e}"));
                        self.status_message.clear();
                    }
                }
            }
            event => {
                let kind = event.kind();
                if self
                    .drive(|controller, ctx| controller.handle_event(event, ctx))
                    .is_none()
                {
                    debug!(kind, "response arrived after logout");
                }
            }
        }
    }

    /// Always available; responses still in flight are dropped on arrival
    pub async fn logout(&mut self) {
        self.controller.unmount(&mut self.map);
        if let Err(e) = self.session.clear_credential().await {
            warn!(error = %e, "could not remove stored API key");
        }

        self.selection = DatasetSelectionState::new(&self.config.default_dataset);
        self.login = LoginForm::default();
        self.overlay = Overlay::None;
        self.picker.reset();
        self.dates = DatePrompt::default();
        self.map.reset_view();
        self.status_message = "Logged out".to_string();
    }

    pub fn handle_map_click(&mut self, area: Rect, column: u16, row: u16) {
        let Some((listener, point)) = self.map.click_point(area, column, row) else {
            return;
        };
        self.drive(|controller, ctx| controller.handle_click(listener, point, ctx));
    }

    pub fn open_dataset_picker(&mut self) {
        self.picker.reset();
        self.overlay = Overlay::DatasetPicker;
    }

    /// Switches to the highlighted catalogue entry
    pub fn choose_picked_dataset(&mut self) {
        let Some(dataset) = self
            .picker
            .matches(&self.config.datasets)
            .get(self.picker.selected)
            .map(|dataset| (*dataset).to_string())
        else {
            return;
        };

        self.overlay = Overlay::None;
        self.status_message = format!("Loading {dataset}");
        self.drive(|controller, ctx| controller.select_dataset(&dataset, ctx));
    }

    pub fn cycle_variable(&mut self, forward: bool) {
        if self.drive(|controller, ctx| controller.cycle_variable(forward, ctx)) == Some(true) {
            self.status_message = format!(
                "Variable: {}",
                self.selection.variable().unwrap_or_default()
            );
        }
    }

    pub fn open_date_prompt(&mut self) {
        if self.selection.bounds().is_none() {
            self.status_message = "Dates are still loading".to_string();
            return;
        }
        self.dates = DatePrompt {
            start: self.selection.start().map(format_api_date).unwrap_or_default(),
            end: self.selection.end().map(format_api_date).unwrap_or_default(),
            ..DatePrompt::default()
        };
        self.overlay = Overlay::DateRange;
    }

    /// Applies the typed dates; out of range dates are clamped
    pub fn submit_date_prompt(&mut self) {
        let (Some(start), Some(end)) = (
            parse_api_date(&self.dates.start),
            parse_api_date(&self.dates.end),
        ) else {
            self.dates.error = Some("Dates must be YYYY-MM-DD".to_string());
            return;
        };

        self.overlay = Overlay::None;
        let changed = self.drive(|controller, ctx| controller.select_date_range(start, end, ctx));
        self.status_message = if changed == Some(true) {
            format!(
                "Dates: {} to {}",
                self.selection.start().map(format_api_date).unwrap_or_default(),
                self.selection.end().map(format_api_date).unwrap_or_default()
            )
        } else {
            "Date range unchanged".to_string()
        };
    }

    /// Requests the layer again for the current selection, re-fetching
    /// dataset metadata that failed to load
    pub fn refresh_layer(&mut self) {
        if self.drive(|controller, ctx| controller.reload(ctx)) == Some(true) {
            self.status_message = "Refreshing layer".to_string();
        }
    }

    pub fn close_chart(&mut self) {
        self.map.close_modal();
    }

    pub fn update(&mut self) {
        let now = Instant::now();
        self.map.tick(now);
        self.last_update = now;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc::{self, UnboundedReceiver};

    use super::*;
    use crate::api::ClimateApi;
    use crate::app::actions::tests::FakeApi;
    use crate::app::controller::LayerState;
    use crate::db::queries::get_value;
    use crate::db::queries::tests::setup_test_db;

    fn app_with(api: FakeApi) -> (App, UnboundedReceiver<ApiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = RequestDispatcher::new(Arc::new(api) as Arc<dyn ClimateApi>, tx);
        let config = AppConfig {
            datasets: vec![
                "LANDSAT8_SR".to_string(),
                "GRIDMET".to_string(),
                "MODIS_NDVI".to_string(),
            ],
            ..AppConfig::default()
        };
        (App::new(config, dispatcher), rx)
    }

    async fn deliver(app: &mut App, rx: &mut UnboundedReceiver<ApiEvent>) -> Option<()> {
        let event = rx.recv().await?;
        app.handle_api_event(event).await;
        Some(())
    }

    async fn login(app: &mut App, rx: &mut UnboundedReceiver<ApiEvent>) {
        app.login.input = "good-key".to_string();
        app.submit_login();
        deliver(app, rx).await;
        while app.controller.has_pending() {
            if deliver(app, rx).await.is_none() {
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_screen_follows_credential() -> Result<(), Box<dyn std::error::Error>> {
        let (mut app, mut rx) = app_with(FakeApi::landsat());
        app.session.attach_pool(setup_test_db().await?);
        assert_eq!(app.screen(), AppScreen::Login);

        login(&mut app, &mut rx).await;
        assert_eq!(app.screen(), AppScreen::Explorer);
        assert_eq!(app.controller.state(), LayerState::Displayed);
        assert_eq!(app.map.layers().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_key_stays_on_login() {
        let (mut app, mut rx) = app_with(FakeApi::landsat());
        app.login.input = "bad-key".to_string();
        app.submit_login();
        assert!(app.login.is_validating());
        deliver(&mut app, &mut rx).await;

        assert_eq!(app.screen(), AppScreen::Login);
        assert_eq!(app.login.error.as_deref(), Some("Invalid API key"));
        assert!(!app.login.is_validating());
    }

    #[tokio::test]
    async fn test_empty_key_is_not_submitted() {
        let (mut app, _rx) = app_with(FakeApi::landsat());
        app.login.input = "   ".to_string();
        app.submit_login();
        assert!(app.login.pending.is_none());
        assert!(app.login.error.is_some());
    }

    #[tokio::test]
    async fn test_logout_with_request_in_flight() -> Result<(), Box<dyn std::error::Error>> {
        let (mut app, mut rx) = app_with(FakeApi::landsat());
        let pool = setup_test_db().await?;
        app.session.attach_pool(pool.clone());
        login(&mut app, &mut rx).await;
        assert_eq!(get_value(&pool, "key").await?.as_deref(), Some("good-key"));

        app.open_date_prompt();
        app.dates.start = "2019-01-01".to_string();
        app.dates.end = "2019-03-01".to_string();
        app.submit_date_prompt();
        assert_eq!(app.controller.state(), LayerState::Loading);

        app.logout().await;
        assert_eq!(app.screen(), AppScreen::Login);
        assert_eq!(get_value(&pool, "key").await?, None);
        assert!(app.map.layers().is_empty());

        // The layer response still arrives and is dropped
        deliver(&mut app, &mut rx).await;
        assert!(app.map.layers().is_empty());
        assert_eq!(app.controller.state(), LayerState::Uninitialized);
        Ok(())
    }

    #[tokio::test]
    async fn test_stored_key_restores_explorer() -> Result<(), Box<dyn std::error::Error>> {
        let (mut app, mut rx) = app_with(FakeApi::landsat());
        let pool = setup_test_db().await?;
        crate::db::queries::put_value(&pool, "key", "good-key").await?;
        app.session = SessionStore::new(Some(pool));

        if app.session.get_credential().await?.is_some() {
            app.enter_explorer();
        }
        assert_eq!(app.screen(), AppScreen::Explorer);
        assert!(app.controller.is_mounted());

        while app.controller.has_pending() {
            deliver(&mut app, &mut rx).await;
        }
        assert_eq!(app.selection.variable(), Some("NDVI"));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_dates_keep_prompt_open() {
        let (mut app, mut rx) = app_with(FakeApi::landsat());
        login(&mut app, &mut rx).await;

        app.open_date_prompt();
        app.dates.start = "01/02/2020".to_string();
        app.submit_date_prompt();
        assert_eq!(app.overlay, Overlay::DateRange);
        assert!(app.dates.error.is_some());
    }

    #[tokio::test]
    async fn test_picker_switches_dataset() {
        let (mut app, mut rx) = app_with(FakeApi::landsat());
        login(&mut app, &mut rx).await;

        app.open_dataset_picker();
        app.picker.query = "grid".to_string();
        assert_eq!(app.picker.matches(&app.config.datasets), vec!["GRIDMET"]);
        app.choose_picked_dataset();
        while app.controller.has_pending() {
            deliver(&mut app, &mut rx).await;
        }

        assert_eq!(app.overlay, Overlay::None);
        assert_eq!(app.selection.dataset(), "GRIDMET");
        assert_eq!(app.selection.variable(), Some("pr"));
    }

    #[test]
    fn test_masked_key_shows_last_four() {
        let form = LoginForm {
            input: "abcdef123456".to_string(),
            ..LoginForm::default()
        };
        assert_eq!(form.masked_input(), "••••••••3456");
    }
}
