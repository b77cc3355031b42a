use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use api_types::AuditLog;
use api_types::Der;
use api_types::EventStatus;
use api_types::FeederSummary;
use api_types::FlexEvent;
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, TableState};
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::app::BackendHealth;
use crate::app::PollingHub;
use crate::beckn::WorkflowTracker;
use crate::config::MonitorArgs;
use crate::events::{self, EventFilter};
use crate::normalize::{fleet_kpis, FeederDetail, FleetKpis};
use crate::tui::dialog::{EventDetailDialog, FeederDetailDialog};
use crate::tui::table::{DerTable, EventsTable, FeederTable};
use crate::tui::types::{AppState, RefreshEvent, View};

pub struct CommandCentreApp {
    hub: Arc<PollingHub>,
    export_path: PathBuf,
    view: View,
    app_state: AppState,
    table_state: TableState,
    selected_index: usize,
    feeders: Vec<FeederSummary>,
    selected_feeder: Option<FeederSummary>,
    detail: Option<FeederDetail>,
    events: Vec<FlexEvent>,
    ders: Vec<Der>,
    audit: Option<AuditLog>,
    kpis: FleetKpis,
    health: BackendHealth,
    errors: Vec<String>,
    workflow: WorkflowTracker,
    filter: EventFilter,
    last_action: Option<String>,
}

impl CommandCentreApp {
    pub fn new(hub: Arc<PollingHub>, export_path: PathBuf) -> Self {
        Self {
            hub,
            export_path,
            view: View::Feeders,
            app_state: AppState::Normal,
            table_state: TableState::default(),
            selected_index: 0,
            feeders: Vec::new(),
            selected_feeder: None,
            detail: None,
            events: Vec::new(),
            ders: Vec::new(),
            audit: None,
            kpis: FleetKpis::default(),
            health: BackendHealth::Checking,
            errors: Vec::new(),
            workflow: WorkflowTracker::new(),
            filter: EventFilter::default(),
            last_action: None,
        }
    }

    /// Pull the freshest snapshots out of the pollers.
    pub fn refresh(&mut self) {
        self.feeders = self.hub.feeders.latest().unwrap_or_default();
        self.selected_feeder = self.hub.resolve_selection();
        self.detail = self.hub.detail.latest().flatten();
        self.events = self.hub.events.latest().unwrap_or_default();
        self.ders = self.hub.ders.latest().unwrap_or_default();
        self.audit = self.hub.audit.latest().flatten();
        self.kpis = fleet_kpis(&self.feeders);
        self.health = self.hub.backend_health();
        self.errors = self.hub.poll_errors();

        // keep the cursor on the focused feeder across refreshes
        if self.view == View::Feeders {
            if let Some(selected) = &self.selected_feeder {
                if let Some(index) = self.feeders.iter().position(|f| f.id == selected.id) {
                    self.selected_index = index;
                }
            }
        }
        self.update_selection();

        // an open dispatch dialog follows the refreshed event; a vanished
        // event keeps its last known data on screen
        if let AppState::EventDetail(current) = &self.app_state {
            if let Some(updated) = self.events.iter().find(|e| e.id == current.id).cloned() {
                self.app_state = AppState::EventDetail(updated);
            }
        }
    }

    pub fn filtered_events(&self) -> Vec<FlexEvent> {
        self.filter.apply(&self.events)
    }

    fn row_count(&self) -> usize {
        match self.view {
            View::Feeders => self.feeders.len(),
            View::Events => self.filtered_events().len(),
            View::Ders => self.ders.len(),
        }
    }

    fn update_selection(&mut self) {
        let count = self.row_count();
        if count == 0 {
            self.selected_index = 0;
            self.table_state.select(None);
        } else {
            if self.selected_index >= count {
                self.selected_index = count - 1;
            }
            self.table_state.select(Some(self.selected_index));
        }
    }

    fn sync_feeder_selection(&mut self) {
        if self.view == View::Feeders {
            if let Some(feeder) = self.feeders.get(self.selected_index) {
                self.hub.select_feeder(feeder.id.clone());
                self.selected_feeder = Some(feeder.clone());
            }
        }
    }

    pub fn next(&mut self) {
        let count = self.row_count();
        if count > 0 {
            self.selected_index = (self.selected_index + 1) % count;
            self.table_state.select(Some(self.selected_index));
            self.sync_feeder_selection();
        }
    }

    pub fn previous(&mut self) {
        let count = self.row_count();
        if count > 0 {
            if self.selected_index == 0 {
                self.selected_index = count - 1;
            } else {
                self.selected_index -= 1;
            }
            self.table_state.select(Some(self.selected_index));
            self.sync_feeder_selection();
        }
    }

    pub fn switch_view(&mut self) {
        self.view = self.view.next();
        self.selected_index = 0;
        self.update_selection();
    }

    pub fn show_details(&mut self) {
        match self.view {
            View::Feeders => {
                if self.selected_feeder.is_some() {
                    self.app_state = AppState::FeederDetail;
                }
            }
            View::Events => {
                if let Some(event) = self.filtered_events().get(self.selected_index).cloned() {
                    self.hub.inspect_obp(Some(event.obp_id.clone()));
                    self.app_state = AppState::EventDetail(event);
                }
            }
            View::Ders => {}
        }
    }

    pub fn close_details(&mut self) {
        if matches!(self.app_state, AppState::EventDetail(_)) {
            self.hub.inspect_obp(None);
            self.audit = None;
        }
        self.app_state = AppState::Normal;
    }

    pub fn cycle_status_filter(&mut self) {
        self.filter.status = match self.filter.status {
            None => Some(EventStatus::Active),
            Some(EventStatus::Active) => Some(EventStatus::Completed),
            Some(EventStatus::Completed) => Some(EventStatus::Failed),
            Some(EventStatus::Failed) => None,
        };
        self.last_action = Some(match self.filter.status {
            Some(status) => format!("Status filter: {status}"),
            None => "Status filter cleared".into(),
        });
        self.selected_index = 0;
        self.update_selection();
    }

    pub fn advance_workflow(&mut self) {
        if self.workflow.advance(Utc::now()) {
            self.last_action = Some(format!("Workflow advanced to {}", self.workflow.current()));
        } else {
            self.last_action = Some("Workflow already at COMPLETE".into());
        }
    }

    pub fn reset_workflow(&mut self) {
        self.workflow.reset();
        self.last_action = Some("Workflow reset to DISCOVER".into());
    }

    pub fn export_events_csv(&mut self) {
        let filtered = self.filtered_events();
        let csv = events::events_to_csv(&filtered);
        self.last_action = Some(match std::fs::write(&self.export_path, csv) {
            Ok(()) => format!(
                "Exported {} events to {}",
                filtered.len(),
                self.export_path.display()
            ),
            Err(e) => format!("Export failed: {e}"),
        });
    }

    pub fn export_audit_csv(&mut self) {
        let Some(audit) = self.audit.clone() else {
            self.last_action = Some("No audit trail loaded yet".into());
            return;
        };
        let path = audit_export_path(&self.export_path);
        let csv = events::audit_to_csv(&[audit]);
        self.last_action = Some(match std::fs::write(&path, csv) {
            Ok(()) => format!("Exported audit trail to {}", path.display()),
            Err(e) => format!("Audit export failed: {e}"),
        });
    }

    fn filter_label(&self) -> String {
        match self.filter.status {
            Some(status) => format!(", filter {status}"),
            None => String::new(),
        }
    }

    fn instructions(&self) -> &'static str {
        if matches!(self.app_state, AppState::Normal) {
            "| Up/Down: Navigate | Tab: View | Enter: Details | F: Filter | E: Export | Q: Quit"
        } else {
            "| ESC: Close Dialog"
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let health: Span = match self.health {
            BackendHealth::Checking => "checking".dim(),
            BackendHealth::Online => "online".green(),
            BackendHealth::Offline => "offline".red(),
        };

        let mut lines: Vec<Line> = vec![vec![
            self.view.title().bold().cyan(),
            "  |  backend: ".into(),
            health,
            format!(
                "  |  {} feeders, {} warning, {} critical, {} unknown",
                self.kpis.total, self.kpis.warning, self.kpis.critical, self.kpis.unknown
            )
            .into(),
        ]
        .into()];

        if self.errors.is_empty() {
            match &self.last_action {
                Some(action) => lines.push(action.clone().dim().into()),
                None => lines.push("All pollers healthy".dim().into()),
            }
        } else {
            // errors render alongside the stale data, never instead of it
            lines.push(self.errors.join("; ").red().into());
        }

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" FLUXEON Command Centre ")
                .bold(),
        );
        frame.render_widget(paragraph, area);
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(5)])
            .split(area);

        self.render_status(frame, chunks[0]);

        let instructions = self.instructions();
        match self.view {
            View::Feeders => {
                FeederTable::render(
                    &self.feeders,
                    &self.kpis,
                    instructions,
                    &mut self.table_state,
                    frame,
                    chunks[1],
                );
            }
            View::Events => {
                let filtered = self.filtered_events();
                let filter_label = self.filter_label();
                EventsTable::render(
                    &filtered,
                    &filter_label,
                    instructions,
                    &mut self.table_state,
                    frame,
                    chunks[1],
                );
            }
            View::Ders => {
                DerTable::render(&self.ders, instructions, &mut self.table_state, frame, chunks[1]);
            }
        }

        match &self.app_state {
            AppState::Normal => {}
            AppState::FeederDetail => {
                if let Some(feeder) = &self.selected_feeder {
                    FeederDetailDialog::render(feeder, self.detail.as_ref(), frame, area);
                }
            }
            AppState::EventDetail(event) => {
                let step = self.workflow.effective_step(event.beckn_step);
                EventDetailDialog::render(
                    event,
                    self.audit.as_ref(),
                    step,
                    &self.workflow,
                    frame,
                    area,
                );
            }
        }
    }
}

/// Sibling path for the audit export, e.g. `fluxeon_events_audit.csv`.
fn audit_export_path(events_path: &Path) -> PathBuf {
    let stem = events_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("fluxeon_audit");
    events_path.with_file_name(format!("{stem}_audit.csv"))
}

pub async fn run_command_centre(hub: Arc<PollingHub>, args: &MonitorArgs) -> Result<()> {
    let mut stdout = std::io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = CommandCentreApp::new(hub, args.export_path.clone());

    let (tx, mut rx) = mpsc::channel(100);
    let refresh_interval = Duration::from_millis(args.feeder_poll_ms);

    let _refresh_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(refresh_interval);
        loop {
            interval.tick().await;
            if tx.send(RefreshEvent::Tick).await.is_err() {
                tracing::debug!("Failed to send refresh tick, receiver dropped");
                break;
            }
        }
    });

    app.refresh();

    let result = run_event_loop(&mut terminal, &mut app, &mut rx).await;

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut CommandCentreApp,
    rx: &mut mpsc::Receiver<RefreshEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => match &app.app_state {
                        AppState::Normal => {
                            if key.code == KeyCode::Char('q') {
                                return Ok(());
                            }
                        }
                        _ => app.close_details(),
                    },
                    KeyCode::Down | KeyCode::Char('j') => {
                        if matches!(app.app_state, AppState::Normal) {
                            app.next();
                        }
                    }
                    KeyCode::Up | KeyCode::Char('k') => {
                        if matches!(app.app_state, AppState::Normal) {
                            app.previous();
                        }
                    }
                    KeyCode::Tab => {
                        if matches!(app.app_state, AppState::Normal) {
                            app.switch_view();
                        }
                    }
                    KeyCode::Enter => {
                        if matches!(app.app_state, AppState::Normal) {
                            app.show_details();
                        }
                    }
                    KeyCode::Char('r') => {
                        if matches!(app.app_state, AppState::Normal) {
                            app.refresh();
                        }
                    }
                    KeyCode::Char('f') => {
                        if matches!(app.app_state, AppState::Normal) && app.view == View::Events {
                            app.cycle_status_filter();
                        }
                    }
                    KeyCode::Char('e') => match app.app_state {
                        AppState::EventDetail(_) => app.export_audit_csv(),
                        _ => app.export_events_csv(),
                    },
                    KeyCode::Char('b') => {
                        if matches!(app.app_state, AppState::EventDetail(_)) {
                            app.advance_workflow();
                        }
                    }
                    KeyCode::Char('n') => {
                        if matches!(app.app_state, AppState::EventDetail(_)) {
                            app.reset_workflow();
                        }
                    }
                    _ => {}
                },
                _ => {}
            }
        } else {
            match rx.try_recv() {
                Ok(RefreshEvent::Tick) => app.refresh(),
                Err(mpsc::error::TryRecvError::Empty) => {}
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    tracing::debug!("Refresh channel disconnected");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use similar_asserts::assert_eq;

    use super::*;

    fn hub_with_data() -> Arc<PollingHub> {
        let hub = PollingHub::new(&MonitorArgs::parse_from(["fluxeon"]));

        let feeders = vec![
            FeederSummary {
                id: "F1".into(),
                name: "Feeder 1".into(),
                state: 0,
                load_kw: 120.5,
                temperature: None,
            },
            FeederSummary {
                id: "F2".into(),
                name: "Feeder 2".into(),
                state: 1,
                load_kw: 230.0,
                temperature: Some(28.5),
            },
        ];
        hub.feeders.apply_success(hub.feeders.issue_seq(), feeders);

        let fetched_at = "2026-03-01T10:00:00Z".parse().expect("timestamp");
        let events = vec![
            FlexEvent::from_dto(
                api_types::EventDto {
                    event_id: "EVT-001".into(),
                    feeder_id: "F2".into(),
                    status: "CONFIRM".into(),
                    requested_kw: 50.0,
                    delivered_kw: 42.0,
                    timestamp: None,
                    der_count: None,
                    obp_id: None,
                },
                fetched_at,
            ),
            FlexEvent::from_dto(
                api_types::EventDto {
                    event_id: "EVT-002".into(),
                    feeder_id: "F1".into(),
                    status: "COMPLETE".into(),
                    requested_kw: 30.0,
                    delivered_kw: 30.0,
                    timestamp: None,
                    der_count: None,
                    obp_id: None,
                },
                fetched_at,
            ),
        ];
        hub.events.apply_success(hub.events.issue_seq(), events);

        hub
    }

    #[test]
    fn refresh_tracks_hub_snapshots_and_selection() {
        let hub = hub_with_data();
        let mut app = CommandCentreApp::new(hub.clone(), PathBuf::from("events.csv"));

        app.refresh();
        assert_eq!(app.feeders.len(), 2);
        assert_eq!(app.kpis.warning, 1);
        assert_eq!(
            app.selected_feeder.as_ref().map(|f| f.id.as_str()),
            Some("F1"),
            "with no hint the first feeder is focused"
        );

        app.next();
        assert_eq!(
            app.selected_feeder.as_ref().map(|f| f.id.as_str()),
            Some("F2"),
            "navigation moves the hub selection"
        );

        app.refresh();
        assert_eq!(
            app.selected_index, 1,
            "the cursor follows the focused feeder across refreshes"
        );
    }

    #[test]
    fn status_filter_narrows_the_event_view() {
        let hub = hub_with_data();
        let mut app = CommandCentreApp::new(hub, PathBuf::from("events.csv"));
        app.refresh();
        app.switch_view();
        assert_eq!(app.view, View::Events);
        assert_eq!(app.row_count(), 2);

        app.cycle_status_filter(); // ACTIVE
        assert_eq!(app.row_count(), 1);
        assert_eq!(app.filtered_events()[0].id, "EVT-001");

        app.cycle_status_filter(); // COMPLETED
        assert_eq!(app.filtered_events()[0].id, "EVT-002");

        app.cycle_status_filter(); // FAILED
        assert_eq!(app.row_count(), 0);

        app.cycle_status_filter(); // cleared
        assert_eq!(app.row_count(), 2);
    }

    #[test]
    fn opening_an_event_marks_its_obp_for_auditing() {
        let hub = hub_with_data();
        let mut app = CommandCentreApp::new(hub.clone(), PathBuf::from("events.csv"));
        app.refresh();
        app.switch_view();

        app.show_details();
        assert!(matches!(app.app_state, AppState::EventDetail(_)));
        assert_eq!(hub.inspected_obp().as_deref(), Some("OBP-EVT-001"));

        app.close_details();
        assert_eq!(hub.inspected_obp(), None, "closing stops the audit poller");
    }

    #[test]
    fn export_writes_the_filtered_events() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("events.csv");

        let hub = hub_with_data();
        let mut app = CommandCentreApp::new(hub, path.clone());
        app.refresh();
        app.cycle_status_filter(); // ACTIVE only

        app.export_events_csv();
        let written = std::fs::read_to_string(&path).expect("export file exists");
        let parsed = crate::events::parse_events_csv(&written).expect("export parses");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, "EVT-001");
        assert!(app
            .last_action
            .as_deref()
            .expect("action recorded")
            .contains("Exported 1 events"));
    }

    #[test]
    fn audit_export_path_derives_from_the_events_path() {
        assert_eq!(
            audit_export_path(Path::new("out/fluxeon_events.csv")),
            PathBuf::from("out/fluxeon_events_audit.csv")
        );
    }
}
