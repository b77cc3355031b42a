use api_types::Der;
use api_types::DerStatus;
use api_types::EventStatus;
use api_types::FeederSummary;
use api_types::FlexEvent;
use api_types::RiskLevel;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Row, Table, TableState};

use crate::normalize::FleetKpis;

fn risk_cell(risk: Option<RiskLevel>) -> Cell<'static> {
    match risk {
        Some(RiskLevel::Normal) => Cell::from("Normal").fg(Color::Green),
        Some(RiskLevel::Warning) => Cell::from("Warning").fg(Color::Yellow),
        Some(RiskLevel::Critical) => Cell::from("Critical").fg(Color::Red),
        None => Cell::from("Unknown").fg(Color::DarkGray),
    }
}

fn status_cell(status: EventStatus) -> Cell<'static> {
    match status {
        EventStatus::Active => Cell::from("ACTIVE").fg(Color::Blue),
        EventStatus::Completed => Cell::from("COMPLETED").fg(Color::Green),
        EventStatus::Failed => Cell::from("FAILED").fg(Color::Red),
    }
}

pub struct FeederTable;

impl FeederTable {
    pub fn render(
        feeders: &[FeederSummary],
        kpis: &FleetKpis,
        instructions: &str,
        table_state: &mut TableState,
        frame: &mut Frame,
        area: Rect,
    ) {
        let header_cells = ["Feeder", "Name", "Risk", "Load (kW)", "Temp (°C)"]
            .iter()
            .map(|h| Cell::from(*h).bold().cyan());
        let header = Row::new(header_cells).height(1).bottom_margin(1);

        let mut rows = Vec::new();
        for feeder in feeders {
            let temperature = feeder
                .temperature
                .map(|t| format!("{t:.1}"))
                .unwrap_or_else(|| "-".into());

            rows.push(Row::new(vec![
                Cell::from(feeder.id.clone()),
                Cell::from(feeder.name.clone()),
                risk_cell(feeder.risk()),
                Cell::from(format!("{:.1}", feeder.load_kw)),
                Cell::from(temperature).dim(),
            ]));
        }

        let widths = [
            Constraint::Length(8),  // Feeder
            Constraint::Min(16),    // Name
            Constraint::Length(10), // Risk
            Constraint::Length(10), // Load
            Constraint::Length(10), // Temp
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(
                        " Feeders ({} monitored, {} warning, {} critical) {} ",
                        kpis.total, kpis.warning, kpis.critical, instructions
                    ))
                    .bold(),
            )
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol(">> ");

        frame.render_stateful_widget(table, area, table_state);
    }
}

pub struct EventsTable;

impl EventsTable {
    pub fn render(
        events: &[FlexEvent],
        filter_label: &str,
        instructions: &str,
        table_state: &mut TableState,
        frame: &mut Frame,
        area: Rect,
    ) {
        let header_cells = [
            "Event", "Feeder", "Status", "Req (kW)", "Del (kW)", "OBP", "Step",
        ]
        .iter()
        .map(|h| Cell::from(*h).bold().cyan());
        let header = Row::new(header_cells).height(1).bottom_margin(1);

        let mut rows = Vec::new();
        for event in events {
            let step = event
                .beckn_step
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".into());

            rows.push(Row::new(vec![
                Cell::from(event.id.clone()),
                Cell::from(event.feeder_id.clone()),
                status_cell(event.status),
                Cell::from(format!("{}", event.flex_requested_kw)),
                Cell::from(format!("{}", event.flex_delivered_kw)).fg(Color::Green),
                Cell::from(event.obp_id.clone()).dim(),
                Cell::from(step),
            ]));
        }

        let widths = [
            Constraint::Min(10),    // Event
            Constraint::Length(8),  // Feeder
            Constraint::Length(10), // Status
            Constraint::Length(9),  // Requested
            Constraint::Length(9),  // Delivered
            Constraint::Min(12),    // OBP
            Constraint::Length(9),  // Step
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(
                        " Flexibility events ({} shown{}) {} ",
                        events.len(),
                        filter_label,
                        instructions
                    ))
                    .bold(),
            )
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol(">> ");

        frame.render_stateful_widget(table, area, table_state);
    }
}

pub struct DerTable;

impl DerTable {
    pub fn render(
        ders: &[Der],
        instructions: &str,
        table_state: &mut TableState,
        frame: &mut Frame,
        area: Rect,
    ) {
        let header_cells = [
            "DER", "Name", "Type", "Status", "Avail (kW)", "Cap (kW)", "Util", "Resp (s)", "€/kWh",
        ]
        .iter()
        .map(|h| Cell::from(*h).bold().cyan());
        let header = Row::new(header_cells).height(1).bottom_margin(1);

        let mut rows = Vec::new();
        for der in ders {
            let status = match der.status {
                DerStatus::Available => Cell::from("available").fg(Color::Green),
                DerStatus::Allocated => Cell::from("allocated").fg(Color::Yellow),
                DerStatus::Active => Cell::from("active").fg(Color::Cyan),
                DerStatus::Unavailable => Cell::from("unavailable").fg(Color::Red),
            };
            let response = der
                .response_time_s
                .map(|s| format!("{s:.1}"))
                .unwrap_or_else(|| "-".into());
            let cost = der
                .cost_per_kwh
                .map(|c| format!("{c:.2}"))
                .unwrap_or_else(|| "-".into());

            rows.push(Row::new(vec![
                Cell::from(der.id.clone()),
                Cell::from(der.name.clone()),
                Cell::from(der.kind.to_string()),
                status,
                Cell::from(format!("{}", der.available_kw)),
                Cell::from(format!("{}", der.capacity_kw)),
                Cell::from(format!("{:.0}%", der.utilization_percent())).dim(),
                Cell::from(response).dim(),
                Cell::from(cost).dim(),
            ]));
        }

        let widths = [
            Constraint::Length(9),  // DER
            Constraint::Min(18),    // Name
            Constraint::Length(8),  // Type
            Constraint::Length(12), // Status
            Constraint::Length(10), // Available
            Constraint::Length(9),  // Capacity
            Constraint::Length(6),  // Util
            Constraint::Length(9),  // Response
            Constraint::Length(7),  // Cost
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Available DERs ({}) {} ", ders.len(), instructions))
                    .bold(),
            )
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol(">> ");

        frame.render_stateful_widget(table, area, table_state);
    }
}
