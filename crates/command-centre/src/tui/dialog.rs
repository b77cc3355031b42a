use api_types::AuditLog;
use api_types::BecknStep;
use api_types::EventStatus;
use api_types::FeederSummary;
use api_types::FlexEvent;
use api_types::RiskLevel;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::beckn::WorkflowTracker;
use crate::normalize::FeederDetail;

fn risk_span(risk: Option<RiskLevel>) -> Span<'static> {
    match risk {
        Some(RiskLevel::Normal) => "Normal".green(),
        Some(RiskLevel::Warning) => "Warning".yellow(),
        Some(RiskLevel::Critical) => "Critical".red(),
        None => "Unknown".dim(),
    }
}

pub struct FeederDetailDialog;

impl FeederDetailDialog {
    pub fn render(
        feeder: &FeederSummary,
        detail: Option<&FeederDetail>,
        frame: &mut Frame,
        area: Rect,
    ) {
        let popup_area = centered_rect(75, 75, area);
        frame.render_widget(Clear, popup_area);

        let risk = detail.and_then(|d| d.risk).or_else(|| feeder.risk());
        let live_load = detail
            .and_then(|d| d.live_load_kw)
            .unwrap_or(feeder.load_kw);

        let mut content_lines: Vec<Line> = vec![
            vec!["Feeder ID: ".into(), feeder.id.clone().dim()].into(),
            vec!["Name: ".into(), feeder.name.clone().dim()].into(),
            "".into(),
            vec!["Current state: ".into(), risk_span(risk)].into(),
            vec![
                "Live load: ".into(),
                format!("{live_load:.1} kW").cyan(),
            ]
            .into(),
        ];

        if let Some(temperature) = detail.and_then(|d| d.temperature).or(feeder.temperature) {
            content_lines
                .push(vec!["Temperature: ".into(), format!("{temperature:.1} °C").yellow()].into());
        }

        content_lines.push("".into());

        match detail {
            Some(detail) => {
                if let Some(timestamp) = detail.timestamp {
                    content_lines.push(
                        vec![
                            "As of: ".into(),
                            format!("{} UTC", timestamp.format("%H:%M:%S")).dim(),
                        ]
                        .into(),
                    );
                }
                if let Some(threshold) = detail.threshold_kw {
                    content_lines.push(
                        vec!["Threshold: ".into(), format!("{threshold:.1} kW").red()].into(),
                    );
                }
                if let Some(critical) = detail.critical_threshold_kw {
                    content_lines.push(
                        vec![
                            "Critical threshold: ".into(),
                            format!("{critical:.1} kW").red(),
                        ]
                        .into(),
                    );
                }

                let insight = if detail.is_over_threshold() {
                    "Load is above the AI threshold - flexibility is recommended."
                        .yellow()
                } else {
                    "Load is below the AI threshold - operating in safe band.".green()
                };
                content_lines.push(vec!["AI insight: ".into(), insight].into());

                let relief = detail.estimated_relief_kw();
                if relief > 0.0 {
                    content_lines.push(
                        vec![
                            "Recommended relief: ".into(),
                            format!("{relief} kW").green().bold(),
                            " flexibility to bring it below threshold".into(),
                        ]
                        .into(),
                    );
                }

                if let Some(message) = &detail.message {
                    content_lines.push(vec!["Backend: ".into(), message.clone().dim()].into());
                }

                if !detail.forecast_kw.is_empty() {
                    let preview: Vec<String> = detail
                        .forecast_kw
                        .iter()
                        .take(6)
                        .map(|kw| format!("{kw}"))
                        .collect();
                    content_lines.push(
                        vec![
                            "Forecast: ".into(),
                            format!("{} kW", preview.join(", ")).into(),
                        ]
                        .into(),
                    );
                }

                content_lines.push("".into());
                content_lines.push("=== RECENT HISTORY ===".bold().into());
                if detail.history.is_empty() {
                    content_lines.push("No history reported".dim().into());
                } else {
                    for sample in detail.history.iter().rev().take(6) {
                        let stamp = sample
                            .timestamp
                            .map(|ts| ts.format("%H:%M:%S").to_string())
                            .unwrap_or_else(|| "--:--:--".into());
                        let temperature = sample
                            .temperature
                            .map(|t| format!("  {t:.1} °C"))
                            .unwrap_or_default();
                        content_lines.push(
                            vec![
                                format!("{stamp}  ").dim(),
                                format!("{:.1} kW", sample.load_kw).into(),
                                temperature.yellow(),
                            ]
                            .into(),
                        );
                    }
                }
            }
            None => {
                content_lines.push("Pulling AI state from backend...".dim().into());
            }
        }

        content_lines.push("".into());
        content_lines.push("Press ESC to close this dialog".dim().into());

        let paragraph = Paragraph::new(content_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Feeder control: {} ", feeder.name))
                    .bold()
                    .cyan(),
            )
            .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, popup_area);
    }
}

pub struct EventDetailDialog;

impl EventDetailDialog {
    pub fn render(
        event: &FlexEvent,
        audit: Option<&AuditLog>,
        effective_step: BecknStep,
        workflow: &WorkflowTracker,
        frame: &mut Frame,
        area: Rect,
    ) {
        let popup_area = centered_rect(80, 80, area);
        frame.render_widget(Clear, popup_area);

        let status = match event.status {
            EventStatus::Active => "ACTIVE".blue(),
            EventStatus::Completed => "COMPLETED".green(),
            EventStatus::Failed => "FAILED".red(),
        };

        let mut content_lines: Vec<Line> = vec![
            vec!["Event: ".into(), event.id.clone().dim()].into(),
            vec!["Feeder: ".into(), event.feeder_name.clone().dim()].into(),
            vec!["Status: ".into(), status].into(),
            vec![
                "Flex requested: ".into(),
                format!("{} kW", event.flex_requested_kw).into(),
            ]
            .into(),
            vec![
                "Flex delivered: ".into(),
                format!("{} kW", event.flex_delivered_kw).green(),
                event
                    .delivery_percent()
                    .map(|pct| format!("  ({pct:.0}% success)"))
                    .unwrap_or_default()
                    .dim(),
            ]
            .into(),
            vec![
                "DERs allocated: ".into(),
                format!("{}", event.der_count).into(),
            ]
            .into(),
            vec!["OBP ID: ".into(), event.obp_id.clone().dim()].into(),
            "".into(),
            "=== BECKN WORKFLOW ===".bold().into(),
        ];

        for step in BecknStep::SEQUENCE {
            let marker: Span = if step.index() < effective_step.index() {
                "[x] ".green()
            } else if step == effective_step {
                "[>] ".cyan().bold()
            } else {
                "[ ] ".dim()
            };
            let stamp = workflow
                .timestamp(step)
                .map(|ts| format!("  {}", ts.format("%H:%M:%S")))
                .unwrap_or_default();
            content_lines.push(vec![marker, step.to_string().into(), stamp.dim()].into());
        }

        content_lines.push("".into());
        content_lines.push("=== AUDIT TRAIL ===".bold().into());
        match audit {
            Some(audit) if !audit.entries.is_empty() => {
                for entry in &audit.entries {
                    let latency: Span = match entry.latency_ms {
                        Some(ms) if ms > 1000.0 => format!("  {ms:.0}ms").red(),
                        Some(ms) => format!("  {ms:.0}ms").green(),
                        None => "".into(),
                    };
                    content_lines.push(
                        vec![
                            format!("{} UTC  ", entry.ts.format("%H:%M:%S")).dim(),
                            entry.message.clone().into(),
                            latency,
                        ]
                        .into(),
                    );
                }
            }
            Some(_) => {
                content_lines.push("No audit entries for this OBP yet".dim().into());
            }
            None => {
                content_lines.push("Fetching audit trail...".dim().into());
            }
        }

        content_lines.push("".into());
        content_lines.push(
            "B: advance step | N: reset workflow | E: export audit CSV | ESC: close"
                .dim()
                .into(),
        );

        let paragraph = Paragraph::new(content_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Dispatch detail: {} ", event.id))
                    .bold()
                    .cyan(),
            )
            .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, popup_area);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
