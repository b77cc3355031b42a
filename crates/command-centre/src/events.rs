//! Event filtering and CSV export.

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use api_types::AuditLog;
use api_types::EventStatus;
use api_types::FlexEvent;
use chrono::DateTime;
use chrono::Utc;

/// Filter over the normalized event list; unset fields match everything,
/// text fields match case-insensitive substrings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub feeder: Option<String>,
    pub obp: Option<String>,
}

impl EventFilter {
    pub fn matches(&self, event: &FlexEvent) -> bool {
        if let Some(status) = self.status {
            if event.status != status {
                return false;
            }
        }
        if let Some(feeder) = &self.feeder {
            if !event
                .feeder_id
                .to_lowercase()
                .contains(&feeder.to_lowercase())
            {
                return false;
            }
        }
        if let Some(obp) = &self.obp {
            if !event.obp_id.to_lowercase().contains(&obp.to_lowercase()) {
                return false;
            }
        }
        true
    }

    /// Filtered copy, preserving input order.
    pub fn apply(&self, events: &[FlexEvent]) -> Vec<FlexEvent> {
        events.iter().filter(|e| self.matches(e)).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub const EVENTS_CSV_HEADER: &str =
    "eventId,feederId,status,flexRequested,flexDelivered,timestamp,derCount,obpId";

/// Encode events as CSV, one row per event, in input order.
pub fn events_to_csv(events: &[FlexEvent]) -> String {
    let mut out = String::from(EVENTS_CSV_HEADER);
    out.push('\n');
    for event in events {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            event.id,
            event.feeder_id,
            event.status,
            event.flex_requested_kw,
            event.flex_delivered_kw,
            event.timestamp.to_rfc3339(),
            event.der_count,
            event.obp_id,
        ));
    }
    out
}

/// Parse a CSV produced by [`events_to_csv`] back into events.
///
/// The Beckn step is not part of the export, so parsed events carry none.
pub fn parse_events_csv(csv: &str) -> Result<Vec<FlexEvent>> {
    let mut lines = csv.lines();
    let header = lines.next().context("CSV is empty")?;
    if header != EVENTS_CSV_HEADER {
        bail!("unexpected CSV header: {header}");
    }

    let mut events = Vec::new();
    for (index, line) in lines.enumerate() {
        let row = index + 2;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 8 {
            bail!("row {row}: expected 8 fields, got {}", fields.len());
        }

        let status = EventStatus::parse(fields[2])
            .with_context(|| format!("row {row}: unrecognized status {:?}", fields[2]))?;
        let timestamp: DateTime<Utc> = fields[5]
            .parse()
            .with_context(|| format!("row {row}: bad timestamp {:?}", fields[5]))?;

        events.push(FlexEvent {
            id: fields[0].to_string(),
            feeder_id: fields[1].to_string(),
            feeder_name: format!("Feeder {}", fields[1]),
            status,
            flex_requested_kw: fields[3]
                .parse()
                .with_context(|| format!("row {row}: bad requested kW {:?}", fields[3]))?,
            flex_delivered_kw: fields[4]
                .parse()
                .with_context(|| format!("row {row}: bad delivered kW {:?}", fields[4]))?,
            timestamp,
            der_count: fields[6]
                .parse()
                .with_context(|| format!("row {row}: bad DER count {:?}", fields[6]))?,
            obp_id: fields[7].to_string(),
            beckn_step: None,
        });
    }
    Ok(events)
}

pub const AUDIT_CSV_HEADER: &str = "obpId,timestamp,message";

/// Encode audit trails as CSV; messages are double-quote escaped since
/// they routinely contain commas.
pub fn audit_to_csv(logs: &[AuditLog]) -> String {
    let mut out = String::from(AUDIT_CSV_HEADER);
    out.push('\n');
    for log in logs {
        for entry in &log.entries {
            let safe_message = format!("\"{}\"", entry.message.replace('"', "\"\""));
            out.push_str(&format!(
                "{},{},{}\n",
                log.obp_id,
                entry.ts.to_rfc3339(),
                safe_message,
            ));
        }
    }
    out
}
