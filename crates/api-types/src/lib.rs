//! Shared API type definitions
//!
//! This crate contains the wire types and view models shared across the
//! FLUXEON command centre: feeder summaries and the two historical
//! feeder-state payload shapes, flexibility events with their Beckn
//! workflow steps, DER catalog entries, and OBP audit trails.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// AI-assigned risk classification for a feeder.
///
/// The backend reports risk as an integer code. Codes outside {0, 1, 2}
/// carry no meaning and must be rendered as unknown, never as `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Normal,
    Warning,
    Critical,
}

impl RiskLevel {
    /// Map a raw backend code to a risk level. Out-of-range codes are `None`.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Normal),
            1 => Some(Self::Warning),
            2 => Some(Self::Critical),
            _ => None,
        }
    }

    /// The wire code for this level.
    pub fn code(self) -> i64 {
        match self {
            Self::Normal => 0,
            Self::Warning => 1,
            Self::Critical => 2,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// One entry of the `GET /feeders` list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeederSummary {
    /// Feeder id, e.g. "F12"
    pub id: String,
    /// Display name
    pub name: String,
    /// Raw risk code as reported by the backend
    pub state: i64,
    /// Current load in kW
    pub load_kw: f64,
    /// Ambient temperature in Celsius, when the backend reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl FeederSummary {
    /// Validated risk level; `None` when the raw code is out of range.
    pub fn risk(&self) -> Option<RiskLevel> {
        RiskLevel::from_code(self.state)
    }
}

/// One sensor reading inside `recent_history` of the AI feeder-state shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeederReading {
    pub timestamp: DateTime<Utc>,
    /// Load in kW at this reading
    pub load_kw: f64,
    /// Ambient temperature in Celsius
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Activity flag (true = workday, false = weekend)
    #[serde(default)]
    pub is_workday: Option<bool>,
    /// Risk code predicted for this reading
    #[serde(default)]
    pub risk_label: Option<i64>,
}

/// Raw `GET /feeders/{id}/state` payload.
///
/// The backend has shipped two shapes for this endpoint: the legacy
/// simulator shape (`id`/`state`/`load_kw`/`threshold_kw`/...) and the
/// current AI shape (`feeder_id`/`risk_level`/`current_load_kw`/...).
/// Neither can be assumed to be exclusively present, so every field is
/// optional here and consumers resolve them through an explicit precedence
/// order instead of reading the union directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeederStateDto {
    // Current AI shape
    pub feeder_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    /// The AI classification (0, 1 or 2)
    pub risk_level: Option<i64>,
    pub current_load_kw: Option<f64>,
    /// Naive forecast for the next interval
    pub forecast_load_kw: Option<f64>,
    pub message: Option<String>,
    /// Last hour of readings for plotting
    pub recent_history: Option<Vec<FeederReading>>,

    // Legacy simulator shape
    pub id: Option<String>,
    pub state: Option<i64>,
    pub load_kw: Option<f64>,
    pub threshold_kw: Option<f64>,
    pub critical_threshold_kw: Option<f64>,
    pub history_kw: Option<Vec<f64>>,
    pub forecast_kw: Option<Vec<f64>>,
    pub temperature: Option<f64>,
}

/// One stage of the fixed six-stage flexibility dispatch workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BecknStep {
    Discover,
    Select,
    Init,
    Confirm,
    Status,
    Complete,
}

impl BecknStep {
    /// The fixed workflow order, DISCOVER through COMPLETE.
    pub const SEQUENCE: [BecknStep; 6] = [
        BecknStep::Discover,
        BecknStep::Select,
        BecknStep::Init,
        BecknStep::Confirm,
        BecknStep::Status,
        BecknStep::Complete,
    ];

    /// Parse an uppercase wire name, e.g. "CONFIRM".
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DISCOVER" => Some(Self::Discover),
            "SELECT" => Some(Self::Select),
            "INIT" => Some(Self::Init),
            "CONFIRM" => Some(Self::Confirm),
            "STATUS" => Some(Self::Status),
            "COMPLETE" => Some(Self::Complete),
            _ => None,
        }
    }

    /// Zero-based position within [`Self::SEQUENCE`].
    pub fn index(self) -> usize {
        match self {
            Self::Discover => 0,
            Self::Select => 1,
            Self::Init => 2,
            Self::Confirm => 3,
            Self::Status => 4,
            Self::Complete => 5,
        }
    }

    /// The following step, or `None` at COMPLETE.
    pub fn next(self) -> Option<Self> {
        Self::SEQUENCE.get(self.index() + 1).copied()
    }
}

impl std::fmt::Display for BecknStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Discover => "DISCOVER",
            Self::Select => "SELECT",
            Self::Init => "INIT",
            Self::Confirm => "CONFIRM",
            Self::Status => "STATUS",
            Self::Complete => "COMPLETE",
        };
        f.write_str(name)
    }
}

/// Coarse display status of a flexibility event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Active,
    Completed,
    Failed,
}

impl EventStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ACTIVE" => Some(Self::Active),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Raw `GET /events/active` entry.
///
/// `status` is the backend's Beckn-step string (or `COMPLETE`/`FAILED`).
/// `timestamp`, `der_count` and `obp_id` are newer supplements the backend
/// may or may not send yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDto {
    pub event_id: String,
    pub feeder_id: String,
    pub status: String,
    pub requested_kw: f64,
    pub delivered_kw: f64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub der_count: Option<u32>,
    #[serde(default)]
    pub obp_id: Option<String>,
}

/// Normalized flexibility-dispatch event as rendered by the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct FlexEvent {
    pub id: String,
    pub feeder_id: String,
    pub feeder_name: String,
    pub status: EventStatus,
    pub flex_requested_kw: f64,
    pub flex_delivered_kw: f64,
    pub timestamp: DateTime<Utc>,
    pub der_count: u32,
    /// Correlates this dispatch to its audit trail
    pub obp_id: String,
    /// Workflow step when the backend reports one; `None` means unknown,
    /// not "not started"
    pub beckn_step: Option<BecknStep>,
}

impl FlexEvent {
    /// Normalize a raw backend event.
    ///
    /// A `COMPLETE` or `FAILED` status maps to the matching terminal
    /// display status; every in-progress Beckn step maps to `ACTIVE`.
    /// `fetched_at` fills in for a missing wire timestamp.
    pub fn from_dto(dto: EventDto, fetched_at: DateTime<Utc>) -> Self {
        let beckn_step = BecknStep::parse(&dto.status);
        let status = match dto.status.as_str() {
            "COMPLETE" => EventStatus::Completed,
            "FAILED" => EventStatus::Failed,
            _ => EventStatus::Active,
        };
        let feeder_name = format!("Feeder {}", dto.feeder_id);
        let obp_id = dto
            .obp_id
            .unwrap_or_else(|| format!("OBP-{}", dto.event_id));

        Self {
            id: dto.event_id,
            feeder_id: dto.feeder_id,
            feeder_name,
            status,
            flex_requested_kw: dto.requested_kw,
            flex_delivered_kw: dto.delivered_kw,
            timestamp: dto.timestamp.unwrap_or(fetched_at),
            der_count: dto.der_count.unwrap_or(0),
            obp_id,
            beckn_step,
        }
    }

    /// Delivered share of the requested flexibility, in percent.
    pub fn delivery_percent(&self) -> Option<f64> {
        if self.flex_requested_kw > 0.0 {
            Some((self.flex_delivered_kw / self.flex_requested_kw) * 100.0)
        } else {
            None
        }
    }
}

/// Kind of distributed energy resource offered as flexibility capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DerKind {
    Ev,
    Battery,
    Hvac,
    Load,
    Pv,
}

impl std::fmt::Display for DerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ev => "EV",
            Self::Battery => "BATTERY",
            Self::Hvac => "HVAC",
            Self::Load => "LOAD",
            Self::Pv => "PV",
        };
        f.write_str(name)
    }
}

/// Allocation status of a DER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DerStatus {
    Available,
    Allocated,
    Active,
    Unavailable,
}

impl std::fmt::Display for DerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// One `GET /ders` catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Der {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DerKind,
    /// Total capacity in kW
    #[serde(rename = "capacity")]
    pub capacity_kw: f64,
    /// Capacity still available in kW
    #[serde(rename = "available")]
    pub available_kw: f64,
    pub status: DerStatus,
    /// Activation latency in seconds
    #[serde(default, rename = "responseTime")]
    pub response_time_s: Option<f64>,
    /// Price per kWh
    #[serde(default, rename = "cost")]
    pub cost_per_kwh: Option<f64>,
}

impl Der {
    /// Capacity currently in use, never negative.
    pub fn used_kw(&self) -> f64 {
        (self.capacity_kw - self.available_kw).max(0.0)
    }

    /// Utilization in percent, clamped to [0, 100]. Zero-capacity DERs
    /// report 0.
    pub fn utilization_percent(&self) -> f64 {
        if self.capacity_kw <= 0.0 {
            return 0.0;
        }
        let raw = (self.capacity_kw - self.available_kw) / self.capacity_kw * 100.0;
        raw.clamp(0.0, 100.0)
    }
}

/// One line of an OBP audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub ts: DateTime<Utc>,
    pub message: String,
    /// Round-trip latency of the logged Beckn call
    #[serde(default)]
    pub latency_ms: Option<f64>,
}

/// `GET /audit/{obp_id}` response; append-only display data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub obp_id: String,
    pub entries: Vec<AuditEntry>,
}

/// Body of the backend root endpoint, used as a health probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub status: String,
    pub service: String,
}
