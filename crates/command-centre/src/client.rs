//! Typed client for the FLUXEON backend API.

use api_types::AuditLog;
use api_types::Der;
use api_types::EventDto;
use api_types::FeederStateDto;
use api_types::FeederSummary;
use api_types::ServiceInfo;
use http_poll_comm::ClientConfig;
use http_poll_comm::CommResult;
use http_poll_comm::JsonClient;

/// All consumed endpoints live behind this client; the dashboard never
/// builds a URL anywhere else.
pub struct BackendClient {
    json: JsonClient,
}

impl BackendClient {
    pub fn new(config: &ClientConfig) -> CommResult<Self> {
        Ok(Self {
            json: JsonClient::new(config)?,
        })
    }

    /// `GET /feeders` — feeder summaries for the overview table.
    pub async fn list_feeders(&self) -> CommResult<Vec<FeederSummary>> {
        self.json.get_json(&["feeders"]).await
    }

    /// `GET /feeders/{id}/state` — detail union for one feeder.
    pub async fn feeder_state(&self, feeder_id: &str) -> CommResult<FeederStateDto> {
        self.json.get_json(&["feeders", feeder_id, "state"]).await
    }

    /// `GET /events/active` — raw flexibility events.
    pub async fn active_events(&self) -> CommResult<Vec<EventDto>> {
        self.json.get_json(&["events", "active"]).await
    }

    /// `GET /ders` — flexibility capacity catalog.
    pub async fn ders(&self) -> CommResult<Vec<Der>> {
        self.json.get_json(&["ders"]).await
    }

    /// `GET /audit/{obp_id}` — audit trail for one dispatch.
    pub async fn audit_trail(&self, obp_id: &str) -> CommResult<AuditLog> {
        self.json.get_json(&["audit", obp_id]).await
    }

    /// `GET /` — lightweight reachability probe.
    pub async fn health(&self) -> CommResult<ServiceInfo> {
        self.json.get_json(&[]).await
    }
}
