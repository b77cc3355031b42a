//! Pure normalization of backend payloads into view models.
//!
//! The feeder-state endpoint has shipped two payload shapes over time, and
//! neither can be assumed exclusive. All "which field exists" branching
//! lives here, away from rendering code; every function is deterministic
//! given the same raw payload, so the precedence rules are unit-testable
//! without a network.

use api_types::FeederStateDto;
use api_types::FeederSummary;
use api_types::RiskLevel;
use chrono::DateTime;
use chrono::Utc;

/// One merged history point for plotting.
///
/// Legacy `history_kw` points have no timestamp or metadata; AI
/// `recent_history` readings carry all of it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSample {
    pub timestamp: Option<DateTime<Utc>>,
    pub load_kw: f64,
    pub temperature: Option<f64>,
    pub risk: Option<RiskLevel>,
}

/// Fully resolved feeder detail, independent of which wire shape arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct FeederDetail {
    pub feeder_id: String,
    /// `None` means unknown, rendered distinctly from [`RiskLevel::Normal`]
    pub risk: Option<RiskLevel>,
    pub live_load_kw: Option<f64>,
    pub threshold_kw: Option<f64>,
    pub critical_threshold_kw: Option<f64>,
    pub temperature: Option<f64>,
    pub forecast_kw: Vec<f64>,
    pub history: Vec<LoadSample>,
    pub message: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl FeederDetail {
    pub fn is_over_threshold(&self) -> bool {
        match (self.live_load_kw, self.threshold_kw) {
            (Some(live), Some(threshold)) => live >= threshold,
            _ => false,
        }
    }

    /// Flexibility needed to bring the load back under the threshold.
    pub fn estimated_relief_kw(&self) -> f64 {
        match (self.live_load_kw, self.threshold_kw) {
            (Some(live), Some(threshold)) if live > threshold => {
                (live - threshold).round().max(0.0)
            }
            _ => 0.0,
        }
    }
}

/// Resolve the feeder-state union using the documented precedence order.
///
/// - live load: `current_load_kw`, else `load_kw`, else the last value
///   shown in the feeder table
/// - threshold: `threshold_kw`, else `round(live × 0.85)`
/// - critical threshold: `critical_threshold_kw`, else `round(live × 0.95)`
/// - temperature: last `recent_history` entry carrying one, else the flat
///   field, else the table value
/// - risk: `risk_level` when the field is present, else legacy `state`;
///   out-of-range codes resolve to unknown, never to Normal
///
/// `table_load_kw` and `table_temperature` are the values from the feeder
/// list row, backstopping payloads that omit the live fields.
pub fn resolve_feeder_detail(
    raw: &FeederStateDto,
    fallback_id: &str,
    table_load_kw: Option<f64>,
    table_temperature: Option<f64>,
) -> FeederDetail {
    let live_load_kw = raw.current_load_kw.or(raw.load_kw).or(table_load_kw);

    let threshold_kw = raw
        .threshold_kw
        .or_else(|| live_load_kw.map(|kw| (kw * 0.85).round()));
    let critical_threshold_kw = raw
        .critical_threshold_kw
        .or_else(|| live_load_kw.map(|kw| (kw * 0.95).round()));

    let history_temperature = raw
        .recent_history
        .as_ref()
        .and_then(|history| history.iter().rev().find_map(|reading| reading.temperature));
    let temperature = history_temperature.or(raw.temperature).or(table_temperature);

    let risk = raw
        .risk_level
        .or(raw.state)
        .and_then(RiskLevel::from_code);

    let feeder_id = raw
        .feeder_id
        .clone()
        .or_else(|| raw.id.clone())
        .unwrap_or_else(|| fallback_id.to_string());

    let history = match &raw.recent_history {
        Some(readings) => readings
            .iter()
            .map(|reading| LoadSample {
                timestamp: Some(reading.timestamp),
                load_kw: reading.load_kw,
                temperature: reading.temperature,
                risk: reading.risk_label.and_then(RiskLevel::from_code),
            })
            .collect(),
        None => raw
            .history_kw
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(|load_kw| LoadSample {
                timestamp: None,
                load_kw,
                temperature: None,
                risk: None,
            })
            .collect(),
    };

    let forecast_kw = match &raw.forecast_kw {
        Some(points) => points.clone(),
        None => raw.forecast_load_kw.into_iter().collect(),
    };

    FeederDetail {
        feeder_id,
        risk,
        live_load_kw,
        threshold_kw,
        critical_threshold_kw,
        temperature,
        forecast_kw,
        history,
        message: raw.message.clone(),
        timestamp: raw.timestamp,
    }
}

/// Fleet-level counts for the KPI strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FleetKpis {
    pub total: usize,
    pub warning: usize,
    pub critical: usize,
    pub unknown: usize,
}

pub fn fleet_kpis(feeders: &[FeederSummary]) -> FleetKpis {
    let mut kpis = FleetKpis {
        total: feeders.len(),
        ..Default::default()
    };
    for feeder in feeders {
        match feeder.risk() {
            Some(RiskLevel::Normal) => {}
            Some(RiskLevel::Warning) => kpis.warning += 1,
            Some(RiskLevel::Critical) => kpis.critical += 1,
            None => kpis.unknown += 1,
        }
    }
    kpis
}

#[cfg(test)]
mod tests {
    use api_types::FeederReading;
    use similar_asserts::assert_eq;

    use super::*;

    fn legacy_dto() -> FeederStateDto {
        FeederStateDto {
            id: Some("F2".into()),
            state: Some(1),
            load_kw: Some(230.0),
            threshold_kw: Some(200.0),
            forecast_kw: Some(vec![210.0, 220.0, 230.0]),
            ..Default::default()
        }
    }

    fn reading(load_kw: f64, temperature: Option<f64>) -> FeederReading {
        FeederReading {
            timestamp: "2026-03-01T08:00:00Z".parse().expect("timestamp"),
            load_kw,
            temperature,
            is_workday: Some(true),
            risk_label: Some(1),
        }
    }

    #[test]
    fn legacy_shape_resolves_exactly() {
        let detail = resolve_feeder_detail(&legacy_dto(), "F2", None, None);

        assert_eq!(detail.feeder_id, "F2");
        assert_eq!(detail.risk, Some(RiskLevel::Warning), "risk equals legacy state");
        assert_eq!(detail.live_load_kw, Some(230.0));
        assert_eq!(
            detail.threshold_kw,
            Some(200.0),
            "an explicit threshold is never re-derived"
        );
        assert_eq!(detail.forecast_kw, vec![210.0, 220.0, 230.0]);
    }

    #[test]
    fn ai_shape_derives_thresholds_from_live_load() {
        let raw = FeederStateDto {
            feeder_id: Some("F7".into()),
            risk_level: Some(2),
            current_load_kw: Some(200.0),
            ..Default::default()
        };

        let detail = resolve_feeder_detail(&raw, "F7", None, None);
        assert_eq!(detail.risk, Some(RiskLevel::Critical));
        assert_eq!(detail.threshold_kw, Some(170.0), "round(200 × 0.85)");
        assert_eq!(detail.critical_threshold_kw, Some(190.0), "round(200 × 0.95)");
    }

    #[test]
    fn derived_thresholds_for_live_load_120() {
        let raw = FeederStateDto {
            current_load_kw: Some(120.0),
            ..Default::default()
        };

        let detail = resolve_feeder_detail(&raw, "F1", None, None);
        assert_eq!(detail.threshold_kw, Some(102.0));
        assert_eq!(detail.critical_threshold_kw, Some(114.0));
    }

    #[test]
    fn live_load_falls_back_to_table_value() {
        let raw = FeederStateDto::default();

        let detail = resolve_feeder_detail(&raw, "F3", Some(88.0), None);
        assert_eq!(detail.live_load_kw, Some(88.0));
        assert_eq!(detail.threshold_kw, Some((88.0_f64 * 0.85).round()));

        let empty = resolve_feeder_detail(&raw, "F3", None, None);
        assert_eq!(empty.live_load_kw, None);
        assert_eq!(empty.threshold_kw, None, "no load means no derived threshold");
        assert_eq!(empty.estimated_relief_kw(), 0.0);
    }

    #[test]
    fn current_load_wins_over_legacy_load() {
        let raw = FeederStateDto {
            current_load_kw: Some(310.0),
            load_kw: Some(120.0),
            ..Default::default()
        };

        let detail = resolve_feeder_detail(&raw, "F4", Some(50.0), None);
        assert_eq!(detail.live_load_kw, Some(310.0));
    }

    #[test]
    fn estimated_relief_matches_the_drawer_rules() {
        let mut detail = resolve_feeder_detail(&FeederStateDto::default(), "F1", None, None);
        detail.live_load_kw = Some(100.0);
        detail.threshold_kw = Some(90.0);
        assert_eq!(detail.estimated_relief_kw(), 10.0);
        assert!(detail.is_over_threshold());

        detail.live_load_kw = Some(80.0);
        assert_eq!(detail.estimated_relief_kw(), 0.0, "no relief below threshold");
        assert!(!detail.is_over_threshold());
    }

    #[test]
    fn temperature_prefers_the_latest_history_reading() {
        let raw = FeederStateDto {
            temperature: Some(18.0),
            recent_history: Some(vec![
                reading(100.0, Some(21.0)),
                reading(101.0, None),
                reading(102.0, Some(24.5)),
                reading(103.0, None),
            ]),
            ..Default::default()
        };

        let detail = resolve_feeder_detail(&raw, "F5", None, Some(10.0));
        assert_eq!(
            detail.temperature,
            Some(24.5),
            "the last history entry carrying a temperature wins"
        );

        let flat_only = FeederStateDto {
            temperature: Some(18.0),
            ..Default::default()
        };
        let detail = resolve_feeder_detail(&flat_only, "F5", None, Some(10.0));
        assert_eq!(detail.temperature, Some(18.0));

        let table_only = resolve_feeder_detail(&FeederStateDto::default(), "F5", None, Some(10.0));
        assert_eq!(table_only.temperature, Some(10.0));

        let nothing = resolve_feeder_detail(&FeederStateDto::default(), "F5", None, None);
        assert_eq!(nothing.temperature, None);
    }

    #[test]
    fn out_of_range_risk_codes_resolve_to_unknown() {
        let raw = FeederStateDto {
            risk_level: Some(7),
            state: Some(1),
            ..Default::default()
        };

        let detail = resolve_feeder_detail(&raw, "F6", None, None);
        assert_eq!(
            detail.risk, None,
            "a present but invalid risk_level is unknown, it does not fall through to state"
        );

        let legacy_only = FeederStateDto {
            state: Some(2),
            ..Default::default()
        };
        let detail = resolve_feeder_detail(&legacy_only, "F6", None, None);
        assert_eq!(detail.risk, Some(RiskLevel::Critical));

        let silent = resolve_feeder_detail(&FeederStateDto::default(), "F6", None, None);
        assert_eq!(silent.risk, None, "no risk field at all is unknown");
    }

    #[test]
    fn history_merges_from_either_shape() {
        let ai = FeederStateDto {
            recent_history: Some(vec![reading(100.0, Some(20.0))]),
            history_kw: Some(vec![1.0, 2.0]),
            ..Default::default()
        };
        let detail = resolve_feeder_detail(&ai, "F8", None, None);
        assert_eq!(detail.history.len(), 1, "recent_history wins when both exist");
        assert_eq!(detail.history[0].risk, Some(RiskLevel::Warning));
        assert!(detail.history[0].timestamp.is_some());

        let legacy = FeederStateDto {
            history_kw: Some(vec![95.0, 97.5]),
            ..Default::default()
        };
        let detail = resolve_feeder_detail(&legacy, "F8", None, None);
        assert_eq!(detail.history.len(), 2);
        assert_eq!(detail.history[1].load_kw, 97.5);
        assert_eq!(detail.history[1].timestamp, None);
    }

    #[test]
    fn forecast_scalar_becomes_a_single_point() {
        let raw = FeederStateDto {
            forecast_load_kw: Some(430.0),
            ..Default::default()
        };
        let detail = resolve_feeder_detail(&raw, "F9", None, None);
        assert_eq!(detail.forecast_kw, vec![430.0]);
    }

    #[test]
    fn fleet_kpis_count_by_validated_risk() {
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
                temperature: None,
            },
            FeederSummary {
                id: "F3".into(),
                name: "Feeder 3".into(),
                state: 2,
                load_kw: 310.0,
                temperature: None,
            },
            FeederSummary {
                id: "F4".into(),
                name: "Feeder 4".into(),
                state: 9,
                load_kw: 50.0,
                temperature: None,
            },
        ];

        let kpis = fleet_kpis(&feeders);
        assert_eq!(kpis.total, 4);
        assert_eq!(kpis.warning, 1);
        assert_eq!(kpis.critical, 1);
        assert_eq!(kpis.unknown, 1, "out-of-range codes count as unknown, not normal");
    }
}
