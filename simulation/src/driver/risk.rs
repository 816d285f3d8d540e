//! V2X risk-classification engine.
//!
//! Target speed is a direct function of the last classification received.
//! There is no history: a new report replaces the old one outright.

use std::str::FromStr;

use bevy_ecs::prelude::*;
use serde::Serialize;

use crate::{hud::labels, Alert, Severity, SimulationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Safe,
    Medium,
    High,
    Critical,
}

impl FromStr for RiskLevel {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SAFE" => Ok(RiskLevel::Safe),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            "CRITICAL" => Ok(RiskLevel::Critical),
            _ => Err(SimulationError::InvalidRiskTag(s.to_string())),
        }
    }
}

/// What a risk level commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskTier {
    pub target_speed: f32,
    pub label: &'static str,
    pub severity: Severity,
    /// Heading of the alert raised for this tier, if any
    pub alert: Option<&'static str>,
}

impl RiskLevel {
    pub fn tier(self) -> RiskTier {
        match self {
            RiskLevel::Safe => RiskTier {
                target_speed: 45.0,
                label: labels::CRUISE,
                severity: Severity::Nominal,
                alert: None,
            },
            RiskLevel::Medium => RiskTier {
                target_speed: 30.0,
                label: labels::V2X_CAUTION,
                severity: Severity::Caution,
                alert: None,
            },
            RiskLevel::High => RiskTier {
                target_speed: 12.0,
                label: labels::V2X_HAZARD,
                severity: Severity::Critical,
                alert: Some("V2X HAZARD WARNING"),
            },
            RiskLevel::Critical => RiskTier {
                target_speed: 0.0,
                label: labels::V2X_CRITICAL,
                severity: Severity::Critical,
                alert: Some("V2X CRITICAL RISK"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskReport {
    pub level: RiskLevel,
    pub event: String,
}

impl RiskReport {
    pub fn alert(&self) -> Option<Alert> {
        let tier = self.level.tier();
        tier.alert
            .map(|title| Alert::new(title, self.event.clone(), tier.severity))
    }
}

/// Latest externally pushed classification. Written between ticks and read
/// by the next one.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskFeed {
    latest: Option<RiskReport>,
}

impl RiskFeed {
    /// Validates the tag and replaces the current report.
    pub fn push(&mut self, risk: &str, event: impl Into<String>) -> Result<RiskLevel, SimulationError> {
        let level = risk.parse::<RiskLevel>()?;
        self.latest = Some(RiskReport {
            level,
            event: event.into(),
        });
        Ok(level)
    }

    pub fn latest(&self) -> Option<&RiskReport> {
        self.latest.as_ref()
    }

    /// Level in force; nothing received yet reads as safe.
    pub fn level(&self) -> RiskLevel {
        self.latest
            .as_ref()
            .map(|report| report.level)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_map_to_fixed_speeds() {
        let speeds: Vec<f32> = [
            RiskLevel::Safe,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Critical,
        ]
        .into_iter()
        .map(|level| level.tier().target_speed)
        .collect();
        assert_eq!(speeds, vec![45.0, 30.0, 12.0, 0.0]);
    }

    #[test]
    fn unknown_tag_is_rejected_and_keeps_last_report() {
        let mut feed = RiskFeed::default();
        feed.push("HIGH", "debris on lane").unwrap();

        let err = feed.push("SEVERE", "typo").unwrap_err();
        assert_eq!(err, SimulationError::InvalidRiskTag("SEVERE".to_string()));
        assert_eq!(feed.level(), RiskLevel::High);
        assert_eq!(feed.latest().unwrap().event, "debris on lane");
    }

    #[test]
    fn tags_are_case_insensitive() {
        assert_eq!("critical".parse(), Ok(RiskLevel::Critical));
        assert_eq!(" Medium ".parse(), Ok(RiskLevel::Medium));
    }

    #[test]
    fn only_high_and_critical_alert() {
        let report = |level| RiskReport {
            level,
            event: "wrong-way driver".to_string(),
        };
        assert!(report(RiskLevel::Safe).alert().is_none());
        assert!(report(RiskLevel::Medium).alert().is_none());
        let alert = report(RiskLevel::Critical).alert().unwrap();
        assert_eq!(alert.description, "wrong-way driver");
        assert_eq!(alert.severity, Severity::Critical);
    }

    #[test]
    fn empty_feed_is_safe() {
        assert_eq!(RiskFeed::default().level(), RiskLevel::Safe);
    }
}
