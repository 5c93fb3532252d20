//! Readiness gate over the three scores.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ReadinessThresholds {
    #[serde(alias = "scs_min")]
    pub scs_min: f64,
    #[serde(alias = "tci_min")]
    pub tci_min: f64,
    #[serde(alias = "mri_max")]
    pub mri_max: f64,
}

impl Default for ReadinessThresholds {
    fn default() -> Self {
        Self {
            scs_min: 0.8,
            tci_min: 0.7,
            mri_max: 0.4,
        }
    }
}

impl ReadinessThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("scs_min", self.scs_min),
            ("tci_min", self.tci_min),
            ("mri_max", self.mri_max),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThresholds(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "ELEMENTARY")]
    Elementary,
    #[serde(rename = "REQUIRES INVESTIGATION")]
    RequiresInvestigation,
    #[serde(rename = "YOU SHALL NOT PASS")]
    YouShallNotPass,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Elementary => "ELEMENTARY",
            Self::RequiresInvestigation => "REQUIRES INVESTIGATION",
            Self::YouShallNotPass => "YOU SHALL NOT PASS",
        }
    }

    pub fn from_failures(failed: usize) -> Self {
        match failed {
            0 => Self::Elementary,
            1 => Self::RequiresInvestigation,
            _ => Self::YouShallNotPass,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessGates {
    pub scs_pass: bool,
    pub tci_pass: bool,
    pub mri_pass: bool,
}

impl ReadinessGates {
    pub fn failures(&self) -> usize {
        [self.scs_pass, self.tci_pass, self.mri_pass]
            .iter()
            .filter(|pass| !**pass)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub ready: bool,
    pub scs: f64,
    pub tci: f64,
    pub mri: f64,
    pub verdict: Verdict,
    pub gates: ReadinessGates,
    pub thresholds: ReadinessThresholds,
}

pub fn evaluate_readiness(
    scs: f64,
    tci: f64,
    mri: f64,
    thresholds: &ReadinessThresholds,
) -> Readiness {
    let gates = ReadinessGates {
        scs_pass: scs >= thresholds.scs_min,
        tci_pass: tci >= thresholds.tci_min,
        mri_pass: mri <= thresholds.mri_max,
    };
    let failed = gates.failures();
    Readiness {
        ready: failed == 0,
        scs,
        tci,
        mri,
        verdict: Verdict::from_failures(failed),
        gates,
        thresholds: *thresholds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_truth_table() {
        let thresholds = ReadinessThresholds::default();
        for mask in 0u8..8 {
            let scs_pass = mask & 1 != 0;
            let tci_pass = mask & 2 != 0;
            let mri_pass = mask & 4 != 0;
            let readiness = evaluate_readiness(
                if scs_pass { 0.9 } else { 0.5 },
                if tci_pass { 0.8 } else { 0.3 },
                if mri_pass { 0.1 } else { 0.9 },
                &thresholds,
            );
            let failed = [scs_pass, tci_pass, mri_pass].iter().filter(|p| !**p).count();
            let expected = match failed {
                0 => Verdict::Elementary,
                1 => Verdict::RequiresInvestigation,
                _ => Verdict::YouShallNotPass,
            };
            assert_eq!(readiness.verdict, expected, "mask {mask:03b}");
            assert_eq!(readiness.ready, failed == 0, "mask {mask:03b}");
        }
    }

    #[test]
    fn boundaries_are_inclusive() {
        let readiness = evaluate_readiness(0.8, 0.7, 0.4, &ReadinessThresholds::default());
        assert!(readiness.ready);
        assert_eq!(readiness.verdict, Verdict::Elementary);
    }

    #[test]
    fn verdict_serializes_with_spaces() {
        let json = serde_json::to_value(Verdict::YouShallNotPass).unwrap();
        assert_eq!(json, serde_json::json!("YOU SHALL NOT PASS"));
    }

    #[test]
    fn thresholds_use_camel_case_on_the_wire() {
        let json = serde_json::to_value(ReadinessThresholds::default()).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 3);
        for key in ["scsMin", "tciMin", "mriMax"] {
            assert!(keys.contains(&key), "missing {key} in {json}");
        }

        let from_config: ReadinessThresholds =
            serde_json::from_value(serde_json::json!({"scs_min": 2.0, "tciMin": 0.5})).unwrap();
        assert_eq!(from_config.scs_min, 2.0);
        assert_eq!(from_config.tci_min, 0.5);
        assert_eq!(from_config.mri_max, ReadinessThresholds::default().mri_max);
    }

    #[test]
    fn thresholds_outside_unit_interval_are_rejected() {
        let thresholds = ReadinessThresholds {
            scs_min: 1.5,
            ..ReadinessThresholds::default()
        };
        assert!(thresholds.validate().is_err());
    }
}
