// rumorAI Data Models
// Migrated from Python backend schemas

use serde::{Deserialize, Serialize};

// ============ Classifier ============

/// Output of the local binary rumor classifier.
///
/// `probability` is the calibrated softmax probability of the rumor class;
/// `label` is 1 when that probability exceeds 0.5.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassifierOutput {
    pub label: u8,
    pub probability: f64,
}

impl ClassifierOutput {
    pub fn label_name(&self) -> &'static str {
        if self.label == 1 {
            "谣言"
        } else {
            "非谣言"
        }
    }

    /// Probability rounded to 3 decimals; both the verification prompt and the
    /// fusion rule consume the rounded value.
    pub fn rounded_probability(&self) -> f64 {
        (self.probability * 1000.0).round() / 1000.0
    }
}

// ============ Verification ============

/// Schema-valid payload recovered from the remote verification agent.
///
/// Invariant (enforced by validation): `sources_count == 0` implies
/// `top_match_rumor` is empty; `sources_count > 0` implies both `answer` and
/// `top_match_rumor` are non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub answer: String,
    pub sources_count: i64,
    pub top_match_rumor: String,
}

// ============ Verdict ============

/// Final fused result returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_rumor: bool,
    pub refutation: String,
    pub sources_count: i64,
    pub top_match_rumor: String,
}

// ============ Usage Statistics ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: String,
    pub count: u32,
}

/// Snapshot returned by the statistics read boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_detection_count: u64,
    pub history: Vec<HistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_name() {
        let rumor = ClassifierOutput { label: 1, probability: 0.9 };
        let clean = ClassifierOutput { label: 0, probability: 0.2 };
        assert_eq!(rumor.label_name(), "谣言");
        assert_eq!(clean.label_name(), "非谣言");
    }

    #[test]
    fn test_rounded_probability() {
        let out = ClassifierOutput { label: 1, probability: 0.500_4 };
        assert_eq!(out.rounded_probability(), 0.5);
        let out = ClassifierOutput { label: 1, probability: 0.500_6 };
        assert_eq!(out.rounded_probability(), 0.501);
    }

    #[test]
    fn test_verdict_wire_shape() {
        let verdict = Verdict {
            is_rumor: true,
            refutation: "X".to_string(),
            sources_count: 2,
            top_match_rumor: "Y".to_string(),
        };
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "is_rumor": true,
                "refutation": "X",
                "sources_count": 2,
                "top_match_rumor": "Y"
            })
        );
    }

    #[test]
    fn test_stats_snapshot_wire_shape() {
        let snapshot = StatsSnapshot {
            total_detection_count: 3,
            history: vec![HistoryEntry { date: "2026-08-07".to_string(), count: 3 }],
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["total_detection_count"], 3);
        assert_eq!(json["history"][0]["date"], "2026-08-07");
        assert_eq!(json["history"][0]["count"], 3);
    }
}
