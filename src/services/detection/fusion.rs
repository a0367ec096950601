// Verdict Fusion Pipeline
// Runs the local classifier and the remote verification agent, then fuses
// both signals into one schema-valid verdict.

use crate::models::Verdict;
use crate::services::classifier::Classifier;
use crate::services::providers::AgentClient;
use crate::services::stats::DetectionStats;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use super::extraction::{extract_json, ExtractionError};
use super::prompt::build_verification_prompt;
use super::validation::{normalize_response, validate_response, ValidationError};

/// Upstream failures absorbed by the pipeline. Each converts to a safe
/// default verdict at the point of detection; none escapes to the caller.
#[derive(Error, Debug)]
pub enum AnalysisFailure {
    #[error("对话创建失败，无法获取辟谣信息。")]
    ConversationCreation,
    #[error("模型返回异常，无法提供辟谣信息。")]
    ResponseAbsent,
    #[error("无法解析模型返回结果。")]
    Extraction(#[from] ExtractionError),
    #[error("模型返回结果格式错误: {0}")]
    Validation(#[from] ValidationError),
}

fn failure_verdict(request_id: Uuid, failure: AnalysisFailure) -> Verdict {
    match &failure {
        AnalysisFailure::Extraction(e) => {
            error!("[FUSION] {} JSON extraction failed: {}", request_id, e)
        }
        other => error!("[FUSION] {} {}", request_id, other),
    }

    Verdict {
        is_rumor: false,
        refutation: failure.to_string(),
        sources_count: 0,
        top_match_rumor: String::new(),
    }
}

/// Analyze one text end to end.
///
/// Classifier inference strictly precedes prompt construction, which precedes
/// the remote call, which precedes extraction/validation/fusion; the usage
/// tracker is updated exactly once, on the validated success path only.
/// Length-capping the input is the caller's responsibility.
pub async fn analyze(
    classifier: &dyn Classifier,
    agent: &dyn AgentClient,
    stats: &DetectionStats,
    text: &str,
) -> Verdict {
    let request_id = Uuid::new_v4();

    let output = classifier.predict(text);
    info!(
        "[FUSION] {} classifier label={} prob={:.3}",
        request_id,
        output.label_name(),
        output.rounded_probability()
    );

    let prompt = build_verification_prompt(&output, text);

    let Some(conversation_id) = agent.create_conversation().await else {
        return failure_verdict(request_id, AnalysisFailure::ConversationCreation);
    };

    let Some(reply) = agent.run(&conversation_id, &prompt).await else {
        return failure_verdict(request_id, AnalysisFailure::ResponseAbsent);
    };

    let mut data = match extract_json(&reply.answer) {
        Ok(value) => value,
        Err(e) => return failure_verdict(request_id, e.into()),
    };

    normalize_response(&mut data);

    let record = match validate_response(&data) {
        Ok(record) => record,
        Err(e) => return failure_verdict(request_id, e.into()),
    };

    // Either signal alone is enough to flag the text as a rumor.
    let is_rumor = output.rounded_probability() > 0.5 || record.sources_count > 0;

    stats.record_detection();
    info!(
        "[FUSION] {} verdict is_rumor={} sources_count={}",
        request_id, is_rumor, record.sources_count
    );

    Verdict {
        is_rumor,
        refutation: record.answer,
        sources_count: record.sources_count,
        top_match_rumor: record.top_match_rumor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClassifierOutput;
    use crate::services::providers::AgentAnswer;
    use async_trait::async_trait;

    struct FixedClassifier {
        label: u8,
        probability: f64,
    }

    impl Classifier for FixedClassifier {
        fn predict(&self, _text: &str) -> ClassifierOutput {
            ClassifierOutput {
                label: self.label,
                probability: self.probability,
            }
        }
    }

    struct FakeAgent {
        conversation_id: Option<&'static str>,
        reply: Option<String>,
    }

    impl FakeAgent {
        fn replying(reply: &str) -> Self {
            Self {
                conversation_id: Some("conv-1"),
                reply: Some(reply.to_string()),
            }
        }
    }

    #[async_trait]
    impl AgentClient for FakeAgent {
        async fn create_conversation(&self) -> Option<String> {
            self.conversation_id.map(str::to_string)
        }

        async fn run(&self, _conversation_id: &str, _prompt: &str) -> Option<AgentAnswer> {
            self.reply.clone().map(|answer| AgentAnswer { answer })
        }
    }

    fn low_classifier() -> FixedClassifier {
        FixedClassifier { label: 0, probability: 0.2 }
    }

    fn high_classifier() -> FixedClassifier {
        FixedClassifier { label: 1, probability: 0.9 }
    }

    #[tokio::test]
    async fn test_no_evidence_yields_non_rumor() {
        let agent =
            FakeAgent::replying(r#"{"answer":"no evidence found","sources_count":0,"top_match_rumor":""}"#);
        let stats = DetectionStats::new();

        let verdict = analyze(&low_classifier(), &agent, &stats, "text").await;
        assert_eq!(
            verdict,
            Verdict {
                is_rumor: false,
                refutation: "no evidence found".to_string(),
                sources_count: 0,
                top_match_rumor: String::new(),
            }
        );
        assert_eq!(stats.read_stats().total_detection_count, 1);
    }

    #[tokio::test]
    async fn test_creation_failure_discards_classifier_signal() {
        let agent = FakeAgent { conversation_id: None, reply: None };
        let stats = DetectionStats::new();

        let verdict = analyze(&high_classifier(), &agent, &stats, "text").await;
        assert!(!verdict.is_rumor);
        assert_eq!(verdict.sources_count, 0);
        assert_eq!(verdict.top_match_rumor, "");
        assert_eq!(verdict.refutation, "对话创建失败，无法获取辟谣信息。");
        assert_eq!(stats.read_stats().total_detection_count, 0);
    }

    #[tokio::test]
    async fn test_absent_response_degrades_safely() {
        let agent = FakeAgent { conversation_id: Some("conv-1"), reply: None };
        let stats = DetectionStats::new();

        let verdict = analyze(&high_classifier(), &agent, &stats, "text").await;
        assert!(!verdict.is_rumor);
        assert_eq!(verdict.refutation, "模型返回异常，无法提供辟谣信息。");
        assert_eq!(stats.read_stats().total_detection_count, 0);
    }

    #[tokio::test]
    async fn test_fenced_response_passes_end_to_end() {
        let agent = FakeAgent::replying(
            "```json\n{\"answer\":\"X\",\"sources_count\":2,\"top_match_rumor\":\"Y\"}\n```",
        );
        let stats = DetectionStats::new();

        let verdict = analyze(&low_classifier(), &agent, &stats, "text").await;
        assert_eq!(
            verdict,
            Verdict {
                is_rumor: true,
                refutation: "X".to_string(),
                sources_count: 2,
                top_match_rumor: "Y".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_missing_top_match_gets_placeholder() {
        let agent =
            FakeAgent::replying(r#"{"sources_count":1,"answer":"Z","top_match_rumor":""}"#);
        let stats = DetectionStats::new();

        let verdict = analyze(&low_classifier(), &agent, &stats, "text").await;
        assert!(verdict.is_rumor);
        assert_eq!(verdict.refutation, "Z");
        assert_eq!(verdict.top_match_rumor, crate::services::detection::TOP_MATCH_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_unparseable_response_degrades_safely() {
        let agent = FakeAgent::replying("抱歉，我无法给出结构化结果");
        let stats = DetectionStats::new();

        let verdict = analyze(&high_classifier(), &agent, &stats, "text").await;
        assert!(!verdict.is_rumor);
        assert_eq!(verdict.refutation, "无法解析模型返回结果。");
        assert_eq!(stats.read_stats().total_detection_count, 0);
    }

    #[tokio::test]
    async fn test_invalid_response_reports_rule() {
        let agent =
            FakeAgent::replying(r#"{"answer":"a","sources_count":-3,"top_match_rumor":""}"#);
        let stats = DetectionStats::new();

        let verdict = analyze(&low_classifier(), &agent, &stats, "text").await;
        assert!(!verdict.is_rumor);
        assert_eq!(
            verdict.refutation,
            "模型返回结果格式错误: 'sources_count' 必须是非负整数"
        );
        assert_eq!(stats.read_stats().total_detection_count, 0);
    }

    #[tokio::test]
    async fn test_fusion_is_disjunctive() {
        let zero_sources = r#"{"answer":"a","sources_count":0,"top_match_rumor":""}"#;
        let two_sources = r#"{"answer":"a","sources_count":2,"top_match_rumor":"b"}"#;
        let stats = DetectionStats::new();

        // probability > 0.5 flags regardless of sources
        let verdict =
            analyze(&high_classifier(), &FakeAgent::replying(zero_sources), &stats, "t").await;
        assert!(verdict.is_rumor);

        // sources > 0 flags regardless of probability
        let verdict =
            analyze(&low_classifier(), &FakeAgent::replying(two_sources), &stats, "t").await;
        assert!(verdict.is_rumor);

        // both weak: not a rumor
        let verdict =
            analyze(&low_classifier(), &FakeAgent::replying(zero_sources), &stats, "t").await;
        assert!(!verdict.is_rumor);

        // boundary: rounded probability exactly 0.5 does not flag
        let boundary = FixedClassifier { label: 0, probability: 0.5004 };
        let verdict =
            analyze(&boundary, &FakeAgent::replying(zero_sources), &stats, "t").await;
        assert!(!verdict.is_rumor);
    }

    #[tokio::test]
    async fn test_stats_updated_once_per_success() {
        let agent =
            FakeAgent::replying(r#"{"answer":"a","sources_count":0,"top_match_rumor":""}"#);
        let stats = DetectionStats::new();

        analyze(&low_classifier(), &agent, &stats, "t").await;
        analyze(&low_classifier(), &agent, &stats, "t").await;
        assert_eq!(stats.read_stats().total_detection_count, 2);
    }
}
