// Response Validation
// Schema and conditional-field checks on the extracted agent JSON

use crate::models::VerificationRecord;
use serde_json::Value;
use thiserror::Error;

/// Substituted when the agent claims sources but omits the matched rumor text.
pub const TOP_MATCH_PLACEHOLDER: &str = "最相关谣言内容未提供";

const REQUIRED_KEYS: [&str; 3] = ["answer", "sources_count", "top_match_rumor"];

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("返回结果不是字典格式")]
    NotAnObject,
    #[error("缺少必需字段：{0}")]
    MissingFields(String),
    #[error("'sources_count' 必须是非负整数")]
    InvalidSourcesCount,
    #[error("sources_count为0时，answer应为字符串")]
    AnswerNotString,
    #[error("sources_count为0时，top_match_rumor必须是空字符串")]
    TopMatchNotEmpty,
    #[error("sources_count大于0时，answer不能为空")]
    EmptyAnswer,
    #[error("sources_count大于0时，top_match_rumor不能为空")]
    EmptyTopMatch,
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Repair known agent omissions before validation.
///
/// Agents are observed to drop `top_match_rumor` when reporting sources; the
/// placeholder keeps such responses usable. With zero sources the field is
/// coerced to the empty string regardless of its original value.
pub fn normalize_response(data: &mut Value) {
    let Some(obj) = data.as_object_mut() else {
        return;
    };

    let sources_count = obj.get("sources_count").and_then(Value::as_i64).unwrap_or(0);
    let top_match_falsy = obj.get("top_match_rumor").map_or(true, is_falsy);

    if sources_count > 0 && top_match_falsy {
        obj.insert(
            "top_match_rumor".to_string(),
            Value::String(TOP_MATCH_PLACEHOLDER.to_string()),
        );
    }
    if sources_count == 0 {
        obj.insert("top_match_rumor".to_string(), Value::String(String::new()));
    }
}

/// Validate the extracted value and build the verification record.
///
/// Checks run in order and short-circuit on the first failure; the function
/// never panics, so callers can degrade gracefully on `Err`.
pub fn validate_response(value: &Value) -> Result<VerificationRecord, ValidationError> {
    let obj = value.as_object().ok_or(ValidationError::NotAnObject)?;

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .filter(|k| !obj.contains_key(**k))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing.join(", ")));
    }

    let sources_count = match obj["sources_count"].as_i64() {
        Some(n) if n >= 0 => n,
        _ => return Err(ValidationError::InvalidSourcesCount),
    };

    let answer = &obj["answer"];
    let top_match = &obj["top_match_rumor"];

    if sources_count == 0 {
        if !answer.is_string() {
            return Err(ValidationError::AnswerNotString);
        }
        if top_match.as_str() != Some("") {
            return Err(ValidationError::TopMatchNotEmpty);
        }
    } else {
        if is_falsy(answer) {
            return Err(ValidationError::EmptyAnswer);
        }
        if is_falsy(top_match) {
            return Err(ValidationError::EmptyTopMatch);
        }
    }

    Ok(VerificationRecord {
        answer: answer
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| answer.to_string()),
        sources_count,
        top_match_rumor: top_match
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| top_match.to_string()),
    })
}
