// Response Extraction
// Recovers a JSON value from noisy model output (code fences, surrounding prose)

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("no JSON object found in response")]
    NoJsonObject,
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Extract a JSON value from raw agent output.
///
/// Directly-parseable text is returned as-is. Otherwise code-fence markers are
/// stripped, surrounding backticks and whitespace trimmed, and the greedy
/// first-`{`-to-last-`}` block parsed.
pub fn extract_json(raw: &str) -> Result<Value, ExtractionError> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Ok(value);
    }

    let fence_re = Regex::new(r"```[a-zA-Z]*").unwrap();
    let stripped = fence_re.replace_all(raw, "");
    let stripped = stripped.trim_matches(|c: char| c == ' ' || c == '\n' || c == '`');

    let block_re = Regex::new(r"(?s)\{.*\}").unwrap();
    match block_re.find(stripped) {
        Some(m) => Ok(serde_json::from_str(m.as_str())?),
        None => Err(ExtractionError::NoJsonObject),
    }
}
