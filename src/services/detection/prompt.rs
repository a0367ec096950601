// Verification Prompt Builder
// Formats the refutation-agent prompt embedding classifier evidence

use crate::models::ClassifierOutput;

/// Build the verification prompt sent to the remote refutation agent.
///
/// Pure and deterministic; embeds the classifier label and 3-decimal
/// confidence as auxiliary evidence and the user text untruncated.
pub fn build_verification_prompt(classifier: &ClassifierOutput, text: &str) -> String {
    format!(
        "你是辟谣专家，请根据以下规则和 JSON 格式输出：\n\
         规则：\n\
         1. 如果 sources_count 为 0，answer 可以是默认的提示信息，也可以为空，top_match_rumor 可以为空字符串 \"\"。\n\
         2. 如果 sources_count 大于 0，answer 应给出针对谣言的辟谣说明，top_match_rumor 应填写最相关的网页谣言内容。\n\
         3. 输出必须是 JSON 格式，不能有其他解释文字。\n\
         4. 若用户文本较长，务必确保文本传输完整，不可丢失内容。\n\
         示范输出格式：\n\
         {{\"answer\":\"辟谣说明内容\", \"sources_count\":1, \"top_match_rumor\":\"最相关谣言内容\"}}\n\
         请结合本地分类模型判断：{label}，置信度 {prob:.3}，\n\
         和用户文本（文本较长的情况下，确保完整处理）：\n\
         {text}\n\
         给出综合判断结果。",
        label = classifier.label_name(),
        prob = classifier.rounded_probability(),
        text = text,
    )
}
