pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a translator. Translate the following text to English. \
     Output only the translated text without any explanations. \
     Preserve the original formatting including blank lines and whitespace.";

/// Builds the single query submitted to an on-device session.
///
/// On-device engines take no separate system role, so the prompt and the
/// chunk are joined with a blank line.
pub fn build_on_device_query(system_prompt: &str, chunk: &str) -> String {
    format!("{system_prompt}\n\n{chunk}")
}
