/// External (OpenAI-style) model name -> upstream model name.
const MODEL_TABLE: &[(&str, &str)] = &[
    ("gpt-3.5-turbo", "gemini-2.5-flash"),
    ("gpt-4", "gemini-2.5-pro"),
    ("gpt-4-turbo", "gemini-2.5-flash"),
    ("gemini-2.5-flash", "gemini-2.5-flash"),
    ("gemini-2.5-pro", "gemini-2.5-pro"),
    ("gemini-2.0-flash", "gemini-2.0-flash"),
    ("gemini-2.0-flash-thinking", "gemini-2.0-flash-thinking"),
];

/// Resolves the upstream model for an external identifier.
///
/// Unknown names are assumed to already be upstream-native and pass through.
pub fn upstream_model(external: &str) -> &str {
    MODEL_TABLE
        .iter()
        .find(|(name, _)| *name == external)
        .map(|(_, upstream)| *upstream)
        .unwrap_or(external)
}
