use crate::application::ports::ChatModelError;

/// Maps a provider failure to a typed error. The provider does not expose a
/// structured code on every path, so this also matches the known substrings
/// of its error payloads; all of that fragility lives in this one function.
pub fn classify_provider_error(status: Option<u16>, body: &str) -> ChatModelError {
    let lowered = body.to_lowercase();

    if status == Some(429) || body.contains("RESOURCE_EXHAUSTED") || lowered.contains("quota") {
        return ChatModelError::QuotaExhausted(summarize(body));
    }
    if status == Some(401) || body.contains("API_KEY_INVALID") || lowered.contains("api key") {
        return ChatModelError::InvalidApiKey(summarize(body));
    }
    if status == Some(403) || body.contains("PERMISSION_DENIED") || lowered.contains("permission") {
        return ChatModelError::PermissionDenied(summarize(body));
    }

    match status {
        Some(code) => ChatModelError::RequestFailed(format!("HTTP {}: {}", code, summarize(body))),
        None => ChatModelError::RequestFailed(summarize(body)),
    }
}

fn summarize(body: &str) -> String {
    const MAX: usize = 300;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(MAX).collect();
        format!("{}...", head)
    }
}
