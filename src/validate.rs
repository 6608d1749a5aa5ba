//! Input validation shared by the server layer and the dispatch submit path.

/// Prompt length cap in bytes. Guards the request body we build, not vendor
/// policy (vendors enforce their own, lower limits).
pub const MAX_PROMPT_BYTES: usize = 8 * 1024;

/// Aspect ratio applied to image jobs when the caller omits one.
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";

/// Validate a prompt: non-empty after trimming, within the byte cap.
pub fn validate_prompt(prompt: &str) -> Result<(), String> {
    if prompt.trim().is_empty() {
        return Err("prompt must not be empty".to_string());
    }
    if prompt.len() > MAX_PROMPT_BYTES {
        return Err(format!("prompt exceeds {MAX_PROMPT_BYTES} bytes"));
    }
    Ok(())
}

/// Validate an aspect ratio of the form "W:H" (e.g. "16:9", "9:21").
pub fn validate_aspect_ratio(ratio: &str) -> Result<(), String> {
    let ok = ratio
        .split_once(':')
        .is_some_and(|(w, h)| is_ratio_term(w) && is_ratio_term(h));
    if ok {
        Ok(())
    } else {
        Err(format!(
            "invalid aspect ratio: {ratio} (expected W:H, e.g. 16:9)"
        ))
    }
}

/// A ratio term is 1-3 ASCII digits with a nonzero value.
fn is_ratio_term(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 3
        && s.chars().all(|c| c.is_ascii_digit())
        && s.parse::<u32>().is_ok_and(|n| n > 0)
}
