//! Video identifier resolution
//!
//! Accepts bare identifiers as well as the usual watch, short-link, shorts
//! and embed URLs, and reduces them to the bare identifier.

use crate::api::ApiError;
use url::Url;

const MAX_VIDEO_ID_LEN: usize = 64;

/// Returns true if `candidate` looks like a bare video identifier
pub fn is_video_id(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.len() <= MAX_VIDEO_ID_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Resolves a video identifier or video URL into its canonical identifier
///
/// # Example
///
/// ```
/// use comment_ripple::api::resolve_video_id;
///
/// let id = resolve_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").unwrap();
/// assert_eq!(id, "dQw4w9WgXcQ");
/// ```
pub fn resolve_video_id(input: &str) -> Result<String, ApiError> {
    let trimmed = input.trim();
    if is_video_id(trimmed) {
        return Ok(trimmed.to_string());
    }

    let url = Url::parse(trimmed)
        .or_else(|_| Url::parse(&format!("https://{}", trimmed)))
        .map_err(|_| ApiError::InvalidVideoId(input.to_string()))?;

    let host = url.host_str().unwrap_or_default();
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(host);

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let candidate = match host {
        "youtu.be" => segments.first().map(|id| id.to_string()),
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            match url.query_pairs().find(|(key, _)| key == "v") {
                Some((_, id)) => Some(id.into_owned()),
                None => match segments.as_slice() {
                    ["shorts" | "embed" | "live" | "v", id, ..] => Some(id.to_string()),
                    _ => None,
                },
            }
        }
        _ => None,
    };

    candidate
        .filter(|id| is_video_id(id))
        .ok_or_else(|| ApiError::InvalidVideoId(input.to_string()))
}
