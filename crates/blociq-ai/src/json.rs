//! Lenient JSON recovery for model output.

use serde_json::Value;

use crate::error::{Error, Result};

/// Parse `raw` as JSON, tolerating the usual model noise.
///
/// Tries, in order: the text as-is, the body of a fenced code block, and the
/// outermost `{ … }` span.
pub fn safe_json(raw: &str) -> Result<Value> {
  let trimmed = raw.trim();
  if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
    return Ok(v);
  }

  if let Some(inner) = fenced_block(trimmed)
    && let Ok(v) = serde_json::from_str::<Value>(inner)
  {
    return Ok(v);
  }

  if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
    && start < end
    && let Ok(v) = serde_json::from_str::<Value>(&trimmed[start..=end])
  {
    return Ok(v);
  }

  Err(Error::InvalidJson(trimmed.chars().take(120).collect()))
}

fn fenced_block(s: &str) -> Option<&str> {
  let open = s.find("```")?;
  let after = &s[open + 3..];
  // skip an optional language tag on the opening line
  let body_start = after.find('\n').map_or(0, |i| i + 1);
  let body = &after[body_start..];
  let close = body.find("```")?;
  Some(body[..close].trim())
}
