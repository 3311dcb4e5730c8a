// src/extract/validate.rs

use anyhow::{Context, Result};
use pulldown_cmark::Parser;
use tracing::debug;

/// Decode an uploaded document and walk it through the Markdown parser once,
/// ahead of table extraction. Plain text always parses, so the walk is a
/// structural pass over the event stream; the practical failure mode is an
/// upload that is not valid UTF-8. Kept separate from the scanner so the
/// extraction path itself stays total.
pub fn validate_markdown(bytes: &[u8]) -> Result<&str> {
    let text = std::str::from_utf8(bytes).context("document is not valid UTF-8")?;
    let events = Parser::new(text).count();
    debug!(events, "markdown pre-check walked document");
    Ok(text)
}
