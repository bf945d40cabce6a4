//! Raw message parsing for the protocol-based backend.
//!
//! Turns RFC822 bytes into body text the extractor can scan. Multipart
//! messages are walked depth-first: text/plain wins, text/html is the
//! fallback, anything else is ignored.

use crate::error::{Error, Result};
use mailparse::{parse_mail, ParsedMail};

/// Extracts body text from raw RFC822 message bytes.
pub(crate) fn body_text(raw: &[u8]) -> Result<String> {
    let parsed = parse_mail(raw).map_err(|source| Error::ParseEmail { source })?;

    if let Some(text) = find_part(&parsed, "text/plain")? {
        return Ok(text);
    }
    if let Some(html) = find_part(&parsed, "text/html")? {
        return Ok(html);
    }

    // Single-part message with an unexpected content type; take it as-is.
    parsed
        .get_body()
        .map_err(|source| Error::ExtractBody { source })
}

/// Depth-first search for the first part with the given mime type.
fn find_part(part: &ParsedMail<'_>, mimetype: &str) -> Result<Option<String>> {
    if part.subparts.is_empty() {
        if part.ctype.mimetype.eq_ignore_ascii_case(mimetype) {
            let body = part
                .get_body()
                .map_err(|source| Error::ExtractBody { source })?;
            return Ok(Some(body));
        }
        return Ok(None);
    }

    for subpart in &part.subparts {
        if let Some(body) = find_part(subpart, mimetype)? {
            return Ok(Some(body));
        }
    }

    Ok(None)
}
