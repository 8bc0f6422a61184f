use crate::error::Error;
use crate::models::{CatalogRef, RefKind};

const CATALOG_HOST: &str = "open.spotify.com";

/// Classify a catalog URL as a single track or a playlist.
///
/// Accepted shapes (scheme optional):
/// - "https://open.spotify.com/track/<id>"
/// - "open.spotify.com/playlist/<id>?si=..."
/// - "https://open.spotify.com/intl-de/track/<id>"
pub fn classify(reference: &str) -> Result<CatalogRef, Error> {
    let invalid = || Error::InvalidReference(reference.to_string());

    let rest = reference.trim();
    let rest = rest
        .strip_prefix("https://")
        .or_else(|| rest.strip_prefix("http://"))
        .unwrap_or(rest);

    // Query strings and fragments carry share tracking only
    let rest = rest.split(['?', '#']).next().unwrap_or_default();

    let mut segments = rest.split('/');
    if segments.next() != Some(CATALOG_HOST) {
        return Err(invalid());
    }

    let mut segments: Vec<&str> = segments.collect();
    if segments.last() == Some(&"") {
        segments.pop();
    }
    if segments.first().is_some_and(|s| s.starts_with("intl-")) {
        segments.remove(0);
    }

    let [kind, id] = segments.as_slice() else {
        return Err(invalid());
    };

    let kind = match *kind {
        "track" => RefKind::Track,
        "playlist" => RefKind::Collection,
        _ => return Err(invalid()),
    };

    if !is_catalog_id(id) {
        return Err(invalid());
    }

    Ok(CatalogRef {
        kind,
        id: id.to_string(),
    })
}

fn is_catalog_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}
