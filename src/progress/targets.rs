use crate::records::ArtistTarget;
use crate::HarvestError;
use std::path::Path;

/// Reads the artists file: one target per line
pub fn load_targets(path: impl AsRef<Path>) -> crate::Result<Vec<ArtistTarget>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| HarvestError::Targets {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_targets(&content))
}

/// Parses targets, skipping blank lines and `#` comments
pub fn parse_targets(content: &str) -> Vec<ArtistTarget> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ArtistTarget::from)
        .collect()
}
