use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{PreprocessError, Result};

/// Locate the file named by an `!include` reference
///
/// The whole reference is tried under every root in order. If nothing
/// exists, the leading path component is dropped and the shorter suffix is
/// tried again, until no components remain.
pub fn resolve(reference: &str, roots: &[PathBuf]) -> Result<PathBuf> {
    let parts: Vec<Component> = Path::new(reference)
        .components()
        .filter(|c| *c != Component::CurDir)
        .collect();

    for start in 0..parts.len() {
        let suffix: PathBuf = parts[start..].iter().collect();
        for root in roots {
            let candidate = root.join(&suffix);
            if candidate.exists() {
                debug!(reference, path = %candidate.display(), "resolved include");
                return Ok(candidate);
            }
        }
    }

    Err(PreprocessError::IncludeResolution {
        reference: reference.to_string(),
        roots: roots.to_vec(),
    })
}
