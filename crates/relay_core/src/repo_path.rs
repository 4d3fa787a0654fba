use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepoPathError {
    #[error("path is empty")]
    Empty,
    #[error("absolute paths are not allowed")]
    Absolute,
    #[error("path traversal not allowed")]
    Traversal,
}

/// Validates a client-supplied file path inside a model repository.
///
/// Must be called before building any upstream URL: a rejected path never
/// reaches the network.
pub fn validate_repo_path(path: &str) -> Result<(), RepoPathError> {
    if path.is_empty() {
        return Err(RepoPathError::Empty);
    }
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(RepoPathError::Absolute);
    }
    if path.contains("..") {
        return Err(RepoPathError::Traversal);
    }
    Ok(())
}
