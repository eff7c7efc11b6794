use std::path::{Component, Path};

use super::FetchError;

/// Normalizes an archive entry name into a safe relative path.
///
/// Rejects absolute paths, parent-directory components, and anything that
/// is not plain UTF-8; `.` components are dropped. The result always joins
/// with `/` regardless of platform.
pub(crate) fn sanitize(raw: &str) -> Result<String, FetchError> {
    let mut parts = Vec::new();
    for component in Path::new(raw).components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(part) => parts.push(part),
                None => {
                    return Err(FetchError::InvalidPath(format!(
                        "non-UTF-8 component in {raw:?}"
                    )))
                }
            },
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(FetchError::InvalidPath(format!(
                    "parent traversal in {raw:?}"
                )))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(FetchError::InvalidPath(format!(
                    "absolute path {raw:?}"
                )))
            }
        }
    }

    if parts.is_empty() {
        return Err(FetchError::InvalidPath(format!("empty path {raw:?}")));
    }
    Ok(parts.join("/"))
}
