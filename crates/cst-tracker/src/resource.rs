// resource.rs — Resolving the commit a run was built from.
//
// A run is reportable when exactly one of its inline resources is a git
// resource with both `url` and `revision` params. The URL must have an
// `host/org/repo` layout; deeper paths (e.g. GitLab subgroups) are not
// supported.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ResolveError;
use crate::run::{PipelineResourceSpec, ResourceType};

const PARAM_URL: &str = "url";
const PARAM_REVISION: &str = "revision";

/// The repository and ref a run refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub repo_url: String,
    pub git_ref: String,
}

impl Commit {
    /// The `org/repo` identifier of the commit's repository.
    pub fn repo(&self) -> Result<String, ResolveError> {
        extract_repo(&self.repo_url)
    }
}

/// Find the single git resource among `specs` and read its commit.
pub fn find_commit<'a>(
    specs: impl IntoIterator<Item = &'a PipelineResourceSpec>,
) -> Result<Commit, ResolveError> {
    let mut gits = specs
        .into_iter()
        .filter(|s| s.resource_type == ResourceType::Git);

    let found = gits.next().ok_or(ResolveError::NoGitResource)?;
    if gits.next().is_some() {
        return Err(ResolveError::MultipleGitResources);
    }

    let repo_url = found
        .param(PARAM_URL)
        .ok_or_else(|| ResolveError::MissingParam(PARAM_URL.to_string()))?;
    let git_ref = found
        .param(PARAM_REVISION)
        .ok_or_else(|| ResolveError::MissingParam(PARAM_REVISION.to_string()))?;

    Ok(Commit {
        repo_url: repo_url.to_string(),
        git_ref: git_ref.to_string(),
    })
}

/// Normalise a repository URL into `org/repo`, dropping a `.git` suffix.
pub fn extract_repo(raw: &str) -> Result<String, ResolveError> {
    let invalid = |reason: String| ResolveError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    check_escapes(raw).map_err(invalid)?;
    let parsed = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if parsed.cannot_be_a_base() {
        return Err(ResolveError::UnresolvableRepo(raw.to_string()));
    }

    // Split the decoded path, so an encoded `/` counts as a separator.
    let decoded = urlencoding::decode(parsed.path()).map_err(|e| invalid(e.to_string()))?;
    let path: &str = &decoded;
    let segments: Vec<&str> = path.strip_prefix('/').unwrap_or(path).split('/').collect();

    match segments.as_slice() {
        [org, repo] => {
            let repo = repo.strip_suffix(".git").unwrap_or(*repo);
            if org.is_empty() || repo.is_empty() {
                return Err(ResolveError::UnresolvableRepo(raw.to_string()));
            }
            Ok(format!("{}/{}", org, repo))
        }
        _ => Err(ResolveError::UnresolvableRepo(raw.to_string())),
    }
}

/// Reject malformed percent-escapes, and any escape in the host.
///
/// The URL parser decodes escapes in hosts (`192.168.0.%31` becomes
/// `192.168.0.1`) and passes bad escapes in paths through untouched; both
/// indicate a mangled repository URL rather than something to guess at.
/// Well-formed escapes in userinfo (`user:p%40ss@host`) are fine.
fn check_escapes(raw: &str) -> Result<(), String> {
    let host = raw.find("://").map(|scheme_end| {
        let start = scheme_end + 3;
        let end = raw[start..]
            .find(['/', '?', '#'])
            .map_or(raw.len(), |i| start + i);
        let host_start = raw[start..end].rfind('@').map_or(start, |i| start + i + 1);
        host_start..end
    });

    let bytes = raw.as_bytes();
    for (i, _) in raw.match_indices('%') {
        let escape = bytes.get(i..i + 3).unwrap_or(&bytes[i..]);
        let escape_str = String::from_utf8_lossy(escape);
        if host.as_ref().is_some_and(|h| h.contains(&i)) {
            return Err(format!("invalid URL escape \"{}\" in host", escape_str));
        }
        let valid = escape.len() == 3
            && escape[1].is_ascii_hexdigit()
            && escape[2].is_ascii_hexdigit();
        if !valid {
            return Err(format!("invalid URL escape \"{}\"", escape_str));
        }
    }
    Ok(())
}
