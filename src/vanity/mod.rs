//! Vanity import module
//!
//! Maps a request path on the vanity domain to the package it names and the
//! repository that hosts it.

pub mod template;

pub use template::MetaTemplate;

use crate::config::VanityConfig;

/// Import path and remote repository of one requested package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// `{hostname}/{package}`
    pub import_path: String,
    pub vcs: String,
    /// `{repo_url}/{organization}/{package}`
    pub remote: String,
}

impl PackageDescriptor {
    /// Build the descriptor for the package containing `path`
    pub fn for_path(path: &str, vanity: &VanityConfig) -> Self {
        let package = package_name(path);
        Self {
            import_path: format!("{}/{package}", vanity.hostname),
            vcs: vanity.vcs.clone(),
            remote: format!("{}/{}/{package}", vanity.repo_url, vanity.organization),
        }
    }
}

/// First segment of the slash-trimmed path
///
/// `/foo/cmd/bar` names package `foo`; an empty path names the empty package.
pub fn package_name(path: &str) -> &str {
    path.trim_matches('/').split('/').next().unwrap_or_default()
}
