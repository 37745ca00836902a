//! Module URL to local path resolution.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{EngineError, Result};

/// Schemes stripped before filesystem resolution.
const STRIPPED_SCHEMES: &[&str] = &["file://", "wasm://"];

/// One ordered `find -> replace` prefix rewrite.
///
/// Substitutions rewrite module URLs that have no recognized scheme, e.g.
/// mapping a build server's source root onto a local checkout. Rules are
/// applied in the order they were configured and several rules may fire on
/// the same URL, each seeing the previous rule's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSubstitution
{
    /// Prefix to look for
    pub find: String,
    /// Replacement for the matched prefix
    pub replace: String,
}

impl PathSubstitution
{
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self
    {
        PathSubstitution {
            find: find.into(),
            replace: replace.into(),
        }
    }

    /// Parse a `find=replace` pair as passed on a command line.
    pub fn parse(pair: &str) -> Result<Self>
    {
        let Some((find, replace)) = pair.split_once('=') else {
            return Err(EngineError::Unsupported(format!(
                "malformed path substitution '{pair}', expected 'find=replace'"
            )));
        };
        if find.is_empty() {
            return Err(EngineError::Unsupported(format!(
                "malformed path substitution '{pair}', empty find prefix"
            )));
        }
        Ok(PathSubstitution::new(find, replace))
    }

    fn apply(&self, url: &str) -> Option<String>
    {
        url.strip_prefix(self.find.as_str())
            .map(|rest| format!("{}{}", self.replace, rest))
    }
}

/// Resolves module and symbol URLs to local filesystem paths.
///
/// `file://` and `wasm://` prefixes are stripped and the remainder, if
/// relative, is resolved against the configured base directory. URLs without
/// a recognized scheme run through the ordered substitution list instead.
#[derive(Debug, Clone, Default)]
pub struct UrlResolver
{
    base_dir: Option<PathBuf>,
    substitutions: Vec<PathSubstitution>,
}

impl UrlResolver
{
    pub fn new() -> Self
    {
        UrlResolver::default()
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self
    {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn with_substitutions(mut self, substitutions: Vec<PathSubstitution>) -> Self
    {
        self.substitutions = substitutions;
        self
    }

    pub fn push_substitution(&mut self, substitution: PathSubstitution)
    {
        self.substitutions.push(substitution);
    }

    /// Resolve a module URL to a local path.
    pub fn resolve(&self, url: &str) -> PathBuf
    {
        for scheme in STRIPPED_SCHEMES {
            if let Some(rest) = url.strip_prefix(scheme) {
                let path = Path::new(rest);
                if path.is_relative() {
                    if let Some(base) = &self.base_dir {
                        return base.join(rest);
                    }
                }
                return PathBuf::from(rest);
            }
        }

        let mut rewritten = url.to_string();
        for substitution in &self.substitutions {
            if let Some(next) = substitution.apply(&rewritten) {
                debug!(from = %rewritten, to = %next, "applied path substitution");
                rewritten = next;
            }
        }
        PathBuf::from(rewritten)
    }

    /// Resolve a symbol-file URL, falling back to the module's own directory
    /// for relative remainders.
    pub fn resolve_symbols(&self, url: &str, module_path: &Path) -> PathBuf
    {
        for scheme in STRIPPED_SCHEMES {
            if let Some(rest) = url.strip_prefix(scheme) {
                let path = Path::new(rest);
                if path.is_relative() {
                    if let Some(dir) = module_path.parent() {
                        return dir.join(rest);
                    }
                }
                return PathBuf::from(rest);
            }
        }
        self.resolve(url)
    }
}
