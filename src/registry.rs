//! Extension registry.
//!
//! Maps lowercase file extensions to the language tag written after the
//! opening code fence. The registry is parsed from a single line of
//! comma-separated rules:
//!
//! ```text
//! *.py(python),*.rs(rust),*.md(markdown)
//! ```

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// Name of the registry file looked up next to the executable.
pub const REGISTRY_FILE_NAME: &str = "searching_files.txt";

static BUILTIN: Lazy<ExtensionRegistry> = Lazy::new(|| {
    [
        ("py", "python"),
        ("rs", "rust"),
        ("toml", "toml"),
        ("md", "markdown"),
        ("txt", "text"),
        ("c", "c"),
        ("h", "c"),
        ("cpp", "cpp"),
        ("hpp", "cpp"),
        ("go", "go"),
        ("java", "java"),
        ("js", "javascript"),
        ("ts", "typescript"),
        ("json", "json"),
        ("yaml", "yaml"),
        ("yml", "yaml"),
        ("sh", "bash"),
    ]
    .into_iter()
    .map(|(ext, tag)| ExtensionRule {
        pattern: format!("*.{ext}"),
        tag: tag.to_string(),
    })
    .collect()
});

/// A single `*.ext(tag)` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRule {
    /// Pattern as written, always starting with `*.`
    pub pattern: String,

    /// Language tag used verbatim in the output
    pub tag: String,
}

impl ExtensionRule {
    /// Parses one trimmed rule entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigFormat`] when the entry is missing the leading
    /// `*.`, either parenthesis, or has an empty extension or tag.
    pub fn parse(entry: &str) -> Result<Self> {
        let entry = entry.trim();

        let rest = entry
            .strip_prefix("*.")
            .ok_or_else(|| Error::config_format(entry, "missing leading '*.'"))?;

        let open = rest
            .find('(')
            .ok_or_else(|| Error::config_format(entry, "missing '('"))?;

        let body = rest[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| Error::config_format(entry, "missing closing ')'"))?;

        let ext = rest[..open].trim();
        let tag = body.trim();

        if ext.is_empty() {
            return Err(Error::config_format(entry, "empty extension"));
        }
        if tag.is_empty() {
            return Err(Error::config_format(entry, "empty tag"));
        }
        if ext.contains(')') {
            return Err(Error::config_format(entry, "extension contains ')'"));
        }
        if tag.contains(['(', ')']) {
            return Err(Error::config_format(entry, "tag contains a parenthesis"));
        }

        Ok(Self {
            pattern: format!("*.{ext}"),
            tag: tag.to_string(),
        })
    }

    /// Returns the extension part of the pattern (after `*.`).
    #[must_use]
    pub fn extension(&self) -> &str {
        self.pattern.strip_prefix("*.").unwrap_or(&self.pattern)
    }
}

impl fmt::Display for ExtensionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.pattern, self.tag)
    }
}

/// Lookup table from lowercase extension to language tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionRegistry {
    tags: BTreeMap<String, String>,
}

impl ExtensionRegistry {
    /// Parses a registry from configuration text.
    ///
    /// Entries are separated by commas and trimmed; blank segments (a
    /// trailing comma or newline) are ignored. When an extension appears
    /// more than once the last rule wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigFormat`] for the first malformed entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use proj2md::ExtensionRegistry;
    ///
    /// let registry = ExtensionRegistry::parse("*.py(python), *.MD(markdown)").unwrap();
    /// assert_eq!(registry.tag_for_extension("md"), Some("markdown"));
    /// assert_eq!(registry.tag_for_extension("PY"), Some("python"));
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let mut registry = Self::default();

        for entry in text.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let rule = ExtensionRule::parse(entry)?;
            registry.insert(rule);
        }

        debug!("Parsed extension registry with {} entries", registry.len());
        Ok(registry)
    }

    /// Reads and parses a registry file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::ConfigFormat`] if it is malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, &e))?;
        debug!("Loading extension registry from {}", path.display());
        Self::parse(&text)
    }

    /// Loads the registry a run should use.
    ///
    /// An explicit file is always read and a failure is returned. Otherwise
    /// [`REGISTRY_FILE_NAME`] inside `exe_dir` is read when it exists, and
    /// the built-in registry is used when it does not.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if a chosen file cannot be read and
    /// [`Error::ConfigFormat`] if it is malformed.
    pub fn resolve(explicit: Option<&Path>, exe_dir: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let colocated = exe_dir.map(|dir| dir.join(REGISTRY_FILE_NAME));
        match colocated {
            Some(path) if path.is_file() => Self::from_file(&path),
            Some(path) => {
                warn!(
                    "No {} found at '{}'; using built-in extension registry",
                    REGISTRY_FILE_NAME,
                    path.display()
                );
                Ok(Self::builtin())
            }
            None => {
                warn!("Executable directory unknown; using built-in extension registry");
                Ok(Self::builtin())
            }
        }
    }

    /// Returns the built-in registry used when no registry file is present.
    #[must_use]
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Inserts a rule, replacing any existing rule for the same extension.
    pub fn insert(&mut self, rule: ExtensionRule) {
        let key = rule.extension().to_lowercase();

        if key.contains('.') {
            warn!(
                "Rule '{}' has a dotted extension; only the text after the last '.' of a file name is matched",
                rule
            );
        }

        if let Some(previous) = self.tags.insert(key, rule.tag.clone()) {
            if previous != rule.tag {
                debug!("Rule '{}' overrides earlier tag '{}'", rule, previous);
            }
        }
    }

    /// Looks up the tag for an extension, ignoring case.
    #[must_use]
    pub fn tag_for_extension(&self, extension: &str) -> Option<&str> {
        self.tags
            .get(&extension.to_lowercase())
            .map(String::as_str)
    }

    /// Looks up the tag for a path by its extension.
    ///
    /// Names without a `.` after the first character (`Makefile`,
    /// `.gitignore`) have no extension and never match.
    #[must_use]
    pub fn tag_for_path(&self, path: &Path) -> Option<&str> {
        let ext = path.extension()?.to_string_lossy();
        self.tag_for_extension(&ext)
    }

    /// Number of distinct extensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns true if no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterates `(extension, tag)` pairs in extension order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromStr for ExtensionRegistry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl FromIterator<ExtensionRule> for ExtensionRegistry {
    fn from_iter<I: IntoIterator<Item = ExtensionRule>>(iter: I) -> Self {
        let mut registry = Self::default();
        for rule in iter {
            registry.insert(rule);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_parse_basic_rules() {
        let registry = ExtensionRegistry::parse("*.py(python),*.txt(text),*.c(C),*.md(markdown)")
            .unwrap();

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.tag_for_extension("py"), Some("python"));
        assert_eq!(registry.tag_for_extension("c"), Some("C"));
        assert_eq!(registry.tag_for_extension("rs"), None);
    }

    #[test]
    fn test_parse_trims_whitespace_and_newlines() {
        let registry = ExtensionRegistry::parse("  *.py(python) ,\n *.rs(rust)\n").unwrap();

        assert_eq!(registry.tag_for_extension("py"), Some("python"));
        assert_eq!(registry.tag_for_extension("rs"), Some("rust"));
    }

    #[test]
    fn test_keys_are_lowercased() {
        let registry = ExtensionRegistry::parse("*.PY(Python),*.Md(markdown)").unwrap();

        let keys: Vec<_> = registry.iter().map(|(ext, _)| ext).collect();
        assert_eq!(keys, vec!["md", "py"]);
        assert_eq!(registry.tag_for_extension("py"), Some("Python"));
        assert_eq!(registry.tag_for_extension("MD"), Some("markdown"));
    }

    #[test]
    fn test_duplicate_extension_last_wins() {
        let registry = ExtensionRegistry::parse("*.h(c),*.H(cpp),*.py(python)").unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.tag_for_extension("h"), Some("cpp"));
    }

    #[test]
    fn test_trailing_comma_and_empty_text() {
        assert_eq!(ExtensionRegistry::parse("*.py(python),").unwrap().len(), 1);
        assert!(ExtensionRegistry::parse("").unwrap().is_empty());
        assert!(ExtensionRegistry::parse("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_missing_star_dot() {
        let err = ExtensionRegistry::parse("*.py(python),py(python)").unwrap_err();
        assert!(err.is_config_format());
        assert!(err.to_string().contains("'py(python)'"));

        assert!(ExtensionRegistry::parse(".py(python)").is_err());
        assert!(ExtensionRegistry::parse("*py(python)").is_err());
    }

    #[test]
    fn test_rejects_missing_parentheses() {
        assert!(ExtensionRegistry::parse("*.py").unwrap_err().is_config_format());
        assert!(ExtensionRegistry::parse("*.py(python").unwrap_err().is_config_format());
        assert!(ExtensionRegistry::parse("*.pypython)").unwrap_err().is_config_format());
        assert!(ExtensionRegistry::parse("*.py(python)x").unwrap_err().is_config_format());
    }

    #[test]
    fn test_rejects_empty_extension_or_tag() {
        assert!(ExtensionRegistry::parse("*.(python)").unwrap_err().is_config_format());
        assert!(ExtensionRegistry::parse("*.py()").unwrap_err().is_config_format());
        assert!(ExtensionRegistry::parse("*.py(  )").unwrap_err().is_config_format());
    }

    #[test]
    fn test_rejects_nested_parentheses() {
        assert!(ExtensionRegistry::parse("*.py((python))").is_err());
        assert!(ExtensionRegistry::parse("*.p)y(python)").is_err());
    }

    #[test]
    fn test_rule_display_and_extension() {
        let rule = ExtensionRule::parse(" *.Rs(rust) ").unwrap();
        assert_eq!(rule.extension(), "Rs");
        assert_eq!(rule.to_string(), "*.Rs(rust)");
    }

    #[test]
    fn test_tag_for_path() {
        let registry = ExtensionRegistry::parse("*.py(python),*.gitignore(ignore)").unwrap();

        assert_eq!(registry.tag_for_path(Path::new("src/A.PY")), Some("python"));
        assert_eq!(registry.tag_for_path(Path::new("archive.tar.py")), Some("python"));
        assert_eq!(registry.tag_for_path(Path::new("Makefile")), None);
        // Leading-dot names have no extension
        assert_eq!(registry.tag_for_path(Path::new(".gitignore")), None);
        assert_eq!(registry.tag_for_path(Path::new("x.gitignore")), Some("ignore"));
    }

    #[test]
    fn test_from_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child(REGISTRY_FILE_NAME);
        file.write_str("*.rs(rust),*.toml(toml)\n").unwrap();

        let registry = ExtensionRegistry::from_file(file.path()).unwrap();
        assert_eq!(registry.tag_for_extension("toml"), Some("toml"));

        let missing = ExtensionRegistry::from_file(temp.path().join("missing.txt"));
        assert!(missing.is_err());
    }

    #[test]
    fn test_resolve_explicit_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("rules.txt").write_str("*.zig(zig)").unwrap();
        temp.child(REGISTRY_FILE_NAME).write_str("*.py(python)").unwrap();

        let registry =
            ExtensionRegistry::resolve(Some(&temp.path().join("rules.txt")), Some(temp.path()))
                .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.tag_for_extension("zig"), Some("zig"));
    }

    #[test]
    fn test_resolve_missing_explicit_file_is_fatal() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(REGISTRY_FILE_NAME).write_str("*.py(python)").unwrap();

        let err =
            ExtensionRegistry::resolve(Some(&temp.path().join("nope.txt")), Some(temp.path()))
                .unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_resolve_colocated_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(REGISTRY_FILE_NAME).write_str("*.py(python),*.c(c)\n").unwrap();

        let registry = ExtensionRegistry::resolve(None, Some(temp.path())).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.tag_for_extension("c"), Some("c"));
    }

    #[test]
    fn test_resolve_malformed_colocated_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(REGISTRY_FILE_NAME).write_str("*.py").unwrap();

        let err = ExtensionRegistry::resolve(None, Some(temp.path())).unwrap_err();
        assert!(err.is_config_format());
    }

    #[test]
    fn test_resolve_falls_back_to_builtin() {
        let temp = assert_fs::TempDir::new().unwrap();

        assert_eq!(
            ExtensionRegistry::resolve(None, Some(temp.path())).unwrap(),
            ExtensionRegistry::builtin()
        );
        assert_eq!(
            ExtensionRegistry::resolve(None, None).unwrap(),
            ExtensionRegistry::builtin()
        );
    }

    #[test]
    fn test_builtin_registry() {
        let registry = ExtensionRegistry::builtin();
        assert_eq!(registry.tag_for_extension("py"), Some("python"));
        assert_eq!(registry.tag_for_extension("rs"), Some("rust"));
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_from_str() {
        let registry: ExtensionRegistry = "*.go(go)".parse().unwrap();
        assert_eq!(registry.tag_for_extension("go"), Some("go"));
    }
}
