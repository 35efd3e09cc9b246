//! Change categories, branch types and commit scopes
//!
//! Classification is an ordered list of (predicate, label) pairs; the first
//! predicate that matches wins. Predicates see the lowercased path.

use serde::{Deserialize, Serialize};

/// Category a changed path is batched under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Feature,
    Docs,
    Config,
    Fix,
}

impl Category {
    /// Fixed enumeration order, also the order batches are flushed in
    pub const ALL: [Category; 4] = [Category::Feature, Category::Docs, Category::Config, Category::Fix];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Docs => "docs",
            Self::Config => "config",
            Self::Fix => "fix",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "feature" => Ok(Self::Feature),
            "docs" => Ok(Self::Docs),
            "config" => Ok(Self::Config),
            "fix" => Ok(Self::Fix),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

type PathPredicate = fn(&str) -> bool;

const DOC_MARKERS: &[&str] = &["readme", "doc", ".md", "license"];
const CONFIG_MARKERS: &[&str] = &["config", ".yaml", ".yml", ".json", ".ini"];
const CONFIG_EXTENSIONS: &[&str] = &[".yaml", ".yml", ".json", ".ini"];
const SCRIPT_MARKERS: &[&str] = &[".sh", ".py", "script"];

fn contains_any(path: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| path.contains(n))
}

fn looks_like_docs(path: &str) -> bool {
    contains_any(path, DOC_MARKERS)
}

fn looks_like_config(path: &str) -> bool {
    contains_any(path, CONFIG_MARKERS)
}

fn looks_like_script(path: &str) -> bool {
    contains_any(path, SCRIPT_MARKERS)
}

const CATEGORY_RULES: &[(PathPredicate, Category)] = &[
    (looks_like_docs, Category::Docs),
    (looks_like_config, Category::Config),
    (looks_like_script, Category::Feature),
];

/// Classify a single path; unmatched paths are features
pub fn classify(path: &str) -> Category {
    let lower = path.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(matches, _)| matches(&lower))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Feature)
}

/// Internal branch type, also used as the conventional-commit type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchType {
    Feature,
    Docs,
    Fix,
    Config,
    Update,
}

impl BranchType {
    /// Map a caller-facing category name; unknown names become `Feature`
    pub fn from_category_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "docs" | "documentation" => Self::Docs,
            "fix" | "bugfix" => Self::Fix,
            "config" | "configuration" => Self::Config,
            "update" | "maintenance" => Self::Update,
            _ => Self::Feature,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Docs => "docs",
            Self::Fix => "fix",
            Self::Config => "config",
            Self::Update => "update",
        }
    }
}

impl std::fmt::Display for BranchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Commit scope derived from a whole set of paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Docs,
    Config,
    Scripts,
    Core,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docs => "docs",
            Self::Config => "config",
            Self::Scripts => "scripts",
            Self::Core => "core",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn mentions_doc(path: &str) -> bool {
    path.contains("doc")
}

fn mentions_config(path: &str) -> bool {
    path.contains("config") || CONFIG_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

const SCOPE_RULES: &[(PathPredicate, Scope)] = &[
    (mentions_doc, Scope::Docs),
    (mentions_config, Scope::Config),
    (looks_like_script, Scope::Scripts),
];

/// Derive the commit scope: a rule matches when any path satisfies it
pub fn derive_scope<S: AsRef<str>>(paths: &[S]) -> Scope {
    let lowered: Vec<String> = paths.iter().map(|p| p.as_ref().to_lowercase()).collect();
    SCOPE_RULES
        .iter()
        .find(|(matches, _)| lowered.iter().any(|p| matches(p)))
        .map(|(_, scope)| *scope)
        .unwrap_or(Scope::Core)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_docs() {
        assert_eq!(classify("docs/README.md"), Category::Docs);
        assert_eq!(classify("LICENSE"), Category::Docs);
        assert_eq!(classify("guide/intro.MD"), Category::Docs);
    }

    #[test]
    fn test_classify_config() {
        assert_eq!(classify("a.yaml"), Category::Config);
        assert_eq!(classify("b.json"), Category::Config);
        assert_eq!(classify("settings.ini"), Category::Config);
        assert_eq!(classify("Config/app.toml"), Category::Config);
    }

    #[test]
    fn test_classify_scripts_and_fallback() {
        assert_eq!(classify("bin/install.sh"), Category::Feature);
        assert_eq!(classify("tools/run.py"), Category::Feature);
        assert_eq!(classify("c.txt"), Category::Feature);
    }

    #[test]
    fn test_classify_first_match_wins() {
        // docs rule precedes config rule
        assert_eq!(classify("docs/config.yaml"), Category::Docs);
        // config rule precedes script rule
        assert_eq!(classify("scripts/config.sh"), Category::Config);
    }

    #[test]
    fn test_category_parse_and_display() {
        assert_eq!("DOCS".parse::<Category>().unwrap(), Category::Docs);
        assert!("documentation".parse::<Category>().is_err());
        assert_eq!(Category::Config.to_string(), "config");
    }

    #[test]
    fn test_branch_type_mapping() {
        assert_eq!(BranchType::from_category_name("feature"), BranchType::Feature);
        assert_eq!(BranchType::from_category_name("documentation"), BranchType::Docs);
        assert_eq!(BranchType::from_category_name("docs"), BranchType::Docs);
        assert_eq!(BranchType::from_category_name("bugfix"), BranchType::Fix);
        assert_eq!(BranchType::from_category_name("configuration"), BranchType::Config);
        assert_eq!(BranchType::from_category_name("maintenance"), BranchType::Update);
        assert_eq!(BranchType::from_category_name("something-else"), BranchType::Feature);
    }

    #[test]
    fn test_derive_scope() {
        assert_eq!(derive_scope(&["src/main.rs", "docs/guide.md"]), Scope::Docs);
        assert_eq!(derive_scope(&["a.yaml", "src/lib.rs"]), Scope::Config);
        assert_eq!(derive_scope(&["bin/deploy.sh"]), Scope::Scripts);
        assert_eq!(derive_scope(&["c.txt"]), Scope::Core);
        assert_eq!(derive_scope::<&str>(&[]), Scope::Core);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Category::Docs).unwrap(), "\"docs\"");
        assert_eq!(serde_json::to_string(&Scope::Scripts).unwrap(), "\"scripts\"");
    }
}
