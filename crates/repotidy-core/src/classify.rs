//! Rule-driven file classification.
//!
//! Rules are plain string tables so operators can extend a category from a
//! config file without touching the evaluation order, which is fixed:
//!
//! 1. protected prefix
//! 2. temp extension or OS junk name
//! 3. build-output directory
//! 4. markdown extension or docs directory
//! 5. structured config extension, tool config keyword, or dotfile
//! 6. test directory or test/spec marker
//! 7. image extension
//! 8. everything else is source

use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::record::{Category, extension_of, file_name_of};

/// Declarative classification tables.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
#[serde(default)]
pub struct RuleSet {
    /// Path substrings that make a file untouchable.
    #[builder(default = "default_protected_prefixes()")]
    pub protected_prefixes: Vec<String>,

    /// Extensions (with dot) of temporary files.
    #[builder(default = "default_temp_extensions()")]
    pub temp_extensions: Vec<String>,

    /// Glob patterns matched against the file name of OS/editor junk.
    #[builder(default = "default_junk_patterns()")]
    pub junk_patterns: Vec<String>,

    /// Directory names holding build output.
    #[builder(default = "default_build_dirs()")]
    pub build_dirs: Vec<String>,

    /// Extensions that are always documentation.
    #[builder(default = "default_docs_extensions()")]
    pub docs_extensions: Vec<String>,

    /// Directory names holding documentation.
    #[builder(default = "default_docs_dirs()")]
    pub docs_dirs: Vec<String>,

    /// Structured config extensions.
    #[builder(default = "default_config_extensions()")]
    pub config_extensions: Vec<String>,

    /// Substrings of tool config file names (matched case-insensitively).
    #[builder(default = "default_tool_config_keywords()")]
    pub tool_config_keywords: Vec<String>,

    /// Directory names holding tests.
    #[builder(default = "default_test_dirs()")]
    pub test_dirs: Vec<String>,

    /// Substrings of test file names.
    #[builder(default = "default_test_markers()")]
    pub test_markers: Vec<String>,

    /// Image extensions.
    #[builder(default = "default_image_extensions()")]
    pub image_extensions: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_protected_prefixes() -> Vec<String> {
    strings(&[".github/", ".husky/", "LICENSE", "Cargo.lock", "package-lock.json"])
}

fn default_temp_extensions() -> Vec<String> {
    strings(&[".tmp", ".temp", ".log", ".bak", ".swp", ".swo", ".orig", ".cache"])
}

fn default_junk_patterns() -> Vec<String> {
    strings(&[".DS_Store", "Thumbs.db", "desktop.ini", "*~", ".#*"])
}

fn default_build_dirs() -> Vec<String> {
    strings(&["dist", "build", "out", "coverage", ".next", "target"])
}

fn default_docs_extensions() -> Vec<String> {
    strings(&[".md", ".markdown"])
}

fn default_docs_dirs() -> Vec<String> {
    strings(&["docs", "doc", "documentation"])
}

fn default_config_extensions() -> Vec<String> {
    strings(&[".json", ".yaml", ".yml", ".toml", ".ini"])
}

fn default_tool_config_keywords() -> Vec<String> {
    strings(&[
        "eslint",
        "prettier",
        "tsconfig",
        "babel",
        "webpack",
        "vite.config",
        "jest.config",
        "rollup.config",
        "dockerfile",
        "makefile",
    ])
}

fn default_test_dirs() -> Vec<String> {
    strings(&["test", "tests", "__tests__", "spec", "e2e"])
}

fn default_test_markers() -> Vec<String> {
    strings(&[".test.", ".spec.", "_test.", "test_"])
}

fn default_image_extensions() -> Vec<String> {
    strings(&[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".bmp"])
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            protected_prefixes: default_protected_prefixes(),
            temp_extensions: default_temp_extensions(),
            junk_patterns: default_junk_patterns(),
            build_dirs: default_build_dirs(),
            docs_extensions: default_docs_extensions(),
            docs_dirs: default_docs_dirs(),
            config_extensions: default_config_extensions(),
            tool_config_keywords: default_tool_config_keywords(),
            test_dirs: default_test_dirs(),
            test_markers: default_test_markers(),
            image_extensions: default_image_extensions(),
        }
    }
}

impl RuleSet {
    /// Create a new ruleset builder.
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }
}

/// A ruleset with its glob patterns compiled.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: RuleSet,
    junk: GlobSet,
}

impl Classifier {
    /// Compile a ruleset.
    pub fn new(rules: RuleSet) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &rules.junk_patterns {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::Glob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let junk = builder.build().map_err(|source| ConfigError::Glob {
            pattern: rules.junk_patterns.join(","),
            source,
        })?;
        Ok(Self { rules, junk })
    }

    /// The rules this classifier evaluates.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Assign exactly one category to a normalized relative path.
    pub fn classify(&self, path: &str) -> Category {
        let rules = &self.rules;
        let name = file_name_of(path);
        let lower_name = name.to_lowercase();
        let extension = extension_of(path);
        let dirs = dir_segments(path);

        if rules.protected_prefixes.iter().any(|p| path.contains(p.as_str())) {
            return Category::Protected;
        }

        if contains_ext(&rules.temp_extensions, &extension) || self.junk.is_match(name) {
            return Category::Temp;
        }

        if dirs.iter().any(|d| eq_any(&rules.build_dirs, d)) {
            return Category::Build;
        }

        if contains_ext(&rules.docs_extensions, &extension)
            || dirs.iter().any(|d| eq_any(&rules.docs_dirs, d))
        {
            return Category::Docs;
        }

        if contains_ext(&rules.config_extensions, &extension)
            || rules
                .tool_config_keywords
                .iter()
                .any(|k| lower_name.contains(&k.to_lowercase()))
            || name.starts_with('.')
        {
            return Category::Config;
        }

        if dirs.iter().any(|d| eq_any(&rules.test_dirs, d))
            || rules
                .test_markers
                .iter()
                .any(|m| lower_name.contains(&m.to_lowercase()))
        {
            return Category::Test;
        }

        if contains_ext(&rules.image_extensions, &extension) {
            return Category::Assets;
        }

        Category::Source
    }
}

/// Directory components of a `/`-separated path, excluding the file name.
fn dir_segments(path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = path.split('/').collect();
    parts.pop();
    parts
}

fn contains_ext(table: &[String], extension: &str) -> bool {
    !extension.is_empty() && table.iter().any(|e| e.eq_ignore_ascii_case(extension))
}

fn eq_any(table: &[String], segment: &str) -> bool {
    table.iter().any(|t| t.eq_ignore_ascii_case(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(RuleSet::default()).unwrap()
    }

    #[test]
    fn test_rule_order() {
        let c = classifier();
        assert_eq!(c.classify(".github/workflows/ci.yml"), Category::Protected);
        assert_eq!(c.classify("debug.log"), Category::Temp);
        assert_eq!(c.classify("src/.DS_Store"), Category::Temp);
        assert_eq!(c.classify("notes.md~"), Category::Temp);
        assert_eq!(c.classify("dist/bundle.js"), Category::Build);
        assert_eq!(c.classify("packages/widget/docs/setup.md"), Category::Docs);
        assert_eq!(c.classify("docs/diagram.txt"), Category::Docs);
        assert_eq!(c.classify("package.json"), Category::Config);
        assert_eq!(c.classify(".eslintrc"), Category::Config);
        assert_eq!(c.classify("src/Dockerfile"), Category::Config);
        assert_eq!(c.classify("src/app.test.ts"), Category::Test);
        assert_eq!(c.classify("tests/helpers.rs"), Category::Test);
        assert_eq!(c.classify("public/logo.PNG"), Category::Assets);
        assert_eq!(c.classify("packages/widget/Button.tsx"), Category::Source);
    }

    #[test]
    fn test_protected_beats_everything() {
        let c = classifier();
        // Would be temp, build and docs without the prefix.
        assert_eq!(c.classify(".github/dist/docs/run.log"), Category::Protected);
        assert_eq!(c.classify("LICENSE"), Category::Protected);
    }

    #[test]
    fn test_segment_match_is_exact() {
        let c = classifier();
        // "distribution" is not "dist", "docsite" is not "docs".
        assert_eq!(c.classify("distribution/main.rs"), Category::Source);
        assert_eq!(c.classify("docsite/main.rs"), Category::Source);
        // The file name itself is not a directory segment.
        assert_eq!(c.classify("src/build"), Category::Source);
    }

    #[test]
    fn test_custom_rules() {
        let rules = RuleSet::builder()
            .protected_prefixes(vec!["vendor/".to_string()])
            .image_extensions(vec![".psd".to_string()])
            .build()
            .unwrap();
        let c = Classifier::new(rules).unwrap();
        assert_eq!(c.classify("vendor/lib.c"), Category::Protected);
        assert_eq!(c.classify("art/cover.psd"), Category::Assets);
        assert_eq!(c.classify("art/cover.png"), Category::Source);
    }

    #[test]
    fn test_invalid_glob_is_reported() {
        let rules = RuleSet::builder()
            .junk_patterns(vec!["[".to_string()])
            .build()
            .unwrap();
        assert!(matches!(
            Classifier::new(rules),
            Err(ConfigError::Glob { .. })
        ));
    }
}
