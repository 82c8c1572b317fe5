//! Exclusion/inclusion policy resolution.
//!
//! Pure functions of configuration + path: no filesystem I/O beyond the
//! lexical normalization of the path itself. The tree walker consults this
//! during live scans, the reconciliation engine during retroactive cleanup.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use regex::{Regex, RegexBuilder};

use crate::config::{ExclusionKind, ExclusionRule, InclusionOverride, PartitionConfig, RootFolder};

/// Hard ceiling on scan depth to bound recursion.
pub const MAX_SCAN_DEPTH: u32 = 100;

/// Lexically normalized absolute path with forward slashes and no trailing
/// separator. Symlinks are deliberately not resolved; the cycle guard in the
/// walker handles loops.
pub fn normalize_path(path: &Path) -> String {
    let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut s = abs.to_string_lossy().replace('\\', "/");
    while s.len() > 1 && s.ends_with('/') {
        s.pop();
    }
    s
}

/// Case-folded form of [`normalize_path`], used as a comparison key.
pub fn normalize_key(path: &Path) -> String {
    normalize_path(path).to_lowercase()
}

fn normalize_pattern_str(pattern: &str) -> String {
    let mut s = pattern.replace('\\', "/");
    while s.len() > 1 && s.ends_with('/') {
        s.pop();
    }
    s.to_lowercase()
}

/// Whether a pattern names an absolute location (drive separator or path
/// root marker) and should therefore be normalized like a path before
/// comparison.
fn pattern_looks_absolute(pattern: &str) -> bool {
    pattern.contains(':') || pattern.starts_with('/') || pattern.starts_with('\\')
}

#[derive(Debug)]
enum CompiledRule {
    ExactPath(String),
    PathPrefix(String),
    FolderName(String),
    Wildcard(GlobMatcher),
    Regex(Regex),
}

#[derive(Debug, Clone)]
pub struct ResolvedOverride {
    /// Case-folded normalized path the override names.
    pub key: String,
    /// Levels below this path, independent of depth consumed above it.
    pub scan_depth: u32,
    pub force_include: bool,
}

/// Answers, for any filesystem path: "is this excluded?" and "what is the
/// effective max depth controlling this node?".
pub struct PolicyResolver {
    rules: Vec<CompiledRule>,
    overrides: Vec<ResolvedOverride>,
}

impl PolicyResolver {
    /// Compiles the enabled rules of a partition configuration. Malformed
    /// wildcard/regex patterns fail closed: the rule matches nothing and the
    /// scan proceeds without it.
    pub fn new(cfg: &PartitionConfig) -> Self {
        let rules = cfg
            .exclusions
            .iter()
            .filter(|r| r.enabled)
            .filter_map(compile_rule)
            .collect();

        let overrides = cfg
            .overrides
            .iter()
            .filter(|o| o.enabled)
            .map(resolve_override)
            .collect();

        Self { rules, overrides }
    }

    /// First matching enabled rule wins; rule order is the configured order.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        let normalized = normalize_path(path);
        let key = normalized.to_lowercase();
        let folder_name = key.rsplit('/').next().unwrap_or(&key).to_string();

        self.rules.iter().any(|rule| match rule {
            CompiledRule::ExactPath(p) => key == *p,
            CompiledRule::PathPrefix(p) => key.starts_with(p.as_str()),
            CompiledRule::FolderName(name) => folder_name == *name,
            CompiledRule::Wildcard(glob) => glob.is_match(&normalized),
            CompiledRule::Regex(re) => re.is_match(&normalized),
        })
    }

    /// Exact case-insensitive match of the normalized path against enabled
    /// overrides. Not a prefix match: overrides apply only to the path they
    /// name.
    pub fn find_override(&self, key: &str) -> Option<&ResolvedOverride> {
        self.overrides.iter().find(|o| o.key == key)
    }

    /// Combined inclusion rule: a node is scanned unless excluded, except
    /// when a force-include override names it.
    pub fn should_scan(&self, path: &Path, key: &str) -> bool {
        !self.is_excluded(path) || self.find_override(key).map(|o| o.force_include).unwrap_or(false)
    }
}

fn compile_rule(rule: &ExclusionRule) -> Option<CompiledRule> {
    match rule.kind {
        ExclusionKind::ExactPath => Some(CompiledRule::ExactPath(normalize_rule_path(&rule.pattern))),
        ExclusionKind::PathPrefix => Some(CompiledRule::PathPrefix(normalize_rule_path(&rule.pattern))),
        ExclusionKind::FolderName => Some(CompiledRule::FolderName(rule.pattern.to_lowercase())),
        ExclusionKind::Wildcard => {
            // literal_separator stays off so `*` crosses directory boundaries
            match GlobBuilder::new(rule.pattern.trim())
                .case_insensitive(true)
                .build()
            {
                Ok(glob) => Some(CompiledRule::Wildcard(glob.compile_matcher())),
                Err(e) => {
                    tracing::warn!("Ignoring malformed wildcard exclusion '{}': {}", rule.pattern, e);
                    None
                }
            }
        }
        ExclusionKind::Regex => match RegexBuilder::new(&rule.pattern).case_insensitive(true).build() {
            Ok(re) => Some(CompiledRule::Regex(re)),
            Err(e) => {
                tracing::warn!("Ignoring malformed regex exclusion '{}': {}", rule.pattern, e);
                None
            }
        },
    }
}

fn normalize_rule_path(pattern: &str) -> String {
    if pattern_looks_absolute(pattern) {
        normalize_key(&PathBuf::from(pattern))
    } else {
        normalize_pattern_str(pattern)
    }
}

fn resolve_override(ov: &InclusionOverride) -> ResolvedOverride {
    ResolvedOverride {
        key: normalize_key(Path::new(&ov.path)),
        scan_depth: ov.scan_depth.min(MAX_SCAN_DEPTH),
        force_include: ov.force_include,
    }
}

/// Depth limit for one root: the root's own override if set, else the
/// partition default, clamped to [`MAX_SCAN_DEPTH`]. An unbounded default
/// scans to the ceiling.
pub fn root_max_depth(root: &RootFolder, cfg: &PartitionConfig) -> u32 {
    root.max_depth
        .or(cfg.default_scan_depth)
        .unwrap_or(MAX_SCAN_DEPTH)
        .min(MAX_SCAN_DEPTH)
}

/// Depth of `key` below `controlling` in path segments, assuming `key`
/// starts with `controlling`. Mirrors the reconciliation prefix logic:
/// no separator-boundary check is applied.
pub fn depth_below(controlling: &str, key: &str) -> u32 {
    if key.len() <= controlling.len() {
        return 0;
    }
    let rest = key[controlling.len()..].trim_start_matches('/');
    if rest.is_empty() {
        0
    } else {
        rest.split('/').count() as u32
    }
}
