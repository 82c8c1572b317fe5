#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::config::{
        ExclusionKind, ExclusionRule, InclusionOverride, PartitionConfig, RootFolder,
    };
    use crate::policy::{
        depth_below, normalize_key, normalize_path, root_max_depth, PolicyResolver, MAX_SCAN_DEPTH,
    };

    fn rule(pattern: &str, kind: ExclusionKind) -> ExclusionRule {
        ExclusionRule { pattern: pattern.to_string(), kind, enabled: true }
    }

    fn cfg_with(exclusions: Vec<ExclusionRule>, overrides: Vec<InclusionOverride>) -> PartitionConfig {
        PartitionConfig {
            path: "/data".to_string(),
            enabled: true,
            default_scan_depth: Some(2),
            roots: vec![RootFolder { path: "/data".to_string(), enabled: true, max_depth: None }],
            exclusions,
            overrides,
        }
    }

    #[test]
    fn normalize_path_uses_forward_slashes_and_trims_trailing_separator() {
        assert_eq!(normalize_path(Path::new("/data/logs/")), "/data/logs");
        assert_eq!(normalize_path(Path::new("/")), "/");
        assert_eq!(normalize_key(Path::new("/Data/Logs")), "/data/logs");
    }

    #[test]
    fn exact_path_rule_matches_only_the_whole_path() {
        let resolver = PolicyResolver::new(&cfg_with(
            vec![rule("/data/Cache", ExclusionKind::ExactPath)],
            vec![],
        ));
        assert!(resolver.is_excluded(Path::new("/data/cache")));
        assert!(!resolver.is_excluded(Path::new("/data/cache/sub")));
        assert!(!resolver.is_excluded(Path::new("/data/cache2")));
    }

    #[test]
    fn path_prefix_rule_has_no_separator_boundary_check() {
        let resolver = PolicyResolver::new(&cfg_with(
            vec![rule("/data/log", ExclusionKind::PathPrefix)],
            vec![],
        ));
        assert!(resolver.is_excluded(Path::new("/data/log")));
        assert!(resolver.is_excluded(Path::new("/data/log/app")));
        // known edge: sibling sharing the prefix also matches
        assert!(resolver.is_excluded(Path::new("/data/logs")));
        assert!(!resolver.is_excluded(Path::new("/data/lo")));
    }

    #[test]
    fn folder_name_rule_matches_final_component_at_any_depth() {
        let resolver = PolicyResolver::new(&cfg_with(
            vec![rule("Node_Modules", ExclusionKind::FolderName)],
            vec![],
        ));
        assert!(resolver.is_excluded(Path::new("/data/a/node_modules")));
        assert!(resolver.is_excluded(Path::new("/node_modules")));
        assert!(!resolver.is_excluded(Path::new("/data/node_modules/inner")));
    }

    #[test]
    fn wildcard_rule_is_anchored_and_crosses_separators() {
        let resolver = PolicyResolver::new(&cfg_with(
            vec![rule("/data/*/tmp-?", ExclusionKind::Wildcard)],
            vec![],
        ));
        assert!(resolver.is_excluded(Path::new("/data/a/tmp-1")));
        assert!(resolver.is_excluded(Path::new("/data/a/b/tmp-x")));
        // anchored: a longer path does not match
        assert!(!resolver.is_excluded(Path::new("/data/a/tmp-1/deeper")));
    }

    #[test]
    fn regex_rule_matches_anywhere_case_insensitively() {
        let resolver = PolicyResolver::new(&cfg_with(
            vec![rule(r"te?mp\d+", ExclusionKind::Regex)],
            vec![],
        ));
        assert!(resolver.is_excluded(Path::new("/data/TMP42/x")));
        assert!(!resolver.is_excluded(Path::new("/data/temper/x")));
    }

    #[test]
    fn malformed_patterns_fail_closed_without_aborting() {
        let resolver = PolicyResolver::new(&cfg_with(
            vec![
                rule(r"(unclosed", ExclusionKind::Regex),
                rule("keep", ExclusionKind::FolderName),
            ],
            vec![],
        ));
        // the broken rule matches nothing; the healthy one still applies
        assert!(!resolver.is_excluded(Path::new("/data/(unclosed")));
        assert!(resolver.is_excluded(Path::new("/data/keep")));
    }

    #[test]
    fn disabled_rules_are_ignored() {
        let mut disabled = rule("skipme", ExclusionKind::FolderName);
        disabled.enabled = false;
        let resolver = PolicyResolver::new(&cfg_with(vec![disabled], vec![]));
        assert!(!resolver.is_excluded(Path::new("/data/skipme")));
    }

    #[test]
    fn find_override_is_exact_not_prefix() {
        let resolver = PolicyResolver::new(&cfg_with(
            vec![],
            vec![InclusionOverride {
                path: "/data/Logs".to_string(),
                scan_depth: 3,
                enabled: true,
                force_include: true,
            }],
        ));
        assert!(resolver.find_override(&normalize_key(Path::new("/data/logs"))).is_some());
        assert!(resolver.find_override(&normalize_key(Path::new("/data/logs/app"))).is_none());
    }

    #[test]
    fn force_include_wins_over_exclusion() {
        let resolver = PolicyResolver::new(&cfg_with(
            vec![rule("logs", ExclusionKind::FolderName)],
            vec![InclusionOverride {
                path: "/data/logs".to_string(),
                scan_depth: 3,
                enabled: true,
                force_include: true,
            }],
        ));
        let logs = Path::new("/data/logs");
        let key = normalize_key(logs);
        assert!(resolver.is_excluded(logs));
        assert!(resolver.should_scan(logs, &key));
        // a different folder matching the rule stays excluded
        let other = Path::new("/data/app/logs");
        let other_key = normalize_key(other);
        assert!(!resolver.should_scan(other, &other_key));
    }

    #[test]
    fn root_depth_falls_back_to_partition_default_and_is_clamped() {
        let cfg = cfg_with(vec![], vec![]);
        let root = RootFolder { path: "/data".to_string(), enabled: true, max_depth: None };
        assert_eq!(root_max_depth(&root, &cfg), 2);

        let deep = RootFolder { path: "/data".to_string(), enabled: true, max_depth: Some(500) };
        assert_eq!(root_max_depth(&deep, &cfg), MAX_SCAN_DEPTH);

        let mut unbounded = cfg_with(vec![], vec![]);
        unbounded.default_scan_depth = None;
        assert_eq!(root_max_depth(&root, &unbounded), MAX_SCAN_DEPTH);
    }

    #[test]
    fn depth_below_counts_segments_beyond_controlling_path() {
        assert_eq!(depth_below("/data", "/data"), 0);
        assert_eq!(depth_below("/data", "/data/a"), 1);
        assert_eq!(depth_below("/data", "/data/a/b/c"), 3);
        assert_eq!(depth_below("/", "/a/b"), 2);
    }
}
