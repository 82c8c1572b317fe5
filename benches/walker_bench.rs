use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use baumwuchs::config::{
    ExclusionKind, ExclusionRule, PartitionConfig, RootFolder, ScannerConfig,
};
use baumwuchs::policy::PolicyResolver;
use baumwuchs::scanner::run_partition_scan;
use baumwuchs::store::SnapshotStore;

fn create_test_tree(depth: usize, files_per_dir: usize, dirs_per_level: usize) -> TempDir {
    let temp_dir = TempDir::new().unwrap();

    fn create_level(
        path: &Path,
        current_depth: usize,
        max_depth: usize,
        files_per_dir: usize,
        dirs_per_level: usize,
    ) {
        if current_depth >= max_depth {
            return;
        }
        for i in 0..files_per_dir {
            fs::write(path.join(format!("file_{}.txt", i)), format!("Test content {}", i)).unwrap();
        }
        for i in 0..dirs_per_level {
            let dir_path = path.join(format!("dir_{}", i));
            fs::create_dir(&dir_path).unwrap();
            create_level(&dir_path, current_depth + 1, max_depth, files_per_dir, dirs_per_level);
        }
    }

    create_level(temp_dir.path(), 0, depth, files_per_dir, dirs_per_level);
    temp_dir
}

fn partition(root: &Path, default_scan_depth: Option<u32>) -> PartitionConfig {
    PartitionConfig {
        path: root.to_string_lossy().to_string(),
        enabled: true,
        default_scan_depth,
        roots: vec![RootFolder {
            path: root.to_string_lossy().to_string(),
            enabled: true,
            max_depth: None,
        }],
        exclusions: vec![],
        overrides: vec![],
    }
}

fn bench_scan(c: &mut Criterion, name: &str, tree: &TempDir, default_scan_depth: Option<u32>) {
    let rt = Runtime::new().unwrap();
    let cfg = partition(tree.path(), default_scan_depth);
    let scanner_cfg =
        ScannerConfig { batch_size: 256, visited_limit: 10000, partition_concurrency: None };

    c.bench_function(name, |b| {
        b.iter(|| {
            rt.block_on(async {
                let data_dir = TempDir::new().unwrap();
                let store = SnapshotStore::new(data_dir.path());
                let progress = Arc::new(Mutex::new(HashMap::new()));
                black_box(
                    run_partition_scan(
                        store,
                        cfg.clone(),
                        scanner_cfg.clone(),
                        progress,
                        CancellationToken::new(),
                        Uuid::new_v4(),
                    )
                    .await,
                )
            })
        })
    });
}

fn benchmark_small_tree(c: &mut Criterion) {
    let tree = create_test_tree(3, 10, 3);
    bench_scan(c, "scan_small_tree", &tree, None);
}

fn benchmark_large_tree(c: &mut Criterion) {
    let tree = create_test_tree(4, 20, 4);
    bench_scan(c, "scan_large_tree", &tree, None);
}

fn benchmark_depth_frontier(c: &mut Criterion) {
    let tree = create_test_tree(4, 20, 4);
    let mut group = c.benchmark_group("depth_frontier");
    for depth in [0u32, 1, 2, 4].iter() {
        let rt = Runtime::new().unwrap();
        let cfg = partition(tree.path(), Some(*depth));
        let scanner_cfg =
            ScannerConfig { batch_size: 256, visited_limit: 10000, partition_concurrency: None };
        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, _| {
            b.iter(|| {
                rt.block_on(async {
                    let data_dir = TempDir::new().unwrap();
                    let store = SnapshotStore::new(data_dir.path());
                    let progress = Arc::new(Mutex::new(HashMap::new()));
                    black_box(
                        run_partition_scan(
                            store,
                            cfg.clone(),
                            scanner_cfg.clone(),
                            progress,
                            CancellationToken::new(),
                            Uuid::new_v4(),
                        )
                        .await,
                    )
                })
            })
        });
    }
    group.finish();
}

fn benchmark_policy_matching(c: &mut Criterion) {
    let mut cfg = partition(Path::new("/data"), Some(4));
    cfg.exclusions = vec![
        ExclusionRule {
            pattern: "node_modules".to_string(),
            kind: ExclusionKind::FolderName,
            enabled: true,
        },
        ExclusionRule {
            pattern: "/data/*/cache".to_string(),
            kind: ExclusionKind::Wildcard,
            enabled: true,
        },
        ExclusionRule {
            pattern: r"tmp\d+".to_string(),
            kind: ExclusionKind::Regex,
            enabled: true,
        },
    ];
    let resolver = PolicyResolver::new(&cfg);
    let paths: Vec<String> =
        (0..1000).map(|i| format!("/data/project_{}/src/module_{}", i % 50, i)).collect();

    c.bench_function("policy_matching_1000_paths", |b| {
        b.iter(|| {
            for p in &paths {
                black_box(resolver.is_excluded(Path::new(p)));
            }
        })
    });
}

criterion_group!(
    benches,
    benchmark_small_tree,
    benchmark_large_tree,
    benchmark_depth_frontier,
    benchmark_policy_matching
);
criterion_main!(benches);
