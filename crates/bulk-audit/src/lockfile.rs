//! package-lock.json 의존성 트리 순회
//!
//! [`LockfileWalker`]는 lockfile의 의존성 트리를 순회하여 (이름, 버전) 쌍을
//! [`DependencyMap`]에 누적합니다.
//!
//! # 스키마 세대
//!
//! - **v0**: `dependencies` 필드의 최상위 항목만 (재귀하지 않음)
//! - **v1** (`lockfileVersion` 없음 또는 1): `dependencies` 필드의 재귀 트리
//! - **v2/v3**: `packages` 필드의 평탄한 맵 (설치 경로가 키)
//!
//! ```json
//! {
//!   "lockfileVersion": 1,
//!   "dependencies": {
//!     "ms": { "version": "2.0.0", "dependencies": { "ms": { "version": "2.1.1" } } }
//!   }
//! }
//! ```
//!
//! 키에 `node_modules/` 세그먼트가 있으면 마지막 세그먼트 이후만 패키지 이름으로
//! 사용하므로, v1 중첩 키와 v2/v3 경로 키가 같은 이름으로 정규화됩니다.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::debug;

use lockwatch_core::metrics as m;

use crate::error::BulkAuditError;

/// 중첩 모듈 디렉토리 세그먼트
const NODE_MODULES_SEGMENT: &str = "node_modules/";

/// 재귀 순회 최대 깊이
pub const MAX_TREE_DEPTH: usize = 256;

/// 패키지 이름 -> 버전 집합 누적기
///
/// 같은 (이름, 버전) 쌍은 트리의 여러 경로에서 도달해도 한 번만 저장됩니다.
pub type DependencyMap = BTreeMap<String, BTreeSet<String>>;

/// 의존성 트리의 형태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeShape {
    /// v0: `dependencies` 필드, 최상위 항목만 읽고 재귀하지 않음
    Shallow,
    /// v1: `dependencies` 필드, 중첩 `dependencies`로 재귀
    Recursive,
    /// v2/v3: `packages` 필드, 이미 평탄화되어 재귀하지 않음
    Flat,
}

impl TreeShape {
    /// lockfile 스키마 버전에서 트리 형태를 결정합니다.
    ///
    /// 중첩 트리로 재귀하는 것은 정확히 버전 1뿐입니다.
    pub fn from_schema_version(version: u64) -> Self {
        match version {
            0 => Self::Shallow,
            1 => Self::Recursive,
            _ => Self::Flat,
        }
    }

    /// 트리 루트를 담고 있는 최상위 필드 이름
    pub fn tree_field(self) -> &'static str {
        match self {
            Self::Shallow | Self::Recursive => "dependencies",
            Self::Flat => "packages",
        }
    }

    /// 중첩 `dependencies`로 재귀하는지 여부
    pub fn recurses(self) -> bool {
        matches!(self, Self::Recursive)
    }
}

/// `lockfileVersion` 필드를 읽습니다. 필드가 없으면 1입니다.
///
/// # Errors
///
/// 필드가 음이 아닌 정수가 아니면 `SchemaViolation`
pub fn schema_version(lockfile: &Value) -> Result<u64, BulkAuditError> {
    match lockfile.get("lockfileVersion") {
        None => Ok(1),
        Some(value) => value.as_u64().ok_or_else(|| {
            BulkAuditError::schema(
                "lockfileVersion",
                format!("expected a non-negative integer, got {value}"),
            )
        }),
    }
}

/// lockfile 키에서 패키지 이름을 추출합니다.
///
/// 마지막 `node_modules/` 세그먼트까지 제거합니다.
/// - `"node_modules/lodash"` -> `"lodash"`
/// - `"node_modules/a/node_modules/@scope/b"` -> `"@scope/b"`
/// - `"kind-of"` -> `"kind-of"`
pub fn package_name_from_key(key: &str) -> &str {
    match key.rfind(NODE_MODULES_SEGMENT) {
        Some(idx) => &key[idx + NODE_MODULES_SEGMENT.len()..],
        None => key,
    }
}

/// 감사 대상에서 제외할 의존성을 판정하는 정책
pub trait DependencyFilter: Send + Sync {
    /// `(name, version)` 쌍을 제외해야 하면 `true`를 반환합니다.
    fn should_skip(&self, name: &str, version: &str) -> bool;
}

/// 레지스트리 버전이 아닌 참조를 가리키는 버전 접두어
const NON_REGISTRY_PREFIXES: &[&str] = &[
    "npm:", "file:", "link:", "git:", "git+", "github:", "http://", "https://",
];

/// 알려진 노이즈 필터
///
/// 감사 서비스가 해석할 수 없는 항목을 제외합니다.
/// - 이름이 빈 항목 (v2/v3의 루트 프로젝트 `""`)
/// - `npm:` 별칭과 로컬/원격 참조 (`file:`, `link:`, `git+` 등)
#[derive(Debug, Default, Clone, Copy)]
pub struct KnownNoiseFilter;

impl DependencyFilter for KnownNoiseFilter {
    fn should_skip(&self, name: &str, version: &str) -> bool {
        name.is_empty()
            || NON_REGISTRY_PREFIXES
                .iter()
                .any(|prefix| version.starts_with(prefix))
    }
}

/// lockfile 의존성 트리 순회기
pub struct LockfileWalker {
    filter: Box<dyn DependencyFilter>,
}

impl Default for LockfileWalker {
    fn default() -> Self {
        Self::new(Box::new(KnownNoiseFilter))
    }
}

impl LockfileWalker {
    /// 지정한 제외 정책으로 순회기를 생성합니다.
    pub fn new(filter: Box<dyn DependencyFilter>) -> Self {
        Self { filter }
    }

    /// lockfile을 순회하여 `out`에 (이름, 버전) 쌍을 누적합니다.
    ///
    /// 트리 필드가 없거나 `null`이면 아무것도 추가하지 않습니다.
    ///
    /// # Errors
    ///
    /// 문서나 노드가 객체가 아니거나 `version`이 없으면 `SchemaViolation`
    pub fn collect(
        &self,
        lockfile: &Value,
        skip_dev: bool,
        out: &mut DependencyMap,
    ) -> Result<(), BulkAuditError> {
        let root = lockfile
            .as_object()
            .ok_or_else(|| BulkAuditError::schema("<root>", "lockfile must be a JSON object"))?;

        let shape = TreeShape::from_schema_version(schema_version(lockfile)?);
        let field = shape.tree_field();

        match root.get(field) {
            None | Some(Value::Null) => {
                debug!(field, "lockfile has no dependency tree");
                Ok(())
            }
            Some(tree) => self.walk(tree, field, shape, skip_dev, 0, out),
        }
    }

    fn walk(
        &self,
        tree: &Value,
        path: &str,
        shape: TreeShape,
        skip_dev: bool,
        depth: usize,
        out: &mut DependencyMap,
    ) -> Result<(), BulkAuditError> {
        if depth >= MAX_TREE_DEPTH {
            return Err(BulkAuditError::schema(
                path,
                format!("dependency tree deeper than {MAX_TREE_DEPTH} levels"),
            ));
        }

        let entries = tree
            .as_object()
            .ok_or_else(|| BulkAuditError::schema(path, "expected an object"))?;

        for (key, node) in entries {
            let node_path = format!("{path}/{key}");
            let node = node
                .as_object()
                .ok_or_else(|| BulkAuditError::schema(&node_path, "expected an object"))?;

            let version = match node.get("version") {
                Some(Value::String(version)) => version.as_str(),
                Some(other) => {
                    return Err(BulkAuditError::schema(
                        &node_path,
                        format!("version must be a string, got {other}"),
                    ));
                }
                None => {
                    return Err(BulkAuditError::schema(&node_path, "missing version"));
                }
            };
            let dev = node.get("dev").and_then(Value::as_bool).unwrap_or(false);

            if skip_dev && dev {
                debug!(key = %key, version, "skipping dev dependency");
                continue;
            }

            if shape.recurses() {
                if let Some(children) = node.get("dependencies") {
                    let children_path = format!("{node_path}/dependencies");
                    self.walk(children, &children_path, shape, skip_dev, depth + 1, out)?;
                }
            }

            let name = package_name_from_key(key);
            if self.filter.should_skip(name, version) {
                debug!(name, version, "skipping dependency excluded by filter");
                metrics::counter!(m::BULK_AUDIT_DEPENDENCIES_SKIPPED_TOTAL).increment(1);
                continue;
            }

            out.entry(name.to_owned())
                .or_default()
                .insert(version.to_owned());
        }

        Ok(())
    }
}

/// 기본 노이즈 필터로 lockfile을 순회하여 새 누적기를 반환합니다.
pub fn collect_dependencies(
    lockfile: &Value,
    skip_dev: bool,
) -> Result<DependencyMap, BulkAuditError> {
    let mut out = DependencyMap::new();
    LockfileWalker::default().collect(lockfile, skip_dev, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn versions(map: &DependencyMap, name: &str) -> Vec<String> {
        map.get(name)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn v1_nested_tree_is_walked_recursively() {
        let lockfile = json!({
            "lockfileVersion": 1,
            "dependencies": {
                "kind-of": { "version": "3.2.2" },
                "ms": {
                    "version": "2.0.0",
                    "dependencies": { "ms": { "version": "2.1.1" } }
                }
            }
        });

        let map = collect_dependencies(&lockfile, false).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(versions(&map, "kind-of"), vec!["3.2.2"]);
        assert_eq!(versions(&map, "ms"), vec!["2.0.0", "2.1.1"]);
    }

    #[test]
    fn missing_lockfile_version_is_treated_as_v1() {
        let with_version = json!({
            "lockfileVersion": 1,
            "dependencies": { "a": { "version": "1.0.0", "dependencies": { "b": { "version": "2.0.0" } } } }
        });
        let without_version = json!({
            "dependencies": { "a": { "version": "1.0.0", "dependencies": { "b": { "version": "2.0.0" } } } }
        });

        assert_eq!(
            collect_dependencies(&with_version, false).unwrap(),
            collect_dependencies(&without_version, false).unwrap()
        );
    }

    #[test]
    fn v2_reads_packages_and_ignores_dependencies() {
        let lockfile = json!({
            "lockfileVersion": 2,
            "packages": {
                "": { "name": "app", "version": "1.0.0" },
                "node_modules/lodash": { "version": "4.17.21" }
            },
            "dependencies": {
                "left-pad": { "version": "1.3.0" }
            }
        });

        let map = collect_dependencies(&lockfile, false).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(versions(&map, "lodash"), vec!["4.17.21"]);
    }

    #[test]
    fn v3_does_not_recurse_into_nested_dependencies() {
        let lockfile = json!({
            "lockfileVersion": 3,
            "packages": {
                "node_modules/a": {
                    "version": "1.0.0",
                    "dependencies": { "b": "^2.0.0" }
                }
            }
        });

        let map = collect_dependencies(&lockfile, false).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(versions(&map, "a"), vec!["1.0.0"]);
    }

    #[test]
    fn diamond_dependencies_are_deduplicated() {
        let lockfile = json!({
            "dependencies": {
                "a": {
                    "version": "1.0.0",
                    "dependencies": { "shared": { "version": "1.2.3" } }
                },
                "b": {
                    "version": "1.0.0",
                    "dependencies": { "shared": { "version": "1.2.3" } }
                },
                "shared": { "version": "1.2.3" }
            }
        });

        let map = collect_dependencies(&lockfile, false).unwrap();
        assert_eq!(versions(&map, "shared"), vec!["1.2.3"]);
        assert_eq!(versions(&map, "a"), vec!["1.0.0"]);
    }

    #[test]
    fn skip_dev_excludes_node_and_its_subtree() {
        let lockfile = json!({
            "dependencies": {
                "mocha": {
                    "version": "10.0.0",
                    "dev": true,
                    "dependencies": { "only-via-mocha": { "version": "0.1.0" } }
                },
                "express": { "version": "4.18.2" }
            }
        });

        let map = collect_dependencies(&lockfile, true).unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("express"));
        assert!(!map.contains_key("mocha"));
        assert!(!map.contains_key("only-via-mocha"));
    }

    #[test]
    fn dev_dependencies_kept_when_not_skipping() {
        let lockfile = json!({
            "packages": {},
            "dependencies": {
                "mocha": { "version": "10.0.0", "dev": true }
            }
        });

        let map = collect_dependencies(&lockfile, false).unwrap();
        assert_eq!(versions(&map, "mocha"), vec!["10.0.0"]);
    }

    #[test]
    fn non_boolean_dev_flag_is_treated_as_false() {
        let lockfile = json!({
            "dependencies": { "a": { "version": "1.0.0", "dev": "yes" } }
        });

        let map = collect_dependencies(&lockfile, true).unwrap();
        assert_eq!(versions(&map, "a"), vec!["1.0.0"]);
    }

    #[test]
    fn v1_and_v3_keys_normalize_to_same_name() {
        let v1 = json!({
            "dependencies": {
                "a": {
                    "version": "1.0.0",
                    "dependencies": { "@scope/b": { "version": "2.0.0" } }
                }
            }
        });
        let v3 = json!({
            "lockfileVersion": 3,
            "packages": {
                "node_modules/a": { "version": "1.0.0" },
                "node_modules/a/node_modules/@scope/b": { "version": "2.0.0" }
            }
        });

        assert_eq!(
            collect_dependencies(&v1, false).unwrap(),
            collect_dependencies(&v3, false).unwrap()
        );
    }

    #[test]
    fn missing_version_is_schema_violation() {
        let lockfile = json!({
            "dependencies": {
                "a": { "version": "1.0.0", "dependencies": { "broken": { "dev": false } } }
            }
        });

        let err = collect_dependencies(&lockfile, false).unwrap_err();
        match err {
            BulkAuditError::SchemaViolation { location, reason } => {
                assert_eq!(location, "dependencies/a/dependencies/broken");
                assert!(reason.contains("missing version"));
            }
            other => panic!("expected SchemaViolation, got {other:?}"),
        }
    }

    #[test]
    fn versionless_npm_entries_are_schema_violations() {
        let link = json!({
            "lockfileVersion": 3,
            "packages": {
                "": { "name": "monorepo", "version": "1.0.0" },
                "node_modules/a": { "resolved": "packages/a", "link": true },
                "packages/a": { "version": "0.1.0" }
            }
        });
        let root = json!({
            "lockfileVersion": 3,
            "packages": { "": { "name": "unversioned" } }
        });

        for (lockfile, expected) in [(link, "packages/node_modules/a"), (root, "packages/")] {
            match collect_dependencies(&lockfile, false).unwrap_err() {
                BulkAuditError::SchemaViolation { location, reason } => {
                    assert_eq!(location, expected);
                    assert!(reason.contains("missing version"));
                }
                other => panic!("expected SchemaViolation, got {other:?}"),
            }
        }
    }

    #[test]
    fn non_string_version_is_schema_violation() {
        let lockfile = json!({ "dependencies": { "a": { "version": 1 } } });
        let err = collect_dependencies(&lockfile, false).unwrap_err();
        assert!(matches!(err, BulkAuditError::SchemaViolation { .. }));
    }

    #[test]
    fn non_object_node_is_schema_violation() {
        let lockfile = json!({ "lockfileVersion": 2, "packages": { "node_modules/a": "1.0.0" } });
        let err = collect_dependencies(&lockfile, false).unwrap_err();
        assert!(err.to_string().contains("packages/node_modules/a"));
    }

    #[test]
    fn non_object_nested_dependencies_is_schema_violation() {
        let lockfile = json!({
            "dependencies": { "a": { "version": "1.0.0", "dependencies": ["b"] } }
        });
        let err = collect_dependencies(&lockfile, false).unwrap_err();
        assert!(matches!(err, BulkAuditError::SchemaViolation { .. }));
    }

    #[test]
    fn absent_or_null_tree_yields_empty_map() {
        assert!(collect_dependencies(&json!({}), false).unwrap().is_empty());
        assert!(
            collect_dependencies(&json!({ "dependencies": null }), false)
                .unwrap()
                .is_empty()
        );
        assert!(
            collect_dependencies(&json!({ "lockfileVersion": 3 }), false)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn non_object_document_is_rejected() {
        let err = collect_dependencies(&json!([1, 2, 3]), false).unwrap_err();
        assert!(matches!(err, BulkAuditError::SchemaViolation { .. }));
    }

    #[test]
    fn invalid_lockfile_version_is_rejected() {
        for bad in [json!("2"), json!(-1), json!(null), json!(2.5)] {
            let lockfile = json!({ "lockfileVersion": bad, "packages": {} });
            assert!(schema_version(&lockfile).is_err());
        }
    }

    #[test]
    fn tree_shape_dispatch() {
        assert_eq!(TreeShape::from_schema_version(0), TreeShape::Shallow);
        assert_eq!(TreeShape::from_schema_version(1), TreeShape::Recursive);
        assert_eq!(TreeShape::from_schema_version(2), TreeShape::Flat);
        assert_eq!(TreeShape::from_schema_version(3), TreeShape::Flat);
        assert_eq!(TreeShape::Shallow.tree_field(), "dependencies");
        assert_eq!(TreeShape::Recursive.tree_field(), "dependencies");
        assert_eq!(TreeShape::Flat.tree_field(), "packages");
        assert!(!TreeShape::Shallow.recurses());
        assert!(TreeShape::Recursive.recurses());
        assert!(!TreeShape::Flat.recurses());
    }

    #[test]
    fn v0_reads_top_level_dependencies_only() {
        let lockfile = json!({
            "lockfileVersion": 0,
            "dependencies": {
                "a": {
                    "version": "1.0.0",
                    "dependencies": { "b": { "version": "2.0.0" } }
                }
            }
        });

        let out = collect_dependencies(&lockfile, false).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out["a"].contains("1.0.0"));
        assert!(!out.contains_key("b"));
    }

    #[test]
    fn package_name_from_key_cases() {
        assert_eq!(package_name_from_key("kind-of"), "kind-of");
        assert_eq!(package_name_from_key("node_modules/lodash"), "lodash");
        assert_eq!(package_name_from_key("node_modules/@types/node"), "@types/node");
        assert_eq!(
            package_name_from_key("node_modules/a/node_modules/b"),
            "b"
        );
        assert_eq!(package_name_from_key("packages/app/node_modules/c"), "c");
        assert_eq!(package_name_from_key(""), "");
    }

    #[test]
    fn noise_filter_skips_root_and_non_registry_versions() {
        let filter = KnownNoiseFilter;
        assert!(filter.should_skip("", "1.0.0"));
        assert!(filter.should_skip("alias", "npm:lodash@4.17.21"));
        assert!(filter.should_skip("local", "file:../local"));
        assert!(filter.should_skip("linked", "link:../linked"));
        assert!(filter.should_skip("remote", "git+https://github.com/a/b.git"));
        assert!(filter.should_skip("gh", "github:a/b"));
        assert!(filter.should_skip("tarball", "https://example.com/x.tgz"));
        assert!(!filter.should_skip("lodash", "4.17.21"));
    }

    #[test]
    fn filtered_node_still_recurses_into_children() {
        let lockfile = json!({
            "dependencies": {
                "local-pkg": {
                    "version": "file:../local-pkg",
                    "dependencies": { "ms": { "version": "2.1.3" } }
                }
            }
        });

        let map = collect_dependencies(&lockfile, false).unwrap();
        assert!(!map.contains_key("local-pkg"));
        assert_eq!(versions(&map, "ms"), vec!["2.1.3"]);
    }

    struct DenyList(&'static [&'static str]);

    impl DependencyFilter for DenyList {
        fn should_skip(&self, name: &str, _version: &str) -> bool {
            self.0.contains(&name)
        }
    }

    #[test]
    fn custom_filter_is_applied() {
        let lockfile = json!({
            "dependencies": {
                "a": { "version": "1.0.0" },
                "b": { "version": "1.0.0" }
            }
        });

        let walker = LockfileWalker::new(Box::new(DenyList(&["a"])));
        let mut map = DependencyMap::new();
        walker.collect(&lockfile, false, &mut map).unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn collect_appends_to_existing_accumulator() {
        let mut map = DependencyMap::new();
        map.entry("ms".to_owned())
            .or_default()
            .insert("2.0.0".to_owned());

        let lockfile = json!({ "dependencies": { "ms": { "version": "2.1.1" } } });
        LockfileWalker::default()
            .collect(&lockfile, false, &mut map)
            .unwrap();

        assert_eq!(versions(&map, "ms"), vec!["2.0.0", "2.1.1"]);
    }

    #[test]
    fn depth_ceiling_is_enforced() {
        let mut node = json!({ "version": "1.0.0" });
        for _ in 0..(MAX_TREE_DEPTH + 4) {
            node = json!({ "version": "1.0.0", "dependencies": { "deep": node } });
        }
        let lockfile = json!({ "dependencies": { "deep": node } });

        let err = collect_dependencies(&lockfile, false).unwrap_err();
        assert!(err.to_string().contains("deeper than"));
    }
}
