//! 벌크 감사 요청 페이로드 인코딩
//!
//! 누적된 [`DependencyMap`]을 감사 서비스가 기대하는 와이어 형식
//! `{ "<name>": ["<version>", ...] }`으로 변환합니다.

use serde_json::{Map, Value};

use crate::lockfile::DependencyMap;

/// 누적기를 요청 페이로드로 인코딩합니다.
///
/// 누적기가 정렬된 맵이므로 키와 버전 배열의 순서는 결정적입니다.
pub fn encode(dependencies: &DependencyMap) -> Value {
    let payload: Map<String, Value> = dependencies
        .iter()
        .map(|(name, versions)| {
            let versions = versions.iter().cloned().map(Value::String).collect();
            (name.clone(), Value::Array(versions))
        })
        .collect();
    Value::Object(payload)
}

/// 페이로드에 담긴 (이름, 버전) 쌍의 수
pub fn pair_count(dependencies: &DependencyMap) -> usize {
    dependencies.values().map(|versions| versions.len()).sum()
}
