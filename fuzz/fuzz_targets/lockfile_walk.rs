#![no_main]

use libfuzzer_sys::fuzz_target;
use lockwatch_bulk_audit::{DependencyMap, LockfileWalker};

fuzz_target!(|data: &[u8]| {
    let Ok(document) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let walker = LockfileWalker::default();
    for skip_dev in [false, true] {
        let mut deps = DependencyMap::new();
        if walker.collect(&document, skip_dev, &mut deps).is_ok() {
            // 빈 이름과 빈 버전 집합은 맵에 들어가지 않음
            assert!(deps.iter().all(|(name, versions)| !name.is_empty() && !versions.is_empty()));
        }
    }
});
