#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use lockwatch_bulk_audit::CvssV3;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// "CVSS:3.x/" 뒤에 붙는 메트릭 부분
    metrics: String,
    minor: bool,
    score: f64,
}

fuzz_target!(|input: FuzzInput| {
    let prefix = if input.minor { "CVSS:3.1/" } else { "CVSS:3.0/" };
    let vector = format!("{prefix}{}", input.metrics);

    if let Ok(cvss) = CvssV3::new(vector.clone(), input.score) {
        assert_eq!(cvss.vector(), vector);
        assert!((0.0..=10.0).contains(&cvss.base_score()));
        let _ = cvss.base_severity();
    }
});
