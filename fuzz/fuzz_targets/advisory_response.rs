#![no_main]

use libfuzzer_sys::fuzz_target;
use lockwatch_bulk_audit::AdvisoryResponseParser;

fuzz_target!(|data: &[u8]| {
    let Ok(response) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    if let Ok(advisories) = AdvisoryResponseParser::new().parse(&response) {
        let entries = response.as_object().map_or(0, |m| m.len());
        assert_eq!(advisories.len(), entries);
        for advisory in &advisories {
            if let Some(cvss) = &advisory.cvss_v3 {
                assert!((0.0..=10.0).contains(&cvss.base_score()));
            }
        }
    }
});
