//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `lockwatch_`
//! - 모듈명: `bulk_audit_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(lockwatch_core::metrics::BULK_AUDIT_ADVISORIES_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (success, transport_failure, rejected, schema_violation)
pub const LABEL_RESULT: &str = "result";

/// 저하된 필드 레이블 키 (cvss_score, cvss_vector)
pub const LABEL_FIELD: &str = "field";

// ─── Bulk Audit 메트릭 ─────────────────────────────────────────────

/// Bulk Audit: 감사 요청 수 (counter, label: result)
pub const BULK_AUDIT_REQUESTS_TOTAL: &str = "lockwatch_bulk_audit_requests_total";

/// Bulk Audit: 페이로드에 담긴 (이름, 버전) 쌍 수 (counter)
pub const BULK_AUDIT_PACKAGES_SUBMITTED_TOTAL: &str =
    "lockwatch_bulk_audit_packages_submitted_total";

/// Bulk Audit: 노이즈 필터로 제외된 의존성 수 (counter)
pub const BULK_AUDIT_DEPENDENCIES_SKIPPED_TOTAL: &str =
    "lockwatch_bulk_audit_dependencies_skipped_total";

/// Bulk Audit: 파싱된 권고 수 (counter)
pub const BULK_AUDIT_ADVISORIES_TOTAL: &str = "lockwatch_bulk_audit_advisories_total";

/// Bulk Audit: 부분 저하된 응답 필드 수 (counter, label: field)
pub const BULK_AUDIT_DEGRADED_FIELDS_TOTAL: &str = "lockwatch_bulk_audit_degraded_fields_total";

/// Bulk Audit: 요청 왕복 소요 시간 (histogram, 초)
pub const BULK_AUDIT_REQUEST_DURATION_SECONDS: &str =
    "lockwatch_bulk_audit_request_duration_seconds";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더가 없으면 아무 일도 하지 않습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        BULK_AUDIT_REQUESTS_TOTAL,
        "Total number of bulk audit requests by result"
    );
    describe_counter!(
        BULK_AUDIT_PACKAGES_SUBMITTED_TOTAL,
        "Total number of package/version pairs submitted for audit"
    );
    describe_counter!(
        BULK_AUDIT_DEPENDENCIES_SKIPPED_TOTAL,
        "Total number of lockfile entries excluded as known noise"
    );
    describe_counter!(
        BULK_AUDIT_ADVISORIES_TOTAL,
        "Total number of advisories parsed from audit responses"
    );
    describe_counter!(
        BULK_AUDIT_DEGRADED_FIELDS_TOTAL,
        "Total number of optional advisory fields dropped as malformed or unsupported"
    );
    describe_histogram!(
        BULK_AUDIT_REQUEST_DURATION_SECONDS,
        "Bulk audit request round-trip time in seconds"
    );
}
