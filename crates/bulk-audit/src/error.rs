//! 벌크 감사 에러 타입
//!
//! [`BulkAuditError`]는 벌크 감사 모듈 내에서 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<BulkAuditError> for LockwatchError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 자연스럽게 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **치명적 감사 실패**: `SchemaViolation`, `TransportFailure`, `ResponseRejected`
//! - **lockfile 로딩**: `LockfileParse`, `Io`, `FileTooBig`
//! - **설정**: `Config`
//!
//! 선택적 보강 필드(CVSS 점수, 벡터)의 결함은 에러가 아니며
//! 파서가 해당 필드만 비워 둡니다.

use lockwatch_core::error::{AuditError, LockwatchError};

/// 벌크 감사 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum BulkAuditError {
    /// 필수 필드 누락 또는 객체가 필요한 위치의 비객체 값
    #[error("schema violation at '{location}': {reason}")]
    SchemaViolation {
        /// 위반 위치 (lockfile 키 경로 또는 응답 키)
        location: String,
        /// 위반 사유
        reason: String,
    },

    /// 감사 서비스 연결 실패 또는 서비스 에러 응답
    #[error("transport failure: {endpoint}: {reason}")]
    TransportFailure {
        /// 요청 엔드포인트
        endpoint: String,
        /// 실패 사유
        reason: String,
    },

    /// 응답을 최상위 수준에서 해석할 수 없음
    #[error("response rejected: {0}")]
    ResponseRejected(String),

    /// lockfile JSON 파싱 실패
    #[error("lockfile parse error: {path}: {reason}")]
    LockfileParse {
        /// 파싱 대상 파일 경로
        path: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 파일 크기 초과
    #[error("file too large: {path}: {size} bytes (max: {max})")]
    FileTooBig {
        /// 파일 경로
        path: String,
        /// 실제 파일 크기 (바이트)
        size: usize,
        /// 최대 허용 크기 (바이트)
        max: usize,
    },
}

impl BulkAuditError {
    /// 스키마 위반 에러를 생성합니다.
    pub fn schema(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// 호출자가 재시도를 고려할 수 있는 에러인지 반환합니다.
    ///
    /// 전송 실패만 해당하며, 이 크레이트는 스스로 재시도하지 않습니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransportFailure { .. })
    }

    /// 메트릭 `result` 레이블 값을 반환합니다.
    pub(crate) fn result_label(&self) -> &'static str {
        match self {
            Self::SchemaViolation { .. } => "schema_violation",
            Self::TransportFailure { .. } => "transport_failure",
            Self::ResponseRejected(_) => "rejected",
            _ => "error",
        }
    }
}

impl From<BulkAuditError> for LockwatchError {
    fn from(err: BulkAuditError) -> Self {
        match err {
            BulkAuditError::SchemaViolation { location, reason } => LockwatchError::Audit(
                AuditError::SchemaViolation(format!("{location}: {reason}")),
            ),
            BulkAuditError::TransportFailure { endpoint, reason } => LockwatchError::Audit(
                AuditError::TransportFailure(format!("{endpoint}: {reason}")),
            ),
            BulkAuditError::ResponseRejected(msg) => {
                LockwatchError::Audit(AuditError::ResponseRejected(msg))
            }
            BulkAuditError::LockfileParse { path, reason } => LockwatchError::Audit(
                AuditError::Failed(format!("lockfile parse error: {path}: {reason}")),
            ),
            BulkAuditError::Config { field, reason } => LockwatchError::Audit(AuditError::Failed(
                format!("config error: {field}: {reason}"),
            )),
            BulkAuditError::Io { path, source } => {
                LockwatchError::Audit(AuditError::Failed(format!("io error: {path}: {source}")))
            }
            BulkAuditError::FileTooBig { path, size, max } => LockwatchError::Audit(
                AuditError::Failed(format!("file too large: {path}: {size} bytes (max: {max})")),
            ),
        }
    }
}
