//! 에러 타입: 도메인별 에러 정의

/// Lockwatch 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LockwatchError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 벌크 감사 에러
    #[error("audit error: {0}")]
    Audit(#[from] AuditError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 벌크 감사 에러
///
/// 호출자가 "네트워크 없음"과 "잘못된 데이터"를 구분할 수 있도록
/// 치명적 실패를 세 종류로 나눕니다.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// lockfile 또는 응답의 구조가 필수 스키마를 위반함
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// 감사 서비스에 도달하지 못했거나 서비스가 에러를 반환함
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// 감사 서비스 응답을 최상위에서 해석할 수 없음
    #[error("response rejected: {0}")]
    ResponseRejected(String),

    /// 그 밖의 감사 실패 (파일 읽기, 모듈 설정 등)
    #[error("audit failed: {0}")]
    Failed(String),
}
