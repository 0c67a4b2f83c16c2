//! Lockwatch 공통 크레이트
//!
//! 모든 Lockwatch 크레이트가 공유하는 에러 계층, 설정, 도메인 타입,
//! 메트릭 이름 상수를 정의합니다.
//!
//! - [`error`]: 최상위 에러 (`LockwatchError`)와 도메인별 에러
//! - [`config`]: `lockwatch.toml` 로딩, 환경변수 오버라이드, 검증
//! - [`types`]: 공통 도메인 타입 (`Severity`)
//! - [`metrics`]: 메트릭 이름 및 설명 등록

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{AuditError, ConfigError, LockwatchError};

// 설정
pub use config::{AuditConfig, GeneralConfig, LockwatchConfig};

// 도메인 타입
pub use types::Severity;
