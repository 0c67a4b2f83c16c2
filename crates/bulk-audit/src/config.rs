//! 벌크 감사 설정
//!
//! [`BulkAuditConfig`]는 core의 [`AuditConfig`](lockwatch_core::config::AuditConfig)에서
//! 파생되며, 모듈 고유 설정(User-Agent)을 추가합니다.
//!
//! # 사용 예시
//!
//! ```
//! use lockwatch_bulk_audit::BulkAuditConfig;
//!
//! // 기본값으로 생성
//! let config = BulkAuditConfig::default();
//! config.validate().unwrap();
//!
//! // 빌더로 생성
//! use lockwatch_bulk_audit::BulkAuditConfigBuilder;
//!
//! let config = BulkAuditConfigBuilder::new()
//!     .skip_dev_dependencies(true)
//!     .timeout_secs(10)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};

use lockwatch_core::config::DEFAULT_AUDIT_URL;

use crate::error::BulkAuditError;

/// npm CLI와 호환되는 기본 User-Agent
pub const DEFAULT_USER_AGENT: &str = "npm/6.1.0 node/v10.5.0 linux x64";

/// 벌크 감사 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAuditConfig {
    /// 벌크 권고 조회 엔드포인트 URL
    pub url: String,
    /// devDependencies 제외 여부
    pub skip_dev_dependencies: bool,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 503 응답 재시도 횟수 (HTTP 전송 계층에서만 사용)
    pub max_retries: u32,
    /// 재시도 기본 지연 (밀리초)
    pub retry_delay_ms: u64,
    /// lockfile 최대 허용 크기 (바이트)
    pub max_lockfile_size: usize,

    // --- 모듈 고유 확장 ---
    /// 요청에 사용할 User-Agent
    pub user_agent: String,
}

impl Default for BulkAuditConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_AUDIT_URL.to_owned(),
            skip_dev_dependencies: false,
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 1_000,
            max_lockfile_size: 50 * 1024 * 1024, // 50 MB
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

/// 설정 상한값 상수
const MAX_TIMEOUT_SECS: u64 = 300;
const MAX_RETRIES: u32 = 10;
const MAX_RETRY_DELAY_MS: u64 = 60_000;
const MAX_LOCKFILE_SIZE: usize = 200 * 1024 * 1024; // 200 MB

impl BulkAuditConfig {
    /// core의 `AuditConfig`에서 모듈 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값을 사용합니다.
    pub fn from_core(core: &lockwatch_core::config::AuditConfig) -> Self {
        Self {
            url: core.url.clone(),
            skip_dev_dependencies: core.skip_dev_dependencies,
            timeout_secs: core.timeout_secs,
            max_retries: core.max_retries,
            retry_delay_ms: core.retry_delay_ms,
            max_lockfile_size: core.max_lockfile_size,
            ..Self::default()
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `url`: `http://` 또는 `https://`로 시작
    /// - `timeout_secs`: 1-300
    /// - `max_retries`: 0-10
    /// - `retry_delay_ms`: 0-60000
    /// - `max_lockfile_size`: 1-209715200 (200MB)
    /// - `user_agent`: 비어있으면 안 됨
    pub fn validate(&self) -> Result<(), BulkAuditError> {
        if !(self.url.starts_with("https://") || self.url.starts_with("http://")) {
            return Err(BulkAuditError::Config {
                field: "url".to_owned(),
                reason: "must start with http:// or https://".to_owned(),
            });
        }

        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(BulkAuditError::Config {
                field: "timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_TIMEOUT_SECS}"),
            });
        }

        if self.max_retries > MAX_RETRIES {
            return Err(BulkAuditError::Config {
                field: "max_retries".to_owned(),
                reason: format!("must be 0-{MAX_RETRIES}"),
            });
        }

        if self.retry_delay_ms > MAX_RETRY_DELAY_MS {
            return Err(BulkAuditError::Config {
                field: "retry_delay_ms".to_owned(),
                reason: format!("must be 0-{MAX_RETRY_DELAY_MS}"),
            });
        }

        if self.max_lockfile_size == 0 || self.max_lockfile_size > MAX_LOCKFILE_SIZE {
            return Err(BulkAuditError::Config {
                field: "max_lockfile_size".to_owned(),
                reason: format!("must be 1-{MAX_LOCKFILE_SIZE}"),
            });
        }

        if self.user_agent.trim().is_empty() {
            return Err(BulkAuditError::Config {
                field: "user_agent".to_owned(),
                reason: "user_agent must not be empty".to_owned(),
            });
        }

        Ok(())
    }
}

/// [`BulkAuditConfig`] 빌더
///
/// 유연한 설정 구성 및 빌드 시 유효성 검증을 제공합니다.
#[derive(Default)]
pub struct BulkAuditConfigBuilder {
    config: BulkAuditConfig,
}

impl BulkAuditConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 엔드포인트 URL을 설정합니다.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// devDependencies 제외 여부를 설정합니다.
    pub fn skip_dev_dependencies(mut self, skip: bool) -> Self {
        self.config.skip_dev_dependencies = skip;
        self
    }

    /// 요청 타임아웃(초)을 설정합니다.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// 503 재시도 횟수를 설정합니다.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// 재시도 기본 지연(밀리초)을 설정합니다.
    pub fn retry_delay_ms(mut self, delay: u64) -> Self {
        self.config.retry_delay_ms = delay;
        self
    }

    /// lockfile 최대 크기(바이트)를 설정합니다.
    pub fn max_lockfile_size(mut self, size: usize) -> Self {
        self.config.max_lockfile_size = size;
        self
    }

    /// User-Agent를 설정합니다.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `BulkAuditError::Config` 반환
    pub fn build(self) -> Result<BulkAuditConfig, BulkAuditError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
