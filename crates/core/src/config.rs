//! 설정 관리: lockwatch.toml 파싱 및 런타임 설정
//!
//! [`LockwatchConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOCKWATCH_AUDIT_URL=https://...` 형식)
//! 3. 설정 파일 (`lockwatch.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), lockwatch_core::error::LockwatchError> {
//! use lockwatch_core::config::LockwatchConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LockwatchConfig::load("lockwatch.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LockwatchConfig::parse("[audit]\nskip_dev_dependencies = true")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LockwatchError};

/// npm 레지스트리의 벌크 권고 조회 엔드포인트
pub const DEFAULT_AUDIT_URL: &str = "https://registry.npmjs.org/-/npm/v1/security/advisories/bulk";

/// Lockwatch 통합 설정
///
/// `lockwatch.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockwatchConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 벌크 감사 설정
    #[serde(default)]
    pub audit: AuditConfig,
}

impl LockwatchConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LockwatchError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LockwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LockwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LockwatchError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LockwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            LockwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOCKWATCH_{SECTION}_{FIELD}`
    /// 예: `LOCKWATCH_AUDIT_SKIP_DEV_DEPENDENCIES=true`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOCKWATCH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOCKWATCH_GENERAL_LOG_FORMAT");

        // Audit
        override_string(&mut self.audit.url, "LOCKWATCH_AUDIT_URL");
        override_bool(
            &mut self.audit.skip_dev_dependencies,
            "LOCKWATCH_AUDIT_SKIP_DEV_DEPENDENCIES",
        );
        override_u64(&mut self.audit.timeout_secs, "LOCKWATCH_AUDIT_TIMEOUT_SECS");
        override_u32(&mut self.audit.max_retries, "LOCKWATCH_AUDIT_MAX_RETRIES");
        override_u64(
            &mut self.audit.retry_delay_ms,
            "LOCKWATCH_AUDIT_RETRY_DELAY_MS",
        );
        override_usize(
            &mut self.audit.max_lockfile_size,
            "LOCKWATCH_AUDIT_MAX_LOCKFILE_SIZE",
        );
        override_string(&mut self.audit.min_severity, "LOCKWATCH_AUDIT_MIN_SEVERITY");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LockwatchError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // 엔드포인트 스킴 검증
        if !(self.audit.url.starts_with("https://") || self.audit.url.starts_with("http://")) {
            return Err(ConfigError::InvalidValue {
                field: "audit.url".to_owned(),
                reason: "must start with http:// or https://".to_owned(),
            }
            .into());
        }

        if self.audit.timeout_secs == 0 || self.audit.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::InvalidValue {
                field: "audit.timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_TIMEOUT_SECS}"),
            }
            .into());
        }

        if self.audit.max_retries > MAX_RETRIES {
            return Err(ConfigError::InvalidValue {
                field: "audit.max_retries".to_owned(),
                reason: format!("must be 0-{MAX_RETRIES}"),
            }
            .into());
        }

        if self.audit.retry_delay_ms > MAX_RETRY_DELAY_MS {
            return Err(ConfigError::InvalidValue {
                field: "audit.retry_delay_ms".to_owned(),
                reason: format!("must be 0-{MAX_RETRY_DELAY_MS}"),
            }
            .into());
        }

        if self.audit.max_lockfile_size == 0 || self.audit.max_lockfile_size > MAX_LOCKFILE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "audit.max_lockfile_size".to_owned(),
                reason: format!("must be 1-{MAX_LOCKFILE_SIZE}"),
            }
            .into());
        }

        // min_severity 검증
        let valid_severities = ["info", "low", "moderate", "medium", "high", "critical"];
        if !valid_severities.contains(&self.audit.min_severity.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "audit.min_severity".to_owned(),
                reason: format!("must be one of: {}", valid_severities.join(", ")),
            }
            .into());
        }

        Ok(())
    }
}

/// 설정 상한값 상수
const MAX_TIMEOUT_SECS: u64 = 300;
const MAX_RETRIES: u32 = 10;
const MAX_RETRY_DELAY_MS: u64 = 60_000;
const MAX_LOCKFILE_SIZE: usize = 200 * 1024 * 1024; // 200 MB

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 벌크 감사 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// 벌크 권고 조회 엔드포인트 URL
    pub url: String,
    /// devDependencies 제외 여부
    pub skip_dev_dependencies: bool,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 503 응답 재시도 횟수
    pub max_retries: u32,
    /// 재시도 기본 지연 (밀리초, 시도마다 선형 증가)
    pub retry_delay_ms: u64,
    /// lockfile 최대 허용 크기 (바이트)
    pub max_lockfile_size: usize,
    /// 보고 최소 심각도 (info, low, moderate, medium, high, critical)
    pub min_severity: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_AUDIT_URL.to_owned(),
            skip_dev_dependencies: false,
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 1_000,
            max_lockfile_size: 50 * 1024 * 1024, // 50 MB
            min_severity: "low".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
