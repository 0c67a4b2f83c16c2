//! 벌크 감사 클라이언트
//!
//! [`BulkAuditClient`]는 lockfile 순회 -> 페이로드 인코딩 -> 전송 -> 응답 파싱을
//! 순서대로 수행합니다. 내부 가변 상태가 없으므로 여러 스레드에서 공유할 수 있으며,
//! 호출마다 별도의 [`DependencyMap`]을 넘겨야 합니다.
//!
//! # 사용 예시
//!
//! ```ignore
//! use std::sync::Arc;
//! use lockwatch_bulk_audit::{BulkAuditClient, BulkAuditConfig, HttpTransport};
//!
//! let config = BulkAuditConfig::default();
//! let transport = Arc::new(HttpTransport::new(&config)?);
//! let client = BulkAuditClient::new(config, transport)?;
//! let report = client.audit_file("package-lock.json".as_ref())?;
//! println!("{} advisories", report.advisories.len());
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};

use lockwatch_core::metrics as m;
use lockwatch_core::types::Severity;

use crate::advisory::Advisory;
use crate::config::BulkAuditConfig;
use crate::error::BulkAuditError;
use crate::lockfile::{DependencyFilter, DependencyMap, LockfileWalker};
use crate::payload;
use crate::response::AdvisoryResponseParser;
use crate::transport::{AuditTransport, HttpTransport};

/// 벌크 감사 클라이언트
pub struct BulkAuditClient {
    config: BulkAuditConfig,
    transport: Arc<dyn AuditTransport>,
    walker: LockfileWalker,
    parser: AdvisoryResponseParser,
}

impl BulkAuditClient {
    /// 설정과 전송 계층으로 클라이언트를 생성합니다.
    ///
    /// # Errors
    ///
    /// 설정 검증 실패 시 `BulkAuditError::Config`
    pub fn new(
        config: BulkAuditConfig,
        transport: Arc<dyn AuditTransport>,
    ) -> Result<Self, BulkAuditError> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            walker: LockfileWalker::default(),
            parser: AdvisoryResponseParser::new(),
        })
    }

    /// 기본 [`HttpTransport`]를 사용하는 클라이언트를 생성합니다.
    pub fn with_http_transport(config: BulkAuditConfig) -> Result<Self, BulkAuditError> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Self::new(config, transport)
    }

    /// lockfile 항목 제외 정책을 교체합니다.
    pub fn with_filter(mut self, filter: Box<dyn DependencyFilter>) -> Self {
        self.walker = LockfileWalker::new(filter);
        self
    }

    /// 현재 설정
    pub fn config(&self) -> &BulkAuditConfig {
        &self.config
    }

    /// lockfile 문서를 감사합니다.
    ///
    /// 감사한 (이름, 버전) 쌍은 `dependencies`에 누적됩니다.
    pub fn submit_lockfile(
        &self,
        lockfile: &Value,
        dependencies: &mut DependencyMap,
        skip_dev: bool,
    ) -> Result<Vec<Advisory>, BulkAuditError> {
        self.submit(lockfile, dependencies, skip_dev)
    }

    /// 평탄한 매니페스트 문서를 감사합니다.
    ///
    /// lockfile과 같은 파이프라인을 거치며 `dependencies`가 같은 방식으로 채워집니다.
    pub fn submit_manifest(
        &self,
        manifest: &Value,
        dependencies: &mut DependencyMap,
        skip_dev: bool,
    ) -> Result<Vec<Advisory>, BulkAuditError> {
        self.submit(manifest, dependencies, skip_dev)
    }

    /// lockfile 경로를 읽어 감사하고 보고서를 반환합니다.
    ///
    /// devDependencies 제외 여부는 설정의 `skip_dev_dependencies`를 따릅니다.
    ///
    /// # Errors
    ///
    /// - 파일 읽기 실패: `Io`
    /// - 크기 초과: `FileTooBig`
    /// - JSON 파싱 실패: `LockfileParse`
    /// - 감사 실패: `SchemaViolation`, `TransportFailure`, `ResponseRejected`
    pub fn audit_file(&self, path: &Path) -> Result<AuditReport, BulkAuditError> {
        let source_file = path.display().to_string();
        let lockfile = self.read_lockfile(path, &source_file)?;

        let mut dependencies = DependencyMap::new();
        let advisories = self.submit_lockfile(
            &lockfile,
            &mut dependencies,
            self.config.skip_dev_dependencies,
        )?;

        Ok(AuditReport {
            audit_id: uuid::Uuid::new_v4().to_string(),
            source_file,
            dependencies,
            advisories,
            audited_at: Utc::now(),
        })
    }

    fn read_lockfile(&self, path: &Path, source_file: &str) -> Result<Value, BulkAuditError> {
        let io_error = |source| BulkAuditError::Io {
            path: source_file.to_owned(),
            source,
        };

        let size = usize::try_from(std::fs::metadata(path).map_err(io_error)?.len())
            .unwrap_or(usize::MAX);
        if size > self.config.max_lockfile_size {
            return Err(BulkAuditError::FileTooBig {
                path: source_file.to_owned(),
                size,
                max: self.config.max_lockfile_size,
            });
        }

        let content = std::fs::read_to_string(path).map_err(io_error)?;
        debug!(path = source_file, bytes = content.len(), "read lockfile");

        serde_json::from_str(&content).map_err(|e| BulkAuditError::LockfileParse {
            path: source_file.to_owned(),
            reason: e.to_string(),
        })
    }

    fn submit(
        &self,
        document: &Value,
        dependencies: &mut DependencyMap,
        skip_dev: bool,
    ) -> Result<Vec<Advisory>, BulkAuditError> {
        let started = Instant::now();

        let result = self
            .walker
            .collect(document, skip_dev, dependencies)
            .and_then(|()| self.exchange(dependencies));

        let label = match &result {
            Ok(_) => "success",
            Err(e) => e.result_label(),
        };
        metrics::counter!(m::BULK_AUDIT_REQUESTS_TOTAL, m::LABEL_RESULT => label).increment(1);
        metrics::histogram!(m::BULK_AUDIT_REQUEST_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        result
    }

    fn exchange(&self, dependencies: &DependencyMap) -> Result<Vec<Advisory>, BulkAuditError> {
        let payload = payload::encode(dependencies);
        let pairs = payload::pair_count(dependencies);
        metrics::counter!(m::BULK_AUDIT_PACKAGES_SUBMITTED_TOTAL).increment(pairs as u64);

        info!(
            endpoint = %self.config.url,
            packages = dependencies.len(),
            versions = pairs,
            "submitting bulk audit request"
        );

        let response = self.transport.submit(&self.config.url, &payload)?;
        let advisories = self.parser.parse(&response)?;

        metrics::counter!(m::BULK_AUDIT_ADVISORIES_TOTAL).increment(advisories.len() as u64);
        info!(advisories = advisories.len(), "bulk audit completed");

        Ok(advisories)
    }
}

/// lockfile 하나의 감사 결과
#[derive(Debug, Clone)]
pub struct AuditReport {
    /// 감사 고유 ID (UUID v4)
    pub audit_id: String,
    /// 감사한 lockfile 경로
    pub source_file: String,
    /// 제출된 (이름, 버전) 쌍
    pub dependencies: DependencyMap,
    /// 보고된 권고 목록
    pub advisories: Vec<Advisory>,
    /// 감사 시각 (UTC)
    pub audited_at: DateTime<Utc>,
}

impl AuditReport {
    /// 제출된 고유 패키지 이름 수
    pub fn package_count(&self) -> usize {
        self.dependencies.len()
    }

    /// 제출된 (이름, 버전) 쌍 수
    pub fn version_count(&self) -> usize {
        payload::pair_count(&self.dependencies)
    }

    /// 심각도별 권고 수를 반환합니다.
    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for advisory in &self.advisories {
            match advisory.severity_level() {
                Some(Severity::Critical) => counts.critical += 1,
                Some(Severity::High) => counts.high += 1,
                Some(Severity::Medium) => counts.medium += 1,
                Some(Severity::Low) => counts.low += 1,
                Some(Severity::Info) => counts.info += 1,
                None => counts.unrated += 1,
            }
        }
        counts
    }

    /// `min` 이상의 심각도를 가진 권고 수를 반환합니다.
    ///
    /// 심각도를 알 수 없는 권고는 `Info`로 취급합니다.
    pub fn count_at_or_above(&self, min: Severity) -> usize {
        self.advisories
            .iter()
            .filter(|a| a.severity_level().unwrap_or(Severity::Info) >= min)
            .count()
    }
}

/// 심각도별 권고 개수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    /// 심각도 레이블도 CVSS도 없는 권고
    pub unrated: usize,
}

impl SeverityCounts {
    /// 전체 권고 수
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info + self.unrated
    }
}
