//! 정규화된 권고 레코드

use serde::Serialize;

use lockwatch_core::types::Severity;

use crate::cvss::CvssV3;

/// 감사 서비스가 보고한 패키지 하나의 취약점 권고
///
/// 선택 필드는 응답에서 누락되었거나 해석할 수 없으면 `None`입니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advisory {
    /// 권고 식별자
    pub id: Option<String>,
    /// 권고 제목
    pub title: Option<String>,
    /// 응답 키에서 가져온 모듈(패키지) 이름
    pub module_name: String,
    /// 취약한 버전 범위 (semver range 원문)
    pub vulnerable_versions: Option<String>,
    /// 서비스가 보고한 심각도 레이블 원문 (예: `"moderate"`)
    pub severity: Option<String>,
    /// CWE 식별자 목록 (응답 순서 유지)
    pub cwes: Vec<String>,
    /// 검증된 CVSS v3 벡터
    pub cvss_v3: Option<CvssV3>,
    /// 권고 상세 URL
    pub url: Option<String>,
}

impl Advisory {
    /// 모듈 이름만 가진 빈 권고를 생성합니다.
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            id: None,
            title: None,
            module_name: module_name.into(),
            vulnerable_versions: None,
            severity: None,
            cwes: Vec::new(),
            cvss_v3: None,
            url: None,
        }
    }

    /// 심각도 레이블을 공통 [`Severity`]로 해석합니다.
    ///
    /// 레이블이 없거나 알 수 없으면 CVSS 기본 점수에서 파생하고,
    /// 둘 다 없으면 `None`입니다.
    pub fn severity_level(&self) -> Option<Severity> {
        self.severity
            .as_deref()
            .and_then(Severity::from_str_loose)
            .or_else(|| {
                self.cvss_v3
                    .as_ref()
                    .map(|cvss| cvss.base_severity().to_severity())
            })
    }
}
