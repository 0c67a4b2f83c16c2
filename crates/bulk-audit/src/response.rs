//! 벌크 감사 응답 파서
//!
//! [`AdvisoryResponseParser`]는 패키지 이름을 키로 하는 응답 객체를
//! [`Advisory`] 목록으로 변환합니다.
//!
//! # 실패 정책
//!
//! - 최상위 값이 객체가 아님 -> `ResponseRejected`
//! - 키 아래 값이 객체가 아님, CWE 요소가 문자열이 아님 -> `SchemaViolation`
//! - CVSS 점수/벡터 결함 -> 해당 필드만 `None` (경고 로그 + 메트릭)
//!
//! 키가 N개인 응답은 항상 정확히 N개의 권고를 만듭니다.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use lockwatch_core::metrics as m;

use crate::advisory::Advisory;
use crate::cvss::CvssV3;
use crate::error::BulkAuditError;

/// 점수를 사용할 수 없을 때의 센티널 값
const NO_SCORE: f64 = -1.0;

/// 지원하는 CVSS 벡터 접두어
const CVSS_V3_PREFIX: &str = "CVSS:3";

/// 벌크 감사 응답 파서
#[derive(Debug, Default, Clone, Copy)]
pub struct AdvisoryResponseParser;

impl AdvisoryResponseParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 응답 JSON을 권고 목록으로 변환합니다.
    ///
    /// # Errors
    ///
    /// 구조적으로 잘못된 응답이면 `ResponseRejected` 또는 `SchemaViolation`
    pub fn parse(&self, response: &Value) -> Result<Vec<Advisory>, BulkAuditError> {
        let entries = response.as_object().ok_or_else(|| {
            BulkAuditError::ResponseRejected(format!(
                "expected a JSON object, got {}",
                json_type(response)
            ))
        })?;

        debug!(keys = entries.len(), "parsing bulk audit response");

        entries
            .iter()
            .map(|(module_name, value)| {
                let object = value.as_object().ok_or_else(|| {
                    BulkAuditError::schema(
                        module_name,
                        format!("expected an advisory object, got {}", json_type(value)),
                    )
                })?;
                parse_advisory(module_name, object)
            })
            .collect()
    }
}

fn parse_advisory(
    module_name: &str,
    object: &Map<String, Value>,
) -> Result<Advisory, BulkAuditError> {
    let mut advisory = Advisory::new(module_name);
    advisory.id = opt_string(object, "id");
    advisory.title = opt_string(object, "title");
    advisory.vulnerable_versions = opt_string(object, "vulnerable_versions");
    advisory.severity = opt_string(object, "severity");
    advisory.url = opt_string(object, "url");
    advisory.cwes = parse_cwes(module_name, object)?;
    advisory.cvss_v3 = object
        .get("cvss")
        .and_then(Value::as_object)
        .and_then(|cvss| parse_cvss(module_name, cvss));
    Ok(advisory)
}

/// 문자열은 그대로, 다른 스칼라는 텍스트 표현으로, null/누락은 `None`
fn opt_string(object: &Map<String, Value>, field: &str) -> Option<String> {
    match object.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn parse_cwes(
    module_name: &str,
    object: &Map<String, Value>,
) -> Result<Vec<String>, BulkAuditError> {
    let Some(Value::Array(items)) = object.get("cwe") else {
        return Ok(Vec::new());
    };

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            item.as_str().map(str::to_owned).ok_or_else(|| {
                BulkAuditError::schema(
                    format!("{module_name}/cwe/{idx}"),
                    format!("CWE identifier must be a string, got {}", json_type(item)),
                )
            })
        })
        .collect()
}

fn parse_score(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(NO_SCORE),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(NO_SCORE),
        _ => NO_SCORE,
    }
}

fn parse_cvss(module_name: &str, cvss: &Map<String, Value>) -> Option<CvssV3> {
    let score = parse_score(cvss.get("score"));
    if score.is_nan() || score < 0.0 {
        debug!(module = module_name, "ignoring CVSS block without a usable score");
        degraded("cvss_score");
        return None;
    }

    let Some(vector) = opt_string(cvss, "vectorString") else {
        warn!(module = module_name, score, "CVSS block without a vector in audit response");
        degraded("cvss_vector");
        return None;
    };

    if !vector.starts_with(CVSS_V3_PREFIX) {
        warn!(
            module = module_name,
            vector = %vector,
            "unsupported CVSS vector format in audit response"
        );
        degraded("cvss_vector");
        return None;
    }

    match CvssV3::new(vector.as_str(), score) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(
                module = module_name,
                vector = %vector,
                error = %e,
                "invalid CVSS vector in audit response"
            );
            degraded("cvss_vector");
            None
        }
    }
}

fn degraded(field: &'static str) {
    metrics::counter!(m::BULK_AUDIT_DEGRADED_FIELDS_TOTAL, m::LABEL_FIELD => field).increment(1);
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
