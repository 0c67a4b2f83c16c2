//! CVSS v3 벡터 값 객체
//!
//! [`CvssV3`]는 검증된 CVSS 3.0/3.1 벡터 문자열과 기본 점수를 보관합니다.
//! 생성 시 벡터 문법과 각 메트릭 값을 검증하므로, 생성에 성공한 값은
//! 항상 8개의 기본 메트릭을 모두 가집니다.
//!
//! # 벡터 형식
//!
//! ```text
//! CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:N/A:N
//! ```
//!
//! 시간(E, RL, RC) 및 환경(CR, IR, AR, M*) 메트릭은 선택 사항이며
//! 값만 검증합니다.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use lockwatch_core::types::Severity;

/// CVSS 벡터 검증 에러
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CvssError {
    /// `CVSS:3.0` 또는 `CVSS:3.1`로 시작하지 않음
    #[error("unsupported vector prefix: '{0}'")]
    InvalidPrefix(String),

    /// `METRIC:VALUE` 형식이 아닌 구성 요소
    #[error("malformed vector component: '{0}'")]
    MalformedComponent(String),

    /// 알 수 없는 메트릭
    #[error("unknown metric: '{0}'")]
    UnknownMetric(String),

    /// 메트릭에 허용되지 않는 값
    #[error("invalid value '{value}' for metric {metric}")]
    InvalidValue {
        /// 메트릭 이름
        metric: String,
        /// 주어진 값
        value: String,
    },

    /// 같은 메트릭이 두 번 이상 나타남
    #[error("duplicate metric: {0}")]
    DuplicateMetric(String),

    /// 필수 기본 메트릭 누락
    #[error("missing base metric: {0}")]
    MissingMetric(&'static str),

    /// 점수가 유한하지 않거나 [0, 10] 범위를 벗어남
    #[error("base score out of range: {0}")]
    ScoreOutOfRange(f64),
}

macro_rules! metric_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// 벡터 문자열에 쓰이는 한 글자 코드
            pub fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => $code),+
                }
            }
        }
    };
}

metric_enum! {
    /// 공격 벡터 (AV)
    AttackVector {
        /// 네트워크
        Network => "N",
        /// 인접 네트워크
        Adjacent => "A",
        /// 로컬
        Local => "L",
        /// 물리적 접근
        Physical => "P",
    }
}

metric_enum! {
    /// 공격 복잡도 (AC)
    AttackComplexity {
        /// 낮음
        Low => "L",
        /// 높음
        High => "H",
    }
}

metric_enum! {
    /// 필요 권한 (PR)
    PrivilegesRequired {
        /// 없음
        None => "N",
        /// 낮음
        Low => "L",
        /// 높음
        High => "H",
    }
}

metric_enum! {
    /// 사용자 상호작용 (UI)
    UserInteraction {
        /// 불필요
        None => "N",
        /// 필요
        Required => "R",
    }
}

metric_enum! {
    /// 범위 (S)
    Scope {
        /// 변경 없음
        Unchanged => "U",
        /// 변경됨
        Changed => "C",
    }
}

metric_enum! {
    /// 기밀성/무결성/가용성 영향 (C, I, A)
    Impact {
        /// 높음
        High => "H",
        /// 낮음
        Low => "L",
        /// 없음
        None => "N",
    }
}

/// 메트릭별 허용 값 (CVSS 3.x 명세)
const METRIC_VALUES: &[(&str, &[&str])] = &[
    // base
    ("AV", &["N", "A", "L", "P"]),
    ("AC", &["L", "H"]),
    ("PR", &["N", "L", "H"]),
    ("UI", &["N", "R"]),
    ("S", &["U", "C"]),
    ("C", &["H", "L", "N"]),
    ("I", &["H", "L", "N"]),
    ("A", &["H", "L", "N"]),
    // temporal
    ("E", &["X", "H", "F", "P", "U"]),
    ("RL", &["X", "U", "W", "T", "O"]),
    ("RC", &["X", "C", "R", "U"]),
    // environmental
    ("CR", &["X", "H", "M", "L"]),
    ("IR", &["X", "H", "M", "L"]),
    ("AR", &["X", "H", "M", "L"]),
    ("MAV", &["X", "N", "A", "L", "P"]),
    ("MAC", &["X", "L", "H"]),
    ("MPR", &["X", "N", "L", "H"]),
    ("MUI", &["X", "N", "R"]),
    ("MS", &["X", "U", "C"]),
    ("MC", &["X", "H", "L", "N"]),
    ("MI", &["X", "H", "L", "N"]),
    ("MA", &["X", "H", "L", "N"]),
];

fn allowed_values(metric: &str) -> Option<&'static [&'static str]> {
    METRIC_VALUES
        .iter()
        .find(|(name, _)| *name == metric)
        .map(|(_, values)| *values)
}

/// CVSS 정성 심각도 등급
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CvssSeverity {
    /// 0.0
    None,
    /// 0.1 - 3.9
    Low,
    /// 4.0 - 6.9
    Medium,
    /// 7.0 - 8.9
    High,
    /// 9.0 - 10.0
    Critical,
}

impl CvssSeverity {
    /// 공통 [`Severity`]로 변환합니다. `None`은 `Info`가 됩니다.
    pub fn to_severity(self) -> Severity {
        match self {
            Self::None => Severity::Info,
            Self::Low => Severity::Low,
            Self::Medium => Severity::Medium,
            Self::High => Severity::High,
            Self::Critical => Severity::Critical,
        }
    }
}

impl fmt::Display for CvssSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "None",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        };
        f.write_str(label)
    }
}

/// 검증된 CVSS v3 벡터와 기본 점수
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CvssV3 {
    vector: String,
    base_score: f64,
    #[serde(skip)]
    minor_version: u8,
    #[serde(skip)]
    attack_vector: AttackVector,
    #[serde(skip)]
    attack_complexity: AttackComplexity,
    #[serde(skip)]
    privileges_required: PrivilegesRequired,
    #[serde(skip)]
    user_interaction: UserInteraction,
    #[serde(skip)]
    scope: Scope,
    #[serde(skip)]
    confidentiality: Impact,
    #[serde(skip)]
    integrity: Impact,
    #[serde(skip)]
    availability: Impact,
}

impl CvssV3 {
    /// 벡터 문자열과 기본 점수를 검증하여 생성합니다.
    ///
    /// # Errors
    ///
    /// 접두어, 메트릭 문법/값, 중복, 기본 메트릭 누락, 점수 범위 위반 시 [`CvssError`]
    pub fn new(vector: impl Into<String>, base_score: f64) -> Result<Self, CvssError> {
        let vector = vector.into();

        if !base_score.is_finite() || !(0.0..=10.0).contains(&base_score) {
            return Err(CvssError::ScoreOutOfRange(base_score));
        }

        let mut components = vector.split('/');
        let minor_version = match components.next() {
            Some("CVSS:3.0") => 0,
            Some("CVSS:3.1") => 1,
            other => return Err(CvssError::InvalidPrefix(other.unwrap_or_default().to_owned())),
        };

        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
        for component in components {
            let (metric, value) = component
                .split_once(':')
                .ok_or_else(|| CvssError::MalformedComponent(component.to_owned()))?;
            let allowed =
                allowed_values(metric).ok_or_else(|| CvssError::UnknownMetric(metric.to_owned()))?;
            if !allowed.contains(&value) {
                return Err(CvssError::InvalidValue {
                    metric: metric.to_owned(),
                    value: value.to_owned(),
                });
            }
            if seen.insert(metric, value).is_some() {
                return Err(CvssError::DuplicateMetric(metric.to_owned()));
            }
        }

        fn base<T>(
            seen: &BTreeMap<&str, &str>,
            metric: &'static str,
            parse: fn(&str) -> Option<T>,
        ) -> Result<T, CvssError> {
            let value = seen
                .get(metric)
                .copied()
                .ok_or(CvssError::MissingMetric(metric))?;
            parse(value).ok_or_else(|| CvssError::InvalidValue {
                metric: metric.to_owned(),
                value: value.to_owned(),
            })
        }

        let attack_vector = base(&seen, "AV", AttackVector::from_code)?;
        let attack_complexity = base(&seen, "AC", AttackComplexity::from_code)?;
        let privileges_required = base(&seen, "PR", PrivilegesRequired::from_code)?;
        let user_interaction = base(&seen, "UI", UserInteraction::from_code)?;
        let scope = base(&seen, "S", Scope::from_code)?;
        let confidentiality = base(&seen, "C", Impact::from_code)?;
        let integrity = base(&seen, "I", Impact::from_code)?;
        let availability = base(&seen, "A", Impact::from_code)?;

        Ok(Self {
            vector,
            base_score,
            minor_version,
            attack_vector,
            attack_complexity,
            privileges_required,
            user_interaction,
            scope,
            confidentiality,
            integrity,
            availability,
        })
    }

    /// 원본 벡터 문자열
    pub fn vector(&self) -> &str {
        &self.vector
    }

    /// 기본 점수 (0.0 - 10.0)
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    /// 명세 버전 문자열 (`"3.0"` 또는 `"3.1"`)
    pub fn version(&self) -> &'static str {
        if self.minor_version == 0 { "3.0" } else { "3.1" }
    }

    pub fn attack_vector(&self) -> AttackVector {
        self.attack_vector
    }

    pub fn attack_complexity(&self) -> AttackComplexity {
        self.attack_complexity
    }

    pub fn privileges_required(&self) -> PrivilegesRequired {
        self.privileges_required
    }

    pub fn user_interaction(&self) -> UserInteraction {
        self.user_interaction
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn confidentiality(&self) -> Impact {
        self.confidentiality
    }

    pub fn integrity(&self) -> Impact {
        self.integrity
    }

    pub fn availability(&self) -> Impact {
        self.availability
    }

    /// 기본 점수에서 정성 심각도를 계산합니다.
    pub fn base_severity(&self) -> CvssSeverity {
        let score = self.base_score;
        if score == 0.0 {
            CvssSeverity::None
        } else if score < 4.0 {
            CvssSeverity::Low
        } else if score < 7.0 {
            CvssSeverity::Medium
        } else if score < 9.0 {
            CvssSeverity::High
        } else {
            CvssSeverity::Critical
        }
    }
}

impl fmt::Display for CvssV3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.vector)
    }
}
