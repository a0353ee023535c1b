//! 역할 기반 접근 제어 (RBAC).
//!
//! 포털의 세 가지 주체 유형과 라우트/미들웨어가 사용하는 허용 역할 집합.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 사용자 역할.
///
/// 닫힌 열거형이며, 토큰 디코딩 시 알 수 없는 문자열은 역직렬화 단계에서
/// 거부됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 관리자
    Admin,
    /// 강사
    Instructor,
    /// 학습자
    Learner,
}

impl Role {
    /// 모든 역할 (선언 순서).
    pub const ALL: [Role; 3] = [Role::Admin, Role::Instructor, Role::Learner];

    /// 문자열에서 역할 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "instructor" => Some(Role::Instructor),
            "learner" => Some(Role::Learner),
            _ => None,
        }
    }

    /// 소문자 식별자 반환.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Learner => "learner",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Role::Admin => 0b001,
            Role::Instructor => 0b010,
            Role::Learner => 0b100,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 닫힌 역할 집합에 없는 문자열.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("알 수 없는 역할: {0}")]
pub struct UnknownRole(pub String);

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// 허용 역할 집합.
///
/// 빈 집합은 "인증된 주체라면 누구나"를 의미합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    /// 빈 집합 (인증만 요구).
    pub const fn any() -> Self {
        Self(0)
    }

    /// 주어진 역할들로 집합 생성.
    pub fn of(roles: &[Role]) -> Self {
        roles.iter().copied().collect()
    }

    /// 역할 추가.
    #[must_use]
    pub fn with(self, role: Role) -> Self {
        Self(self.0 | role.bit())
    }

    /// 집합이 비어 있는지 확인.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// 역할이 집합에 명시적으로 포함되는지 확인.
    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// 역할이 이 집합을 통과하는지 확인.
    ///
    /// 빈 집합은 모든 역할을 통과시킵니다.
    pub fn permits(&self, role: Role) -> bool {
        self.is_empty() || self.contains(role)
    }

    /// 포함된 역할 순회.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|r| self.contains(*r))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        iter.into_iter().fold(RoleSet::any(), RoleSet::with)
    }
}

impl std::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "*");
        }
        let names: Vec<&str> = self.iter().map(|r| r.as_str()).collect();
        write!(f, "{}", names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("INSTRUCTOR"), Some(Role::Instructor));
        assert_eq!(Role::parse("Learner"), Some(Role::Learner));
        assert_eq!(Role::parse("teacher"), None);

        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(
            "teacher".parse::<Role>(),
            Err(UnknownRole("teacher".to_string()))
        );
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Instructor).unwrap();
        assert_eq!(json, "\"instructor\"");

        let parsed: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Role::Instructor);
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
        assert!(serde_json::from_str::<Role>("\"Admin\"").is_err());
    }

    #[test]
    fn test_empty_set_permits_everyone() {
        let any = RoleSet::any();
        assert!(any.is_empty());
        for role in Role::ALL {
            assert!(any.permits(role));
            assert!(!any.contains(role));
        }
    }

    #[test]
    fn test_role_set_membership() {
        let staff = RoleSet::of(&[Role::Admin, Role::Instructor]);
        assert!(staff.permits(Role::Admin));
        assert!(staff.permits(Role::Instructor));
        assert!(!staff.permits(Role::Learner));
        assert_eq!(staff.to_string(), "admin,instructor");
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Admin), Just(Role::Instructor), Just(Role::Learner)]
    }

    proptest! {
        #[test]
        fn prop_permits_matches_membership(
            roles in proptest::collection::vec(role_strategy(), 1..4),
            candidate in role_strategy(),
        ) {
            let set = RoleSet::of(&roles);
            prop_assert!(!set.is_empty());
            prop_assert_eq!(set.permits(candidate), roles.contains(&candidate));
        }
    }
}
