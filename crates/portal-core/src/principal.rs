//! 인증된 주체.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Role;

/// 검증된 토큰에서 도출된 로그인 사용자의 신원.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    /// 사용자 ID
    pub id: String,
    /// 표시 이름
    pub display_name: String,
    /// 이메일
    pub email: String,
    /// 역할
    pub role: Role,
    /// 프로필 이미지 참조 (URL 또는 저장소 키)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    /// 사용자 환경설정 (자유 형식 JSON 객체)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Value>,
}

impl Principal {
    /// 부분 프로필을 병합합니다.
    ///
    /// `id`와 `role`은 변경되지 않습니다. 환경설정은 양쪽이 모두 객체일 때
    /// 최상위 키 단위로 병합하고, 그 외에는 교체합니다.
    pub fn merge(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.display_name {
            self.display_name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(image) = update.profile_image {
            self.profile_image = Some(image);
        }
        if let Some(incoming) = update.preferences {
            self.preferences = Some(match (self.preferences.take(), incoming) {
                (Some(Value::Object(mut current)), Value::Object(patch)) => {
                    current.extend(patch);
                    Value::Object(current)
                }
                (_, replacement) => replacement,
            });
        }
    }
}

/// 프로필 부분 갱신.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Value>,
}

impl ProfileUpdate {
    /// 아무 필드도 설정되지 않았는지 확인.
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.email.is_none()
            && self.profile_image.is_none()
            && self.preferences.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn learner() -> Principal {
        Principal {
            id: "u-42".to_string(),
            display_name: "Jamie".to_string(),
            email: "jamie@campus.test".to_string(),
            role: Role::Learner,
            profile_image: None,
            preferences: Some(json!({"theme": "dark", "lang": "ko"})),
        }
    }

    #[test]
    fn test_merge_keeps_identity() {
        let mut principal = learner();
        principal.merge(ProfileUpdate {
            display_name: Some("Jamie K.".to_string()),
            profile_image: Some("avatars/u-42.png".to_string()),
            ..Default::default()
        });

        assert_eq!(principal.id, "u-42");
        assert_eq!(principal.role, Role::Learner);
        assert_eq!(principal.display_name, "Jamie K.");
        assert_eq!(principal.email, "jamie@campus.test");
        assert_eq!(principal.profile_image.as_deref(), Some("avatars/u-42.png"));
    }

    #[test]
    fn test_merge_preferences_shallow() {
        let mut principal = learner();
        principal.merge(ProfileUpdate {
            preferences: Some(json!({"theme": "light", "sort": "name"})),
            ..Default::default()
        });

        assert_eq!(
            principal.preferences,
            Some(json!({"theme": "light", "lang": "ko", "sort": "name"}))
        );
    }

    #[test]
    fn test_profile_update_is_empty() {
        assert!(ProfileUpdate::default().is_empty());
        let update = ProfileUpdate {
            email: Some("x@campus.test".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
