//! Team members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{DepartmentId, MemberId, RoleId};
use super::normalize::Tags;

/// A person who can manage projects and be assigned tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: MemberId,
    pub name: String,
    /// Unique across the member collection, case-insensitively.
    pub email: String,
    #[serde(default)]
    pub role_id: Option<RoleId>,
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Tags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for creating or updating a member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDraft {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role_id: Option<RoleId>,
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Tags,
}

impl MemberDraft {
    /// Materialize a full member from this draft, as a backend would.
    #[must_use]
    pub fn into_member(self, id: MemberId, now: DateTime<Utc>) -> TeamMember {
        TeamMember {
            id,
            name: self.name,
            email: self.email,
            role_id: self.role_id,
            department_id: self.department_id,
            avatar: self.avatar,
            bio: self.bio,
            phone: self.phone,
            skills: self.skills,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn member_deserializes_camel_case_wire_shape() {
        let member: TeamMember = serde_json::from_str(
            r#"{
                "id": "m-1",
                "name": "Ada",
                "email": "ada@example.com",
                "roleId": "r-1",
                "departmentId": "d-1",
                "skills": "rust, sql",
                "createdAt": "2026-08-01T09:00:00Z",
                "updatedAt": "2026-08-01T09:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(member.id, MemberId::new("m-1"));
        assert_eq!(member.skills.as_slice(), ["rust", "sql"]);
        assert_eq!(member.avatar, None);
    }

    #[test]
    fn draft_into_member_copies_all_fields() {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap();
        let member = MemberDraft {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role_id: Some(RoleId::new("r-1")),
            ..MemberDraft::default()
        }
        .into_member(MemberId::new("m-1"), now);

        assert_eq!(member.name, "Ada");
        assert_eq!(member.role_id, Some(RoleId::new("r-1")));
        assert_eq!(member.created_at, now);
        assert_eq!(member.updated_at, now);
    }
}
