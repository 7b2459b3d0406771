use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default avatar for new members
pub const DEFAULT_MEMBER_EMOJI: &str = "👤";

/// A participant eligible to be assigned tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    pub id: String,
    /// Join key against task assignments
    pub name: String,
    pub emoji: String,
    pub is_active: bool,
}

/// A member before it has been given an ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFamilyMember {
    pub name: String,
    pub emoji: String,
    pub is_active: bool,
}

impl NewFamilyMember {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emoji: DEFAULT_MEMBER_EMOJI.to_string(),
            is_active: true,
        }
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = emoji.into();
        self
    }

    pub fn into_member(self) -> FamilyMember {
        FamilyMember {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            emoji: self.emoji,
            is_active: self.is_active,
        }
    }
}

/// Fields to overwrite on an existing member; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilyMemberPatch {
    pub name: Option<String>,
    pub emoji: Option<String>,
    pub is_active: Option<bool>,
}

impl FamilyMemberPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, member: &mut FamilyMember) {
        if let Some(name) = &self.name {
            member.name = name.clone();
        }
        if let Some(emoji) = &self.emoji {
            member.emoji = emoji.clone();
        }
        if let Some(is_active) = self.is_active {
            member.is_active = is_active;
        }
    }
}
