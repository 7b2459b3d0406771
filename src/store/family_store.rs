use super::{LoadOutcome, PersistOutcome};
use crate::command::CommandError;
use crate::domain::{FamilyMember, FamilyMemberPatch, NewFamilyMember};
use crate::persistence::{load_list, save_list, KeyValueStore, FAMILY_MEMBERS_KEY};
use std::sync::Arc;

/// Roster of people tasks can be assigned to
pub struct FamilyStore {
    storage: Arc<dyn KeyValueStore>,
    minimum_active: usize,
    members: Vec<FamilyMember>,
    is_configured: bool,
    is_loading: bool,
}

impl FamilyStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, minimum_active: usize) -> Self {
        Self {
            storage,
            minimum_active,
            members: Vec::new(),
            is_configured: false,
            is_loading: true,
        }
    }

    /// Hydrate from storage; absent or unreadable data yields an empty roster
    pub fn load_family_members(&mut self) -> LoadOutcome {
        self.is_loading = true;

        let outcome = match load_list::<FamilyMember>(self.storage.as_ref(), FAMILY_MEMBERS_KEY) {
            Ok(Some(members)) => {
                let count = members.len();
                self.members = members;
                LoadOutcome::Loaded(count)
            }
            Ok(None) => {
                self.members.clear();
                LoadOutcome::Empty
            }
            Err(e) => {
                tracing::error!(key = FAMILY_MEMBERS_KEY, error = %e, "failed to load family members");
                self.members.clear();
                LoadOutcome::Failed(e.to_string())
            }
        };

        self.is_configured = self.check_family_configuration();
        self.is_loading = false;
        outcome
    }

    /// Replace the roster and persist it
    pub fn set_family_members(&mut self, members: Vec<FamilyMember>) -> PersistOutcome {
        self.members = members;
        self.is_configured = self.check_family_configuration();

        match save_list(self.storage.as_ref(), FAMILY_MEMBERS_KEY, &self.members) {
            Ok(()) => PersistOutcome::Saved,
            Err(e) => {
                tracing::error!(key = FAMILY_MEMBERS_KEY, error = %e, "failed to save family members");
                PersistOutcome::Failed(e.to_string())
            }
        }
    }

    pub fn add_family_member(&mut self, new_member: NewFamilyMember) -> Result<(String, PersistOutcome), CommandError> {
        let name = new_member.name.trim().to_string();
        if name.is_empty() {
            return Err(CommandError::EmptyMemberName);
        }

        let member = NewFamilyMember { name, ..new_member }.into_member();
        let id = member.id.clone();
        let mut next = self.members.clone();
        next.push(member);
        Ok((id, self.set_family_members(next)))
    }

    /// Overwrite the fields present in `patch`.
    ///
    /// Renaming does not touch tasks that reference the old name.
    pub fn update_family_member(&mut self, id: &str, patch: &FamilyMemberPatch) -> Result<PersistOutcome, CommandError> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(CommandError::EmptyMemberName);
        }
        Ok(self.modify(id, |member| patch.apply_to(member)))
    }

    pub fn delete_family_member(&mut self, id: &str) -> PersistOutcome {
        if !self.members.iter().any(|m| m.id == id) {
            return PersistOutcome::Unchanged;
        }
        let next = self.members.iter().filter(|m| m.id != id).cloned().collect();
        self.set_family_members(next)
    }

    pub fn toggle_family_member(&mut self, id: &str) -> PersistOutcome {
        self.modify(id, |member| member.is_active = !member.is_active)
    }

    fn modify<F>(&mut self, id: &str, f: F) -> PersistOutcome
    where
        F: FnOnce(&mut FamilyMember),
    {
        let mut next = self.members.clone();
        let Some(member) = next.iter_mut().find(|m| m.id == id) else {
            return PersistOutcome::Unchanged;
        };
        f(member);
        if next == self.members {
            return PersistOutcome::Unchanged;
        }
        self.set_family_members(next)
    }

    /// Recount active members against the configured minimum
    pub fn check_family_configuration(&self) -> bool {
        self.members.iter().filter(|m| m.is_active).count() >= self.minimum_active
    }

    /// Cached result of the last [`Self::check_family_configuration`]
    pub fn is_family_configured(&self) -> bool {
        self.is_configured
    }

    pub fn members(&self) -> &[FamilyMember] {
        &self.members
    }

    pub fn member(&self, id: &str) -> Option<&FamilyMember> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn member_by_name(&self, name: &str) -> Option<&FamilyMember> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Members offered when picking who is responsible for a task
    pub fn active_members(&self) -> Vec<&FamilyMember> {
        self.members.iter().filter(|m| m.is_active).collect()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn minimum_active(&self) -> usize {
        self.minimum_active
    }
}
