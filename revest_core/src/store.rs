//! # Project Store
//!
//! [`StoreState`] is the whole persisted record: the project list, the
//! current selection and the user preferences. [`ProjectStore`] owns a state
//! and the [`StateSlot`] it is persisted to, and saves after every mutation.
//!
//! ## Persistence format
//!
//! ```json
//! {
//!   "projects": [ { "id": "...", "name": "...", "rooms": [ ... ] } ],
//!   "currentProjectId": null,
//!   "preferences": { "theme": "light", "sidebarCollapsed": true }
//! }
//! ```
//!
//! Records without `preferences` (or with it set to `null`) get the default
//! preferences; everything else in the record is kept.
//!
//! ## Selection
//!
//! The selection is `None` or the id of an existing project. Creating or
//! selecting a project selects it; deleting the selected project falls back
//! to the first remaining one. [`ProjectStore::open`] always starts with no
//! selection, whatever was persisted.
//!
//! ## Example
//!
//! ```rust
//! use revest_core::calculations::RoomSpec;
//! use revest_core::file_io::MemorySlot;
//! use revest_core::store::ProjectStore;
//!
//! let mut store = ProjectStore::open(MemorySlot::new());
//! let project = store.create_project("Beach House")?;
//! store.add_room(&project, RoomSpec::new(4.0, 3.0, 60.0, 60.0, 3.0), "Kitchen")?;
//!
//! assert_eq!(store.project_totals(&project)?.tiles_units, 37);
//! assert!(store.slot().contents().is_some());
//! # Ok::<(), revest_core::errors::CalcError>(())
//! ```

use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize};

use crate::calculations::RoomSpec;
use crate::errors::{CalcError, CalcResult};
use crate::file_io::StateSlot;
use crate::preferences::{Preferences, Theme};
use crate::project::{Project, ProjectId, ProjectSummary, ProjectTotals, Room, RoomId};

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// In-memory store contents. All operations here are pure; persistence is
/// handled by [`ProjectStore`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreState {
    projects: Vec<Project>,
    #[serde(rename = "currentProjectId")]
    current_project_id: Option<ProjectId>,
    #[serde(deserialize_with = "null_as_default")]
    preferences: Preferences,
}

impl StoreState {
    /// Projects in display order, newest first
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id() == id)
    }

    pub fn current_project_id(&self) -> Option<&ProjectId> {
        self.current_project_id.as_ref()
    }

    pub fn current_project(&self) -> Option<&Project> {
        self.current_project_id.as_ref().and_then(|id| self.project(id))
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    fn require_project(&self, id: &ProjectId) -> CalcResult<&Project> {
        self.project(id)
            .ok_or_else(|| CalcError::not_found("project", id.as_str()))
    }

    fn require_project_mut(&mut self, id: &ProjectId) -> CalcResult<&mut Project> {
        self.projects
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or_else(|| CalcError::not_found("project", id.as_str()))
    }

    /// Create a project at the front of the list and select it.
    pub fn create_project(&mut self, name: &str) -> ProjectId {
        let project = Project::new(name);
        let id = project.id().clone();
        debug!("create project {} ({})", id, project.name());
        self.projects.insert(0, project);
        self.current_project_id = Some(id.clone());
        id
    }

    /// Delete a project and all its rooms.
    ///
    /// If it was selected, the selection moves to the new first project, or
    /// to none when the list is empty.
    pub fn delete_project(&mut self, id: &ProjectId) -> CalcResult<Project> {
        let index = self
            .projects
            .iter()
            .position(|p| p.id() == id)
            .ok_or_else(|| CalcError::not_found("project", id.as_str()))?;
        let removed = self.projects.remove(index);
        if self.current_project_id.as_ref() == Some(id) {
            self.current_project_id = self.projects.first().map(|p| p.id().clone());
        }
        debug!(
            "delete project {} ({} rooms), selection now {:?}",
            id,
            removed.rooms().len(),
            self.current_project_id
        );
        Ok(removed)
    }

    pub fn select_project(&mut self, id: &ProjectId) -> CalcResult<()> {
        self.require_project(id)?;
        self.current_project_id = Some(id.clone());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.current_project_id = None;
    }

    /// Compute a new room and append it to the project.
    pub fn add_room(&mut self, project_id: &ProjectId, spec: RoomSpec, name: &str) -> CalcResult<RoomId> {
        let project = self.require_project_mut(project_id)?;
        let room = Room::new(RoomId::generate(), name, spec)?;
        let id = room.id().clone();
        debug!("add room {} to project {}", id, project_id);
        project.push_room(room);
        Ok(id)
    }

    /// Replace a room with a freshly computed one, keeping its id and position.
    pub fn edit_room(
        &mut self,
        project_id: &ProjectId,
        room_id: &RoomId,
        spec: RoomSpec,
        name: &str,
    ) -> CalcResult<()> {
        let project = self.require_project_mut(project_id)?;
        if project.room(room_id).is_none() {
            return Err(CalcError::not_found("room", room_id.as_str()));
        }
        let room = Room::new(room_id.clone(), name, spec)?;
        debug!("edit room {} in project {}", room_id, project_id);
        project.replace_room(room)
    }

    pub fn delete_room(&mut self, project_id: &ProjectId, room_id: &RoomId) -> CalcResult<Room> {
        let room = self.require_project_mut(project_id)?.remove_room(room_id)?;
        debug!("delete room {} from project {}", room_id, project_id);
        Ok(room)
    }

    /// Totals over the project's cached room results.
    pub fn project_totals(&self, project_id: &ProjectId) -> CalcResult<ProjectTotals> {
        Ok(self.require_project(project_id)?.totals())
    }

    pub fn project_summaries(&self) -> Vec<ProjectSummary> {
        self.projects.iter().map(Project::summary).collect()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.preferences.theme = theme;
    }

    pub fn set_sidebar_collapsed(&mut self, collapsed: bool) {
        self.preferences.sidebar_collapsed = collapsed;
    }

    /// Flip the sidebar flag, returning the new value.
    pub fn toggle_sidebar(&mut self) -> bool {
        self.preferences.sidebar_collapsed = !self.preferences.sidebar_collapsed;
        self.preferences.sidebar_collapsed
    }

    /// Remove every project and the selection. Preferences are kept.
    pub fn wipe(&mut self) {
        self.projects.clear();
        self.current_project_id = None;
    }

    /// Clear a selection that points to a project that no longer exists.
    pub fn repair_selection(&mut self) {
        let dangling = match &self.current_project_id {
            Some(id) => self.project(id).is_none(),
            None => false,
        };
        if dangling {
            warn!("clearing selection of missing project {:?}", self.current_project_id);
            self.current_project_id = None;
        }
    }
}

/// Serialize the store record.
pub fn encode_state(state: &StoreState) -> CalcResult<String> {
    Ok(serde_json::to_string(state)?)
}

/// Parse a store record.
///
/// # Errors
///
/// * `CalcError::PersistenceCorrupt` - If the text is not a valid record
pub fn decode_state(contents: &str) -> CalcResult<StoreState> {
    let mut state: StoreState =
        serde_json::from_str(contents).map_err(|e| CalcError::persistence_corrupt(e.to_string()))?;
    state.repair_selection();
    Ok(state)
}

/// Load the store from a slot. Never fails: a missing, unreadable or corrupt
/// record yields the default store.
pub fn load_state<S: StateSlot>(slot: &S) -> StoreState {
    match slot.read() {
        Ok(None) => {
            info!("no saved state, starting with an empty store");
            StoreState::default()
        }
        Ok(Some(contents)) => match decode_state(&contents) {
            Ok(state) => {
                info!("loaded {} projects", state.projects.len());
                state
            }
            Err(e) => {
                warn!("discarding saved state: {}", e);
                StoreState::default()
            }
        },
        Err(e) => {
            warn!("could not read saved state, starting empty: {}", e);
            StoreState::default()
        }
    }
}

/// Write the whole store to a slot.
pub fn save_state<S: StateSlot>(slot: &mut S, state: &StoreState) -> CalcResult<()> {
    let contents = encode_state(state)?;
    slot.write(&contents)
}

/// A [`StoreState`] bound to the slot it is persisted to.
///
/// Every mutating operation is applied to a copy of the state, the copy is
/// saved, and only then does it replace the current state. When the save
/// fails the error is returned and both memory and slot keep the previous
/// state.
pub struct ProjectStore<S: StateSlot> {
    state: StoreState,
    slot: S,
}

impl<S: StateSlot> ProjectStore<S> {
    /// Load the store from `slot` for a new session, with no project selected.
    pub fn open(slot: S) -> Self {
        let mut state = load_state(&slot);
        state.clear_selection();
        ProjectStore { state, slot }
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn into_slot(self) -> S {
        self.slot
    }

    /// Persist the current state.
    pub fn save(&mut self) -> CalcResult<()> {
        save_state(&mut self.slot, &self.state)
    }

    fn transact<T>(&mut self, f: impl FnOnce(&mut StoreState) -> CalcResult<T>) -> CalcResult<T> {
        let mut next = self.state.clone();
        let value = f(&mut next)?;
        save_state(&mut self.slot, &next)?;
        self.state = next;
        Ok(value)
    }

    pub fn projects(&self) -> &[Project] {
        self.state.projects()
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.state.project(id)
    }

    pub fn current_project_id(&self) -> Option<&ProjectId> {
        self.state.current_project_id()
    }

    pub fn current_project(&self) -> Option<&Project> {
        self.state.current_project()
    }

    pub fn preferences(&self) -> &Preferences {
        self.state.preferences()
    }

    pub fn create_project(&mut self, name: &str) -> CalcResult<ProjectId> {
        self.transact(|state| Ok(state.create_project(name)))
    }

    pub fn delete_project(&mut self, id: &ProjectId) -> CalcResult<Project> {
        self.transact(|state| state.delete_project(id))
    }

    pub fn select_project(&mut self, id: &ProjectId) -> CalcResult<()> {
        self.transact(|state| state.select_project(id))
    }

    pub fn clear_selection(&mut self) -> CalcResult<()> {
        self.transact(|state| {
            state.clear_selection();
            Ok(())
        })
    }

    pub fn add_room(&mut self, project_id: &ProjectId, spec: RoomSpec, name: &str) -> CalcResult<RoomId> {
        self.transact(|state| state.add_room(project_id, spec, name))
    }

    pub fn edit_room(
        &mut self,
        project_id: &ProjectId,
        room_id: &RoomId,
        spec: RoomSpec,
        name: &str,
    ) -> CalcResult<()> {
        self.transact(|state| state.edit_room(project_id, room_id, spec, name))
    }

    pub fn delete_room(&mut self, project_id: &ProjectId, room_id: &RoomId) -> CalcResult<Room> {
        self.transact(|state| state.delete_room(project_id, room_id))
    }

    pub fn project_totals(&self, project_id: &ProjectId) -> CalcResult<ProjectTotals> {
        self.state.project_totals(project_id)
    }

    pub fn project_summaries(&self) -> Vec<ProjectSummary> {
        self.state.project_summaries()
    }

    pub fn set_theme(&mut self, theme: Theme) -> CalcResult<()> {
        self.transact(|state| {
            state.set_theme(theme);
            Ok(())
        })
    }

    pub fn set_sidebar_collapsed(&mut self, collapsed: bool) -> CalcResult<()> {
        self.transact(|state| {
            state.set_sidebar_collapsed(collapsed);
            Ok(())
        })
    }

    pub fn toggle_sidebar(&mut self) -> CalcResult<bool> {
        self.transact(|state| Ok(state.toggle_sidebar()))
    }

    /// Delete all projects. Preferences survive.
    pub fn wipe(&mut self) -> CalcResult<()> {
        info!("wiping {} projects", self.state.projects.len());
        self.transact(|state| {
            state.wipe();
            Ok(())
        })
    }
}
