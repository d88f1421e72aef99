//! Radio-button families for one conversion run.

use std::collections::HashMap;

use crate::backend::{BackendError, FormBackend, ToggleHandle, WidgetHandle};
use crate::widget::normalize_export_value;

/// Attempts made to set an on-state before giving up.
const ON_STATE_ATTEMPTS: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct RadioGroup {
    pub name: String,
    /// First member; every later member links to it.
    pub parent: Option<WidgetHandle>,
    pub members: Vec<WidgetHandle>,
    /// On-state of the anchor member.
    pub on_state_token: String,
    export_values: Vec<String>,
}

#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: HashMap<String, RadioGroup>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(&self, name: &str) -> Option<&RadioGroup> {
        self.groups.get(name)
    }

    pub fn parent(&self, name: &str) -> Option<WidgetHandle> {
        self.groups.get(name).and_then(|g| g.parent)
    }

    pub fn has_members(&self, name: &str) -> bool {
        self.groups.get(name).is_some_and(|g| !g.members.is_empty())
    }

    /// Export value for a new member of `name`. Two members of one group
    /// sharing an on-state cannot be told apart, so repeats get a numeric
    /// suffix (`Yes`, `Yes2`, ...).
    pub fn unique_export_value(&self, name: &str, requested: &str) -> String {
        let Some(group) = self.groups.get(name) else {
            return requested.to_string();
        };
        let taken = |v: &str| group.export_values.iter().any(|e| e.eq_ignore_ascii_case(v));
        if !taken(requested) {
            return requested.to_string();
        }
        (2..)
            .map(|n| format!("{requested}{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| requested.to_string())
    }

    /// Record a created radio widget. The first member becomes the group's
    /// parent anchor; later members are linked to that anchor.
    pub fn register_member(
        &mut self,
        backend: &mut impl FormBackend,
        name: &str,
        member: ToggleHandle,
        export_value: &str,
    ) -> Result<(), BackendError> {
        let group = self.groups.entry(name.to_string()).or_insert_with(|| RadioGroup {
            name: name.to_string(),
            parent: None,
            members: Vec::new(),
            on_state_token: normalize_export_value(Some(export_value)),
            export_values: Vec::new(),
        });
        group.members.push(member.widget());
        group.export_values.push(export_value.to_string());

        match group.parent {
            None => {
                group.parent = Some(member.widget());
                log::debug!("radio group '{name}' anchored at widget {}", member.widget().id());
                Ok(())
            }
            Some(parent) if parent == member.widget() => Ok(()),
            Some(parent) => backend.link_radio_parent(member, parent),
        }
    }

    /// Make sure `member` exposes an on-state equal to the normalized export
    /// value. Some backends reject state updates after creation; the call is
    /// retried and the last error returned for the caller to log.
    pub fn ensure_on_state(
        &self,
        backend: &mut impl FormBackend,
        member: ToggleHandle,
        requested: &str,
    ) -> Result<(), BackendError> {
        let normalized = normalize_export_value(Some(requested));
        if let Ok(states) = backend.toggle_states(member)
            && states.iter().any(|s| *s == normalized)
        {
            return Ok(());
        }
        let mut last_err = None;
        for attempt in 1..=ON_STATE_ATTEMPTS {
            match backend.set_on_state(member, &normalized) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    log::debug!(
                        "setting on-state '{normalized}' on widget {} failed (attempt {attempt}): {e}",
                        member.widget().id()
                    );
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| BackendError::Failed("on-state not applied".into())))
    }
}
