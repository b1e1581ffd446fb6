//! Object lifecycle state.
//!
//! ```text
//!            set_ready()
//!  UPDATING ───────────► READY
//!     │  ▲                 │
//!     │  └─────────────────┘  (any field change + put)
//!     │ delete()
//!     ▼
//!  DELETING ──► remove() from storage
//! ```
//!
//! Transitions are a convention, not a guard: nothing stops a controller
//! from writing any state. "Pending" (blocked on manual intervention) is
//! expressed by staying in UPDATING or DELETING with an explanatory
//! message, never by a state of its own.

use serde::{Deserialize, Serialize};

/// The state of an object with respect to its configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectState {
    /// Newly created or changed; controllers still have work to do.
    #[default]
    Updating,
    /// Fully realized; the steady state.
    Ready,
    /// Deletion requested; controllers are cleaning up.
    Deleting,
}

impl ObjectState {
    /// The stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Updating => "UPDATING",
            Self::Ready => "READY",
            Self::Deleting => "DELETING",
        }
    }
}

impl std::fmt::Display for ObjectState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const STATE_DESCRIPTION: &str = "
    The state of an object vis-a-vis the configuration.
    Values are: 'READY', 'UPDATING', 'DELETING', 'DELETED',
    'PENDING'.  The 'READY' state means the configuration has been
    absorbed and propagated and the object is reconciled as
    configured.  The 'UPDATING' state means the configuration has
    changed and the changes are still being absorbed and
    propagated.  The 'DELETING' state means deletion of the object
    has been requested and is being processed but is not complete
    yet. The 'DELETED' state means all resources associated with
    the object configuration have been cleaned up and the object
    no longer exists. The configuration can safely be removed.
    The 'PENDING' state means some condition that requires manual
    intervention has prevented the object from reaching the
    'READY' state from the 'UPDATING' state.
    A newly created object starts in the 'UPDATING' state.
";

const MESSAGES_DESCRIPTION: &str = "
    In conjunction with 'state' there may be messages that
    describe either an object's progress toward 'READY' or
    'DELETED' states or reasons for reaching the 'PENDING'
    state.  The 'messages' field provides these in a list of
    strings.
";

/// Collapse runs of whitespace into single spaces and trim the ends.
///
/// Useful for turning indented multi-line literals into API descriptions.
pub fn clean_desc(desc: &str) -> String {
    desc.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// API description of the `state` field.
pub fn state_description() -> String {
    clean_desc(STATE_DESCRIPTION)
}

/// API description of the `messages` field.
pub fn messages_description() -> String {
    clean_desc(MESSAGES_DESCRIPTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_wire_format() {
        assert_eq!(
            serde_json::to_string(&ObjectState::Updating).unwrap(),
            "\"UPDATING\""
        );
        let state: ObjectState = serde_json::from_str("\"DELETING\"").unwrap();
        assert_eq!(state, ObjectState::Deleting);
        assert_eq!(ObjectState::default(), ObjectState::Updating);
        assert!(serde_json::from_str::<ObjectState>("\"ready\"").is_err());
    }

    #[test]
    fn test_clean_desc() {
        assert_eq!(clean_desc("  a\n   b\tc  "), "a b c");
        assert_eq!(clean_desc(""), "");
    }

    #[test]
    fn test_descriptions_are_single_line() {
        let state = state_description();
        assert!(state.starts_with("The state of an object"));
        assert!(!state.contains('\n'));
        assert!(!state.contains("  "));
        assert!(messages_description().ends_with("list of strings."));
    }
}
