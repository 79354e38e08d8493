//! Per-step change flags.

use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::fmt;

/// Set of things that changed at one report step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Events(u32);

impl Events {
    pub const NEW_WELL: Events = Events(1 << 0);
    pub const WELL_WELSPECS_UPDATE: Events = Events(1 << 1);
    pub const NEW_GROUP: Events = Events(1 << 2);
    pub const GROUP_CHANGE: Events = Events(1 << 3);
    pub const COMPLETION_CHANGE: Events = Events(1 << 4);
    pub const PRODUCTION_UPDATE: Events = Events(1 << 5);
    pub const INJECTION_UPDATE: Events = Events(1 << 6);
    pub const WELL_STATUS_CHANGE: Events = Events(1 << 7);
    pub const WELL_SWITCHED_INJECTOR_PRODUCER: Events = Events(1 << 8);
    pub const GROUP_PRODUCTION_UPDATE: Events = Events(1 << 9);
    pub const TUNING_CHANGE: Events = Events(1 << 10);

    const NAMES: [(Events, &'static str); 11] = [
        (Events::NEW_WELL, "NEW_WELL"),
        (Events::WELL_WELSPECS_UPDATE, "WELL_WELSPECS_UPDATE"),
        (Events::NEW_GROUP, "NEW_GROUP"),
        (Events::GROUP_CHANGE, "GROUP_CHANGE"),
        (Events::COMPLETION_CHANGE, "COMPLETION_CHANGE"),
        (Events::PRODUCTION_UPDATE, "PRODUCTION_UPDATE"),
        (Events::INJECTION_UPDATE, "INJECTION_UPDATE"),
        (Events::WELL_STATUS_CHANGE, "WELL_STATUS_CHANGE"),
        (
            Events::WELL_SWITCHED_INJECTOR_PRODUCER,
            "WELL_SWITCHED_INJECTOR_PRODUCER",
        ),
        (Events::GROUP_PRODUCTION_UPDATE, "GROUP_PRODUCTION_UPDATE"),
        (Events::TUNING_CHANGE, "TUNING_CHANGE"),
    ];

    pub fn empty() -> Self {
        Events(0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Events) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Events) {
        self.0 |= other.0;
    }

    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl std::ops::BitOr for Events {
    type Output = Events;

    fn bitor(self, rhs: Events) -> Events {
        Events(self.0 | rhs.0)
    }
}

impl fmt::Display for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(" "))
    }
}

impl Serialize for Events {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names = self.names();
        let mut seq = serializer.serialize_seq(Some(names.len()))?;
        for name in names {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine() {
        let mut events = Events::empty();
        assert!(events.is_empty());
        events.insert(Events::NEW_WELL);
        events.insert(Events::COMPLETION_CHANGE);
        assert!(events.contains(Events::NEW_WELL));
        assert!(!events.contains(Events::TUNING_CHANGE));
        assert!(events.contains(Events::NEW_WELL | Events::COMPLETION_CHANGE));
        assert!(!events.contains(Events::empty()));
        assert_eq!(events.to_string(), "NEW_WELL COMPLETION_CHANGE");
        assert_eq!(
            serde_json::to_value(events).unwrap(),
            serde_json::json!(["NEW_WELL", "COMPLETION_CHANGE"])
        );
    }
}
