use serde::{Deserialize, Serialize};

use crate::model::{LocalImage, ProfileField, SkillLevelId};

/// Everything the shell can tell the profile-edit core.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    // Form
    FieldChanged { field: ProfileField, value: String },
    PhonePrefixChanged(u32),

    // Skill level picker
    SkillLevelPickerOpened,
    SkillLevelSelected(SkillLevelId),
    SkillLevelPickerClosed,

    // Photo picker
    PhotoPickerOpened,
    PhotoSelected(LocalImage),
    PhotoPickerCancelled,

    // Header
    BackRequested,
    SaveRequested,
}

impl Event {
    /// Stable name for logs. Carries no user data.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FieldChanged { .. } => "field_changed",
            Self::PhonePrefixChanged(_) => "phone_prefix_changed",
            Self::SkillLevelPickerOpened => "skill_level_picker_opened",
            Self::SkillLevelSelected(_) => "skill_level_selected",
            Self::SkillLevelPickerClosed => "skill_level_picker_closed",
            Self::PhotoPickerOpened => "photo_picker_opened",
            Self::PhotoSelected(_) => "photo_selected",
            Self::PhotoPickerCancelled => "photo_picker_cancelled",
            Self::BackRequested => "back_requested",
            Self::SaveRequested => "save_requested",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_round_trip_through_json() {
        let event = Event::FieldChanged {
            field: ProfileField::HourlyRate,
            value: "45".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"FieldChanged":{"field":"hourly_rate","value":"45"}}"#);
        assert_eq!(serde_json::from_str::<Event>(&json).unwrap(), event);
    }

    #[test]
    fn event_names_do_not_leak_values() {
        let event = Event::FieldChanged {
            field: ProfileField::Email,
            value: "ada@example.com".into(),
        };
        assert_eq!(event.name(), "field_changed");
    }

    #[test]
    fn event_size_is_reasonable() {
        let size = std::mem::size_of::<Event>();
        assert!(size <= 64, "Event enum is {size} bytes");
    }
}
