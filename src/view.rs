//! What the shell renders. Built fresh from controller state after every
//! change; the shell never reads controller state directly.

use serde::{Deserialize, Serialize};

use crate::model::{
    ProfileDraft, ProfileField, SaveState, SkillLevelId, SkillLevelOption, UiMode,
};

pub const SAVE_BUTTON_LABEL: &str = "Save";
pub const SKILL_PICKER_TITLE: &str = "Select skill level";

/// Form order, top to bottom. The skill level selector sits between the
/// email and the hourly rate and is rendered from `skill_level_label`.
const FORM_FIELDS: [ProfileField; 6] = [
    ProfileField::FirstName,
    ProfileField::LastName,
    ProfileField::Email,
    ProfileField::HourlyRate,
    ProfileField::ExperienceYears,
    ProfileField::PhoneNumber,
];

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ViewModel {
    pub screen: Screen,
    /// Show the blocking loader.
    pub loading: bool,
    pub message: Option<String>,
}

/// Exactly one full-screen view at a time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Screen {
    EditForm(EditFormView),
    SkillPicker(SkillPickerView),
    PhotoPicker,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EditFormView {
    pub header: HeaderView,
    pub fields: Vec<FieldView>,
    pub skill_level_label: Option<String>,
    pub phone_prefix: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct HeaderView {
    pub photo: PhotoView,
    pub save_label: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhotoView {
    AddPhoto,
    Image { uri: String },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Keyboard {
    Default,
    Email,
    NumberPad,
    Phone,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FieldView {
    pub field: ProfileField,
    pub value: String,
    pub placeholder: String,
    pub keyboard: Keyboard,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SkillPickerView {
    pub title: String,
    pub selected: Option<SkillLevelId>,
    pub options: Vec<SkillLevelOption>,
}

/// Section heading used across the profile screens: an icon next to a
/// title, with a short description underneath.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SubHeaderView {
    pub icon: String,
    pub title: String,
    pub description: String,
}

impl SubHeaderView {
    pub fn new(
        icon: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            icon: icon.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}

fn placeholder(field: ProfileField) -> &'static str {
    match field {
        ProfileField::FirstName => "Enter your first name",
        ProfileField::LastName => "Enter your last name",
        ProfileField::Email => "Enter your email address",
        ProfileField::ExperienceYears => "Enter your years of experience",
        ProfileField::HourlyRate => "Enter your hourly rate",
        ProfileField::PhoneNumber => "Enter your phone number",
    }
}

fn keyboard(field: ProfileField) -> Keyboard {
    match field {
        ProfileField::Email => Keyboard::Email,
        ProfileField::ExperienceYears | ProfileField::HourlyRate => Keyboard::NumberPad,
        ProfileField::PhoneNumber => Keyboard::Phone,
        ProfileField::FirstName | ProfileField::LastName => Keyboard::Default,
    }
}

fn skill_level_label(draft: &ProfileDraft, levels: Option<&[SkillLevelOption]>) -> Option<String> {
    let id = draft.skill_level.as_ref()?;
    let name = levels
        .and_then(|levels| levels.iter().find(|level| &level.id == id))
        .map(|level| level.name.clone());
    Some(name.unwrap_or_else(|| id.to_string()))
}

#[must_use]
pub fn render(
    mode: UiMode,
    draft: &ProfileDraft,
    skill_levels: Option<&[SkillLevelOption]>,
    save: &SaveState,
) -> ViewModel {
    let screen = match mode {
        UiMode::Editing => Screen::EditForm(EditFormView {
            header: HeaderView {
                photo: draft
                    .picture
                    .display_uri()
                    .map_or(PhotoView::AddPhoto, |uri| PhotoView::Image {
                        uri: uri.to_string(),
                    }),
                save_label: SAVE_BUTTON_LABEL.to_string(),
            },
            fields: FORM_FIELDS
                .iter()
                .map(|&field| FieldView {
                    field,
                    value: draft.field(field).to_string(),
                    placeholder: placeholder(field).to_string(),
                    keyboard: keyboard(field),
                })
                .collect(),
            skill_level_label: skill_level_label(draft, skill_levels),
            phone_prefix: draft.phone_prefix,
        }),
        UiMode::SelectingSkillLevel => Screen::SkillPicker(SkillPickerView {
            title: SKILL_PICKER_TITLE.to_string(),
            selected: draft.skill_level.clone(),
            options: skill_levels.map(<[_]>::to_vec).unwrap_or_default(),
        }),
        UiMode::SelectingPhoto => Screen::PhotoPicker,
    };

    ViewModel {
        screen,
        loading: save.loading,
        message: (!save.error_message.is_empty()).then(|| save.error_message.clone()),
    }
}
