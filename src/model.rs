use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Key of one entry in the skill level list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SkillLevelId(String);

impl SkillLevelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkillLevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SkillLevelOption {
    pub id: SkillLevelId,
    pub name: String,
}

/// An image picked on the device that has not been uploaded yet.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LocalImage {
    pub uri: String,
}

impl LocalImage {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProfilePicture {
    /// Nothing stored; the header shows the "add photo" affordance.
    #[default]
    Unset,
    /// The picture already stored server-side. Never re-uploaded.
    Remote(String),
    /// Freshly selected and waiting for the next save.
    Pending(LocalImage),
}

impl ProfilePicture {
    /// Any non-blank link is kept as is; relative media paths are resolved
    /// by the shell's image loader.
    fn from_link(link: Option<String>) -> Self {
        link.filter(|l| !l.trim().is_empty())
            .map_or(Self::Unset, Self::Remote)
    }

    #[must_use]
    pub fn pending(&self) -> Option<&LocalImage> {
        match self {
            Self::Pending(image) => Some(image),
            Self::Unset | Self::Remote(_) => None,
        }
    }

    /// The URI the header should display, if any.
    #[must_use]
    pub fn display_uri(&self) -> Option<&str> {
        match self {
            Self::Unset => None,
            Self::Remote(link) => Some(link),
            Self::Pending(image) => Some(&image.uri),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UiMode {
    #[default]
    Editing,
    SelectingSkillLevel,
    SelectingPhoto,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FirstName,
    LastName,
    Email,
    ExperienceYears,
    HourlyRate,
    PhoneNumber,
}

impl ProfileField {
    /// Fields that only take whole numbers.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::ExperienceYears | Self::HourlyRate)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldUpdate {
    Applied,
    Rejected,
}

/// Accepts what a number-pad field may legitimately hold: a whole number,
/// optionally padded with whitespace. Blank text reads as zero, which is
/// how the user clears the field.
///
/// Only decimal notation is understood (`"12"`, `"-3"`, `"12.0"`, `"1e3"`);
/// hex or binary literals such as `"0x10"` are rejected.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn is_integer_text(candidate: &str) -> bool {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return true;
    }
    match trimmed.parse::<f64>() {
        Ok(n) => n.is_finite() && n.fract() == 0.0,
        Err(_) => false,
    }
}

/// The signed-in user as the backend reports it.
#[derive(Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct CurrentUser {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub experience_years: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub hourly_rate: Option<String>,
    #[serde(default)]
    pub skill_level: Option<SkillLevelId>,
    /// Includes the leading country-code marker character.
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub profile_picture_link: Option<String>,
}

impl fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentUser")
            .field("first_name_present", &self.first_name.is_some())
            .field("last_name_present", &self.last_name.is_some())
            .field("email_present", &self.email.is_some())
            .field("skill_level", &self.skill_level)
            .field("phone_present", &self.phone_number.is_some())
            .field("picture_present", &self.profile_picture_link.is_some())
            .finish_non_exhaustive()
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<TextOrNumber>::deserialize(deserializer)?.map(|value| match value {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Int(n) => n.to_string(),
        TextOrNumber::Float(n) => n.to_string(),
    }))
}

/// The editable copy of the profile. Owned by one controller for one
/// editing session.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub experience_years: String,
    pub hourly_rate: String,
    pub skill_level: Option<SkillLevelId>,
    /// Dialable number without the country code.
    pub phone_number: String,
    pub phone_prefix: u32,
    pub picture: ProfilePicture,
}

impl ProfileDraft {
    #[must_use]
    pub fn from_user(user: CurrentUser, phone_prefix: u32) -> Self {
        Self {
            first_name: user.first_name.unwrap_or_default(),
            last_name: user.last_name.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
            experience_years: user.experience_years.unwrap_or_default(),
            hourly_rate: user.hourly_rate.unwrap_or_default(),
            skill_level: user.skill_level,
            // First char is the country-code marker, not part of the number.
            phone_number: user
                .phone_number
                .map(|p| p.chars().skip(1).collect())
                .unwrap_or_default(),
            phone_prefix,
            picture: ProfilePicture::from_link(user.profile_picture_link),
        }
    }

    #[must_use]
    pub fn field(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::FirstName => &self.first_name,
            ProfileField::LastName => &self.last_name,
            ProfileField::Email => &self.email,
            ProfileField::ExperienceYears => &self.experience_years,
            ProfileField::HourlyRate => &self.hourly_rate,
            ProfileField::PhoneNumber => &self.phone_number,
        }
    }

    /// Replace one text field. Numeric fields keep their old value when the
    /// candidate is not a whole number.
    pub fn set_field(&mut self, field: ProfileField, value: String) -> FieldUpdate {
        if field.is_numeric() && !is_integer_text(&value) {
            return FieldUpdate::Rejected;
        }
        let slot = match field {
            ProfileField::FirstName => &mut self.first_name,
            ProfileField::LastName => &mut self.last_name,
            ProfileField::Email => &mut self.email,
            ProfileField::ExperienceYears => &mut self.experience_years,
            ProfileField::HourlyRate => &mut self.hourly_rate,
            ProfileField::PhoneNumber => &mut self.phone_number,
        };
        *slot = value;
        FieldUpdate::Applied
    }
}

// Redact debug output: the draft holds personal data.
impl fmt::Debug for ProfileDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileDraft")
            .field("first_name_len", &self.first_name.len())
            .field("last_name_len", &self.last_name.len())
            .field("email_len", &self.email.len())
            .field("experience_years", &self.experience_years)
            .field("hourly_rate", &self.hourly_rate)
            .field("skill_level", &self.skill_level)
            .field("phone_len", &self.phone_number.len())
            .field("phone_prefix", &self.phone_prefix)
            .field("picture_pending", &self.picture.pending().is_some())
            .finish()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveState {
    pub loading: bool,
    /// Empty when nothing is shown.
    pub error_message: String,
}

/// Body of a profile update. Empty fields are left out entirely so the
/// backend keeps whatever it already has for them.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SavePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_level: Option<SkillLevelId>,
    /// Country code followed by the dialable number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl SavePayload {
    /// Every empty draft field is left out. The phone number goes out as
    /// prefix followed by number, and only when a number is stored: a bare
    /// country code is never sent.
    #[must_use]
    pub fn from_draft(draft: &ProfileDraft) -> Self {
        fn non_empty(s: &str) -> Option<String> {
            (!s.is_empty()).then(|| s.to_string())
        }

        Self {
            first_name: non_empty(&draft.first_name),
            last_name: non_empty(&draft.last_name),
            email: non_empty(&draft.email),
            experience_years: non_empty(&draft.experience_years),
            hourly_rate: non_empty(&draft.hourly_rate),
            skill_level: draft.skill_level.clone().filter(|id| !id.as_str().is_empty()),
            phone_number: non_empty(&draft.phone_number)
                .map(|number| format!("{}{number}", draft.phone_prefix)),
        }
    }
}
