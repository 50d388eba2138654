//! Shared core for the edit-profile screens.
//!
//! The native shell forwards user input as [`Event`]s to a
//! [`ProfileEditController`] and renders whatever [`ViewModel`] it
//! publishes. Backend access, routing and analytics are injected through
//! [`Services`].

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod event;
pub mod model;
pub mod view;

pub use app::{ProfileEditController, SaveOutcome};
pub use capabilities::{
    Analytics, Navigator, ProfileService, ServiceResponse, Services, SkillLevelService,
};
pub use config::ControllerConfig;
pub use error::{AnalyticsError, ConfigError, ServiceError};
pub use event::Event;
pub use model::{
    CurrentUser, FieldUpdate, LocalImage, ProfileDraft, ProfileField, ProfilePicture, SaveState,
    SavePayload, SkillLevelId, SkillLevelOption, UiMode,
};
pub use view::{SubHeaderView, ViewModel};

pub const DEFAULT_ERROR_DISPLAY_MS: u64 = 3_000;
pub const DEFAULT_PHONE_PREFIX: u32 = 1;
pub const SAVE_EVENT_NAME: &str = "Save Edit Profile Click";
pub const PROFILE_ROUTE: &str = "Profile";
