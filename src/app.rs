//! The profile-edit controller.
//!
//! Owns the draft, the active sub-view and the save state for one editing
//! session. Input arrives as [`Event`]s; every state change publishes a new
//! [`ViewModel`] on a watch channel for the shell to render.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;
use tracing::{debug, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

use crate::capabilities::{ServiceResponse, Services};
use crate::config::ControllerConfig;
use crate::error::{ConfigError, ServiceError};
use crate::event::Event;
use crate::model::{
    CurrentUser, FieldUpdate, LocalImage, ProfileDraft, ProfileField, ProfilePicture, SaveState,
    SavePayload, SkillLevelId, SkillLevelOption, UiMode,
};
use crate::view::{self, ViewModel};

/// How a call to [`ProfileEditController::save`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Both calls succeeded and the navigator was sent to the success route.
    Saved,
    /// The backend answered with an error indicator.
    Rejected(String),
    /// A service call failed outright.
    Failed(String),
    /// Another save was still running; nothing was sent.
    InFlight,
}

#[derive(Debug, Default)]
struct EditState {
    draft: ProfileDraft,
    mode: UiMode,
    skill_levels: Option<Vec<SkillLevelOption>>,
    save: SaveState,
    // Bumped on every shown message so a stale clear timer leaves a newer
    // message alone.
    message_seq: u64,
}

impl EditState {
    fn view(&self) -> ViewModel {
        view::render(self.mode, &self.draft, self.skill_levels.as_deref(), &self.save)
    }
}

struct Inner {
    state: Mutex<EditState>,
    services: Services,
    config: ControllerConfig,
    view_tx: watch::Sender<ViewModel>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, EditState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to the state and publish the resulting view.
    fn mutate<R>(&self, f: impl FnOnce(&mut EditState) -> R) -> R {
        let (result, view) = {
            let mut state = self.lock();
            let result = f(&mut state);
            (result, state.view())
        };
        self.view_tx.send_replace(view);
        result
    }

    fn show_message(self: &Arc<Self>, message: String) {
        let seq = self.mutate(|state| {
            state.save.error_message = message;
            state.message_seq += 1;
            state.message_seq
        });

        let weak = Arc::downgrade(self);
        let delay = self.config.error_display();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.mutate(|state| {
                    if state.message_seq == seq {
                        state.save.error_message.clear();
                    }
                });
            }
        });
    }

    fn log_analytics(&self, name: String) {
        let analytics = Arc::clone(&self.services.analytics);
        tokio::spawn(async move {
            if let Err(e) = analytics.log_event(&name).await {
                warn!(event = %name, error = %e, "analytics event dropped");
            }
        });
    }
}

/// Clears the loading flag when the save ends, including when the save
/// future is dropped mid-flight.
struct LoadingGuard {
    inner: Arc<Inner>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.inner.mutate(|state| state.save.loading = false);
    }
}

fn fetch_skill_levels(inner: &Arc<Inner>) {
    let service = Arc::clone(&inner.services.skill_levels);
    let weak: Weak<Inner> = Arc::downgrade(inner);
    tokio::spawn(
        async move {
            match service.list_all().await {
                Ok(levels) => {
                    debug!(count = levels.len(), "skill levels loaded");
                    if let Some(inner) = weak.upgrade() {
                        inner.mutate(|state| state.skill_levels = Some(levels));
                    }
                }
                Err(e) => warn!(error = %e, "skill level fetch failed; picker stays empty"),
            }
        }
        .instrument(info_span!("skill_level_fetch")),
    );
}

/// State machine behind the edit-profile screen and its two pickers.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct ProfileEditController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ProfileEditController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("ProfileEditController")
            .field("draft", &state.draft)
            .field("mode", &state.mode)
            .field("save", &state.save)
            .finish_non_exhaustive()
    }
}

impl ProfileEditController {
    /// Start an editing session for `user` and kick off the skill level
    /// fetch in the background.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if `config` is invalid.
    #[instrument(skip_all)]
    pub fn spawn(
        user: CurrentUser,
        services: Services,
        config: ControllerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let state = EditState {
            draft: ProfileDraft::from_user(user, config.default_phone_prefix),
            ..EditState::default()
        };
        let (view_tx, _) = watch::channel(state.view());
        let inner = Arc::new(Inner {
            state: Mutex::new(state),
            services,
            config,
            view_tx,
        });

        fetch_skill_levels(&inner);
        info!("profile edit session started");

        Ok(Self { inner })
    }

    /// Dispatch one event from the shell.
    pub async fn update(&self, event: Event) {
        debug!(event = event.name(), "handling event");
        match event {
            Event::FieldChanged { field, value } => {
                self.set_field(field, value);
            }
            Event::PhonePrefixChanged(prefix) => self.set_phone_prefix(prefix),
            Event::SkillLevelPickerOpened => {
                self.enter(UiMode::SelectingSkillLevel);
            }
            Event::SkillLevelSelected(id) => {
                self.select_skill_level(id);
            }
            Event::SkillLevelPickerClosed => {
                self.leave(UiMode::SelectingSkillLevel);
            }
            Event::PhotoPickerOpened => {
                self.enter(UiMode::SelectingPhoto);
            }
            Event::PhotoSelected(image) => {
                self.select_photo(image);
            }
            Event::PhotoPickerCancelled => {
                self.leave(UiMode::SelectingPhoto);
            }
            Event::BackRequested => self.inner.services.navigator.go_back(),
            Event::SaveRequested => {
                self.save().await;
            }
        }
    }

    #[must_use]
    pub fn view(&self) -> ViewModel {
        self.inner.lock().view()
    }

    /// Receives a fresh [`ViewModel`] after every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewModel> {
        self.inner.view_tx.subscribe()
    }

    #[must_use]
    pub fn draft(&self) -> ProfileDraft {
        self.inner.lock().draft.clone()
    }

    #[must_use]
    pub fn mode(&self) -> UiMode {
        self.inner.lock().mode
    }

    #[must_use]
    pub fn save_state(&self) -> SaveState {
        self.inner.lock().save.clone()
    }

    /// `None` until the background fetch succeeds.
    #[must_use]
    pub fn skill_levels(&self) -> Option<Vec<SkillLevelOption>> {
        self.inner.lock().skill_levels.clone()
    }

    pub fn set_field(&self, field: ProfileField, value: String) -> FieldUpdate {
        let outcome = self.inner.mutate(|state| state.draft.set_field(field, value));
        if outcome == FieldUpdate::Rejected {
            debug!(?field, "discarded non-integer input");
        }
        outcome
    }

    pub fn set_phone_prefix(&self, prefix: u32) {
        self.inner.mutate(|state| state.draft.phone_prefix = prefix);
    }

    /// Open a picker. Only valid from the edit form.
    pub fn enter(&self, mode: UiMode) -> bool {
        self.transition(UiMode::Editing, mode, |_| {})
    }

    /// Close a picker without touching the draft.
    pub fn leave(&self, mode: UiMode) -> bool {
        self.transition(mode, UiMode::Editing, |_| {})
    }

    pub fn select_skill_level(&self, id: SkillLevelId) -> bool {
        self.transition(UiMode::SelectingSkillLevel, UiMode::Editing, |draft| {
            draft.skill_level = Some(id);
        })
    }

    pub fn select_photo(&self, image: LocalImage) -> bool {
        self.transition(UiMode::SelectingPhoto, UiMode::Editing, |draft| {
            draft.picture = ProfilePicture::Pending(image);
        })
    }

    fn transition(&self, from: UiMode, to: UiMode, apply: impl FnOnce(&mut ProfileDraft)) -> bool {
        if from == to {
            return false;
        }
        let moved = self.inner.mutate(|state| {
            if state.mode != from {
                return false;
            }
            apply(&mut state.draft);
            state.mode = to;
            true
        });
        if !moved {
            debug!(?from, ?to, "ignoring transition from another view");
        }
        moved
    }

    /// Send the draft to the backend: field update first, then the picture
    /// if a new one was picked.
    ///
    /// Failures end up in the transient message slot; the draft is kept so
    /// the user can try again.
    #[instrument(skip(self), fields(attempt = %Uuid::new_v4()))]
    pub async fn save(&self) -> SaveOutcome {
        self.inner.log_analytics(self.inner.config.save_event_name.clone());

        let reject_concurrent = self.inner.config.reject_concurrent_saves;
        let started = self.inner.mutate(|state| {
            if reject_concurrent && state.save.loading {
                return None;
            }
            state.save.loading = true;
            Some((
                SavePayload::from_draft(&state.draft),
                state.draft.picture.pending().cloned(),
            ))
        });
        let Some((payload, pending)) = started else {
            warn!("save requested while another save is running");
            return SaveOutcome::InFlight;
        };

        let loading = LoadingGuard {
            inner: Arc::clone(&self.inner),
        };
        let result = self.send(&payload, pending.as_ref()).await;
        drop(loading);

        match result {
            Ok(None) => {
                info!("profile saved");
                self.inner
                    .services
                    .navigator
                    .navigate_to(&self.inner.config.success_route);
                SaveOutcome::Saved
            }
            Ok(Some(message)) => {
                warn!(error = %message, "profile save rejected");
                self.inner.show_message(message.clone());
                SaveOutcome::Rejected(message)
            }
            Err(e) => {
                warn!(error = %e, "profile save failed");
                let message = e.to_string();
                self.inner.show_message(message.clone());
                SaveOutcome::Failed(message)
            }
        }
    }

    /// Both calls, strictly in order. The upload still goes out when the
    /// field update came back with an error indicator; that error wins the
    /// display slot.
    async fn send(
        &self,
        payload: &SavePayload,
        pending: Option<&LocalImage>,
    ) -> Result<Option<String>, ServiceError> {
        let profile = &self.inner.services.profile;
        let updated = profile.update_details(payload).await?;
        let uploaded = match pending {
            Some(image) => profile.upload_picture(image).await?,
            None => ServiceResponse::ok(),
        };
        Ok(updated
            .error_message()
            .or_else(|| uploaded.error_message())
            .map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::testing::{FakeSkillLevelService, Fakes, NavigationCall, ProfileCall};
    use crate::view::Screen;
    use std::time::Duration;

    fn user() -> CurrentUser {
        CurrentUser {
            first_name: Some("Ada".into()),
            last_name: Some(String::new()),
            email: Some("ada@example.com".into()),
            hourly_rate: Some("45".into()),
            phone_number: Some("15551234".into()),
            profile_picture_link: Some("https://cdn.example.com/ada.png".into()),
            ..CurrentUser::default()
        }
    }

    fn controller(fakes: &Fakes) -> ProfileEditController {
        ProfileEditController::spawn(user(), fakes.services(), ControllerConfig::default()).unwrap()
    }

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn invalid_config_is_refused() {
        let fakes = Fakes::default();
        let config = ControllerConfig {
            error_display_ms: 0,
            ..ControllerConfig::default()
        };
        let result = ProfileEditController::spawn(user(), fakes.services(), config);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[tokio::test]
    async fn fetches_skill_levels_once_on_creation() {
        let levels = vec![
            SkillLevelOption { id: SkillLevelId::new("senior"), name: "Senior".into() },
            SkillLevelOption { id: SkillLevelId::new("junior"), name: "Junior".into() },
            SkillLevelOption { id: SkillLevelId::new("mid"), name: "Mid".into() },
        ];
        let fakes = Fakes {
            skill_levels: Arc::new(FakeSkillLevelService::with_levels(levels.clone())),
            ..Fakes::default()
        };
        let controller = controller(&fakes);
        assert_eq!(controller.skill_levels(), None);

        settle().await;
        assert_eq!(fakes.skill_levels.call_count(), 1);
        assert_eq!(controller.skill_levels(), Some(levels));

        controller.enter(UiMode::SelectingSkillLevel);
        controller.leave(UiMode::SelectingSkillLevel);
        settle().await;
        assert_eq!(fakes.skill_levels.call_count(), 1);
    }

    #[tokio::test]
    async fn failed_skill_fetch_leaves_list_empty() {
        let fakes = Fakes {
            skill_levels: Arc::new(FakeSkillLevelService::failing(ServiceError::Network(
                "offline".into(),
            ))),
            ..Fakes::default()
        };
        let controller = controller(&fakes);
        settle().await;
        assert_eq!(controller.skill_levels(), None);

        assert!(controller.enter(UiMode::SelectingSkillLevel));
        let Screen::SkillPicker(picker) = controller.view().screen else {
            panic!("expected skill picker");
        };
        assert!(picker.options.is_empty());
    }

    #[tokio::test]
    async fn skill_picker_confirm_and_cancel() {
        let fakes = Fakes::default();
        let controller = controller(&fakes);

        assert!(controller.enter(UiMode::SelectingSkillLevel));
        assert_eq!(controller.mode(), UiMode::SelectingSkillLevel);
        assert!(controller.select_skill_level(SkillLevelId::new("senior")));
        assert_eq!(controller.mode(), UiMode::Editing);
        assert_eq!(controller.draft().skill_level, Some(SkillLevelId::new("senior")));

        assert!(controller.enter(UiMode::SelectingSkillLevel));
        assert!(controller.leave(UiMode::SelectingSkillLevel));
        assert_eq!(controller.mode(), UiMode::Editing);
        assert_eq!(controller.draft().skill_level, Some(SkillLevelId::new("senior")));
    }

    #[tokio::test]
    async fn photo_picker_confirm_and_cancel() {
        let fakes = Fakes::default();
        let controller = controller(&fakes);
        let original = controller.draft().picture;

        assert!(controller.enter(UiMode::SelectingPhoto));
        assert!(controller.leave(UiMode::SelectingPhoto));
        assert_eq!(controller.draft().picture, original);

        assert!(controller.enter(UiMode::SelectingPhoto));
        assert!(controller.select_photo(LocalImage::new("file:///tmp/me.jpg")));
        assert_eq!(controller.mode(), UiMode::Editing);
        assert_eq!(
            controller.draft().picture,
            ProfilePicture::Pending(LocalImage::new("file:///tmp/me.jpg"))
        );
    }

    #[tokio::test]
    async fn undefined_transitions_are_ignored() {
        let fakes = Fakes::default();
        let controller = controller(&fakes);

        assert!(!controller.select_skill_level(SkillLevelId::new("junior")));
        assert_eq!(controller.draft().skill_level, None);

        assert!(controller.enter(UiMode::SelectingPhoto));
        assert!(!controller.enter(UiMode::SelectingSkillLevel));
        assert!(!controller.leave(UiMode::SelectingSkillLevel));
        assert_eq!(controller.mode(), UiMode::SelectingPhoto);
        assert!(!controller.enter(UiMode::Editing));
    }

    #[tokio::test]
    async fn rejected_numeric_input_keeps_previous_value() {
        let fakes = Fakes::default();
        let controller = controller(&fakes);

        assert_eq!(controller.set_field(ProfileField::HourlyRate, "12.5".into()), FieldUpdate::Rejected);
        assert_eq!(controller.draft().hourly_rate, "45");
        assert_eq!(controller.save_state().error_message, "");
    }

    #[tokio::test]
    async fn state_changes_publish_views() {
        let fakes = Fakes::default();
        let controller = controller(&fakes);
        let mut rx = controller.subscribe();

        controller.update(Event::PhotoPickerOpened).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().screen, Screen::PhotoPicker);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_save_navigates_once() {
        let fakes = Fakes::default();
        let controller = controller(&fakes);

        controller.set_phone_prefix(1);
        let outcome = controller.save().await;
        settle().await;

        assert_eq!(outcome, SaveOutcome::Saved);
        assert_eq!(fakes.navigator.calls(), vec![NavigationCall::To("Profile".into())]);
        assert_eq!(fakes.analytics.events(), vec!["Save Edit Profile Click".to_string()]);
        assert_eq!(fakes.profile.upload_count(), 0);
        assert!(!controller.save_state().loading);
        assert_eq!(controller.save_state().error_message, "");

        let calls = fakes.profile.calls();
        let [ProfileCall::UpdateDetails(payload)] = calls.as_slice() else {
            panic!("expected a single update call, got {calls:?}");
        };
        assert_eq!(payload.phone_number.as_deref(), Some("15551234"));
        assert_eq!(payload.last_name, None);
    }

    #[tokio::test(start_paused = true)]
    async fn service_error_is_shown_then_cleared() {
        let fakes = Fakes::default();
        fakes.profile.reply_to_update(Ok(ServiceResponse::rejected("E1")));
        let controller = controller(&fakes);

        let outcome = controller.save().await;
        assert_eq!(outcome, SaveOutcome::Rejected("E1".into()));
        assert!(!controller.save_state().loading);
        assert_eq!(controller.view().message.as_deref(), Some("E1"));
        assert!(fakes.navigator.calls().is_empty());

        tokio::time::sleep(Duration::from_millis(2999)).await;
        assert_eq!(controller.save_state().error_message, "E1");
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(controller.save_state().error_message, "");
    }

    #[tokio::test(start_paused = true)]
    async fn update_error_wins_over_upload_error() {
        let fakes = Fakes::default();
        fakes.profile.reply_to_update(Ok(ServiceResponse::rejected("E1")));
        fakes.profile.reply_to_upload(Ok(ServiceResponse::rejected("E2")));
        let controller = controller(&fakes);
        controller.enter(UiMode::SelectingPhoto);
        controller.select_photo(LocalImage::new("file:///tmp/me.jpg"));

        let outcome = controller.save().await;
        assert_eq!(outcome, SaveOutcome::Rejected("E1".into()));
        assert_eq!(fakes.profile.upload_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn upload_error_alone_blocks_navigation() {
        let fakes = Fakes::default();
        fakes.profile.reply_to_upload(Ok(ServiceResponse::rejected("too large")));
        let controller = controller(&fakes);
        controller.enter(UiMode::SelectingPhoto);
        controller.select_photo(LocalImage::new("file:///tmp/me.jpg"));

        assert_eq!(controller.save().await, SaveOutcome::Rejected("too large".into()));
        assert!(fakes.navigator.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_skips_upload_and_keeps_draft() {
        let fakes = Fakes::default();
        fakes
            .profile
            .reply_to_update(Err(ServiceError::Network("connection reset".into())));
        let controller = controller(&fakes);
        controller.enter(UiMode::SelectingPhoto);
        controller.select_photo(LocalImage::new("file:///tmp/me.jpg"));
        let before = controller.draft();

        let outcome = controller.save().await;
        assert_eq!(outcome, SaveOutcome::Failed("connection reset".into()));
        assert!(!controller.save_state().loading);
        assert_eq!(controller.save_state().error_message, "connection reset");
        assert_eq!(fakes.profile.upload_count(), 0);
        assert!(fakes.navigator.calls().is_empty());
        assert_eq!(controller.draft(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn upload_transport_failure_is_shown_without_navigating() {
        let fakes = Fakes::default();
        fakes
            .profile
            .reply_to_upload(Err(ServiceError::Network("upload timed out".into())));
        let controller = controller(&fakes);
        controller.enter(UiMode::SelectingPhoto);
        controller.select_photo(LocalImage::new("file:///tmp/me.jpg"));

        let outcome = controller.save().await;
        settle().await;

        assert_eq!(outcome, SaveOutcome::Failed("upload timed out".into()));
        assert!(!controller.save_state().loading);
        assert_eq!(controller.view().message.as_deref(), Some("upload timed out"));
        assert_eq!(fakes.profile.calls().len(), 2);
        assert!(fakes.navigator.calls().is_empty());
        assert_eq!(fakes.analytics.events(), vec!["Save Edit Profile Click".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_save_does_not_block_the_next_one() {
        let fakes = Fakes::default();
        let gate = fakes.profile.hold_updates();
        let controller = controller(&fakes);

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.save().await }
        });
        settle().await;
        assert!(controller.save_state().loading);

        first.abort();
        assert!(first.await.unwrap_err().is_cancelled());
        assert!(!controller.save_state().loading);
        assert!(!controller.view().loading);

        // Release the next update call straight away.
        gate.notify_one();
        assert_eq!(controller.save().await, SaveOutcome::Saved);
        assert_eq!(fakes.navigator.calls(), vec![NavigationCall::To("Profile".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_message_gets_full_display_time() {
        let fakes = Fakes::default();
        fakes.profile.reply_to_update(Ok(ServiceResponse::rejected("first")));
        let controller = controller(&fakes);

        controller.save().await;
        tokio::time::sleep(Duration::from_millis(2000)).await;
        fakes.profile.reply_to_update(Ok(ServiceResponse::rejected("second")));
        controller.save().await;

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(controller.save_state().error_message, "second");
        tokio::time::sleep(Duration::from_millis(1501)).await;
        assert_eq!(controller.save_state().error_message, "");
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_save_is_refused_while_loading() {
        let fakes = Fakes::default();
        let gate = fakes.profile.hold_updates();
        let controller = controller(&fakes);

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.save().await }
        });
        settle().await;
        assert!(controller.save_state().loading);

        assert_eq!(controller.save().await, SaveOutcome::InFlight);

        gate.notify_one();
        assert_eq!(first.await.unwrap(), SaveOutcome::Saved);
        settle().await;
        assert_eq!(fakes.analytics.events().len(), 2);
        assert_eq!(fakes.profile.calls().len(), 1);
        assert_eq!(fakes.navigator.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn analytics_failure_does_not_affect_save() {
        let fakes = Fakes::default();
        fakes.analytics.set_failing(true);
        let controller = controller(&fakes);

        assert_eq!(controller.save().await, SaveOutcome::Saved);
        settle().await;
        assert_eq!(fakes.analytics.events().len(), 1);
    }

    #[tokio::test]
    async fn back_event_reaches_navigator() {
        let fakes = Fakes::default();
        let controller = controller(&fakes);
        controller.update(Event::BackRequested).await;
        assert_eq!(fakes.navigator.calls(), vec![NavigationCall::Back]);
    }
}
