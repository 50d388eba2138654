//! Scripted stand-ins for the services, recording every call.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use super::{Analytics, Navigator, ProfileService, ServiceResponse, Services, SkillLevelService};
use crate::error::{AnalyticsError, ServiceError};
use crate::model::{LocalImage, SavePayload, SkillLevelId, SkillLevelOption};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileCall {
    UpdateDetails(SavePayload),
    UploadPicture(LocalImage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationCall {
    Back,
    To(String),
}

type Reply = Result<ServiceResponse, ServiceError>;

pub struct FakeProfileService {
    update_reply: Mutex<Reply>,
    upload_reply: Mutex<Reply>,
    calls: Mutex<Vec<ProfileCall>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl Default for FakeProfileService {
    fn default() -> Self {
        Self {
            update_reply: Mutex::new(Ok(ServiceResponse::ok())),
            upload_reply: Mutex::new(Ok(ServiceResponse::ok())),
            calls: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        }
    }
}

impl FakeProfileService {
    pub fn reply_to_update(&self, reply: Reply) {
        *lock(&self.update_reply) = reply;
    }

    pub fn reply_to_upload(&self, reply: Reply) {
        *lock(&self.upload_reply) = reply;
    }

    /// Park every `update_details` call until the returned handle is
    /// notified once per call.
    pub fn hold_updates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.gate) = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<ProfileCall> {
        lock(&self.calls).clone()
    }

    pub fn upload_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ProfileCall::UploadPicture(_)))
            .count()
    }
}

#[async_trait::async_trait]
impl ProfileService for FakeProfileService {
    async fn update_details(&self, payload: &SavePayload) -> Result<ServiceResponse, ServiceError> {
        lock(&self.calls).push(ProfileCall::UpdateDetails(payload.clone()));
        let gate = lock(&self.gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        lock(&self.update_reply).clone()
    }

    async fn upload_picture(&self, image: &LocalImage) -> Result<ServiceResponse, ServiceError> {
        lock(&self.calls).push(ProfileCall::UploadPicture(image.clone()));
        lock(&self.upload_reply).clone()
    }
}

pub struct FakeSkillLevelService {
    reply: Mutex<Result<Vec<SkillLevelOption>, ServiceError>>,
    calls: AtomicUsize,
}

impl Default for FakeSkillLevelService {
    fn default() -> Self {
        Self::with_levels(vec![
            SkillLevelOption {
                id: SkillLevelId::new("junior"),
                name: "Junior".into(),
            },
            SkillLevelOption {
                id: SkillLevelId::new("senior"),
                name: "Senior".into(),
            },
        ])
    }
}

impl FakeSkillLevelService {
    #[must_use]
    pub fn with_levels(levels: Vec<SkillLevelOption>) -> Self {
        Self {
            reply: Mutex::new(Ok(levels)),
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn failing(error: ServiceError) -> Self {
        Self {
            reply: Mutex::new(Err(error)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SkillLevelService for FakeSkillLevelService {
    async fn list_all(&self) -> Result<Vec<SkillLevelOption>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.reply).clone()
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    calls: Mutex<Vec<NavigationCall>>,
}

impl RecordingNavigator {
    pub fn calls(&self) -> Vec<NavigationCall> {
        lock(&self.calls).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn go_back(&self) {
        lock(&self.calls).push(NavigationCall::Back);
    }

    fn navigate_to(&self, screen: &str) {
        lock(&self.calls).push(NavigationCall::To(screen.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingAnalytics {
    events: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingAnalytics {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Events received, including the ones answered with an error.
    pub fn events(&self) -> Vec<String> {
        lock(&self.events).clone()
    }
}

#[async_trait::async_trait]
impl Analytics for RecordingAnalytics {
    async fn log_event(&self, name: &str) -> Result<(), AnalyticsError> {
        lock(&self.events).push(name.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(AnalyticsError::Unavailable("injected failure".into()));
        }
        Ok(())
    }
}

/// One of each fake, kept typed so tests can script and inspect them.
#[derive(Clone, Default)]
pub struct Fakes {
    pub profile: Arc<FakeProfileService>,
    pub skill_levels: Arc<FakeSkillLevelService>,
    pub navigator: Arc<RecordingNavigator>,
    pub analytics: Arc<RecordingAnalytics>,
}

impl Fakes {
    pub fn services(&self) -> Services {
        Services {
            profile: self.profile.clone(),
            skill_levels: self.skill_levels.clone(),
            navigator: self.navigator.clone(),
            analytics: self.analytics.clone(),
        }
    }
}
