//! Collaborators the profile screens call into.
//!
//! Each one is a narrow trait so the shell (or a test) can supply its own
//! implementation; the controller receives them bundled in [`Services`].

mod analytics;
mod navigation;
mod profile;
mod skill_level;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

use std::fmt;
use std::sync::Arc;

pub use self::analytics::Analytics;
pub use self::navigation::Navigator;
pub use self::profile::{ProfileService, ServiceResponse};
pub use self::skill_level::SkillLevelService;

#[derive(Clone)]
pub struct Services {
    pub profile: Arc<dyn ProfileService>,
    pub skill_levels: Arc<dyn SkillLevelService>,
    pub navigator: Arc<dyn Navigator>,
    pub analytics: Arc<dyn Analytics>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
