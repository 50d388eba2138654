use crate::error::ServiceError;
use crate::model::SkillLevelOption;

#[async_trait::async_trait]
pub trait SkillLevelService: Send + Sync {
    /// All selectable skill levels, in display order.
    async fn list_all(&self) -> Result<Vec<SkillLevelOption>, ServiceError>;
}
