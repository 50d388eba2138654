use crate::error::AnalyticsError;

#[async_trait::async_trait]
pub trait Analytics: Send + Sync {
    async fn log_event(&self, name: &str) -> Result<(), AnalyticsError>;
}
