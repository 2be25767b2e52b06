//! Notifier trait for sending alerts

use async_trait::async_trait;

/// Trait for sending notifications
///
/// Each call is one delivery attempt. There is no queue and no retry; a
/// failed delivery is reported to the caller and then lost.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Get the notifier type name (e.g. "telegram")
    fn type_name(&self) -> &str;

    /// Deliver `message` to `destination`
    async fn notify(&self, destination: &str, message: &str) -> crate::Result<()>;
}
