//! Fetcher trait

use async_trait::async_trait;

use crate::config::Target;
use crate::session::SessionContext;
use crate::snapshot::Snapshot;

/// Retrieves the current seat availability of one target
///
/// One call performs exactly one backend request. Retrying is up to the
/// caller. Failures are `Network`, `SessionExpired` or
/// `UnexpectedResponseShape`.
#[async_trait]
pub trait Fetcher: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, target: &Target, session: &SessionContext) -> crate::Result<Snapshot>;
}
