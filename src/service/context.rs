//! Per-request context
//!
//! Carries the acting identity and the operation deadline into every
//! service call. Nothing here is shared between requests.

use std::future::Future;
use std::time::Duration;

use crate::auth::AccessClaims;
use crate::error::AppError;
use crate::metrics::STORE_TIMEOUTS_TOTAL;

/// Identifier of the user performing a request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&AccessClaims> for ActorId {
    fn from(claims: &AccessClaims) -> Self {
        Self(claims.user_id.clone())
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Acting identity (possibly anonymous) plus the operation deadline
#[derive(Debug, Clone)]
pub struct RequestContext {
    actor: Option<ActorId>,
    timeout: Duration,
}

impl RequestContext {
    pub fn new(actor: Option<ActorId>, timeout: Duration) -> Self {
        Self { actor, timeout }
    }

    /// Context for an authenticated actor
    pub fn authenticated(actor: ActorId, timeout: Duration) -> Self {
        Self::new(Some(actor), timeout)
    }

    /// Context without an acting identity
    pub fn anonymous(timeout: Duration) -> Self {
        Self::new(None, timeout)
    }

    pub fn actor(&self) -> Option<&ActorId> {
        self.actor.as_ref()
    }

    /// The acting identity, or `Unauthorized` for anonymous requests
    pub fn require_actor(&self) -> Result<&ActorId, AppError> {
        self.actor.as_ref().ok_or(AppError::Unauthorized)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `operation` under the request deadline
    ///
    /// An elapsed deadline is reported as `Timeout`, never as absence.
    pub async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Operation exceeded deadline"
                );
                STORE_TIMEOUTS_TOTAL.with_label_values(&[operation]).inc();
                Err(AppError::Timeout(operation))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_context_requires_actor() {
        let ctx = RequestContext::anonymous(Duration::from_secs(1));
        assert!(ctx.actor().is_none());
        assert!(matches!(ctx.require_actor(), Err(AppError::Unauthorized)));

        let ctx = RequestContext::authenticated(ActorId::new("u1"), Duration::from_secs(1));
        assert_eq!(ctx.require_actor().unwrap().as_str(), "u1");
    }

    #[tokio::test]
    async fn bounded_reports_timeout_not_absence() {
        let ctx = RequestContext::anonymous(Duration::from_millis(10));

        let result: Result<Option<u32>, AppError> = ctx
            .bounded("slow_lookup", async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(None)
            })
            .await;

        assert!(matches!(result, Err(AppError::Timeout("slow_lookup"))));
    }

    #[tokio::test]
    async fn bounded_passes_results_through() {
        let ctx = RequestContext::anonymous(Duration::from_secs(1));

        let value = ctx.bounded("fast", async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);

        let error = ctx
            .bounded::<(), _>("fails", async { Err(AppError::NotFound("Video")) })
            .await;
        assert!(matches!(error, Err(AppError::NotFound("Video"))));
    }
}
