use crate::client::Client;
use crate::error::ClientError;

/// Something whose readiness can be checked over the network.
///
/// Implementations return `Ok(true)` when healthy, `Ok(false)` when the
/// dependency answered but reported itself unhealthy, and `Err` only when it
/// could not be reached.
pub trait ReadinessProbe: Send + Sync {
    fn is_ready(&self) -> impl std::future::Future<Output = Result<bool, ClientError>> + Send;
}

impl ReadinessProbe for Client {
    async fn is_ready(&self) -> Result<bool, ClientError> {
        Client::is_ready(self).await
    }
}
