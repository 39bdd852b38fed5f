//! engine::dry_run
//!
//! The single choke point between the dispatcher and the transport for
//! every call a verb intends to make.
//!
//! In dry-run mode the request descriptor is recorded as a preview and the
//! transport is never called. Identifier and type lookups that must happen
//! before a request can even be described go straight to the session; they
//! never mutate.

use serde_json::Value;
use tracing::info;

use super::Session;
use crate::api::{ApiRequest, TransportError};

/// Result of passing a request through the gate.
#[derive(Debug, Clone, PartialEq)]
pub enum Gated {
    /// Dry run: the request that would have been sent.
    Preview(ApiRequest),
    /// The response of the executed request.
    Executed(Value),
}

#[derive(Debug, Default)]
pub struct DryRunGate {
    dry_run: bool,
    previews: Vec<ApiRequest>,
}

impl DryRunGate {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            previews: Vec::new(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub async fn guard(&mut self, session: &Session, request: ApiRequest) -> Result<Gated, TransportError> {
        if self.dry_run {
            info!(request = %request, "dry run, not sending");
            self.previews.push(request.clone());
            return Ok(Gated::Preview(request));
        }
        session.execute(&request).await.map(Gated::Executed)
    }

    /// Previews recorded so far, draining them.
    pub fn take_previews(&mut self) -> Vec<ApiRequest> {
        std::mem::take(&mut self.previews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn dry_run_never_reaches_transport() {
        let mock = MockTransport::new();
        let session = Session::new("t", "https://m", Arc::new(mock.clone()));
        let mut gate = DryRunGate::new(true);

        let req = ApiRequest::post("/api/roles", json!({"role": {"authority": "x"}}));
        assert_eq!(gate.guard(&session, req.clone()).await.unwrap(), Gated::Preview(req.clone()));
        gate.guard(&session, ApiRequest::get("/api/roles")).await.unwrap();

        assert!(mock.operations().is_empty());
        assert_eq!(gate.take_previews().len(), 2);
        assert!(gate.take_previews().is_empty());
    }

    #[tokio::test]
    async fn live_mode_calls_through() {
        let mock = MockTransport::new();
        let session = Session::new("t", "https://m", Arc::new(mock.clone()));
        let mut gate = DryRunGate::new(false);
        let err = gate
            .guard(&session, ApiRequest::delete("/api/roles/1"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::NotFound(_)));
        assert_eq!(mock.mutation_count(), 1);
    }
}
