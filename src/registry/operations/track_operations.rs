//! Public track listing; no session required

use crate::error::handlers::{KnownFailure, StatusPolicy};
use crate::error::{ErrorKind, Result};
use crate::registry::operations::OperationContext;
use crate::registry::transport::ApiRequest;
use serde_json::Value;

const LIST_TRACKS: StatusPolicy = StatusPolicy {
    operation: "list tracks",
    success: &[200],
    failures: &[KnownFailure::new(
        500,
        ErrorKind::ServerFault,
        "The system encountered an error while retrieving the student's track information.",
    )],
};

#[derive(Clone)]
pub struct TrackOperations {
    ctx: OperationContext,
}

impl TrackOperations {
    pub fn new(ctx: OperationContext) -> Self {
        Self { ctx }
    }

    pub async fn list_tracks(&self) -> Result<Value> {
        let tracks = self.ctx.call(&LIST_TRACKS, ApiRequest::get(&["tracks"])).await?;
        tracing::info!("tracks retrieved");
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::registry::operations::testing::harness;
    use crate::registry::transport::{AUTH_HEADER, RawResponse};
    use serde_json::json;

    #[tokio::test]
    async fn tracks_never_send_token() {
        let h = harness();
        h.fx.session.begin("bearer t");
        h.sender.respond(RawResponse::json(200, &json!({"plannedTracks": ["Access control track"]})));

        let tracks = TrackOperations::new(h.ctx.clone()).list_tracks().await.unwrap();
        assert_eq!(tracks["plannedTracks"][0], "Access control track");
        assert_eq!(h.sender.last_request().header_value(AUTH_HEADER), None);
    }

    #[tokio::test]
    async fn tracks_failures() {
        let h = harness();
        let ops = TrackOperations::new(h.ctx.clone());

        h.sender.respond(RawResponse::new(500, Vec::new()));
        assert_eq!(
            ops.list_tracks().await.unwrap_err(),
            ErrorKind::ServerFault.at_status(
                500,
                "The system encountered an error while retrieving the student's track information."
            )
        );

        h.sender.respond(RawResponse::new(418, Vec::new()));
        assert_eq!(
            ops.list_tracks().await.unwrap_err(),
            ApiError::Unknown { status: 418, detail: None }
        );

        h.sender.fail("dns error");
        assert_eq!(ops.list_tracks().await.unwrap_err().kind(), ErrorKind::NoResponse);
    }
}
