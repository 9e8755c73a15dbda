//! User and group administration

use crate::error::handlers::{KnownFailure, StatusPolicy};
use crate::error::{AUTH_TOKEN_REJECTED, ErrorKind, Result};
use crate::registry::operations::OperationContext;
use crate::registry::transport::ApiRequest;
use serde::Serialize;
use serde_json::Value;

const AUTH_REJECTED: KnownFailure =
    KnownFailure::new(403, ErrorKind::AuthExpiredOrMissing, AUTH_TOKEN_REJECTED);

const LIST_USERS: StatusPolicy = StatusPolicy {
    operation: "list users",
    success: &[200],
    failures: &[AUTH_REJECTED],
};

const LIST_GROUPS: StatusPolicy = StatusPolicy {
    operation: "list groups and permissions",
    success: &[200],
    failures: &[AUTH_REJECTED],
};

const ADD_GROUP: StatusPolicy = StatusPolicy {
    operation: "add group",
    success: &[200, 201],
    failures: &[
        KnownFailure::new(
            400,
            ErrorKind::Validation,
            "There is missing field(s) in the GroupRequest or it is formed improperly.",
        ),
        AUTH_REJECTED,
        KnownFailure::new(409, ErrorKind::Conflict, "The group already exists."),
    ],
};

const DELETE_GROUP: StatusPolicy = StatusPolicy {
    operation: "delete group",
    success: &[200],
    failures: &[
        KnownFailure::new(
            400,
            ErrorKind::Validation,
            "There is missing field(s) in the GroupID or it is formed improperly, or is invalid.",
        ),
        AUTH_REJECTED,
        KnownFailure::new(404, ErrorKind::NotFound, "Group does not exist."),
    ],
};

#[derive(Debug, Clone, Serialize)]
pub struct GroupRequest {
    pub name: String,
    pub permissions: Vec<String>,
}

#[derive(Clone)]
pub struct UserOperations {
    ctx: OperationContext,
}

impl UserOperations {
    pub fn new(ctx: OperationContext) -> Self {
        Self { ctx }
    }

    pub async fn list_users(&self) -> Result<Value> {
        let request = self.ctx.authorized(ApiRequest::get(&["users"]));
        let users = self.ctx.call(&LIST_USERS, request).await?;
        tracing::info!("users retrieved");
        Ok(users)
    }

    pub async fn list_groups_and_permissions(&self) -> Result<Value> {
        let request = self
            .ctx
            .authorized(ApiRequest::get(&["users", "groups-permissions"]));
        let groups = self.ctx.call(&LIST_GROUPS, request).await?;
        tracing::info!("groups retrieved");
        Ok(groups)
    }

    pub async fn add_group(&self, group: &GroupRequest) -> Result<Value> {
        let request = self
            .ctx
            .authorized(ApiRequest::post(&["groups"]).json(serde_json::json!(group)));
        let payload = self.ctx.call(&ADD_GROUP, request).await?;
        tracing::info!(group = %group.name, "group added");
        Ok(payload)
    }

    pub async fn delete_group(&self, group_id: u64) -> Result<Value> {
        let id = group_id.to_string();
        let request = self.ctx.authorized(ApiRequest::delete(&["groups", &id]));
        let payload = self.ctx.call(&DELETE_GROUP, request).await?;
        tracing::info!(group_id, "group deleted");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::registry::operations::testing::harness;
    use crate::registry::transport::{AUTH_HEADER, RawResponse};
    use reqwest::Method;
    use serde_json::json;

    fn group() -> GroupRequest {
        GroupRequest {
            name: "maintainers".to_string(),
            permissions: vec!["upload".to_string(), "search".to_string()],
        }
    }

    #[tokio::test]
    async fn list_users_returns_payload_with_token() {
        let h = harness();
        h.fx.session.begin("bearer t");
        h.sender.respond(RawResponse::json(200, &json!([{"id": 1, "name": "user1"}])));

        let users = UserOperations::new(h.ctx.clone()).list_users().await.unwrap();
        assert_eq!(users, json!([{"id": 1, "name": "user1"}]));

        let sent = h.sender.last_request();
        assert_eq!((sent.method.clone(), sent.path()), (Method::GET, "/users".to_string()));
        assert_eq!(sent.header_value(AUTH_HEADER), Some("bearer t"));
    }

    #[tokio::test]
    async fn list_groups_hits_groups_permissions() {
        let h = harness();
        h.sender.respond(RawResponse::json(
            200,
            &json!({"groups": ["group1"], "permissions": ["READ"]}),
        ));

        let groups = UserOperations::new(h.ctx.clone())
            .list_groups_and_permissions()
            .await
            .unwrap();
        assert_eq!(groups["groups"], json!(["group1"]));
        assert_eq!(h.sender.last_request().path(), "/users/groups-permissions");
        assert_eq!(h.sender.last_request().header_value(AUTH_HEADER), None);
    }

    #[tokio::test]
    async fn add_group_body_and_statuses() {
        let h = harness();
        let ops = UserOperations::new(h.ctx.clone());
        for status in [200, 201] {
            h.sender.respond(RawResponse::json(status, &json!({"message": "Group added"})));
            assert_eq!(ops.add_group(&group()).await.unwrap(), json!({"message": "Group added"}));
        }
        assert_eq!(
            h.sender.last_request().body,
            Some(json!({"name": "maintainers", "permissions": ["upload", "search"]}))
        );

        for (status, kind, message) in [
            (400, ErrorKind::Validation, "There is missing field(s) in the GroupRequest or it is formed improperly."),
            (403, ErrorKind::AuthExpiredOrMissing, AUTH_TOKEN_REJECTED),
            (409, ErrorKind::Conflict, "The group already exists."),
        ] {
            h.sender.respond(RawResponse::new(status, Vec::new()));
            let err = ops.add_group(&group()).await.unwrap_err();
            assert_eq!(err, kind.at_status(status, message), "status {status}");
        }

        h.sender.respond(RawResponse::new(418, Vec::new()));
        assert_eq!(
            ops.add_group(&group()).await.unwrap_err(),
            ApiError::Unknown { status: 418, detail: None }
        );
    }

    #[tokio::test]
    async fn listings_forbidden_and_unknown_statuses() {
        let h = harness();
        let ops = UserOperations::new(h.ctx.clone());

        h.sender.respond(RawResponse::new(403, Vec::new()));
        assert_eq!(
            ops.list_users().await.unwrap_err(),
            ApiError::AuthExpiredOrMissing(AUTH_TOKEN_REJECTED.to_string())
        );
        h.sender.respond(RawResponse::new(403, Vec::new()));
        assert_eq!(
            ops.list_groups_and_permissions().await.unwrap_err(),
            ApiError::AuthExpiredOrMissing(AUTH_TOKEN_REJECTED.to_string())
        );

        h.sender.respond(RawResponse::json(418, &json!({"message": "teapot"})));
        assert_eq!(
            ops.list_users().await.unwrap_err(),
            ApiError::Unknown { status: 418, detail: Some("teapot".to_string()) }
        );
        h.sender.respond(RawResponse::new(418, Vec::new()));
        assert_eq!(
            ops.list_groups_and_permissions().await.unwrap_err(),
            ApiError::Unknown { status: 418, detail: None }
        );
    }

    #[tokio::test]
    async fn delete_group_statuses() {
        let h = harness();
        let ops = UserOperations::new(h.ctx.clone());

        h.sender.respond(RawResponse::json(200, &json!({"message": "Group deleted"})));
        ops.delete_group(1).await.unwrap();
        let sent = h.sender.last_request();
        assert_eq!((sent.method.clone(), sent.path()), (Method::DELETE, "/groups/1".to_string()));

        for (status, kind, message) in [
            (
                400,
                ErrorKind::Validation,
                "There is missing field(s) in the GroupID or it is formed improperly, or is invalid.",
            ),
            (403, ErrorKind::AuthExpiredOrMissing, AUTH_TOKEN_REJECTED),
            (404, ErrorKind::NotFound, "Group does not exist."),
        ] {
            h.sender.respond(RawResponse::new(status, Vec::new()));
            assert_eq!(ops.delete_group(7).await.unwrap_err(), kind.at_status(status, message));
        }

        h.sender.respond(RawResponse::new(500, Vec::new()));
        assert_eq!(
            ops.delete_group(7).await.unwrap_err(),
            ApiError::Unknown { status: 500, detail: None }
        );
    }

    #[tokio::test]
    async fn list_users_forbidden_triggers_expiry() {
        let h = harness();
        h.fx.session.begin("bearer old");
        h.sender.respond(RawResponse::new(403, Vec::new()));

        let err = UserOperations::new(h.ctx.clone()).list_users().await.unwrap_err();
        assert!(err.is_session_rejected());
        assert_eq!(h.fx.session.current_token(), None);
        assert_eq!(*h.fx.navigator.routes.lock().unwrap(), vec!["/login".to_string()]);
    }
}
