//! Package lifecycle: upload, query, fetch, update, rate, cost, search, reset

use crate::error::handlers::{KnownFailure, StatusPolicy};
use crate::error::{AUTH_TOKEN_REJECTED, ApiError, ErrorKind, Result};
use crate::registry::operations::OperationContext;
use crate::registry::transport::ApiRequest;
use serde_json::{Map, Value, json};

const AUTH_REJECTED: KnownFailure =
    KnownFailure::new(403, ErrorKind::AuthExpiredOrMissing, AUTH_TOKEN_REJECTED);

const PACKAGE_MISSING: KnownFailure =
    KnownFailure::new(404, ErrorKind::NotFound, "Package does not exist.");

const BAD_PACKAGE_ID: KnownFailure = KnownFailure::new(
    400,
    ErrorKind::Validation,
    "There is missing field(s) in the PackageID or it is formed improperly, or is invalid.",
);

const METRIC_FAILURES: [KnownFailure; 4] = [
    KnownFailure::new(400, ErrorKind::Validation, "There is missing field(s) in the PackageID"),
    AUTH_REJECTED,
    PACKAGE_MISSING,
    KnownFailure::new(
        500,
        ErrorKind::ServerFault,
        "The package rating system choked on at least one of the metrics.",
    ),
];

const UPLOAD_FAILURES: [KnownFailure; 4] = [
    KnownFailure::new(
        400,
        ErrorKind::Validation,
        "There is missing field(s) in the PackageUpload or it is formed improperly, or is invalid.",
    ),
    AUTH_REJECTED,
    KnownFailure::new(409, ErrorKind::Conflict, "Package exists already."),
    KnownFailure::new(
        424,
        ErrorKind::BusinessRejected,
        "Package is not uploaded due to the disqualified rating.",
    ),
];

const QUERY: StatusPolicy = StatusPolicy {
    operation: "query packages",
    success: &[200],
    failures: &[
        KnownFailure::new(
            400,
            ErrorKind::Validation,
            "There is missing field(s) in the PackageQuery or it is formed improperly, or is invalid.",
        ),
        AUTH_REJECTED,
        KnownFailure::new(413, ErrorKind::PayloadTooLarge, "Too many packages returned."),
    ],
};

const GET: StatusPolicy = StatusPolicy {
    operation: "get package",
    success: &[200],
    failures: &[BAD_PACKAGE_ID, AUTH_REJECTED, PACKAGE_MISSING],
};

const UPDATE: StatusPolicy = StatusPolicy {
    operation: "update package",
    success: &[200],
    failures: &[BAD_PACKAGE_ID, AUTH_REJECTED, PACKAGE_MISSING],
};

const RESET: StatusPolicy = StatusPolicy {
    operation: "reset registry",
    success: &[200],
    failures: &[
        KnownFailure::new(
            401,
            ErrorKind::AuthInvalid,
            "You do not have permission to reset the registry.",
        ),
        AUTH_REJECTED,
    ],
};

const RATE: StatusPolicy = StatusPolicy {
    operation: "package rate",
    success: &[200],
    failures: &METRIC_FAILURES,
};

const COST: StatusPolicy = StatusPolicy {
    operation: "package cost",
    success: &[200],
    failures: &METRIC_FAILURES,
};

const SEARCH: StatusPolicy = StatusPolicy {
    operation: "search by regex",
    success: &[200],
    failures: &[
        KnownFailure::new(
            400,
            ErrorKind::Validation,
            "There is missing field(s) in the PackageRegEx or it is formed improperly, or is invalid",
        ),
        AUTH_REJECTED,
        KnownFailure::new(404, ErrorKind::NotFound, "No package found under this regex."),
    ],
};

const UPLOAD: StatusPolicy = StatusPolicy {
    operation: "upload package",
    success: &[200, 201],
    failures: &UPLOAD_FAILURES,
};

/// One entry of a package query; `name` may be `*` to match everything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageQuery {
    pub name: String,
    pub version: Option<String>,
}

impl PackageQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    fn to_json(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("Name".to_string(), Value::String(self.name.clone()));
        if let Some(version) = &self.version {
            entry.insert("Version".to_string(), Value::String(version.clone()));
        }
        Value::Object(entry)
    }

    /// Request body for a list of queries
    pub fn body(queries: &[PackageQuery]) -> Value {
        Value::Array(queries.iter().map(PackageQuery::to_json).collect())
    }
}

#[derive(Clone)]
pub struct PackageOperations {
    ctx: OperationContext,
}

impl PackageOperations {
    pub fn new(ctx: OperationContext) -> Self {
        Self { ctx }
    }

    /// Query with an arbitrary body; see [`PackageQuery::body`] for the usual shape.
    pub async fn query_packages(&self, query: Value, offset: Option<u64>) -> Result<Value> {
        let mut request = ApiRequest::post(&["packages"]).json(query);
        if let Some(offset) = offset {
            request = request.query("offset", offset);
        }
        let packages = self.ctx.call(&QUERY, self.ctx.authorized(request)).await?;
        tracing::info!(?offset, "packages retrieved");
        Ok(packages)
    }

    pub async fn get_package(&self, package_id: &str) -> Result<Value> {
        tracing::debug!(package_id, "fetching package");
        let request = self.ctx.authorized(ApiRequest::get(&["package", package_id]));
        let package = self.ctx.call(&GET, request).await?;
        tracing::info!(package_id, "package retrieved");
        Ok(package)
    }

    pub async fn update_package(&self, package_id: &str, package: Value) -> Result<Value> {
        let request = ApiRequest::post(&["package", package_id])
            .header("id", package_id)
            .json(package);
        let payload = self.ctx.call(&UPDATE, self.ctx.authorized(request)).await?;
        tracing::info!(package_id, "version is updated");
        Ok(payload)
    }

    pub async fn reset_registry(&self) -> Result<Value> {
        let request = self.ctx.authorized(ApiRequest::delete(&["reset"]));
        let payload = self.ctx.call(&RESET, request).await?;
        tracing::info!("registry is reset");
        Ok(payload)
    }

    pub async fn package_rate(&self, package_id: &str) -> Result<Value> {
        let request = self
            .ctx
            .authorized(ApiRequest::get(&["package", package_id, "rate"]));
        self.ctx.call(&RATE, request).await
    }

    /// Total cost of a package, optionally including its dependencies.
    pub async fn package_cost(&self, package_id: &str, dependency: bool) -> Result<f64> {
        let request = ApiRequest::get(&["package", package_id, "cost"]).query("dependency", dependency);
        let payload = self.ctx.call(&COST, self.ctx.authorized(request)).await?;
        let cost = extract_total_cost(&payload)?;
        tracing::debug!(package_id, dependency, cost, "package cost retrieved");
        Ok(cost)
    }

    pub async fn search_by_regex(&self, regex: &str) -> Result<Value> {
        let request = ApiRequest::post(&["package", "byRegEx"]).json(json!({ "RegEx": regex }));
        self.ctx.call(&SEARCH, self.ctx.authorized(request)).await
    }

    /// Ingest a package from a public repository URL.
    pub async fn upload_by_url(&self, js_program: &str, url: &str) -> Result<Value> {
        let body = json!({
            "JSProgram": js_program,
            "URL": url,
        });
        self.upload(body).await
    }

    /// Upload base64-encoded zip content.
    pub async fn upload_by_content(&self, content: &str, js_program: &str, debloat: bool) -> Result<Value> {
        let body = json!({
            "Content": content,
            "JSProgram": js_program,
            "debloat": debloat,
        });
        self.upload(body).await
    }

    async fn upload(&self, body: Value) -> Result<Value> {
        let request = self.ctx.authorized(ApiRequest::post(&["package"]).json(body));
        let metadata = self.ctx.call(&UPLOAD, request).await?;
        tracing::info!("package uploaded; check the returned metadata for the official ID");
        Ok(metadata)
    }
}

/// The cost body is keyed by the package id the server echoes back; the
/// total lives under the first key whatever its literal value.
fn extract_total_cost(payload: &Value) -> Result<f64> {
    let entry = payload
        .as_object()
        .and_then(|entries| entries.values().next())
        .ok_or_else(|| {
            ApiError::UnexpectedPayload("cost response contained no package entry".to_string())
        })?;

    entry
        .get("totalCost")
        .and_then(Value::as_f64)
        .ok_or_else(|| {
            ApiError::UnexpectedPayload("cost entry has no numeric totalCost".to_string())
        })
}
