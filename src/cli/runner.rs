//! Runner that maps each subcommand onto one registry operation

use crate::cli::args::{Args, Command};
use crate::config::ClientConfig;
use crate::error::CliError;
use crate::logging::Logger;
use crate::registry::{
    Credentials, GroupRequest, PackageQuery, RegistrationRequest, RegistryClient,
};
use crate::session::{Navigator, SessionState};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;

/// Navigator for a terminal: there is no login page, so tell the user which
/// command starts a new session.
pub struct ConsoleNavigator {
    logger: Logger,
    login_route: String,
}

impl ConsoleNavigator {
    pub fn new(logger: Logger, login_route: impl Into<String>) -> Self {
        Self {
            logger,
            login_route: login_route.into(),
        }
    }
}

impl Navigator for ConsoleNavigator {
    fn navigate(&self, route: &str) {
        if route == self.login_route {
            self.logger
                .info("Run `pkg-registry login` to start a new session.");
        } else {
            self.logger.verbose(&format!("Returned to {}", route));
        }
    }
}

pub struct Runner {
    args: Args,
    logger: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        let logger = if args.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(args.verbose)
        };

        Self { args, logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub async fn run(&self) -> Result<(), CliError> {
        self.args.validate().map_err(CliError::Arguments)?;

        let client = self.create_registry_client()?;
        self.execute(&client, &self.args.command).await?;

        self.logger.verbose(&format!(
            "Completed in {}",
            self.logger.format_duration(self.logger.elapsed())
        ));
        Ok(())
    }

    /// Environment first, then explicit flags.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(base_url) = &self.args.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(path) = &self.args.session_file {
            config.session_file = Some(path.clone());
        }
        config
    }

    fn create_registry_client(&self) -> Result<RegistryClient, CliError> {
        let config = self.client_config();
        self.logger.verbose(&format!("Registry: {}", config.base_url));
        if let Some(path) = &config.session_file {
            self.logger
                .verbose(&format!("Session file: {}", path.display()));
        }

        let navigator = ConsoleNavigator::new(self.logger.clone(), config.login_route.clone());
        let client = RegistryClient::builder(config)
            .with_navigator(Arc::new(navigator))
            .with_notifier(Arc::new(self.logger.clone()))
            .build()?;
        Ok(client)
    }

    async fn execute(&self, client: &RegistryClient, command: &Command) -> Result<(), CliError> {
        match command {
            Command::Register {
                name,
                password,
                admin,
                permissions,
                groups,
            } => {
                let request = RegistrationRequest {
                    name: name.clone(),
                    password: password.clone(),
                    is_admin: *admin,
                    permissions: permissions.clone(),
                    groups: groups.clone(),
                };
                let created = client.register(&request).await?;
                self.logger.success(&format!("Registered user {}", name));
                self.print_result(&created);
            }
            Command::Login {
                username,
                password,
                admin,
            } => {
                let credentials = Credentials {
                    username: username.clone(),
                    password: password.clone(),
                    is_admin: *admin,
                };
                client.authenticate(&credentials).await?;
                self.logger.success(&format!("Logged in as {}", username));
            }
            Command::Logout => {
                client.logout();
                self.logger.success("Logged out");
            }
            Command::Whoami => match client.session().state() {
                SessionState::Authenticated => self.logger.payload(&json!("authenticated")),
                SessionState::Unauthenticated => self.logger.payload(&json!("not logged in")),
            },
            Command::Users => self.logger.payload(&client.list_users().await?),
            Command::Groups => self
                .logger
                .payload(&client.list_groups_and_permissions().await?),
            Command::AddGroup { name, permissions } => {
                let group = GroupRequest {
                    name: name.clone(),
                    permissions: permissions.clone(),
                };
                let created = client.add_group(&group).await?;
                self.logger.success(&format!("Created group {}", name));
                self.print_result(&created);
            }
            Command::DeleteGroup { id } => {
                let removed = client.delete_group(*id).await?;
                self.logger.success(&format!("Deleted group {}", id));
                self.print_result(&removed);
            }
            Command::Query {
                name,
                version,
                json,
                offset,
            } => {
                let query = query_body(name, version.as_deref(), json.as_deref())?;
                self.logger.verbose(&format!("Query: {}", query));
                self.logger.payload(&client.query_packages(query, *offset).await?);
            }
            Command::Get { id } => self.logger.payload(&client.get_package(id).await?),
            Command::Update { id, data } => {
                let package: Value = serde_json::from_str(data)
                    .map_err(|e| CliError::Arguments(format!("--data is not valid JSON: {}", e)))?;
                let updated = client.update_package(id, package).await?;
                self.logger.success(&format!("Updated package {}", id));
                self.print_result(&updated);
            }
            Command::Reset => {
                let reset = client.reset_registry().await?;
                self.logger.success("Registry reset");
                self.print_result(&reset);
            }
            Command::Rate { id } => self.logger.payload(&client.package_rate(id).await?),
            Command::Cost { id, dependency } => {
                let total = client.package_cost(id, *dependency).await?;
                self.logger.summary_kv(
                    "Package cost",
                    &[("id", id.clone()), ("dependencies", dependency.to_string())],
                );
                self.logger.payload(&json!(total));
            }
            Command::Search { regex } => self.logger.payload(&client.search_by_regex(regex).await?),
            Command::Tracks => self.logger.payload(&client.list_tracks().await?),
            Command::UploadUrl { url, js_program } => {
                let package = client.upload_by_url(js_program, url).await?;
                self.logger.success(&format!("Uploaded {}", url));
                self.print_result(&package);
            }
            Command::UploadContent {
                file,
                js_program,
                debloat,
            } => {
                let content = encode_package(file)?;
                self.logger.verbose(&format!(
                    "Encoded {} ({} base64 characters)",
                    file.display(),
                    content.len()
                ));
                let package = client.upload_by_content(&content, js_program, *debloat).await?;
                self.logger.success(&format!("Uploaded {}", file.display()));
                self.print_result(&package);
            }
        }
        Ok(())
    }

    fn print_result(&self, value: &Value) {
        if !value.is_null() {
            self.logger.payload(value);
        }
    }
}

/// Query body from either a raw JSON document or one name/version pair.
pub fn query_body(name: &str, version: Option<&str>, raw: Option<&str>) -> Result<Value, CliError> {
    if let Some(raw) = raw {
        return serde_json::from_str(raw)
            .map_err(|e| CliError::Arguments(format!("--json is not valid JSON: {}", e)));
    }

    let mut query = PackageQuery::new(name);
    if let Some(version) = version {
        query = query.with_version(version);
    }
    Ok(PackageQuery::body(&[query]))
}

/// Base64 of the package archive, as the upload endpoint expects it.
pub fn encode_package(path: &Path) -> Result<String, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn flags_override_environment_config() {
        let args = Args::try_parse_from([
            "pkg-registry",
            "--base-url",
            "https://r.example.com",
            "--session-file",
            "/tmp/session.json",
            "tracks",
        ])
        .unwrap();
        let config = Runner::new(args).client_config();

        assert_eq!(config.base_url, "https://r.example.com");
        assert_eq!(config.session_file, Some(PathBuf::from("/tmp/session.json")));
    }

    #[test]
    fn query_body_from_flags_or_raw_json() {
        let body = query_body("lodash", Some("1.2.3"), None).unwrap();
        assert_eq!(body, json!([{"Name": "lodash", "Version": "1.2.3"}]));

        let body = query_body("ignored", None, Some(r#"[{"Name": "*"}]"#)).unwrap();
        assert_eq!(body, json!([{"Name": "*"}]));

        assert!(matches!(
            query_body("x", None, Some("{not json")),
            Err(CliError::Arguments(_))
        ));
    }

    #[test]
    fn encode_package_reads_file_as_base64() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"PK\x03\x04").unwrap();

        assert_eq!(encode_package(file.path()).unwrap(), "UEsDBA==");
        assert!(matches!(
            encode_package(Path::new("/missing/package.zip")),
            Err(CliError::Input { .. })
        ));
    }
}
