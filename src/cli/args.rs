//! Command-line argument parsing

use crate::config::{BASE_URL_ENV, SESSION_FILE_ENV};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pkg-registry")]
#[command(about = "A command-line client for the package registry API")]
#[command(version, author)]
pub struct Args {
    /// Registry API base URL
    #[arg(
        long = "base-url",
        global = true,
        env = BASE_URL_ENV,
        help = "Base URL of the registry API"
    )]
    pub base_url: Option<String>,

    /// File holding the persisted session token
    #[arg(
        long = "session-file",
        global = true,
        env = SESSION_FILE_ENV,
        help = "Path of the session file that keeps the login token"
    )]
    pub session_file: Option<PathBuf>,

    /// Verbose output
    #[arg(long = "verbose", short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Quiet mode
    #[arg(
        long = "quiet",
        short = 'q',
        global = true,
        conflicts_with = "verbose",
        help = "Only print results and errors"
    )]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a user account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long, env = "REGISTRY_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        admin: bool,
        #[arg(long = "permission")]
        permissions: Vec<String>,
        #[arg(long = "group")]
        groups: Vec<String>,
    },
    /// Authenticate and persist the session token
    Login {
        #[arg(long, short = 'u')]
        username: String,
        #[arg(long, short = 'p', env = "REGISTRY_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        admin: bool,
    },
    /// Forget the session token
    Logout,
    /// Show whether a session token is held
    Whoami,
    /// List user accounts
    Users,
    /// List groups and their permissions
    Groups,
    /// Create a group
    AddGroup {
        name: String,
        #[arg(long = "permission")]
        permissions: Vec<String>,
    },
    /// Delete a group by id
    DeleteGroup { id: u64 },
    /// Query packages by name and version, or with a raw JSON query
    Query {
        #[arg(long, default_value = "*")]
        name: String,
        #[arg(long)]
        version: Option<String>,
        /// Raw JSON query body; overrides --name and --version
        #[arg(long)]
        json: Option<String>,
        #[arg(long)]
        offset: Option<u64>,
    },
    /// Fetch one package
    Get { id: String },
    /// Replace a package with the JSON document in --data
    Update {
        id: String,
        #[arg(long)]
        data: String,
    },
    /// Reset the registry to its default state
    Reset,
    /// Show the rating of a package
    Rate { id: String },
    /// Show the total cost of a package
    Cost {
        id: String,
        #[arg(long)]
        dependency: bool,
    },
    /// Search packages by regular expression
    Search { regex: String },
    /// List the planned tracks
    Tracks,
    /// Upload a package from a public repository URL
    UploadUrl {
        url: String,
        #[arg(long = "js-program", default_value = "")]
        js_program: String,
    },
    /// Upload a package from a local zip file
    UploadContent {
        file: PathBuf,
        #[arg(long = "js-program", default_value = "")]
        js_program: String,
        #[arg(long)]
        debloat: bool,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate arguments that clap cannot check on its own
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Command::Register { name, .. } if name.trim().is_empty() => {
                Err("User name cannot be empty".to_string())
            }
            Command::Login { username, .. } if username.trim().is_empty() => {
                Err("Username cannot be empty".to_string())
            }
            Command::Search { regex } if regex.is_empty() => {
                Err("Search expression cannot be empty".to_string())
            }
            Command::UploadContent { file, .. } if !file.exists() => {
                Err(format!("File does not exist: {}", file.display()))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "pkg-registry",
            "cost",
            "42",
            "--dependency",
            "--base-url",
            "https://r.example.com",
            "-v",
        ])
        .unwrap();

        assert!(args.verbose);
        assert_eq!(args.base_url.as_deref(), Some("https://r.example.com"));
        assert_eq!(
            args.command,
            Command::Cost {
                id: "42".to_string(),
                dependency: true
            }
        );
    }

    #[test]
    fn repeated_permission_flags_collect() {
        let args = Args::try_parse_from([
            "pkg-registry",
            "add-group",
            "editors",
            "--permission",
            "upload",
            "--permission",
            "download",
        ])
        .unwrap();

        assert_eq!(
            args.command,
            Command::AddGroup {
                name: "editors".to_string(),
                permissions: vec!["upload".to_string(), "download".to_string()],
            }
        );
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["pkg-registry", "tracks", "-q", "-v"]).is_err());
    }

    #[test]
    fn validate_rejects_missing_upload_file() {
        let args = Args::try_parse_from([
            "pkg-registry",
            "upload-content",
            "/definitely/not/here.zip",
        ])
        .unwrap();
        assert!(args.validate().unwrap_err().contains("File does not exist"));
    }
}
