use crate::constants::{
    BLOB_AUTH_CONNECTION_STRING, BLOB_AUTH_IDENTITY, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_PUBLIC_ACCESS,
};
use blob_store::{BlobBackend, BlobStoreOptions, PublicAccess};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::error;

/// How the gateway authenticates to the blob service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobAuth {
    /// Shared Key from a storage connection string
    ConnectionString(String),
    /// Ambient credential chain against the named account
    Identity { account_name: String },
}

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    pub blob_auth: BlobAuth,
    pub blob_options: BlobStoreOptions,
    pub cosmos_connection_string: String,
    /// Skip TLS verification for the document store (emulator only)
    pub cosmos_accept_invalid_certs: bool,
}

impl ServerConfig {
    /// Load from command-line flags, falling back to environment variables and defaults
    pub fn load() -> Result<Self, std::io::Error> {
        Self::from_matches(&command().get_matches(), |name| std::env::var(name).ok())
    }

    fn from_matches(
        matches: &ArgMatches,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, std::io::Error> {
        // Priority: command-line args > environment variables > defaults
        let value = |arg: &str, var: &str| {
            matches
                .get_one::<String>(arg)
                .cloned()
                .or_else(|| env(var))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = value("host", "SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port_str = value("port", "SERVER_PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
        let port = port_str
            .parse::<u16>()
            .map_err(|_| invalid_input(format!("Invalid port number: {}", port_str)))?;

        let auth_mode = value("blob-auth", "BLOB_AUTH")
            .unwrap_or_else(|| BLOB_AUTH_CONNECTION_STRING.to_string());
        let blob_auth = match auth_mode.as_str() {
            BLOB_AUTH_CONNECTION_STRING => BlobAuth::ConnectionString(
                value("blob-connection-string", "AZURE_STORAGE_CONNECTION_STRING").ok_or_else(
                    || {
                        invalid_input(
                            "Storage connection string required. Set --blob-connection-string or AZURE_STORAGE_CONNECTION_STRING env var",
                        )
                    },
                )?,
            ),
            BLOB_AUTH_IDENTITY => BlobAuth::Identity {
                account_name: value("blob-account", "AZURE_STORAGE_ACCOUNT").ok_or_else(|| {
                    invalid_input(
                        "Storage account name required for identity auth. Set --blob-account or AZURE_STORAGE_ACCOUNT env var",
                    )
                })?,
            },
            other => {
                return Err(invalid_input(format!(
                    "Invalid blob auth: {}. Must be '{}' or '{}'",
                    other, BLOB_AUTH_CONNECTION_STRING, BLOB_AUTH_IDENTITY
                )))
            }
        };

        let container_name = value("blob-container", "AZURE_STORAGE_CONTAINER").ok_or_else(|| {
            invalid_input("Blob container required. Set --blob-container or AZURE_STORAGE_CONTAINER env var")
        })?;

        let auto_create_container = match value("auto-create-container", "AUTO_CREATE_CONTAINER") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                invalid_input(format!("Invalid value for auto-create-container: {}", raw))
            })?,
            None => true,
        };

        let public_access = value("public-access", "BLOB_PUBLIC_ACCESS")
            .unwrap_or_else(|| DEFAULT_PUBLIC_ACCESS.to_string())
            .parse::<PublicAccess>()
            .map_err(invalid_input)?;

        let cosmos_connection_string = value("cosmos-connection-string", "COSMOS_CONNECTION_STRING")
            .ok_or_else(|| {
                invalid_input(
                    "Cosmos DB connection string required. Set --cosmos-connection-string or COSMOS_CONNECTION_STRING env var",
                )
            })?;

        let cosmos_accept_invalid_certs = matches.get_flag("cosmos-accept-invalid-certs")
            || env("COSMOS_ACCEPT_INVALID_CERTS")
                .and_then(|raw| parse_bool(&raw))
                .unwrap_or(false);

        Ok(ServerConfig {
            host,
            port,
            blob_auth,
            blob_options: BlobStoreOptions {
                container_name,
                auto_create_container,
                public_access,
            },
            cosmos_connection_string,
            cosmos_accept_invalid_certs,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn blob_backend(&self) -> BlobBackend {
        match &self.blob_auth {
            BlobAuth::ConnectionString(raw) => BlobBackend::ConnectionString(raw.clone()),
            BlobAuth::Identity { account_name } => BlobBackend::AmbientCredential {
                account_name: account_name.clone(),
            },
        }
    }
}

fn command() -> Command {
    let text = |name: &'static str, value_name: &'static str, help: &'static str| {
        Arg::new(name).long(name).value_name(value_name).help(help)
    };

    Command::new("server")
        .about("HTTP gateway to Azure Blob Storage and Cosmos DB")
        .arg(text("host", "HOST", "Server host (default: 0.0.0.0, or SERVER_HOST env var)"))
        .arg(text("port", "PORT", "Server port (default: 8080, or SERVER_PORT env var)"))
        .arg(text(
            "blob-auth",
            "MODE",
            "Blob auth: 'connection-string' (default) or 'identity' (or BLOB_AUTH env var)",
        ))
        .arg(text(
            "blob-connection-string",
            "CONNECTION_STRING",
            "Storage connection string (or AZURE_STORAGE_CONNECTION_STRING env var)",
        ))
        .arg(text(
            "blob-account",
            "ACCOUNT",
            "Storage account name for identity auth (or AZURE_STORAGE_ACCOUNT env var)",
        ))
        .arg(text(
            "blob-container",
            "CONTAINER",
            "Default blob container (or AZURE_STORAGE_CONTAINER env var)",
        ))
        .arg(text(
            "auto-create-container",
            "BOOL",
            "Create the default container on first write (default: true, or AUTO_CREATE_CONTAINER env var)",
        ))
        .arg(text(
            "public-access",
            "LEVEL",
            "Public access for created containers: private, blob or container (default: blob, or BLOB_PUBLIC_ACCESS env var)",
        ))
        .arg(text(
            "cosmos-connection-string",
            "CONNECTION_STRING",
            "Cosmos DB connection string (or COSMOS_CONNECTION_STRING env var)",
        ))
        .arg(
            Arg::new("cosmos-accept-invalid-certs")
                .long("cosmos-accept-invalid-certs")
                .action(ArgAction::SetTrue)
                .help("Accept self-signed Cosmos DB certificates, for the emulator (or COSMOS_ACCEPT_INVALID_CERTS env var)"),
        )
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid_input(message: impl Into<String>) -> std::io::Error {
    let message = message.into();
    error!("{}", message);
    std::io::Error::new(std::io::ErrorKind::InvalidInput, message)
}
