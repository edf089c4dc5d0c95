/// Default server host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_PORT: &str = "8080";

/// Blob auth strategy using a storage connection string (also the default)
pub const BLOB_AUTH_CONNECTION_STRING: &str = "connection-string";

/// Blob auth strategy using the ambient credential chain
pub const BLOB_AUTH_IDENTITY: &str = "identity";

/// Default public access level for containers the gateway creates
pub const DEFAULT_PUBLIC_ACCESS: &str = "blob";

/// Maximum size of a multipart upload (256 MiB)
pub const MAX_UPLOAD_SIZE: usize = 256 * 1024 * 1024;

/// Content type of every download response
pub const DOWNLOAD_CONTENT_TYPE: &str = "application/octet-stream";
