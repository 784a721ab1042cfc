use std::env;
use std::path::PathBuf;

use filedrop_blob::{FileHostConfig, FileType, TypeTable};

struct ServerDefaults;

impl ServerDefaults {
    const HOST: &'static str = "127.0.0.1";
    const PORT: u16 = 3030;
    const MAX_REQUEST_BYTES: usize = 100 * 1024 * 1024;
}

/// Request body limit that still lets an oversize file reach the size check.
///
/// A body cut off by the limit looks like a broken transfer and the file would be
/// skipped instead of rejected, so the limit keeps room for two maximum-size files.
pub fn default_request_limit(max_file_size_bytes: u64) -> usize {
    let room = usize::try_from(max_file_size_bytes.saturating_mul(2)).unwrap_or(usize::MAX);
    ServerDefaults::MAX_REQUEST_BYTES.max(room)
}

/// Everything the server needs: bind address, spool location, registry settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Where multipart file parts are spooled before a batch is processed
    pub spool_dir: PathBuf,
    /// Upper bound on a whole upload request body. Keep it well above
    /// `files.max_file_size_bytes`, see [`default_request_limit`].
    pub max_request_bytes: usize,
    pub files: FileHostConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let files = FileHostConfig::default();
        Self {
            host: ServerDefaults::HOST.to_string(),
            port: ServerDefaults::PORT,
            spool_dir: env::temp_dir().join("filedrop-spool"),
            max_request_bytes: default_request_limit(files.max_file_size_bytes),
            files,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = env_var_or("HTTP_HOST", defaults.host);
        let port = env_var_or("HTTP_PORT", defaults.port);
        let public_base_url = env::var("FILEDROP_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let files = FileHostConfig::new()
            .with_upload_root(env_var_or(
                "FILEDROP_UPLOAD_ROOT",
                defaults.files.upload_root.display().to_string(),
            ))
            .with_catalog_path(env_var_or(
                "FILEDROP_CATALOG_PATH",
                defaults.files.catalog_path.display().to_string(),
            ))
            .with_max_file_size(env_var_or(
                "FILEDROP_MAX_FILE_SIZE_BYTES",
                defaults.files.max_file_size_bytes,
            ))
            .with_public_base_url(public_base_url)
            .with_serve_prefix(env_var_or("FILEDROP_SERVE_PREFIX", defaults.files.serve_prefix))
            .with_type_table(type_table_from_env(defaults.files.type_table));

        Self {
            host,
            port,
            spool_dir: env::var("FILEDROP_SPOOL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.spool_dir),
            max_request_bytes: env_var_or(
                "FILEDROP_MAX_REQUEST_BYTES",
                default_request_limit(files.max_file_size_bytes),
            ),
            files,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_var_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Debug,
{
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or(default)
}

/// `FILEDROP_TYPES_IMAGE=jpg,png,svg` replaces the image list, and so on per type
fn type_table_from_env(mut table: TypeTable) -> TypeTable {
    for file_type in FileType::ALL {
        let key = format!("FILEDROP_TYPES_{}", file_type.as_str().to_uppercase());
        if let Ok(list) = env::var(&key) {
            table = table.with_extensions(file_type, list.split(','));
        }
    }
    table
}
