use serde::{Deserialize, Serialize};

/// Static configuration, loaded once at startup.
///
/// Sections:
/// - server: listen address and worker count
/// - storage: mapping store backend and persistence
/// - generator: short code generation strategy
/// - allocation: create/delete policy
/// - cache: redirect cache
/// - logging: tracing output
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub allocation: AllocationConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// Load from a TOML file and environment variables
    ///
    /// Precedence: ENV > TOML file > defaults.
    /// ENV prefix `SM`, separator `__`, e.g. `SM__SERVER__PORT=9999`.
    pub fn load(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("SM")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// Render the defaults as a sample TOML file
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// Mapping store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `memory` or `file`
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    #[serde(default = "default_storage_file_path")]
    pub file_path: String,
    #[serde(default = "default_storage_shards")]
    pub shards: usize,
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// `random`, `counter` or `hash`
    #[serde(default = "default_generator_strategy")]
    pub strategy: String,
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    #[serde(default)]
    pub counter_offset: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationConfig {
    /// One canonical code per URL when no alias is requested
    #[serde(default = "default_reuse_existing_url")]
    pub reuse_existing_url: bool,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_max_alias_length")]
    pub max_alias_length: usize,
    /// Prepend `http://` to scheme-less URLs
    #[serde(default = "default_normalize_scheme")]
    pub normalize_scheme: bool,
    /// 0 means mappings never expire
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Redirect cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_storage_backend() -> String {
    "memory".to_string()
}

fn default_storage_file_path() -> String {
    "mappings.json".to_string()
}

fn default_storage_shards() -> usize {
    64
}

fn default_flush_interval_secs() -> u64 {
    5
}

fn default_generator_strategy() -> String {
    "random".to_string()
}

fn default_code_length() -> usize {
    8
}

fn default_reuse_existing_url() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    5
}

fn default_max_alias_length() -> usize {
    64
}

fn default_normalize_scheme() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    7 * 24 * 3600
}

fn default_sweep_interval_secs() -> u64 {
    24 * 3600
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_capacity() -> u64 {
    10000
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            file_path: default_storage_file_path(),
            shards: default_storage_shards(),
            flush_interval_secs: default_flush_interval_secs(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            strategy: default_generator_strategy(),
            code_length: default_code_length(),
            counter_offset: 0,
        }
    }
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            reuse_existing_url: default_reuse_existing_url(),
            max_attempts: default_max_attempts(),
            max_alias_length: default_max_alias_length(),
            normalize_scheme: default_normalize_scheme(),
            default_ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            max_capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}
