use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortmintError {
    InvalidInput(String),
    Conflict(String),
    ResourceExhausted(String),
    NotFound(String),
    StoreOperation(String),
    FileOperation(String),
    Serialization(String),
    Config(String),
}

impl ShortmintError {
    /// Stable error code, surfaced in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            ShortmintError::InvalidInput(_) => "E001",
            ShortmintError::Conflict(_) => "E002",
            ShortmintError::ResourceExhausted(_) => "E003",
            ShortmintError::NotFound(_) => "E004",
            ShortmintError::StoreOperation(_) => "E005",
            ShortmintError::FileOperation(_) => "E006",
            ShortmintError::Serialization(_) => "E007",
            ShortmintError::Config(_) => "E008",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ShortmintError::InvalidInput(_) => "Invalid Input",
            ShortmintError::Conflict(_) => "Conflict",
            ShortmintError::ResourceExhausted(_) => "Resource Exhausted",
            ShortmintError::NotFound(_) => "Not Found",
            ShortmintError::StoreOperation(_) => "Store Operation Error",
            ShortmintError::FileOperation(_) => "File Operation Error",
            ShortmintError::Serialization(_) => "Serialization Error",
            ShortmintError::Config(_) => "Configuration Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ShortmintError::InvalidInput(msg) => msg,
            ShortmintError::Conflict(msg) => msg,
            ShortmintError::ResourceExhausted(msg) => msg,
            ShortmintError::NotFound(msg) => msg,
            ShortmintError::StoreOperation(msg) => msg,
            ShortmintError::FileOperation(msg) => msg,
            ShortmintError::Serialization(msg) => msg,
            ShortmintError::Config(msg) => msg,
        }
    }

    /// HTTP status the boundary answers with for this error
    #[cfg(feature = "server")]
    pub fn http_status(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            ShortmintError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ShortmintError::NotFound(_) => StatusCode::NOT_FOUND,
            ShortmintError::Conflict(_) => StatusCode::CONFLICT,
            ShortmintError::ResourceExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether an outer layer may retry the whole request
    pub fn is_transient(&self) -> bool {
        matches!(self, ShortmintError::ResourceExhausted(_))
    }

    /// Colored output for server-mode startup failures
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ShortmintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShortmintError {}

impl ShortmintError {
    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        ShortmintError::InvalidInput(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        ShortmintError::Conflict(msg.into())
    }

    pub fn resource_exhausted<T: Into<String>>(msg: T) -> Self {
        ShortmintError::ResourceExhausted(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ShortmintError::NotFound(msg.into())
    }

    pub fn store_operation<T: Into<String>>(msg: T) -> Self {
        ShortmintError::StoreOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        ShortmintError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ShortmintError::Serialization(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        ShortmintError::Config(msg.into())
    }
}

impl From<std::io::Error> for ShortmintError {
    fn from(err: std::io::Error) -> Self {
        ShortmintError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ShortmintError {
    fn from(err: serde_json::Error) -> Self {
        ShortmintError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortmintError>;
