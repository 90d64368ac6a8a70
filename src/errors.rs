use actix_web::http::StatusCode;
use std::fmt;

#[derive(Debug, Clone)]
pub enum OutlinkerError {
    InvalidUrl(String),
    InvalidWeight(String),
    DuplicateUrl(String),
    NoActiveLinks(String),
    NotFound(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Serialization(String),
    DateParse(String),
    FileOperation(String),
    NotInitialized(String),
}

impl OutlinkerError {
    pub fn code(&self) -> &'static str {
        match self {
            OutlinkerError::InvalidUrl(_) => "E001",
            OutlinkerError::InvalidWeight(_) => "E002",
            OutlinkerError::DuplicateUrl(_) => "E003",
            OutlinkerError::NoActiveLinks(_) => "E004",
            OutlinkerError::NotFound(_) => "E005",
            OutlinkerError::DatabaseConfig(_) => "E006",
            OutlinkerError::DatabaseConnection(_) => "E007",
            OutlinkerError::DatabaseOperation(_) => "E008",
            OutlinkerError::Serialization(_) => "E009",
            OutlinkerError::DateParse(_) => "E010",
            OutlinkerError::FileOperation(_) => "E011",
            OutlinkerError::NotInitialized(_) => "E012",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            OutlinkerError::InvalidUrl(_) => "Validation Error",
            OutlinkerError::InvalidWeight(_) => "Validation Error",
            OutlinkerError::DuplicateUrl(_) => "Validation Error",
            OutlinkerError::NoActiveLinks(_) => "No Active Links",
            OutlinkerError::NotFound(_) => "Resource Not Found",
            OutlinkerError::DatabaseConfig(_) => "Database Configuration Error",
            OutlinkerError::DatabaseConnection(_) => "Database Connection Error",
            OutlinkerError::DatabaseOperation(_) => "Database Operation Error",
            OutlinkerError::Serialization(_) => "Serialization Error",
            OutlinkerError::DateParse(_) => "Date Parse Error",
            OutlinkerError::FileOperation(_) => "File Operation Error",
            OutlinkerError::NotInitialized(_) => "Component Not Initialized",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            OutlinkerError::InvalidUrl(msg) => msg,
            OutlinkerError::InvalidWeight(msg) => msg,
            OutlinkerError::DuplicateUrl(msg) => msg,
            OutlinkerError::NoActiveLinks(msg) => msg,
            OutlinkerError::NotFound(msg) => msg,
            OutlinkerError::DatabaseConfig(msg) => msg,
            OutlinkerError::DatabaseConnection(msg) => msg,
            OutlinkerError::DatabaseOperation(msg) => msg,
            OutlinkerError::Serialization(msg) => msg,
            OutlinkerError::DateParse(msg) => msg,
            OutlinkerError::FileOperation(msg) => msg,
            OutlinkerError::NotInitialized(msg) => msg,
        }
    }

    /// True for the request-validation family (bad url, bad weight, duplicate).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OutlinkerError::InvalidUrl(_)
                | OutlinkerError::InvalidWeight(_)
                | OutlinkerError::DuplicateUrl(_)
        )
    }

    /// HTTP status the API layer maps this error to.
    pub fn http_status(&self) -> StatusCode {
        match self {
            OutlinkerError::InvalidUrl(_)
            | OutlinkerError::InvalidWeight(_)
            | OutlinkerError::DateParse(_) => StatusCode::BAD_REQUEST,
            OutlinkerError::DuplicateUrl(_) => StatusCode::CONFLICT,
            OutlinkerError::NoActiveLinks(_) | OutlinkerError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for OutlinkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for OutlinkerError {}

// 便捷的构造函数
impl OutlinkerError {
    pub fn invalid_url<T: Into<String>>(msg: T) -> Self {
        OutlinkerError::InvalidUrl(msg.into())
    }

    pub fn invalid_weight<T: Into<String>>(msg: T) -> Self {
        OutlinkerError::InvalidWeight(msg.into())
    }

    pub fn duplicate_url<T: Into<String>>(msg: T) -> Self {
        OutlinkerError::DuplicateUrl(msg.into())
    }

    pub fn no_active_links<T: Into<String>>(msg: T) -> Self {
        OutlinkerError::NoActiveLinks(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        OutlinkerError::NotFound(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        OutlinkerError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        OutlinkerError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        OutlinkerError::DatabaseOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        OutlinkerError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        OutlinkerError::DateParse(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        OutlinkerError::FileOperation(msg.into())
    }

    pub fn not_initialized<T: Into<String>>(msg: T) -> Self {
        OutlinkerError::NotInitialized(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for OutlinkerError {
    fn from(err: sea_orm::DbErr) -> Self {
        OutlinkerError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for OutlinkerError {
    fn from(err: std::io::Error) -> Self {
        OutlinkerError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for OutlinkerError {
    fn from(err: serde_json::Error) -> Self {
        OutlinkerError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for OutlinkerError {
    fn from(err: chrono::ParseError) -> Self {
        OutlinkerError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OutlinkerError>;
