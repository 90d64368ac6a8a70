//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::OutlinkerError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字。按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证错误
/// - 3000-3099: 链接错误
/// - 6000-6099: 分析统计错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    NotFound = 1004,
    InternalServerError = 1005,
    ServiceUnavailable = 1030,

    // 认证错误 2000-2099
    AuthFailed = 2000,
    TokenExpired = 2001,
    TokenInvalid = 2002,
    CsrfInvalid = 2003,
    RateLimitExceeded = 2004,

    // 链接错误 3000-3099
    LinkNotFound = 3000,
    LinkDuplicateUrl = 3001,
    LinkInvalidUrl = 3002,
    LinkInvalidWeight = 3003,
    NoActiveLinks = 3004,
    LinkDatabaseError = 3005,

    // 分析统计错误 6000-6099
    AnalyticsQueryFailed = 6000,
}

impl From<&OutlinkerError> for ErrorCode {
    fn from(err: &OutlinkerError) -> Self {
        match err {
            OutlinkerError::InvalidUrl(_) => ErrorCode::LinkInvalidUrl,
            OutlinkerError::InvalidWeight(_) => ErrorCode::LinkInvalidWeight,
            OutlinkerError::DuplicateUrl(_) => ErrorCode::LinkDuplicateUrl,
            OutlinkerError::NoActiveLinks(_) => ErrorCode::NoActiveLinks,
            OutlinkerError::NotFound(_) => ErrorCode::NotFound,
            OutlinkerError::DateParse(_) => ErrorCode::BadRequest,
            OutlinkerError::DatabaseConfig(_)
            | OutlinkerError::DatabaseConnection(_)
            | OutlinkerError::DatabaseOperation(_) => ErrorCode::LinkDatabaseError,
            OutlinkerError::NotInitialized(_) => ErrorCode::ServiceUnavailable,
            OutlinkerError::Serialization(_) | OutlinkerError::FileOperation(_) => {
                ErrorCode::InternalServerError
            }
        }
    }
}
