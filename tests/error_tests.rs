//! 错误处理单元测试
//!
//! 测试应用错误类型的状态码映射与响应格式

use axum::http::StatusCode;
use report_system::error::{AppError, ErrorResponse};
use std::collections::HashMap;

// ==================== 错误状态码测试 ====================

#[test]
fn test_error_status_codes() {
    assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        AppError::BadRequest("invalid".to_string()).status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        AppError::Conflict("duplicate".to_string()).status_code(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        AppError::validation("title", "too short").status_code(),
        StatusCode::BAD_REQUEST
    );
}

#[test]
fn test_database_error_status_code() {
    let db_error = sqlx::Error::RowNotFound;
    let app_error = AppError::Database(db_error);
    assert_eq!(app_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_config_error_status_code() {
    let app_error = AppError::Config("missing database url".to_string());
    assert_eq!(app_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ==================== 用户可见消息测试 ====================

#[test]
fn test_internal_errors_do_not_leak_details() {
    let db_error = AppError::Database(sqlx::Error::PoolTimedOut);
    assert_eq!(db_error.user_message(), "Database error occurred");

    let config_error = AppError::Config("CIVIC_DATABASE__URL parse failure".to_string());
    assert_eq!(config_error.user_message(), "Configuration error");
    assert!(!config_error.user_message().contains("CIVIC"));
}

#[test]
fn test_client_errors_keep_their_message() {
    let error = AppError::BadRequest("invalid status: deleted".to_string());
    assert_eq!(error.user_message(), "invalid status: deleted");

    let error = AppError::Conflict("email is already registered".to_string());
    assert_eq!(error.user_message(), "email is already registered");
}

// ==================== 响应格式测试 ====================

#[test]
fn test_error_response_shape() {
    let body = ErrorResponse {
        success: false,
        message: "Validation failed".to_string(),
        errors: None,
    };

    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Validation failed");
    // errors 为空时不序列化该字段
    assert!(json.get("errors").is_none());
}

#[test]
fn test_validation_response_carries_field_map() {
    let mut errors = HashMap::new();
    errors.insert("rating".to_string(), "must be between 1 and 5".to_string());

    let body = ErrorResponse {
        success: false,
        message: "Validation failed".to_string(),
        errors: Some(errors),
    };

    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["errors"]["rating"], "must be between 1 and 5");
}

#[test]
fn test_validator_errors_translate_to_field_map() {
    use validator::Validate;

    #[derive(Validate)]
    struct TitleForm {
        #[validate(length(min = 5, message = "title must be at least 5 characters"))]
        title: String,
    }

    let form = TitleForm {
        title: "ab".to_string(),
    };
    let error: AppError = form.validate().unwrap_err().into();

    match error {
        AppError::Validation(map) => {
            assert_eq!(
                map.get("title").unwrap(),
                "title must be at least 5 characters"
            );
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}
