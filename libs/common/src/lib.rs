//! Common library for the Joy Kunga application
//!
//! This crate holds the payload shapes exchanged between the API layer and its
//! clients for the authentication and user domain. The records carry no
//! behavior: issuing tokens, persisting users and evaluating permissions all
//! live in the services that consume them.
//!
//! ```rust
//! use common::models::LoginRequest;
//!
//! let body = r#"{"email":"jane@example.com","password":"hunter2!"}"#;
//! let request: LoginRequest = serde_json::from_str(body).unwrap();
//! assert_eq!(request.email, "jane@example.com");
//! ```

pub mod models;

pub use models::{
    AuthUser, ChangePasswordRequest, ConfirmResetPasswordRequest, CreateUserRequest, JwtPayload,
    LoginRequest, LoginResponse, PermissionEntity, RefreshTokenRequest, RefreshTokenResponse,
    ResetPasswordRequest, Role, UpdateUserRequest, User, UserWithRoles,
};
