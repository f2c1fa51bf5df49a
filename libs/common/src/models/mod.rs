//! Shared request/response contracts

pub mod auth;
pub mod role;
pub mod user;

// Re-export for convenience
pub use auth::{
    AuthUser, ChangePasswordRequest, ConfirmResetPasswordRequest, JwtPayload, LoginRequest,
    LoginResponse, RefreshTokenRequest, RefreshTokenResponse, ResetPasswordRequest,
};
pub use role::{PermissionEntity, Role};
pub use user::{CreateUserRequest, UpdateUserRequest, User, UserWithRoles};
