use crate::{
    auth::{AuthContext, UserRole},
    errors::{AppError, AppResult},
};

pub fn require_authenticated(ctx: &AuthContext) -> AppResult<String> {
    ctx.user_id()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
}

pub fn require_role(ctx: &AuthContext, role: UserRole) -> AppResult<()> {
    require_authenticated(ctx)?;
    match ctx.role() {
        Some(current) if current == role => Ok(()),
        _ => Err(AppError::Unauthorized(format!(
            "Only a {} can perform this action",
            role
        ))),
    }
}
