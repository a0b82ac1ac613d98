use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sea_orm::{DatabaseConnection, EntityTrait};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::entities::Profile;
use crate::error::AppError;

/// Cookie carrying the member id issued by the identity provider.
pub const MEMBER_COOKIE: &str = "familypaw_member";

pub async fn auth_middleware(cookies: Cookies, mut request: Request, next: Next) -> Response {
    let member_id = cookies
        .get(MEMBER_COOKIE)
        .and_then(|cookie| cookie.value().parse::<Uuid>().ok());

    match member_id {
        Some(member_id) => {
            tracing::Span::current().record("member_id", tracing::field::display(member_id));
            request.extensions_mut().insert(member_id);
            next.run(request).await
        }
        None => AppError::Unauthorized.into_response(),
    }
}

/// Runs after `auth_middleware`; lets only admin profiles through.
pub async fn admin_middleware(
    Extension(db): Extension<DatabaseConnection>,
    Extension(member_id): Extension<Uuid>,
    request: Request,
    next: Next,
) -> Response {
    match Profile::find_by_id(member_id).one(&db).await {
        Ok(Some(p)) if p.is_admin() => next.run(request).await,
        Ok(_) => AppError::Forbidden("Admin only").into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}
