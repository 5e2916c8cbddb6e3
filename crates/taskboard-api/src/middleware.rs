use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
    typed_header::TypedHeaderRejection,
};
use tracing::debug;

use taskboard_db::models::UserRow;

use crate::auth::{AppState, AppStateInner, run_blocking};
use crate::error::ApiError;

/// Who is making the current request. Lives in the request's extensions
/// and nowhere else.
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    User(UserRow),
}

/// Resolve HTTP Basic credentials to an [`Identity`] for every request.
///
/// Missing, malformed or wrong credentials all resolve to
/// `Identity::Anonymous`; rejecting them is left to handlers that take
/// [`CurrentUser`].
pub async fn resolve_identity(
    State(state): State<AppState>,
    credentials: Result<TypedHeader<Authorization<Basic>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = match credentials {
        Ok(TypedHeader(Authorization(basic))) => {
            let username = basic.username().to_string();
            let password = basic.password().to_string();
            match run_blocking(&state, move |s| authenticate(s, &username, &password)).await {
                Ok(identity) => identity,
                Err(e) => return e.into_response(),
            }
        }
        Err(_) => Identity::Anonymous,
    };

    req.extensions_mut().insert(identity);
    next.run(req).await
}

/// First user with this username whose stored password matches.
pub fn authenticate(state: &AppStateInner, username: &str, password: &str) -> anyhow::Result<Identity> {
    let candidates = state.db.get_users_by_username(username)?;

    let identity = candidates
        .into_iter()
        .find(|user| state.credentials.verify(password, &user.password))
        .map(Identity::User)
        .unwrap_or(Identity::Anonymous);

    match &identity {
        Identity::User(user) => debug!(user_id = user.id, "Credentials accepted"),
        Identity::Anonymous => debug!(username, "Credentials rejected"),
    }

    Ok(identity)
}

/// Extractor for operations that need an authenticated user.
/// Fails with [`ApiError::Unauthorized`] before the handler runs.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRow);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Identity>() {
            Some(Identity::User(user)) => Ok(CurrentUser(user.clone())),
            _ => Err(ApiError::Unauthorized),
        }
    }
}
