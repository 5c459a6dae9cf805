use std::sync::Arc;

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};

use milestack_store::{Store, gen_id};
use milestack_types::api::{AuthResponse, Claims, LoginRequest, SignupRequest};
use milestack_types::models::{ROLE_MEMBER, User, UserPublic};

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Store,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_exp_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change_this_secret_in_prod".to_string(),
            token_exp_hours: 24,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token_expired")]
    Expired,
    #[error("invalid_token")]
    Invalid,
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, plain: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

pub fn create_token(config: &AuthConfig, user: &User) -> anyhow::Result<String> {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(config.token_exp_hours)).timestamp();
    let claims = Claims {
        user_id: user.id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        exp: exp as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, TokenError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = (
        req.name.filter(|s| !s.is_empty()),
        req.email.filter(|s| !s.is_empty()),
        req.password.filter(|s| !s.is_empty()),
    );
    let (Some(name), Some(email), Some(password)) = fields else {
        return Err(ApiError::Validation("name, email, password required".into()));
    };

    if state.store.user_by_email(&email).is_some() {
        return Err(ApiError::Conflict("email already exists".into()));
    }

    let user = state.store.insert_user(User {
        id: gen_id("user"),
        name,
        email,
        password_hash: hash_password(&password)?,
        status: "online".to_string(),
    });

    // Consume pending invites addressed to this email: membership plus one
    // feed entry per invite.
    for invite in state.store.take_invites_for_email(&user.email) {
        state.store.add_member(&invite.project_id, &user.id, ROLE_MEMBER);
        state
            .store
            .log_activity(&invite.project_id, &user.id, "joined the project");
    }

    let token = create_token(&state.auth, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserPublic::from(&user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = req
        .email
        .as_deref()
        .and_then(|email| state.store.user_by_email(email))
        .filter(|user| verify_password(&user.password_hash, req.password.as_deref().unwrap_or("")))
        .ok_or_else(|| ApiError::Unauthenticated("invalid credentials".into()))?;

    let user = state
        .store
        .set_user_status(&user.id, "online")
        .unwrap_or(user);

    // Every project the user belongs to sees the login in its feed.
    for membership in state.store.memberships_for_user(&user.id) {
        state
            .store
            .log_activity(&membership.project_id, &user.id, "logged in");
    }

    let token = create_token(&state.auth, &user)?;

    Ok(Json(AuthResponse {
        token,
        user: UserPublic::from(&user),
    }))
}
