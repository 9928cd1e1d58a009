use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, RequestParts};
use axum::headers::authorization::Bearer;
use axum::headers::Authorization;
use axum::{async_trait, Extension, Json, TypedHeader};
use chrono::{DateTime, Utc};
use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::Pbkdf2;
use rand::{thread_rng, Rng};
use rand_core::OsRng;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::models::{Account, LoginAccount, RegisterAccount, Role, Session};
use crate::state::AppState;
use crate::{proceeds, Error, Payload};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Who is behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Anonymous,
    AuthenticatedUser(Session),
    AuthenticatedAdmin(Session),
}

impl Access {
    fn of(session: Session) -> Self {
        if session.is_admin() {
            Access::AuthenticatedAdmin(session)
        } else {
            Access::AuthenticatedUser(session)
        }
    }
}

/// Resolves a bearer token. Expired sessions are dropped on sight.
pub async fn ensure_authenticated(
    state: &AppState,
    session_id: Option<&str>,
) -> Result<Access, Error> {
    let ssid = match session_id {
        Some(ssid) if !ssid.is_empty() => ssid,
        _ => return Ok(Access::Anonymous),
    };

    let session = match state.session(ssid).await {
        Some(session) => session,
        None => return Ok(Access::Anonymous),
    };

    if session.is_expired(Utc::now()) {
        log::info!("Session of {} expired", session.email);
        state.remove_session(ssid).await?;
        return Ok(Access::Anonymous);
    }
    Ok(Access::of(session))
}

/// Any signed-in account.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Session);

/// A signed-in account with the admin role.
#[derive(Debug, Clone)]
pub struct AdminOnly(pub Session);

#[async_trait]
impl<B> FromRequest<B> for Authenticated
where
    B: Send,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Extension(state) = Extension::<AppState>::from_request(req)
            .await
            .map_err(|err| Error::InternalError {
                kind: "ExtensionError",
                message: err.to_string(),
            })?;
        let token = match TypedHeader::<Authorization<Bearer>>::from_request(req).await {
            Ok(TypedHeader(Authorization(bearer))) => Some(bearer.token().to_string()),
            Err(_) => None,
        };

        match ensure_authenticated(&state, token.as_deref()).await? {
            Access::Anonymous => Err(Error::InvalidSession {
                message: "Please log in to continue".to_string(),
            }),
            Access::AuthenticatedUser(session) | Access::AuthenticatedAdmin(session) => {
                Ok(Authenticated(session))
            }
        }
    }
}

#[async_trait]
impl<B> FromRequest<B> for AdminOnly
where
    B: Send,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let Authenticated(session) = Authenticated::from_request(req).await?;
        if !session.is_admin() {
            return Err(Error::Forbidden {
                message: "Only administrators can do this".to_string(),
            });
        }
        Ok(AdminOnly(session))
    }
}

pub async fn register_account(state: &AppState, form: RegisterAccount) -> Result<Account, Error> {
    form.validate()?;
    let email = form.email.trim().to_string();

    let taken = || Error::UserAlreadyExists {
        message: "A user with this email already exists".to_string(),
    };
    if state.accounts().await.iter().any(|a| a.email == email) {
        return Err(taken());
    }

    let salt = SaltString::generate(&mut OsRng);
    let account = Account {
        name: form.name.trim().to_string(),
        email,
        password_hash: Pbkdf2
            .hash_password(form.password.as_bytes(), &salt)?
            .to_string(),
        role: form.role,
        created_at: Utc::now(),
    };

    // the check above ran without the write lock
    if !state.append_account(account.clone()).await? {
        return Err(taken());
    }
    log::info!("Registered {} account {}", account.role.as_str(), account.email);
    Ok(account)
}

pub async fn login_account(state: &AppState, form: LoginAccount) -> Result<Session, Error> {
    form.validate()?;
    let email = form.email.trim();

    let account = state
        .accounts()
        .await
        .iter()
        .find(|a| a.email == email)
        .cloned();
    let account = match account {
        Some(account) if verify_password(&account.password_hash, &form.password)? => account,
        _ => {
            log::info!("Rejected login for {}", email);
            return Err(Error::AuthenticationFailure {
                message: INVALID_CREDENTIALS.to_string(),
            });
        }
    };

    let session = Session {
        ssid: generate_ssid(),
        name: account.name,
        email: account.email,
        role: account.role,
        expires_at: Utc::now() + state.session_ttl(),
    };
    state.insert_session(session.clone()).await?;
    log::info!("{} logged in", session.email);
    Ok(session)
}

fn verify_password(hash: &str, password: &str) -> Result<bool, Error> {
    let hash = PasswordHash::new(hash)?;
    Ok(Pbkdf2.verify_password(password.as_bytes(), &hash).is_ok())
}

fn generate_ssid() -> String {
    let ssid_bytes: [u8; 32] = thread_rng().gen();

    let mut hasher: Sha256 = Digest::new();
    hasher.update(ssid_bytes);
    hex::encode(hasher.finalize())
}

pub async fn register(
    Extension(state): Extension<AppState>,
    form: Result<Json<RegisterAccount>, JsonRejection>,
) -> Payload<RegisteredAccount> {
    let Json(form) = form?;
    let account = register_account(&state, form).await?;
    proceeds(RegisteredAccount {
        name: account.name,
        email: account.email,
        role: account.role,
    })
}

pub async fn login(
    Extension(state): Extension<AppState>,
    form: Result<Json<LoginAccount>, JsonRejection>,
) -> Payload<LoggedIn> {
    let Json(form) = form?;
    let session = login_account(&state, form).await?;
    proceeds(LoggedIn {
        session_id: session.ssid.clone(),
        session: SessionInfo::from(session),
    })
}

pub async fn logout(
    Authenticated(session): Authenticated,
    Extension(state): Extension<AppState>,
) -> Payload<SessionDropped> {
    let dropped = state.remove_session(&session.ssid).await?.is_some();
    log::info!("{} logged out", session.email);
    proceeds(SessionDropped {
        email: session.email,
        drop_success: dropped,
    })
}

pub async fn current_session(Authenticated(session): Authenticated) -> Payload<SessionInfo> {
    proceeds(SessionInfo::from(session))
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredAccount {
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_admin: bool,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for SessionInfo {
    fn from(session: Session) -> Self {
        Self {
            is_admin: session.is_admin(),
            name: session.name,
            email: session.email,
            role: session.role,
            expires_at: session.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggedIn {
    pub session_id: String,
    #[serde(flatten)]
    pub session: SessionInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionDropped {
    pub email: String,
    pub drop_success: bool,
}
