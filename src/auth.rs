use axum::headers::{Cookie, HeaderMapExt};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::{Extension, Json};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::Pbkdf2;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::{CurrentSession, JsonBody, SharedState};
use crate::err::{Error, Success};
use crate::models::{AuthorView, Role, User, UserView};
use crate::{proceeds, Payload};

pub const SESSION_COOKIE: &str = "token";

pub fn session_ttl() -> Duration {
    Duration::days(7)
}

/// Identity claims carried inside the session token.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            name: user.name.clone(),
            email: user.email.clone(),
            department: user.department.clone(),
        }
    }
}

impl Session {
    /// The caller as a populated author reference.
    pub fn author(&self) -> AuthorView {
        AuthorView {
            id: self.id,
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// Why a request ended up without a session.
#[derive(Debug, Clone, Eq, Ord, PartialOrd, PartialEq)]
pub enum AuthResult {
    NoSession,
    SessionExpired,
    InvalidSession,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    session: Session,
    iat: i64,
    exp: i64,
}

/// Signs and verifies HS256 session tokens with a shared secret.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    pub fn sign(&self, session: &Session) -> Result<String, Error> {
        self.sign_at(session, Utc::now())
    }

    pub fn sign_at(&self, session: &Session, issued_at: DateTime<Utc>) -> Result<String, Error> {
        let claims = Claims {
            session: session.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + session_ttl()).timestamp(),
        };
        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.encoding,
        )?)
    }

    pub fn inspect(&self, token: &str) -> Result<Session, AuthResult> {
        match jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Ok(data.claims.session),
            Err(err) => match err.kind() {
                ErrorKind::ExpiredSignature => Err(AuthResult::SessionExpired),
                _ => Err(AuthResult::InvalidSession),
            },
        }
    }

    pub fn verify(&self, token: &str) -> Option<Session> {
        self.inspect(token).ok()
    }
}

/// Reads the `token` cookie and decodes it. Never fails; a missing or bad
/// token is just an anonymous caller.
pub fn resolve_session(headers: &HeaderMap, codec: &TokenCodec) -> Option<Session> {
    match inspect_request(headers, codec) {
        Ok(session) => Some(session),
        Err(AuthResult::NoSession) => None,
        Err(reason) => {
            log::debug!("Ignoring session cookie: {:?}", reason);
            None
        }
    }
}

fn inspect_request(headers: &HeaderMap, codec: &TokenCodec) -> Result<Session, AuthResult> {
    let cookies = headers.typed_get::<Cookie>().ok_or(AuthResult::NoSession)?;
    match cookies.get(SESSION_COOKIE) {
        Some(token) if !token.is_empty() => codec.inspect(token),
        _ => Err(AuthResult::NoSession),
    }
}

pub fn hash_password(password: &str) -> Result<String, Error> {
    Ok(Pbkdf2
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))?
        .to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, Error> {
    let hash = PasswordHash::new(password_hash)?;
    Ok(Pbkdf2.verify_password(password.as_bytes(), &hash).is_ok())
}

pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly",
        SESSION_COOKIE,
        token,
        session_ttl().num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn cleared_cookie(secure: bool) -> String {
    let mut cookie = format!("{}=; Path=/; Max-Age=0; HttpOnly", SESSION_COOKIE);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn set_cookie(cookie: String) -> Result<HeaderMap, Error> {
    let value = HeaderValue::from_str(&cookie).map_err(|err| Error::InternalError {
        kind: "HeaderError",
        message: err.to_string(),
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, value);
    Ok(headers)
}

fn issue_session(state: &SharedState, user: &User) -> Result<HeaderMap, Error> {
    let token = state.tokens.sign(&Session::from(user))?;
    set_cookie(session_cookie(&token, state.secure_cookies))
}

pub async fn register_user(
    Extension(state): Extension<SharedState>,
    JsonBody(body): JsonBody<RegisterUser>,
) -> Result<(HeaderMap, Json<UserEnvelope>), Error> {
    if body.password.is_empty() {
        return Err(Error::invalid("Provided password was empty!"));
    }

    if state.store.find_user_by_email(&body.email).await?.is_some() {
        return Err(Error::UserAlreadyExists {
            message: "User already exists".to_string(),
        });
    }

    // Self-registration always yields a student, whatever the body says.
    let user = state
        .store
        .create_user(User {
            id: Uuid::new_v4(),
            name: body.name,
            email: body.email,
            password_hash: hash_password(&body.password)?,
            role: Role::Student,
            student_id: body.student_id,
            department: body.department,
            year: body.year,
            created_at: Utc::now(),
        })
        .await?;
    log::info!("Registered student {} ({})", user.id, user.email);

    let headers = issue_session(&state, &user)?;
    Ok((headers, Json(UserEnvelope::of(&user))))
}

pub async fn login_user(
    Extension(state): Extension<SharedState>,
    JsonBody(login): JsonBody<LoginUser>,
) -> Result<(HeaderMap, Json<UserEnvelope>), Error> {
    let invalid = || Error::AuthenticationFailure {
        message: "Invalid credentials".to_string(),
    };

    let user = match state.store.find_user_by_email(&login.email).await? {
        Some(user) => user,
        None => return Err(invalid()),
    };
    if !verify_password(&login.password, &user.password_hash)? {
        return Err(invalid());
    }

    let headers = issue_session(&state, &user)?;
    Ok((headers, Json(UserEnvelope::of(&user))))
}

pub async fn current_user(
    CurrentSession(session): CurrentSession,
    Extension(state): Extension<SharedState>,
) -> Payload<UserEnvelope> {
    let session = match session {
        Some(session) => session,
        None => return proceeds(UserEnvelope { user: None }),
    };
    let user = state.store.find_user(session.id).await?;
    proceeds(UserEnvelope {
        user: user.as_ref().map(UserView::from),
    })
}

pub async fn logout_user(
    Extension(state): Extension<SharedState>,
) -> Result<(HeaderMap, Json<Success>), Error> {
    let headers = set_cookie(cleared_cookie(state.secure_cookies))?;
    Ok((headers, Json(Success::new())))
}

#[derive(Debug, Clone, Serialize)]
pub struct UserEnvelope {
    pub user: Option<UserView>,
}

impl UserEnvelope {
    pub fn of(user: &User) -> Self {
        Self {
            user: Some(UserView::from(user)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub email: String,
    pub password: String,
}
