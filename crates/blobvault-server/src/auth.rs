use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use blobvault_types::UserId;

use crate::error::{ServerError, ServerResult};
use crate::router::AppState;

/// Request header carrying the caller's token.
pub const AUTH_HEADER: &str = "AuthToken";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Anonymous,
}

impl Credentials {
    /// A missing or empty header is anonymous. A header that is not valid
    /// visible ASCII is passed through lossily and fails resolution.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match headers.get(AUTH_HEADER) {
            Some(value) => {
                let token = String::from_utf8_lossy(value.as_bytes()).trim().to_string();
                if token.is_empty() {
                    Self::Anonymous
                } else {
                    Self::Bearer(token)
                }
            }
            None => Self::Anonymous,
        }
    }
}

/// Maps an opaque token to the user it belongs to.
#[async_trait]
pub trait TokenResolver: Send + Sync {
    /// `Ok(None)` means the token is unknown.
    async fn resolve(&self, token: &str) -> ServerResult<Option<UserId>>;
}

/// Resolver backed by a fixed token table.
#[derive(Clone, Debug, Default)]
pub struct StaticTokenResolver {
    tokens: HashMap<String, UserId>,
}

impl StaticTokenResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, user: UserId) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }

    /// Build from a `token -> user name` table, rejecting blank user names.
    pub fn from_table(table: &BTreeMap<String, String>) -> ServerResult<Self> {
        let mut tokens = HashMap::with_capacity(table.len());
        for (token, name) in table {
            let user = UserId::parse(name)
                .map_err(|e| ServerError::Config(format!("token table: {e}")))?;
            tokens.insert(token.clone(), user);
        }
        Ok(Self { tokens })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl TokenResolver for StaticTokenResolver {
    async fn resolve(&self, token: &str) -> ServerResult<Option<UserId>> {
        Ok(self.tokens.get(token).cloned())
    }
}

/// Turn request credentials into a caller. Unknown tokens are rejected
/// rather than downgraded to anonymous.
pub async fn authenticate(
    resolver: &dyn TokenResolver,
    credentials: &Credentials,
) -> ServerResult<Option<UserId>> {
    match credentials {
        Credentials::Anonymous => Ok(None),
        Credentials::Bearer(token) => match resolver.resolve(token).await? {
            Some(user) => Ok(Some(user)),
            None => Err(ServerError::AuthFailed("unknown token".into())),
        },
    }
}

/// The resolved caller of a request, `None` when anonymous.
#[derive(Clone, Debug)]
pub struct Caller(pub Option<UserId>);

impl Caller {
    pub fn user(&self) -> Option<&UserId> {
        self.0.as_ref()
    }

    /// The caller, or [`ServerError::AuthRequired`] when anonymous.
    pub fn require(&self) -> ServerResult<&UserId> {
        self.0.as_ref().ok_or(ServerError::AuthRequired)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let credentials = Credentials::from_headers(&parts.headers);
        let user = authenticate(state.tokens.as_ref(), &credentials).await?;
        Ok(Self(user))
    }
}
