//! In-memory bearer-token session store
//!
//! Tokens are opaque strings mapped to user ids, held only in process
//! memory: a restart invalidates every session. Tokens never expire on
//! their own; they are removed at logout or when the owning account is
//! found to be gone.

use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Prefix marking tokens issued by this service
const TOKEN_PREFIX: &str = "campus-token-";

/// Generate a random lowercase-hex string from `bytes` random bytes
pub fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{b:02x}")).collect()
}

/// Session store mapping bearer tokens to user identities
#[derive(Clone, Default)]
pub struct SessionStore {
    tokens: Arc<Mutex<HashMap<String, Uuid>>>,
}

impl SessionStore {
    /// Create an empty session store
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh opaque token for the user
    pub async fn issue(&self, user_id: Uuid) -> String {
        let token = format!("{TOKEN_PREFIX}{}", random_hex(16));
        self.tokens.lock().await.insert(token.clone(), user_id);
        token
    }

    /// Resolve a token to the user it was issued to
    pub async fn resolve(&self, token: &str) -> Option<Uuid> {
        self.tokens.lock().await.get(token).copied()
    }

    /// Revoke a token; resolving it afterwards yields nothing
    pub async fn revoke(&self, token: &str) {
        self.tokens.lock().await.remove(token);
    }
}
