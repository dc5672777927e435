//! In-process user accounts and the session auth gate.
//!
//! [`UserStore`] keeps accounts in memory for the lifetime of the
//! process (durable accounts are deliberately out of scope). Passwords
//! are stored as SHA-256 over password + per-user random salt.
//!
//! Identity lives in an explicit [`Session`] value owned by the caller,
//! never in ambient state; operations that need an identity take the
//! session and gate through [`Session::require_auth`].
//!
//! The first login against an empty store creates the reserved
//! `demo`/`demo` account so a fresh deployment is usable immediately.
//! That bootstrap is intentional and confined to [`UserStore::login`].

use crate::error::LensError;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write as _;
use tracing::{info, warn};

const SALT_LEN: usize = 16;

const DEMO_USERNAME: &str = "demo";
const DEMO_PASSWORD: &str = "demo";

/// Result of a register or login attempt. Failures leave both the store
/// and the session unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub success: bool,
    pub message: String,
}

impl AuthOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Stored credentials for one account.
#[derive(Debug, Clone)]
struct Credentials {
    user_id: i64,
    salt: String,
    password_hash: String,
    email: Option<String>,
}

/// The authenticated identity carried by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
}

/// Caller-owned session context.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<SessionUser>,
}

impl Session {
    /// Fresh anonymous session.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Current identity, if any.
    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// Gate for identity-requiring operations.
    pub fn require_auth(&self) -> Result<&SessionUser, LensError> {
        self.user.as_ref().ok_or(LensError::AuthRequired)
    }

    /// Clears the identity. Safe to call on an anonymous session.
    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!(username = %user.username, "logged out");
        }
    }
}

/// In-memory account registry.
#[derive(Debug, Default)]
pub struct UserStore {
    accounts: HashMap<String, Credentials>,
    next_id: i64,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            next_id: 1,
        }
    }

    /// Creates a new account. Duplicate usernames and blank fields are
    /// rejected without touching the store.
    pub fn register(
        &mut self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> AuthOutcome {
        if username.trim().is_empty() || password.is_empty() {
            return AuthOutcome::fail("username and password are required");
        }
        if self.accounts.contains_key(username) {
            warn!(username, "registration rejected: username taken");
            return AuthOutcome::fail(format!("username '{username}' is already taken"));
        }

        let salt = generate_salt();
        let credentials = Credentials {
            user_id: self.next_id,
            password_hash: hash_password(password, &salt),
            salt,
            email: email.map(|e| e.to_string()),
        };
        self.next_id += 1;
        self.accounts.insert(username.to_string(), credentials);
        info!(username, "account registered");
        AuthOutcome::ok(format!("account '{username}' created"))
    }

    /// Verifies credentials and, on success, binds the identity to the
    /// session. An empty store bootstraps the demo account first.
    pub fn login(&mut self, session: &mut Session, username: &str, password: &str) -> AuthOutcome {
        if self.accounts.is_empty() {
            self.register(DEMO_USERNAME, DEMO_PASSWORD, None);
        }

        let Some(credentials) = self.accounts.get(username) else {
            warn!(username, "login failed: unknown username");
            return AuthOutcome::fail("invalid username or password");
        };
        if hash_password(password, &credentials.salt) != credentials.password_hash {
            warn!(username, "login failed: bad password");
            return AuthOutcome::fail("invalid username or password");
        }

        session.user = Some(SessionUser {
            user_id: credentials.user_id,
            username: username.to_string(),
        });
        info!(username, "logged in");
        AuthOutcome::ok(format!("welcome, {username}"))
    }

    /// Registered account count.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Email on file for an account, if any.
    pub fn email_of(&self, username: &str) -> Option<&str> {
        self.accounts.get(username)?.email.as_deref()
    }
}

fn generate_salt() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect()
}

fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_login() {
        let mut store = UserStore::new();
        let mut session = Session::new();

        let out = store.register("alice", "s3cret", Some("alice@example.com"));
        assert!(out.success);
        assert_eq!(store.email_of("alice"), Some("alice@example.com"));

        let out = store.login(&mut session, "alice", "s3cret");
        assert!(out.success);
        assert!(session.is_authenticated());
        assert_eq!(session.user().unwrap().username, "alice");
    }

    #[test]
    fn duplicate_username_rejected() {
        let mut store = UserStore::new();
        assert!(store.register("bob", "pw1", None).success);
        let out = store.register("bob", "pw2", None);
        assert!(!out.success);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn blank_credentials_rejected() {
        let mut store = UserStore::new();
        assert!(!store.register("", "pw", None).success);
        assert!(!store.register("  ", "pw", None).success);
        assert!(!store.register("user", "", None).success);
        assert!(store.is_empty());
    }

    #[test]
    fn wrong_password_leaves_session_anonymous() {
        let mut store = UserStore::new();
        let mut session = Session::new();
        store.register("carol", "right", None);

        let out = store.login(&mut session, "carol", "wrong");
        assert!(!out.success);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn empty_store_bootstraps_demo_account() {
        let mut store = UserStore::new();
        let mut session = Session::new();

        let out = store.login(&mut session, "demo", "demo");
        assert!(out.success);
        assert!(session.is_authenticated());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn bootstrap_only_happens_once() {
        let mut store = UserStore::new();
        let mut session = Session::new();
        store.register("dave", "pw", None);

        // Store is non-empty, so demo does not exist
        let out = store.login(&mut session, "demo", "demo");
        assert!(!out.success);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn require_auth_gate() {
        let mut store = UserStore::new();
        let mut session = Session::new();

        assert!(matches!(
            session.require_auth(),
            Err(LensError::AuthRequired)
        ));

        store.login(&mut session, "demo", "demo");
        assert!(session.require_auth().is_ok());

        session.logout();
        assert!(session.require_auth().is_err());
    }

    #[test]
    fn salts_are_unique_per_account() {
        let mut store = UserStore::new();
        store.register("u1", "same", None);
        store.register("u2", "same", None);
        let h1 = &store.accounts["u1"];
        let h2 = &store.accounts["u2"];
        assert_ne!(h1.salt, h2.salt);
        assert_ne!(h1.password_hash, h2.password_hash);
    }

    #[test]
    fn user_ids_are_sequential() {
        let mut store = UserStore::new();
        store.register("a", "pw", None);
        store.register("b", "pw", None);
        assert_eq!(store.accounts["a"].user_id, 1);
        assert_eq!(store.accounts["b"].user_id, 2);
    }

    #[test]
    fn hash_is_hex_sha256() {
        let h = hash_password("pw", "salt");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        // Deterministic for fixed inputs
        assert_eq!(h, hash_password("pw", "salt"));
    }
}
