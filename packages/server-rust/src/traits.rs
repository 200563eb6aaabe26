use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fintrack_core::{Budget, Goal, Transaction, UserProfile};
use uuid::Uuid;

/// A record that belongs to exactly one user.
pub trait OwnedRecord: Clone + Send + Sync + 'static {
    /// Entity name used in not-found errors and logs.
    const ENTITY: &'static str;

    fn id(&self) -> Uuid;

    /// Handle (email) of the owning user.
    fn owner(&self) -> &str;
}

impl OwnedRecord for Transaction {
    const ENTITY: &'static str = "transaction";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> &str {
        &self.owner
    }
}

impl OwnedRecord for Budget {
    const ENTITY: &'static str = "budget";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> &str {
        &self.owner
    }
}

impl OwnedRecord for Goal {
    const ENTITY: &'static str = "goal";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> &str {
        &self.owner
    }
}

/// Per-owner persistence for one record type.
///
/// Lookups are always scoped by owner; a record owned by someone else is
/// indistinguishable from a missing one.
/// Implementations: memory (default, tests).
#[async_trait]
pub trait Repository<T: OwnedRecord>: Send + Sync {
    /// Store a new record. Fails if the id is already taken.
    async fn insert(&self, record: T) -> anyhow::Result<()>;

    /// Load a record by owner and id.
    async fn get(&self, owner: &str, id: Uuid) -> anyhow::Result<Option<T>>;

    /// Replace an existing record. Returns `false` if no such record exists
    /// for the record's owner.
    async fn put(&self, record: T) -> anyhow::Result<bool>;

    /// All records of an owner, in no particular order.
    async fn list(&self, owner: &str) -> anyhow::Result<Vec<T>>;

    /// Delete a record. Returns the removed record, if any.
    async fn remove(&self, owner: &str, id: Uuid) -> anyhow::Result<Option<T>>;
}

/// Stored user account, including the password hash.
#[derive(Clone)]
pub struct UserAccount {
    pub email: String,
    pub display_name: String,
    /// PHC-formatted argon2 hash.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            created_at: self.created_at,
        }
    }
}

impl std::fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAccount")
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Registered user accounts keyed by normalized email.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Add an account. Returns `false` if the email is already registered.
    async fn insert_user(&self, account: UserAccount) -> anyhow::Result<bool>;

    /// Look up an account by email (case-insensitive).
    async fn find_user(&self, email: &str) -> anyhow::Result<Option<UserAccount>>;
}
