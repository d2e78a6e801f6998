use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// The relationship a caller needs to a blob for an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    /// Mutation, deletion, visibility and ACL management.
    Owner,
    /// Reading content, location and digests.
    Reader,
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => f.write_str("owner"),
            Self::Reader => f.write_str("reader"),
        }
    }
}

/// Who may touch a blob.
///
/// The owner is always implicitly authorized and is never stored in
/// `readers`. Every mutator on this type preserves that invariant, and
/// deserialization drops the owner from a stored `users` list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredAccess")]
pub struct Access {
    owner: UserId,
    public: bool,
    #[serde(rename = "users")]
    readers: BTreeSet<UserId>,
}

#[derive(Deserialize)]
struct StoredAccess {
    owner: UserId,
    public: bool,
    users: BTreeSet<UserId>,
}

impl From<StoredAccess> for Access {
    fn from(stored: StoredAccess) -> Self {
        let mut access = Access {
            owner: stored.owner,
            public: stored.public,
            readers: BTreeSet::new(),
        };
        access.replace_readers(stored.users);
        access
    }
}

impl Access {
    /// Private access for a freshly created blob.
    pub fn new(owner: UserId) -> Self {
        Self {
            owner,
            public: false,
            readers: BTreeSet::new(),
        }
    }

    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Explicit (non-owner) readers.
    pub fn readers(&self) -> &BTreeSet<UserId> {
        &self.readers
    }

    pub fn is_owner(&self, user: &UserId) -> bool {
        self.owner == *user
    }

    /// `public OR user == owner OR user ∈ readers`. Anonymous callers pass `None`.
    pub fn can_read(&self, user: Option<&UserId>) -> bool {
        if self.public {
            return true;
        }
        match user {
            Some(user) => self.is_owner(user) || self.readers.contains(user),
            None => false,
        }
    }

    /// Whether `user` stands in `relationship` to this blob.
    pub fn permits(&self, user: Option<&UserId>, relationship: Relationship) -> bool {
        match relationship {
            Relationship::Owner => user.is_some_and(|user| self.is_owner(user)),
            Relationship::Reader => self.can_read(user),
        }
    }

    /// Everyone allowed to read: explicit readers plus the owner.
    pub fn permitted(&self) -> BTreeSet<UserId> {
        let mut all = self.readers.clone();
        all.insert(self.owner.clone());
        all
    }

    pub fn set_public(&mut self, public: bool) {
        self.public = public;
    }

    /// Add a reader. Returns `false` if `user` is the owner or already present.
    pub fn grant(&mut self, user: UserId) -> bool {
        if self.is_owner(&user) {
            return false;
        }
        self.readers.insert(user)
    }

    /// Remove a reader. Returns `false` if `user` was not an explicit reader.
    pub fn revoke(&mut self, user: &UserId) -> bool {
        self.readers.remove(user)
    }

    /// Replace the explicit readers wholesale, dropping the owner if listed.
    pub fn replace_readers(&mut self, users: impl IntoIterator<Item = UserId>) {
        let owner = &self.owner;
        self.readers = users.into_iter().filter(|user| user != owner).collect();
    }
}
