use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Mutex;

use blobvault_crypto::{BlobDigest, DigestEngine};
use blobvault_store::{ContentStore, StoreError};
use blobvault_types::{BlobId, BlobRecord, BlobSummary, Location, Relationship, UserId};
use tracing::{debug, error, info, warn};

use crate::error::{RepoError, RepoResult, SnapshotError};
use crate::index::BlobIndex;
use crate::snapshot::SnapshotFile;

/// The blob metadata repository.
///
/// Owns every [`BlobRecord`], decides who may do what through
/// [`blobvault_types::Access`], tells the content store what to write and
/// remove, and flushes the complete snapshot after each mutation.
///
/// Every public operation runs inside one critical section covering the
/// uniqueness checks, the content side effect, the in-memory change and the
/// flush. A failed flush restores the in-memory index, so the snapshot on
/// disk and the index never disagree.
pub struct BlobRepository<S> {
    store: S,
    snapshot: SnapshotFile,
    digests: DigestEngine,
    index: Mutex<BlobIndex>,
}

impl<S: ContentStore> BlobRepository<S> {
    /// Open the repository backed by `db_file`, creating an empty snapshot
    /// if the file does not exist yet.
    pub fn open(db_file: impl Into<PathBuf>, store: S) -> RepoResult<Self> {
        let snapshot = SnapshotFile::new(db_file);
        snapshot.ensure_initialized()?;
        let records = snapshot.load()?;
        let index = BlobIndex::from_records(records).map_err(|location| SnapshotError::Corrupt {
            path: snapshot.path().to_path_buf(),
            reason: format!("location {location} is claimed by more than one blob"),
        })?;
        info!(path = %snapshot.path().display(), blobs = index.len(), "opened blob repository");

        Ok(Self {
            store,
            snapshot,
            digests: DigestEngine::all(),
            index: Mutex::new(index),
        })
    }

    // ---- Content operations ----

    /// Store a new blob owned by `owner`. The record starts private with no
    /// explicit readers.
    pub fn create(&self, data: &[u8], filename: &str, owner: &UserId) -> RepoResult<(BlobId, Location)> {
        self.create_with_id(BlobId::new(), data, filename, owner)
    }

    pub(crate) fn create_with_id(
        &self,
        id: BlobId,
        data: &[u8],
        filename: &str,
        owner: &UserId,
    ) -> RepoResult<(BlobId, Location)> {
        let mut index = self.index.lock().expect("lock poisoned");

        let location = self.locate(filename)?;
        if index.contains(&id) {
            return Err(RepoError::IdTaken(id));
        }
        if index.at_location(&location).is_some() {
            return Err(RepoError::LocationTaken(location));
        }

        self.store.write(&location, data)?;

        let record = BlobRecord::new(location.clone(), owner.clone());
        if let Err(err) = self.commit(&mut index, |index| index.insert(id, record)) {
            self.discard(&location);
            return Err(err);
        }

        info!(blob_id = %id, owner = %owner, location = %location, bytes = data.len(), "created blob");
        Ok((id, location))
    }

    /// Where the blob's bytes live, if `caller` may read it.
    pub fn read(&self, id: &BlobId, caller: Option<&UserId>) -> RepoResult<Location> {
        let index = self.index.lock().expect("lock poisoned");
        let record = authorize(&index, id, caller, Relationship::Reader)?;
        Ok(record.location.clone())
    }

    /// [`BlobRepository::read`] plus the bytes themselves.
    pub fn content(&self, id: &BlobId, caller: Option<&UserId>) -> RepoResult<(Location, Vec<u8>)> {
        let index = self.index.lock().expect("lock poisoned");
        let record = authorize(&index, id, caller, Relationship::Reader)?;
        let data = self.store.read(&record.location)?;
        Ok((record.location.clone(), data))
    }

    /// Delete the blob's content, then its record. Owner only.
    pub fn remove(&self, id: &BlobId, caller: &UserId) -> RepoResult<()> {
        let mut index = self.index.lock().expect("lock poisoned");
        let location = authorize(&index, id, Some(caller), Relationship::Owner)?
            .location
            .clone();

        self.store.remove(&location)?;

        if let Err(err) = self.commit(&mut index, |index| {
            index.remove(id);
        }) {
            error!(blob_id = %id, location = %location, "content removed but record could not be deleted");
            return Err(err);
        }

        info!(blob_id = %id, location = %location, "removed blob");
        Ok(())
    }

    /// Replace the blob's content with `data` stored under `filename`. Owner only.
    ///
    /// The new content is written before the old content is removed. If the
    /// sanitized filename resolves to the current location the file is
    /// replaced in place.
    pub fn update(&self, id: &BlobId, data: &[u8], filename: &str, caller: &UserId) -> RepoResult<()> {
        let mut index = self.index.lock().expect("lock poisoned");
        let old = authorize(&index, id, Some(caller), Relationship::Owner)?
            .location
            .clone();

        let new = self.locate(filename)?;
        if index.at_location(&new).is_some_and(|other| other != id) {
            return Err(RepoError::LocationTaken(new));
        }

        self.store.write(&new, data)?;

        if new == old {
            self.commit(&mut index, |_| {})?;
            info!(blob_id = %id, location = %new, bytes = data.len(), "updated blob in place");
            return Ok(());
        }

        if let Err(err) = self.commit(&mut index, |index| {
            index.relocate(id, new.clone());
        }) {
            self.discard(&new);
            return Err(err);
        }
        if let Err(err) = self.store.remove(&old) {
            warn!(blob_id = %id, location = %old, error = %err, "failed to remove replaced content");
        }

        info!(blob_id = %id, from = %old, to = %new, bytes = data.len(), "updated blob");
        Ok(())
    }

    /// Digests of the blob's content, in the engine's fixed order.
    pub fn hash(&self, id: &BlobId, caller: Option<&UserId>) -> RepoResult<Vec<BlobDigest>> {
        let index = self.index.lock().expect("lock poisoned");
        let record = authorize(&index, id, caller, Relationship::Reader)?;
        let reader = self.store.open(&record.location)?;
        let digests = self.digests.digest_reader(reader)?;
        debug!(blob_id = %id, "hashed blob");
        Ok(digests)
    }

    // ---- Access operations ----

    /// Flip the public flag. Owner only; setting the current value is rejected.
    pub fn set_visibility(&self, id: &BlobId, public: bool, caller: &UserId) -> RepoResult<()> {
        let mut index = self.index.lock().expect("lock poisoned");
        let record = authorize(&index, id, Some(caller), Relationship::Owner)?;
        if record.access.is_public() == public {
            return Err(RepoError::VisibilityUnchanged { blob: *id, public });
        }

        self.commit(&mut index, |index| {
            if let Some(access) = index.access_mut(id) {
                access.set_public(public);
            }
        })?;
        info!(blob_id = %id, public, "changed blob visibility");
        Ok(())
    }

    /// Everyone allowed to read the blob, owner included. Owner only.
    pub fn list_permissions(&self, id: &BlobId, caller: &UserId) -> RepoResult<BTreeSet<UserId>> {
        let index = self.index.lock().expect("lock poisoned");
        let record = authorize(&index, id, Some(caller), Relationship::Owner)?;
        Ok(record.access.permitted())
    }

    /// Grant read access to each of `users`. Owner only. Already-present
    /// users and the owner are skipped.
    pub fn add_permission<I>(&self, id: &BlobId, users: I, caller: &UserId) -> RepoResult<()>
    where
        I: IntoIterator<Item = UserId>,
    {
        let mut index = self.index.lock().expect("lock poisoned");
        authorize(&index, id, Some(caller), Relationship::Owner)?;

        let mut added = 0usize;
        self.commit(&mut index, |index| {
            if let Some(access) = index.access_mut(id) {
                added = users.into_iter().filter(|user| access.grant(user.clone())).count();
            }
        })?;
        info!(blob_id = %id, added, "granted read access");
        Ok(())
    }

    /// Revoke one user's read access. Owner only.
    pub fn remove_permission(&self, id: &BlobId, user: &UserId, caller: &UserId) -> RepoResult<()> {
        let mut index = self.index.lock().expect("lock poisoned");
        let record = authorize(&index, id, Some(caller), Relationship::Owner)?;
        if !record.access.readers().contains(user) {
            return Err(RepoError::UserNotFound {
                blob: *id,
                user: user.clone(),
            });
        }

        self.commit(&mut index, |index| {
            if let Some(access) = index.access_mut(id) {
                access.revoke(user);
            }
        })?;
        info!(blob_id = %id, user = %user, "revoked read access");
        Ok(())
    }

    /// Replace the explicit readers wholesale. Owner only. The owner is
    /// dropped from `users` if listed.
    pub fn replace_permissions<I>(&self, id: &BlobId, users: I, caller: &UserId) -> RepoResult<()>
    where
        I: IntoIterator<Item = UserId>,
    {
        let mut index = self.index.lock().expect("lock poisoned");
        authorize(&index, id, Some(caller), Relationship::Owner)?;

        self.commit(&mut index, |index| {
            if let Some(access) = index.access_mut(id) {
                access.replace_readers(users);
            }
        })?;
        info!(blob_id = %id, "replaced read access list");
        Ok(())
    }

    // ---- Queries ----

    /// Every blob `caller` may read, ordered by id.
    pub fn list(&self, caller: Option<&UserId>) -> Vec<BlobSummary> {
        let index = self.index.lock().expect("lock poisoned");
        index
            .iter()
            .filter(|(_, record)| record.access.can_read(caller))
            .map(|(id, record)| BlobSummary {
                blob_id: *id,
                location: record.location.clone(),
            })
            .collect()
    }

    pub fn contains(&self, id: &BlobId) -> bool {
        self.index.lock().expect("lock poisoned").contains(id)
    }

    pub fn len(&self) -> usize {
        self.index.lock().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.lock().expect("lock poisoned").is_empty()
    }

    // ---- Accessors ----

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn snapshot(&self) -> &SnapshotFile {
        &self.snapshot
    }

    /// Apply `change` and flush. On flush failure the index is rolled back.
    fn commit<F>(&self, index: &mut BlobIndex, change: F) -> RepoResult<()>
    where
        F: FnOnce(&mut BlobIndex),
    {
        let before = index.clone();
        change(index);
        if let Err(err) = self.snapshot.flush(index.records()) {
            *index = before;
            return Err(err.into());
        }
        Ok(())
    }

    /// Where `filename` would be stored. An unusable name is the caller's
    /// mistake, not a storage failure.
    fn locate(&self, filename: &str) -> RepoResult<Location> {
        self.store.locate(filename).map_err(|err| match err {
            StoreError::InvalidFilename(name) => RepoError::InvalidFilename(name),
            other => RepoError::Store(other),
        })
    }

    /// Best-effort removal of content that no record will point at.
    fn discard(&self, location: &Location) {
        if let Err(err) = self.store.remove(location) {
            warn!(location = %location, error = %err, "failed to discard orphaned content");
        }
    }
}

/// Look up `id` and check `caller` stands in `required` relationship to it.
fn authorize<'a>(
    index: &'a BlobIndex,
    id: &BlobId,
    caller: Option<&UserId>,
    required: Relationship,
) -> RepoResult<&'a BlobRecord> {
    let record = index.get(id).ok_or(RepoError::BlobNotFound(*id))?;
    if !record.access.permits(caller, required) {
        return Err(RepoError::Unauthorized {
            blob: *id,
            user: caller.cloned(),
            required,
        });
    }
    Ok(record)
}
