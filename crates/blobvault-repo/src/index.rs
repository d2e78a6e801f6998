use std::collections::{BTreeMap, HashMap};

use blobvault_types::{Access, BlobId, BlobRecord, Location};

/// In-memory blob metadata with a reverse index on location.
///
/// The primary map is ordered by id so a snapshot of it serializes with
/// stable key order. `by_location` always mirrors the primary map: every
/// record's location maps back to its id, and nothing else is present.
#[derive(Clone, Debug, Default)]
pub struct BlobIndex {
    records: BTreeMap<BlobId, BlobRecord>,
    by_location: HashMap<Location, BlobId>,
}

impl BlobIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from loaded records. Fails with the first location
    /// claimed by more than one record.
    pub fn from_records(records: BTreeMap<BlobId, BlobRecord>) -> Result<Self, Location> {
        let mut by_location = HashMap::with_capacity(records.len());
        for (id, record) in &records {
            if by_location.insert(record.location.clone(), *id).is_some() {
                return Err(record.location.clone());
            }
        }
        Ok(Self {
            records,
            by_location,
        })
    }

    pub fn records(&self) -> &BTreeMap<BlobId, BlobRecord> {
        &self.records
    }

    pub fn get(&self, id: &BlobId) -> Option<&BlobRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &BlobId) -> bool {
        self.records.contains_key(id)
    }

    /// The blob stored at `location`, if any.
    pub fn at_location(&self, location: &Location) -> Option<&BlobId> {
        self.by_location.get(location)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BlobId, &BlobRecord)> {
        self.records.iter()
    }

    /// Insert a record. Callers check id and location uniqueness first.
    pub fn insert(&mut self, id: BlobId, record: BlobRecord) {
        if let Some(old) = self.records.remove(&id) {
            self.by_location.remove(&old.location);
        }
        self.by_location.insert(record.location.clone(), id);
        self.records.insert(id, record);
    }

    pub fn remove(&mut self, id: &BlobId) -> Option<BlobRecord> {
        let record = self.records.remove(id)?;
        self.by_location.remove(&record.location);
        Some(record)
    }

    /// Point `id` at a new location, keeping the reverse index in step.
    pub fn relocate(&mut self, id: &BlobId, location: Location) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        self.by_location.remove(&record.location);
        self.by_location.insert(location.clone(), *id);
        record.location = location;
        true
    }

    /// Mutable access rights. Locations go through [`BlobIndex::relocate`].
    pub fn access_mut(&mut self, id: &BlobId) -> Option<&mut Access> {
        self.records.get_mut(id).map(|record| &mut record.access)
    }
}
