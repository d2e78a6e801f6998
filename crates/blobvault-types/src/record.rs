use serde::{Deserialize, Serialize};

use crate::access::Access;
use crate::id::{BlobId, Location, UserId};

/// Persisted metadata for one blob.
///
/// On disk a record is a flat JSON object:
///
/// ```text
/// { "URL": "a.txt", "owner": "alice", "public": false, "users": ["bob"] }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
    #[serde(rename = "URL")]
    pub location: Location,
    #[serde(flatten)]
    pub access: Access,
}

impl BlobRecord {
    /// A new private record with no explicit readers.
    pub fn new(location: Location, owner: UserId) -> Self {
        Self {
            location,
            access: Access::new(owner),
        }
    }

    pub fn owner(&self) -> &UserId {
        self.access.owner()
    }
}

/// Listing entry returned to callers: id plus location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobSummary {
    #[serde(rename = "blobId")]
    pub blob_id: BlobId,
    #[serde(rename = "URL")]
    pub location: Location,
}
