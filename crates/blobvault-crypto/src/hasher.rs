use std::fmt;
use std::io::Read;
use std::str::FromStr;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

/// Read buffer size for streaming digests.
const CHUNK_SIZE: usize = 64 * 1024;

/// A supported digest algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Every algorithm, in output order.
    pub const ALL: [Self; 4] = [Self::Md5, Self::Sha1, Self::Sha256, Self::Sha512];

    /// Lowercase name as reported to callers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Digest length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HasherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(HasherError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// One `(algorithm, lowercase hex digest)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobDigest {
    #[serde(rename = "hash_type")]
    pub algorithm: HashAlgorithm,
    pub hexdigest: String,
}

/// In-progress state of a single algorithm.
enum Running {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
}

impl Running {
    fn start(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => Self::Md5(Md5::new()),
            HashAlgorithm::Sha1 => Self::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    fn finish(self) -> String {
        match self {
            Self::Md5(h) => hex::encode(h.finalize()),
            Self::Sha1(h) => hex::encode(h.finalize()),
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}

/// Stateless digest calculator over a fixed, ordered algorithm set.
///
/// The same input always yields the same output, in the same order,
/// regardless of who asks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DigestEngine {
    algorithms: Vec<HashAlgorithm>,
}

impl DigestEngine {
    /// Engine producing every supported algorithm.
    pub fn all() -> Self {
        Self {
            algorithms: HashAlgorithm::ALL.to_vec(),
        }
    }

    /// Engine restricted to `algorithms`. Output order still follows
    /// [`HashAlgorithm::ALL`] and duplicates collapse.
    pub fn only(algorithms: &[HashAlgorithm]) -> Self {
        Self {
            algorithms: HashAlgorithm::ALL
                .into_iter()
                .filter(|a| algorithms.contains(a))
                .collect(),
        }
    }

    pub fn algorithms(&self) -> &[HashAlgorithm] {
        &self.algorithms
    }

    /// Digest a whole buffer.
    pub fn digest(&self, data: &[u8]) -> Vec<BlobDigest> {
        let mut running = self.start();
        for state in &mut running {
            state.update(data);
        }
        self.finish(running)
    }

    /// Digest everything `reader` yields, one chunk at a time.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> Result<Vec<BlobDigest>, HasherError> {
        let mut running = self.start();
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            for state in &mut running {
                state.update(&buf[..n]);
            }
        }
        Ok(self.finish(running))
    }

    fn start(&self) -> Vec<Running> {
        self.algorithms.iter().copied().map(Running::start).collect()
    }

    fn finish(&self, running: Vec<Running>) -> Vec<BlobDigest> {
        self.algorithms
            .iter()
            .zip(running)
            .map(|(algorithm, state)| BlobDigest {
                algorithm: *algorithm,
                hexdigest: state.finish(),
            })
            .collect()
    }
}

impl Default for DigestEngine {
    fn default() -> Self {
        Self::all()
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error)]
pub enum HasherError {
    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("I/O error while hashing: {0}")]
    Io(#[from] std::io::Error),
}
