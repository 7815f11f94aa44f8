mod checksum;

pub use checksum::{
    Checksum, ChecksumAlgorithm, ChecksumVerifier, VerificationError, file_matches,
};
