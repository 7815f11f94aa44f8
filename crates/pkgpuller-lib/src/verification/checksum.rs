use digest::Digest;
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("{algorithm} mismatch: expected {}, got {}",
        hex::encode(.expected),
        hex::encode(.actual)
    )]
    Mismatch {
        algorithm: ChecksumAlgorithm,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },
    #[error("invalid {algorithm} digest {value:?}")]
    InvalidDigest {
        algorithm: ChecksumAlgorithm,
        value: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChecksumAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl ChecksumAlgorithm {
    /// Strongest first.
    pub const PREFERRED_ORDER: [ChecksumAlgorithm; 4] = [
        ChecksumAlgorithm::Sha512,
        ChecksumAlgorithm::Sha256,
        ChecksumAlgorithm::Sha1,
        ChecksumAlgorithm::Md5,
    ];

    /// Field carrying this digest in an APT `Packages` stanza.
    pub fn apt_field_name(self) -> &'static str {
        match self {
            ChecksumAlgorithm::Md5 => "MD5sum",
            ChecksumAlgorithm::Sha1 => "SHA1",
            ChecksumAlgorithm::Sha256 => "SHA256",
            ChecksumAlgorithm::Sha512 => "SHA512",
        }
    }

    /// Maps the `type` attribute of an RPM repodata `<checksum>` element.
    pub fn from_rpm_type(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "md5" => Some(ChecksumAlgorithm::Md5),
            "sha" | "sha1" => Some(ChecksumAlgorithm::Sha1),
            "sha256" => Some(ChecksumAlgorithm::Sha256),
            "sha512" => Some(ChecksumAlgorithm::Sha512),
            _ => None,
        }
    }

    fn digest_len(self) -> usize {
        match self {
            ChecksumAlgorithm::Md5 => 16,
            ChecksumAlgorithm::Sha1 => 20,
            ChecksumAlgorithm::Sha256 => 32,
            ChecksumAlgorithm::Sha512 => 64,
        }
    }
}

impl Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ChecksumAlgorithm::Md5 => "MD5",
            ChecksumAlgorithm::Sha1 => "SHA1",
            ChecksumAlgorithm::Sha256 => "SHA256",
            ChecksumAlgorithm::Sha512 => "SHA512",
        })
    }
}

/// Digest a repository index advertises for a package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checksum {
    pub algorithm: ChecksumAlgorithm,
    pub expected: Vec<u8>,
}

impl Checksum {
    pub fn from_hex(algorithm: ChecksumAlgorithm, value: &str) -> Result<Self, VerificationError> {
        let invalid = || VerificationError::InvalidDigest {
            algorithm,
            value: value.to_string(),
        };
        let expected = hex::decode(value.trim()).map_err(|_| invalid())?;
        if expected.len() != algorithm.digest_len() {
            return Err(invalid());
        }
        Ok(Self {
            algorithm,
            expected,
        })
    }

    pub fn hex(&self) -> String {
        hex::encode(&self.expected)
    }
}

enum Hasher {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
}

/// Streams bytes through the hasher matching a [`Checksum`] and compares at the end.
pub struct ChecksumVerifier {
    hasher: Hasher,
    checksum: Checksum,
}

impl ChecksumVerifier {
    #[inline]
    pub fn new(checksum: Checksum) -> Self {
        let hasher = match checksum.algorithm {
            ChecksumAlgorithm::Md5 => Hasher::Md5(Md5::new()),
            ChecksumAlgorithm::Sha1 => Hasher::Sha1(Sha1::new()),
            ChecksumAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            ChecksumAlgorithm::Sha512 => Hasher::Sha512(Sha512::new()),
        };
        Self { hasher, checksum }
    }

    #[inline]
    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        match &mut self.hasher {
            Hasher::Md5(digest) => Digest::update(digest, data.as_ref()),
            Hasher::Sha1(digest) => Digest::update(digest, data.as_ref()),
            Hasher::Sha256(digest) => Digest::update(digest, data.as_ref()),
            Hasher::Sha512(digest) => Digest::update(digest, data.as_ref()),
        };
    }

    pub fn verify(self) -> Result<(), VerificationError> {
        let actual = match self.hasher {
            Hasher::Md5(digest) => digest.finalize().to_vec(),
            Hasher::Sha1(digest) => digest.finalize().to_vec(),
            Hasher::Sha256(digest) => digest.finalize().to_vec(),
            Hasher::Sha512(digest) => digest.finalize().to_vec(),
        };

        if actual == self.checksum.expected {
            Ok(())
        } else {
            Err(VerificationError::Mismatch {
                algorithm: self.checksum.algorithm,
                expected: self.checksum.expected,
                actual,
            })
        }
    }
}

/// Checks an on-disk file against `checksum` without loading it whole.
pub async fn file_matches(
    path: &std::path::Path,
    checksum: &Checksum,
) -> Result<bool, std::io::Error> {
    let file = tokio::fs::File::open(path).await?;
    let mut reader = tokio::io::BufReader::new(file);
    let mut buffer = vec![0u8; 65536];
    let mut verifier = ChecksumVerifier::new(checksum.clone());

    loop {
        let bytes_read = tokio::io::AsyncReadExt::read(&mut reader, &mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        verifier.update(&buffer[..bytes_read]);
    }

    Ok(verifier.verify().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_streaming_verification_succeeds() {
        let checksum = Checksum::from_hex(ChecksumAlgorithm::Sha256, HELLO_SHA256).unwrap();
        let mut verifier = ChecksumVerifier::new(checksum);
        verifier.update(b"hel");
        verifier.update(b"lo");
        assert!(verifier.verify().is_ok());
    }

    #[test]
    fn test_mismatch_reports_both_digests() {
        let checksum = Checksum::from_hex(ChecksumAlgorithm::Sha256, HELLO_SHA256).unwrap();
        let mut verifier = ChecksumVerifier::new(checksum);
        verifier.update(b"goodbye");
        let err = verifier.verify().unwrap_err();
        assert!(err.to_string().contains(HELLO_SHA256));
    }

    #[test]
    fn test_md5_digest() {
        let checksum =
            Checksum::from_hex(ChecksumAlgorithm::Md5, "5d41402abc4b2a76b9719d911017c592").unwrap();
        let mut verifier = ChecksumVerifier::new(checksum);
        verifier.update("hello");
        assert!(verifier.verify().is_ok());
    }

    #[test]
    fn test_from_hex_rejects_wrong_length_and_garbage() {
        assert!(Checksum::from_hex(ChecksumAlgorithm::Sha256, "abcd").is_err());
        assert!(Checksum::from_hex(ChecksumAlgorithm::Md5, "not-hex").is_err());
    }

    #[test]
    fn test_rpm_checksum_types() {
        assert_eq!(
            ChecksumAlgorithm::from_rpm_type("sha"),
            Some(ChecksumAlgorithm::Sha1)
        );
        assert_eq!(
            ChecksumAlgorithm::from_rpm_type("SHA256"),
            Some(ChecksumAlgorithm::Sha256)
        );
        assert_eq!(ChecksumAlgorithm::from_rpm_type("sha224"), None);
    }

    #[tokio::test]
    async fn test_file_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.deb");
        std::fs::write(&path, b"hello").unwrap();

        let good = Checksum::from_hex(ChecksumAlgorithm::Sha256, HELLO_SHA256).unwrap();
        assert!(file_matches(&path, &good).await.unwrap());

        std::fs::write(&path, b"hello!").unwrap();
        assert!(!file_matches(&path, &good).await.unwrap());
    }
}
