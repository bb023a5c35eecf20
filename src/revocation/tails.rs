use crate::error::Error;
use crate::knox::accumulator::vb20::MembershipWitness;
use crate::CredxResult;
use blsful::inner_types::G1Affine;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// The version tag at the start of every tails blob
pub const TAILS_TAG: [u8; 2] = [0, 2];
/// The size of one compressed witness in the tails blob
pub const TAILS_ENTRY_SIZE: usize = 48;

/// The byte offset of the witness for registry index `index`
pub fn tails_offset(index: u32) -> CredxResult<usize> {
    let position = index
        .checked_sub(1)
        .ok_or(Error::InvalidRevocationIndex(index))?;
    Ok(TAILS_TAG.len() + position as usize * TAILS_ENTRY_SIZE)
}

/// Decode one compressed witness read from a tails blob
pub fn decode_witness(bytes: &[u8]) -> CredxResult<MembershipWitness> {
    let bytes = <[u8; TAILS_ENTRY_SIZE]>::try_from(bytes)
        .map_err(|_| Error::InvalidTails(format!("witness has {} bytes", bytes.len())))?;
    Option::<G1Affine>::from(G1Affine::from_compressed(&bytes))
        .map(|p| MembershipWitness(p.into()))
        .ok_or_else(|| Error::InvalidTails("witness is not a curve point".to_string()))
}

/// Receives the tails blob while a registry is created
pub trait TailsWriter {
    /// Append bytes to the blob
    fn write(&mut self, data: &[u8]) -> CredxResult<()>;
}

/// Random access to a tails blob
pub trait TailsReader {
    /// The hex SHA-256 of the whole blob
    fn hash(&mut self) -> CredxResult<String>;
    /// Read `size` bytes at `offset`
    fn read(&mut self, size: usize, offset: usize) -> CredxResult<Vec<u8>>;
}

/// A tails blob held in memory
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TailsBuffer {
    data: Vec<u8>,
}

impl TailsBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing tails bytes
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// The tails bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl TailsWriter for TailsBuffer {
    fn write(&mut self, data: &[u8]) -> CredxResult<()> {
        self.data.extend_from_slice(data);
        Ok(())
    }
}

impl TailsReader for TailsBuffer {
    fn hash(&mut self) -> CredxResult<String> {
        Ok(hex::encode(Sha256::digest(&self.data)))
    }

    fn read(&mut self, size: usize, offset: usize) -> CredxResult<Vec<u8>> {
        offset
            .checked_add(size)
            .and_then(|end| self.data.get(offset..end))
            .map(<[u8]>::to_vec)
            .ok_or_else(|| {
                Error::InvalidTails(format!("no {} bytes at offset {}", size, offset))
            })
    }
}

/// A read only tails file
#[derive(Debug)]
pub struct TailsFileReader {
    path: PathBuf,
    file: File,
}

impl TailsFileReader {
    /// Open a tails file
    pub fn open<P: AsRef<Path>>(path: P) -> CredxResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| {
            Error::InvalidTails(format!("cannot open {}: {}", path.display(), e))
        })?;
        Ok(Self { path, file })
    }

    fn io_error(&self, e: std::io::Error) -> Error {
        Error::InvalidTails(format!("{}: {}", self.path.display(), e))
    }
}

impl TailsReader for TailsFileReader {
    fn hash(&mut self) -> CredxResult<String> {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| self.io_error(e))?;
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 4096];
        loop {
            let read = self.file.read(&mut buffer).map_err(|e| self.io_error(e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        Ok(hex::encode(hasher.finalize()))
    }

    fn read(&mut self, size: usize, offset: usize) -> CredxResult<Vec<u8>> {
        self.file
            .seek(SeekFrom::Start(offset as u64))
            .map_err(|e| self.io_error(e))?;
        let mut data = vec![0u8; size];
        self.file
            .read_exact(&mut data)
            .map_err(|e| self.io_error(e))?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets() {
        assert_eq!(tails_offset(1).unwrap(), 2);
        assert_eq!(tails_offset(3).unwrap(), 2 + 2 * 48);
        assert_eq!(tails_offset(0), Err(Error::InvalidRevocationIndex(0)));
    }

    #[test]
    fn witness_decoding() {
        assert!(decode_witness(&[0u8; 47]).is_err());
        assert!(decode_witness(&[0xFFu8; 48]).is_err());
    }

    #[test]
    fn buffer_reads() {
        let mut buffer = TailsBuffer::new();
        buffer.write(&TAILS_TAG).unwrap();
        buffer.write(&[7u8; 48]).unwrap();
        assert_eq!(buffer.read(2, 0).unwrap(), TAILS_TAG.to_vec());
        assert_eq!(buffer.read(48, 2).unwrap(), vec![7u8; 48]);
        assert!(buffer.read(48, 3).is_err());
        assert_eq!(buffer.hash().unwrap().len(), 64);
    }

    #[test]
    fn file_reader_matches_buffer() {
        let mut buffer = TailsBuffer::new();
        buffer.write(&TAILS_TAG).unwrap();
        buffer.write(&[1u8; 96]).unwrap();
        let path = std::env::temp_dir().join(format!("tails-{}", uuid::Uuid::new_v4()));
        std::fs::write(&path, buffer.as_bytes()).unwrap();

        let mut reader = TailsFileReader::open(&path).unwrap();
        assert_eq!(reader.hash().unwrap(), buffer.hash().unwrap());
        assert_eq!(reader.read(48, 50).unwrap(), buffer.read(48, 50).unwrap());
        assert!(reader.read(48, 60).is_err());
        std::fs::remove_file(&path).unwrap();
    }
}
