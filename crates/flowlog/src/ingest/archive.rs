//! Archive: in-memory `.tgz` member enumeration.

use std::io::Read;

use bytes::Bytes;
use flate2::read::MultiGzDecoder;
use thiserror::Error;

use crate::conf::IngestLimits;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive is {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("archive decompresses to more than {0} bytes")]
    TotalTooLarge(usize),

    #[error("{0}")]
    Read(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberBody {
    /// Regular file contents
    File(Bytes),
    /// Regular file whose declared size exceeds the member cap; not read
    Oversized(u64),
    Directory,
    /// Links, devices, fifos
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    pub name: String,
    pub body: MemberBody,
}

/// Enumerate every member of a gzip-compressed tar in stored order.
///
/// Concatenated gzip members are read as one stream. Fails as a whole if
/// the stream is not a readable `.tgz` or the regular files it holds add
/// up to more than `max_total_bytes`; nothing is returned for a partially
/// readable archive.
pub fn read_members(archive: &[u8], limits: &IngestLimits) -> Result<Vec<ArchiveMember>, ArchiveError> {
    let mut tar = tar::Archive::new(MultiGzDecoder::new(archive));
    let mut members = Vec::new();
    let mut total: u64 = 0;

    for entry in tar.entries()? {
        let mut entry = entry?;
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let entry_type = entry.header().entry_type();

        let body = if entry_type.is_dir() {
            MemberBody::Directory
        } else if entry_type.is_file() {
            let size = entry.size();
            if size > limits.max_member_bytes as u64 {
                MemberBody::Oversized(size)
            } else {
                total += size;
                if total > limits.max_total_bytes as u64 {
                    return Err(ArchiveError::TotalTooLarge(limits.max_total_bytes));
                }
                let mut data = Vec::with_capacity(size as usize);
                entry.read_to_end(&mut data)?;
                MemberBody::File(Bytes::from(data))
            }
        } else {
            MemberBody::Other
        };

        members.push(ArchiveMember { name, body });
    }

    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixture::{gzip, tar, tgz, Entry};

    fn limits(max_member_bytes: usize, max_total_bytes: usize) -> IngestLimits {
        IngestLimits {
            max_member_bytes,
            max_total_bytes,
            ..IngestLimits::default()
        }
    }

    #[test]
    fn test_members_in_stored_order() {
        let archive = tgz(&[
            Entry::Dir("logs/"),
            Entry::File("logs/b.log", b"second"),
            Entry::File("logs/a.log", b"first"),
        ]);
        let members = read_members(&archive, &limits(1024, 4096)).unwrap();

        assert_eq!(members.len(), 3);
        assert_eq!(members[0].body, MemberBody::Directory);
        assert_eq!(members[1].name, "logs/b.log");
        assert_eq!(members[1].body, MemberBody::File(Bytes::from_static(b"second")));
        assert_eq!(members[2].name, "logs/a.log");
    }

    #[test]
    fn test_oversized_member_not_read() {
        let archive = tgz(&[
            Entry::File("big.log", &[b'x'; 64]),
            Entry::File("small.log", b"ok"),
        ]);
        let members = read_members(&archive, &limits(16, 4096)).unwrap();
        assert_eq!(members[0].body, MemberBody::Oversized(64));
        assert_eq!(members[1].body, MemberBody::File(Bytes::from_static(b"ok")));
    }

    #[test]
    fn test_not_gzip() {
        let result = read_members(b"definitely not a tarball", &limits(1024, 4096));
        assert!(matches!(result, Err(ArchiveError::Read(_))));
    }

    #[test]
    fn test_empty_archive() {
        let archive = tgz(&[]);
        assert!(read_members(&archive, &limits(1024, 4096)).unwrap().is_empty());
    }

    #[test]
    fn test_concatenated_gzip_members() {
        let plain = tar(&[
            Entry::File("a.log", &[b'a'; 700]),
            Entry::File("b.log", &[b'b'; 700]),
        ]);
        // split mid-stream so b.log lives entirely in the second gzip member
        let mut archive = gzip(&plain[..1024]);
        archive.extend(gzip(&plain[1024..]));

        let members = read_members(&archive, &limits(1024, 4096)).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].name, "b.log");
        assert_eq!(members[1].body, MemberBody::File(Bytes::from(vec![b'b'; 700])));
    }

    #[test]
    fn test_total_size_cap() {
        let archive = tgz(&[
            Entry::File("a.log", &[b'x'; 600]),
            Entry::File("b.log", &[b'x'; 600]),
        ]);
        let result = read_members(&archive, &limits(1024, 1000));
        assert!(matches!(result, Err(ArchiveError::TotalTooLarge(1000))));

        // oversized members are skipped unread and do not count
        let archive = tgz(&[
            Entry::File("big.log", &[b'x'; 2048]),
            Entry::File("a.log", &[b'x'; 600]),
        ]);
        assert_eq!(read_members(&archive, &limits(1024, 1000)).unwrap().len(), 2);
    }
}
