//! Ingest: bulk loading of flow-log archives.
//!
//! An upload is a gzip-compressed tar. Every regular member is decoded,
//! split into lines and parsed; accepted records are written to the store
//! in one bulk call at the end. Problems are collected into the
//! [`IngestionReport`] instead of aborting the upload.

pub mod archive;
pub mod ingestor;
pub mod report;

pub use archive::{read_members, ArchiveError, ArchiveMember, MemberBody};
pub use ingestor::ArchiveIngestor;
pub use report::{ErrorEntry, IgnoredContent, IngestStatus, IngestionReport};
