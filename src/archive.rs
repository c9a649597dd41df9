//! Virtual archive access
//!
//! The pipeline only ever reads archive members by path. [`ArchiveAccessor`]
//! is that seam; [`EpubArchive`] implements it over an in-memory ZIP.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::error::Result;

/// Read-only lookup of archive members by archive-root-relative path
///
/// Paths are `/`-separated and case-sensitive. Implementations percent-decode
/// the path before lookup.
pub trait ArchiveAccessor: Send + Sync {
    /// Raw bytes of a member
    fn read_binary(&self, path: &str) -> Option<Cow<'_, [u8]>>;

    fn has_member(&self, path: &str) -> bool {
        self.read_binary(path).is_some()
    }

    /// Member decoded as UTF-8; invalid sequences are replaced and a leading BOM is dropped
    fn read_text(&self, path: &str) -> Option<String> {
        let bytes = self.read_binary(path)?;
        let text = String::from_utf8_lossy(&bytes);
        Some(text.strip_prefix('\u{feff}').unwrap_or(&text).to_string())
    }
}

/// All files of an EPUB container, extracted into memory
#[derive(Debug, Default, Clone)]
pub struct EpubArchive {
    members: HashMap<String, Vec<u8>>,
}

impl EpubArchive {
    /// Decompress an EPUB (ZIP) from raw bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;

        let mut members = HashMap::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_file() {
                let name = file.name().to_string();
                let mut content = Vec::with_capacity(file.size() as usize);
                file.read_to_end(&mut content)?;
                members.insert(name, content);
            }
        }

        tracing::debug!(members = members.len(), "Extracted EPUB archive");
        Ok(Self { members })
    }

    /// Build an archive from already extracted members
    pub fn from_members<I, P, B>(members: I) -> Self
    where
        I: IntoIterator<Item = (P, B)>,
        P: Into<String>,
        B: Into<Vec<u8>>,
    {
        Self {
            members: members
                .into_iter()
                .map(|(path, bytes)| (path.into(), bytes.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl ArchiveAccessor for EpubArchive {
    fn read_binary(&self, path: &str) -> Option<Cow<'_, [u8]>> {
        let key = decode_member_path(path);
        self.members
            .get(key.as_ref())
            .or_else(|| self.members.get(path))
            .map(|bytes| Cow::Borrowed(bytes.as_slice()))
    }
}

/// Percent-decode an href; undecodable input is returned verbatim
pub fn decode_member_path(path: &str) -> Cow<'_, str> {
    if !path.contains('%') {
        return Cow::Borrowed(path);
    }
    urlencoding::decode(path).unwrap_or(Cow::Borrowed(path))
}
