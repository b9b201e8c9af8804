//! File record types.

use std::fmt;
use std::path::{Component, Path};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumIter, EnumString};

/// BLAKE3 content hash used to group files with identical bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a 64 character hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 64 || !s.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).ok_or_else(|| serde::de::Error::custom("invalid content hash"))
    }
}

/// Role of a file within the repository.
///
/// Every file gets exactly one category. `Protected` overrides everything
/// else and is never the source of a cleanup action.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Protected,
    Source,
    Docs,
    Config,
    Temp,
    Build,
    Test,
    Assets,
}

/// A regular file found by the walker, before classification.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Path relative to the scan root, `/`-separated.
    pub path: String,
    /// Number of bytes read while hashing.
    pub size: u64,
    /// Hash of the full content.
    pub content_hash: ContentHash,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
}

impl ScannedFile {
    /// Attach a category, producing a full record.
    pub fn into_record(self, category: Category) -> FileRecord {
        FileRecord {
            extension: extension_of(&self.path),
            path: self.path,
            size: self.size,
            content_hash: self.content_hash,
            last_modified: self.last_modified,
            category,
        }
    }
}

/// One classified regular file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Path relative to the scan root, `/`-separated. Unique key.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// Hash of the full content.
    pub content_hash: ContentHash,
    /// Informational only.
    pub last_modified: DateTime<Utc>,
    /// Lowercase extension including the dot, or empty.
    pub extension: CompactString,
    /// Assigned category.
    pub category: Category,
}

impl FileRecord {
    /// The final path component.
    pub fn file_name(&self) -> &str {
        file_name_of(&self.path)
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(idx) => &name[..idx],
        }
    }

    /// Parent directory, `None` for files at the scan root.
    pub fn parent(&self) -> Option<&str> {
        self.path.rfind('/').map(|idx| &self.path[..idx])
    }

    /// Whether this file sits directly in the scan root.
    pub fn is_root_level(&self) -> bool {
        self.parent().is_none()
    }

    /// Whether the record may be touched by a cleanup action.
    pub fn is_protected(&self) -> bool {
        self.category == Category::Protected
    }
}

/// Render a relative path with `/` separators, dropping `.` components.
pub fn normalize_path(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => {
                if !out.is_empty() {
                    out.push('/');
                }
                out.push_str(&part.to_string_lossy());
            }
            Component::ParentDir => {
                if !out.is_empty() {
                    out.push('/');
                }
                out.push_str("..");
            }
            _ => {}
        }
    }
    out
}

pub(crate) fn file_name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

pub(crate) fn extension_of(path: &str) -> CompactString {
    let name = file_name_of(path);
    match name.rfind('.') {
        Some(0) | None => CompactString::default(),
        Some(idx) => CompactString::new(name[idx..].to_lowercase()),
    }
}
