//! # Archive Inspection
//!
//! Opens a stored upload as a ZIP archive and finds the provisioning
//! manifests inside it. An application bundle may nest extensions, each
//! with its own `embedded.mobileprovision`, so every member whose name ends
//! with [`MANIFEST_SUFFIX`] counts.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

use crate::error::PipelineError;

/// File name that marks a member as a provisioning manifest.
pub const MANIFEST_SUFFIX: &str = "embedded.mobileprovision";

/// Largest decompressed manifest member that will be read. Real profiles
/// are a few tens of kilobytes.
pub const MAX_MANIFEST_BYTES: u64 = 4 * 1024 * 1024;

/// One entry of the central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    pub name: String,
    pub index: usize,
    /// Uncompressed size as declared by the archive.
    pub size: u64,
    pub is_dir: bool,
}

impl ArchiveMember {
    pub fn is_manifest(&self) -> bool {
        !self.is_dir && self.name.ends_with(MANIFEST_SUFFIX)
    }
}

/// A ZIP archive opened for inspection.
pub struct ArchiveInspector {
    archive: ZipArchive<File>,
    members: Vec<ArchiveMember>,
}

impl std::fmt::Debug for ArchiveInspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveInspector")
            .field("members", &self.members)
            .finish_non_exhaustive()
    }
}

impl ArchiveInspector {
    /// Open `path` and read its central directory.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let file = File::open(path).map_err(|source| PipelineError::ReadStored {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive = ZipArchive::new(file).map_err(PipelineError::OpenArchive)?;

        let mut members = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|source| PipelineError::OpenMember {
                    name: format!("#{index}"),
                    source,
                })?;
            members.push(ArchiveMember {
                name: entry.name().to_string(),
                index,
                size: entry.size(),
                is_dir: entry.is_dir(),
            });
        }

        Ok(Self { archive, members })
    }

    pub fn members(&self) -> &[ArchiveMember] {
        &self.members
    }

    /// Look a member up by its full name.
    pub fn member(&self, name: &str) -> Option<&ArchiveMember> {
        self.members.iter().find(|m| m.name == name)
    }

    /// All manifest members, in central-directory order.
    pub fn manifest_members(&self) -> Vec<ArchiveMember> {
        self.members
            .iter()
            .filter(|m| m.is_manifest())
            .cloned()
            .collect()
    }

    /// Decompress a member, refusing anything above [`MAX_MANIFEST_BYTES`].
    pub fn read_member(&mut self, member: &ArchiveMember) -> Result<Vec<u8>, PipelineError> {
        self.read_member_limited(member, MAX_MANIFEST_BYTES)
    }

    pub fn read_member_limited(
        &mut self,
        member: &ArchiveMember,
        limit: u64,
    ) -> Result<Vec<u8>, PipelineError> {
        let entry = self
            .archive
            .by_index(member.index)
            .map_err(|source| PipelineError::OpenMember {
                name: member.name.clone(),
                source,
            })?;

        // The declared size is attacker-controlled; bound the actual read.
        let mut buf = Vec::with_capacity(member.size.min(limit) as usize);
        entry
            .take(limit + 1)
            .read_to_end(&mut buf)
            .map_err(|source| PipelineError::ReadMember {
                name: member.name.clone(),
                source,
            })?;
        if buf.len() as u64 > limit {
            return Err(PipelineError::MemberTooLarge {
                name: member.name.clone(),
                limit,
            });
        }
        Ok(buf)
    }
}
