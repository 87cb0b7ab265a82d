// src/archive.rs
//
// Staging of the virtual filesystem: a ustar archive (optionally gzipped)
// is materialized into the staging directory at startup.

use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::errors::HuskError;

const BLOCK_SIZE: usize = 512;

/// One entry read from the archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub path: String,
    pub content: Vec<u8>,
    pub is_directory: bool,
    pub is_symlink: bool,
}

/// Read a null-terminated string from a fixed-size field.
fn read_string(header: &[u8], offset: usize, len: usize) -> String {
    let slice = &header[offset..offset + len];
    let end = slice.iter().position(|&b| b == 0).unwrap_or(len);
    String::from_utf8_lossy(&slice[..end]).to_string()
}

/// Read an octal ASCII value from a fixed-size field.
fn read_octal(header: &[u8], offset: usize, len: usize) -> u64 {
    let s = read_string(header, offset, len);
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0;
    }
    u64::from_str_radix(trimmed, 8).unwrap_or(0)
}

/// Check if a 512-byte block is all zeros (end-of-archive marker).
fn is_zero_block(block: &[u8]) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Sum of all header bytes, treating the checksum field (148..156) as spaces.
fn calculate_checksum(header: &[u8; BLOCK_SIZE]) -> u32 {
    let mut sum: u32 = 0;
    for (i, &byte) in header.iter().enumerate() {
        if (148..156).contains(&i) {
            sum += 0x20u32;
        } else {
            sum += byte as u32;
        }
    }
    sum
}

fn verify_checksum(header: &[u8; BLOCK_SIZE]) -> bool {
    let stored = read_octal(header, 148, 8) as u32;
    let computed = calculate_checksum(header);
    stored == computed
}

/// Parse a ustar archive. Extended headers and special entries other than
/// directories and symlinks are consumed and dropped.
fn parse_archive(data: &[u8]) -> Result<Vec<ArchiveEntry>, String> {
    let mut entries = Vec::new();
    let mut offset = 0;
    let mut zero_blocks = 0;

    while offset + BLOCK_SIZE <= data.len() {
        let block = &data[offset..offset + BLOCK_SIZE];

        if is_zero_block(block) {
            zero_blocks += 1;
            offset += BLOCK_SIZE;
            if zero_blocks >= 2 {
                break;
            }
            continue;
        }
        zero_blocks = 0;

        let header: [u8; BLOCK_SIZE] = block
            .try_into()
            .map_err(|_| "invalid header block".to_string())?;

        if !verify_checksum(&header) {
            return Err("invalid header checksum".to_string());
        }

        let name = read_string(&header, 0, 100);
        let prefix = read_string(&header, 345, 155);
        let path = if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix, name)
        };

        let size = read_octal(&header, 124, 12);
        let type_flag = header[156];

        let is_directory = type_flag == b'5';
        let is_symlink = type_flag == b'2';
        let is_file = type_flag == b'0' || type_flag == 0;

        offset += BLOCK_SIZE;

        let content = if !is_directory && size > 0 {
            let end = offset + size as usize;
            if end > data.len() {
                return Err("unexpected end of archive".to_string());
            }
            let content = data[offset..end].to_vec();
            let blocks = (size as usize + BLOCK_SIZE - 1) / BLOCK_SIZE;
            offset += blocks * BLOCK_SIZE;
            content
        } else {
            Vec::new()
        };

        if is_directory || is_symlink || is_file {
            entries.push(ArchiveEntry {
                path,
                content,
                is_directory,
                is_symlink,
            });
        }
    }

    Ok(entries)
}

/// Decompress gzip data.
fn decompress_gzip(data: &[u8]) -> Result<Vec<u8>, String> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| e.to_string())?;
    Ok(decompressed)
}

/// Check if data is gzip compressed (magic bytes 0x1f 0x8b).
fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

/// Read an archive file, transparently decompressing gzip.
pub fn read_archive(path: &Path) -> Result<Vec<ArchiveEntry>, HuskError> {
    let raw = std::fs::read(path)
        .map_err(|e| HuskError::archive(format!("cannot read '{}': {}", path.display(), e)))?;
    let data = if is_gzip(&raw) {
        decompress_gzip(&raw)
            .map_err(|e| HuskError::archive(format!("gzip decompression error: {}", e)))?
    } else {
        raw
    };
    parse_archive(&data).map_err(HuskError::archive)
}

/// Materialize an archive into the staging directory.
///
/// The staging directory is wiped first so stale entries from a previous
/// run never leak into the tree. Symlinks and other special entries are
/// skipped.
pub fn stage_archive(archive_path: &Path, staging_dir: &Path) -> Result<(), HuskError> {
    let entries = read_archive(archive_path)?;

    if staging_dir.exists() {
        std::fs::remove_dir_all(staging_dir).map_err(|e| {
            HuskError::archive(format!(
                "cannot clear staging dir '{}': {}",
                staging_dir.display(),
                e
            ))
        })?;
    }
    std::fs::create_dir_all(staging_dir).map_err(|e| {
        HuskError::archive(format!(
            "cannot create staging dir '{}': {}",
            staging_dir.display(),
            e
        ))
    })?;

    for entry in &entries {
        if entry.is_symlink {
            continue;
        }
        let target = match safe_join(staging_dir, &entry.path)? {
            Some(t) => t,
            None => continue,
        };
        if entry.is_directory {
            std::fs::create_dir_all(&target).map_err(|e| {
                HuskError::archive(format!("cannot create '{}': {}", target.display(), e))
            })?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    HuskError::archive(format!("cannot create '{}': {}", parent.display(), e))
                })?;
            }
            std::fs::write(&target, &entry.content).map_err(|e| {
                HuskError::archive(format!("cannot write '{}': {}", target.display(), e))
            })?;
        }
    }
    Ok(())
}

/// Join an entry path under the staging directory, refusing anything that
/// would land outside it. Returns None when no components remain (the
/// archive's own root entry).
fn safe_join(staging_dir: &Path, entry_path: &str) -> Result<Option<PathBuf>, HuskError> {
    let mut target = staging_dir.to_path_buf();
    let mut pushed = false;
    for component in entry_path.split('/') {
        if component.is_empty() || component == "." {
            continue;
        }
        if component == ".." {
            return Err(HuskError::archive(format!(
                "unsafe path '{}' in archive",
                entry_path
            )));
        }
        target.push(component);
        pushed = true;
    }
    if pushed {
        Ok(Some(target))
    } else {
        Ok(None)
    }
}
