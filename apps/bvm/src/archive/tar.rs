//! Minimal POSIX tar reader.
//!
//! Runtime vendors ship plain ustar/GNU archives, so this reader handles only
//! what those contain: regular files, directories, symbolic links, the ustar
//! name prefix, and PAX/GNU long-name records. It reads the stream front to
//! back and writes entries below a destination directory.
//!
//! Header layout (offsets in a 512-byte block):
//!
//! | offset | size | field     |
//! |--------|------|-----------|
//! | 0      | 100  | name      |
//! | 100    | 8    | mode      |
//! | 124    | 12   | size      |
//! | 156    | 1    | type flag |
//! | 157    | 100  | link name |
//! | 257    | 6    | magic     |
//! | 345    | 155  | prefix    |

use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};

const BLOCK_SIZE: usize = 512;

const NAME: (usize, usize) = (0, 100);
const MODE: (usize, usize) = (100, 8);
const SIZE: (usize, usize) = (124, 12);
const TYPE_FLAG: usize = 156;
const LINK_NAME: (usize, usize) = (157, 100);
const MAGIC: (usize, usize) = (257, 6);
const USTAR_MAGIC: &[u8] = b"ustar\0";
const PREFIX: (usize, usize) = (345, 155);

/// Entry kinds this reader acts on, keyed by the header type flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryType {
    File,
    Directory,
    Symlink,
    PaxExtended,
    PaxGlobal,
    GnuLongName,
    Other(u8),
}

impl EntryType {
    fn from_flag(flag: u8) -> Self {
        match flag {
            b'0' | b'\0' | b'7' => Self::File,
            b'5' => Self::Directory,
            b'2' => Self::Symlink,
            b'x' => Self::PaxExtended,
            b'g' => Self::PaxGlobal,
            b'L' => Self::GnuLongName,
            other => Self::Other(other),
        }
    }
}

/// One decoded header block.
struct Header {
    name: String,
    mode: u32,
    size: u64,
    entry_type: EntryType,
    link_name: String,
}

impl Header {
    /// Decodes a header block. Returns `None` for the end-of-archive marker.
    fn parse(block: &[u8; BLOCK_SIZE]) -> Result<Option<Self>> {
        let raw_name = field_str(block, NAME);
        if raw_name.is_empty() {
            return Ok(None);
        }

        let name = if field(block, MAGIC) == USTAR_MAGIC {
            let prefix = field_str(block, PREFIX);
            if prefix.is_empty() {
                raw_name
            } else {
                format!("{prefix}/{raw_name}")
            }
        } else {
            raw_name
        };

        let size = parse_octal(field(block, SIZE))
            .with_context(|| format!("Invalid size field for tar entry {name}"))?;
        #[allow(clippy::cast_possible_truncation)]
        let mode = (parse_octal(field(block, MODE)).unwrap_or(0) & 0o7777) as u32;

        Ok(Some(Self {
            name,
            mode,
            size,
            entry_type: EntryType::from_flag(block[TYPE_FLAG]),
            link_name: field_str(block, LINK_NAME),
        }))
    }
}

/// Extracts an uncompressed tar stream into `dest_dir`.
///
/// Stops at the first header whose name is empty. A stream that ends without
/// that marker is accepted as long as it ends on a header boundary.
///
/// # Errors
///
/// Returns an error if the stream is truncated, a size field is not octal, an
/// entry name escapes the destination, or a file cannot be written.
pub fn unpack<R: Read>(mut reader: R, dest_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    let mut block = [0u8; BLOCK_SIZE];
    let mut long_name: Option<String> = None;

    loop {
        if !read_block(&mut reader, &mut block)? {
            break;
        }
        let Some(header) = Header::parse(&block)? else {
            break;
        };

        match header.entry_type {
            EntryType::PaxExtended => {
                let data = read_data(&mut reader, header.size)?;
                if let Some(path) = pax_path(&data) {
                    long_name = Some(path);
                }
                skip_padding(&mut reader, header.size)?;
                continue;
            }
            EntryType::PaxGlobal => {
                skip_data(&mut reader, header.size)?;
                continue;
            }
            EntryType::GnuLongName => {
                let data = read_data(&mut reader, header.size)?;
                long_name = Some(trim_nul(&data));
                skip_padding(&mut reader, header.size)?;
                continue;
            }
            _ => {}
        }

        let name = long_name.take().unwrap_or_else(|| header.name.clone());
        let Some(relative) = sanitize(&name)? else {
            skip_data(&mut reader, header.size)?;
            continue;
        };
        let output_path = dest_dir.join(&relative);

        match header.entry_type {
            EntryType::Directory => {
                std::fs::create_dir_all(&output_path).with_context(|| {
                    format!("Failed to create directory: {}", output_path.display())
                })?;
                skip_data(&mut reader, header.size)?;
            }
            EntryType::File => {
                write_file(&mut reader, &output_path, header.size)?;
                skip_padding(&mut reader, header.size)?;
                set_mode(&output_path, header.mode)?;
            }
            EntryType::Symlink => {
                create_symlink(&header.link_name, &output_path)?;
                skip_data(&mut reader, header.size)?;
            }
            EntryType::Other(flag) => {
                tracing::debug!("Skipping tar entry {name} of type {:?}", flag as char);
                skip_data(&mut reader, header.size)?;
            }
            EntryType::PaxExtended | EntryType::PaxGlobal | EntryType::GnuLongName => {}
        }
    }

    Ok(())
}

/// Fills `block` from the reader. Returns `false` on a clean end of stream.
fn read_block<R: Read>(reader: &mut R, block: &mut [u8; BLOCK_SIZE]) -> Result<bool> {
    let mut filled = 0;
    while filled < BLOCK_SIZE {
        let n = reader
            .read(&mut block[filled..])
            .context("Failed to read tar header")?;
        if n == 0 {
            if filled == 0 {
                return Ok(false);
            }
            bail!("Unexpected end of tar stream inside a header block");
        }
        filled += n;
    }
    Ok(true)
}

fn read_data<R: Read>(reader: &mut R, size: u64) -> Result<Vec<u8>> {
    let len = usize::try_from(size).context("Tar metadata record too large")?;
    let mut data = vec![0u8; len];
    reader
        .read_exact(&mut data)
        .context("Unexpected end of tar stream inside a metadata record")?;
    Ok(data)
}

fn write_file<R: Read>(reader: &mut R, path: &Path, size: u64) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let copied = io::copy(&mut reader.by_ref().take(size), &mut file)
        .with_context(|| format!("Failed to extract: {}", path.display()))?;
    if copied != size {
        bail!(
            "Unexpected end of tar stream: {} has {copied} of {size} bytes",
            path.display()
        );
    }
    Ok(())
}

fn skip_data<R: Read>(reader: &mut R, size: u64) -> Result<()> {
    let skipped = io::copy(&mut reader.by_ref().take(size), &mut io::sink())
        .context("Failed to skip tar entry data")?;
    if skipped != size {
        bail!("Unexpected end of tar stream while skipping entry data");
    }
    skip_padding(reader, size)
}

fn skip_padding<R: Read>(reader: &mut R, size: u64) -> Result<()> {
    let padding = padding_for(size);
    if padding > 0 {
        let mut buf = [0u8; BLOCK_SIZE];
        reader
            .read_exact(&mut buf[..padding])
            .context("Unexpected end of tar stream inside block padding")?;
    }
    Ok(())
}

/// Bytes needed to round `size` up to the next block boundary.
fn padding_for(size: u64) -> usize {
    let block = BLOCK_SIZE as u64;
    #[allow(clippy::cast_possible_truncation)]
    let padding = ((block - size % block) % block) as usize;
    padding
}

/// Turns an entry name into a path relative to the destination.
///
/// Returns `None` for names that denote the destination itself (`./`).
fn sanitize(name: &str) -> Result<Option<PathBuf>> {
    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                bail!("Refusing to extract path with parent directory or absolute reference: {name}");
            }
        }
    }
    Ok((!relative.as_os_str().is_empty()).then_some(relative))
}

/// Finds the `path` key among PAX `"<len> key=value\n"` records.
fn pax_path(data: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(data);
    let mut path = None;
    for record in text.split_terminator('\n') {
        let (_, pair) = record.split_once(' ')?;
        if let Some(value) = pair.strip_prefix("path=") {
            path = Some(value.to_string());
        }
    }
    path
}

fn field(block: &[u8; BLOCK_SIZE], (offset, len): (usize, usize)) -> &[u8] {
    &block[offset..offset + len]
}

fn field_str(block: &[u8; BLOCK_SIZE], range: (usize, usize)) -> String {
    trim_nul(field(block, range))
}

fn trim_nul(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Parses a NUL/space padded octal field.
fn parse_octal(bytes: &[u8]) -> Result<u64> {
    let text = trim_nul(bytes);
    let digits = text.trim();
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 8).with_context(|| format!("Invalid octal number: {digits:?}"))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if mode == 0 {
        return Ok(());
    }
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to set permissions: {}", path.display()))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn create_symlink(target: &str, link: &Path) -> Result<()> {
    if let Some(parent) = link.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    if link.symlink_metadata().is_ok() {
        std::fs::remove_file(link)
            .with_context(|| format!("Failed to remove existing file: {}", link.display()))?;
    }
    std::os::unix::fs::symlink(target, link)
        .with_context(|| format!("Failed to create symlink {} -> {target}", link.display()))
}

#[cfg(not(unix))]
fn create_symlink(target: &str, link: &Path) -> Result<()> {
    tracing::debug!("Skipping symlink {} -> {target}", link.display());
    Ok(())
}
