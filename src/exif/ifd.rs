use std::collections::HashMap;

use crate::reader::ByteReader;

use super::tags::ExifTag;

pub(crate) const IFD_ENTRY_SIZE: usize = 12;

/// Bytes per component, indexed by the entry's data format code.
///
/// ```txt
/// | Value           |             1 |             2 |              3 |               4 |                 5 |            6 |
/// | Format          | unsigned byte | ascii strings | unsigned short |   unsigned long | unsigned rational |  signed byte |
/// | Bytes/component |             1 |             1 |              2 |               4 |                 8 |            1 |
///
/// | Value           |             7 |             8 |              9 |              10 |                11 |           12 |
/// | Format          |     undefined |  signed short |    signed long | signed rational |      single float | double float |
/// | Bytes/component |             1 |             2 |              4 |               8 |                 4 |            8 |
/// ```
const COMPONENT_SIZES: [usize; 13] = [0, 1, 1, 2, 4, 8, 1, 1, 2, 4, 8, 4, 8];

const FORMAT_U16: u16 = 3;

fn component_size(data_format: u16) -> usize {
    match COMPONENT_SIZES.get(data_format as usize) {
        Some(0) | None => 1,
        Some(size) => *size,
    }
}

/// The content of an entry's 4-byte value slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagValue {
    /// The value fits in the slot and was read from it directly.
    Inline(u32),
    /// The slot holds an offset (relative to the TIFF origin) to the value.
    Offset(u32),
}

/// One decoded IFD entry.
///
/// ```txt
/// | 2   | 2           | 4              | 4                      |
/// | tag | data format | components num | data (value or offset) |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TagEntry {
    pub data_format: u16,
    pub components_num: u32,
    pub value: TagValue,
    /// Absolute buffer position of the 4-byte value slot.
    pub slot: usize,
}

impl TagEntry {
    pub fn inline(&self) -> Option<u32> {
        match self.value {
            TagValue::Inline(v) => Some(v),
            TagValue::Offset(_) => None,
        }
    }

    /// Absolute buffer position of the entry's value bytes.
    pub fn data_pos(&self, origin: usize) -> usize {
        match self.value {
            TagValue::Inline(_) => self.slot,
            TagValue::Offset(offset) => origin.saturating_add(offset as usize),
        }
    }

    /// Absolute position of an out-of-line value, `None` for inline values
    /// and null offsets.
    pub fn offset_pos(&self, origin: usize) -> Option<usize> {
        match self.value {
            TagValue::Inline(_) | TagValue::Offset(0) => None,
            TagValue::Offset(offset) => Some(origin.saturating_add(offset as usize)),
        }
    }
}

/// A decoded image file directory: tag code → entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TagDirectory {
    entries: HashMap<u16, TagEntry>,
    // entry num from the directory header
    declared: u16,
    // entries successfully read, duplicates included
    read: u16,
}

impl TagDirectory {
    pub fn get(&self, tag: ExifTag) -> Option<&TagEntry> {
        self.entries.get(&tag.code())
    }

    /// Number of entries actually decoded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn declared(&self) -> u16 {
        self.declared
    }

    /// False if the table ran off the end of the buffer before all
    /// declared entries were read.
    pub fn is_complete(&self) -> bool {
        self.read == self.declared
    }
}

/// Decodes the directory at absolute position `dir_pos`.
///
/// Returns an error only if the entry num itself can't be read. Entries are
/// then read until the table is exhausted or a read fails; a truncated
/// table still yields the entries before the failure.
#[tracing::instrument(skip(reader))]
pub(crate) fn parse_directory(
    reader: &ByteReader,
    origin: usize,
    dir_pos: usize,
) -> crate::Result<TagDirectory> {
    let declared = reader.u16_at(dir_pos)?;
    let mut dir = TagDirectory {
        entries: HashMap::with_capacity(declared as usize),
        declared,
        read: 0,
    };

    for i in 0..declared as usize {
        let pos = dir_pos + 2 + i * IFD_ENTRY_SIZE;
        match parse_entry(reader, pos) {
            Ok((tag, entry)) => {
                dir.entries.insert(tag, entry);
                dir.read += 1;
            }
            Err(e) => {
                tracing::debug!(
                    ?e,
                    index = i,
                    declared,
                    origin,
                    "ifd table truncated"
                );
                break;
            }
        }
    }

    Ok(dir)
}

fn parse_entry(reader: &ByteReader, pos: usize) -> crate::Result<(u16, TagEntry)> {
    let tag = reader.u16_at(pos)?;
    let data_format = reader.u16_at(pos + 2)?;
    let components_num = reader.u32_at(pos + 4)?;
    let slot = pos + 8;

    let size = (components_num as usize).saturating_mul(component_size(data_format));
    let value = if size <= 4 {
        if data_format == FORMAT_U16 {
            TagValue::Inline(reader.u16_at(slot)? as u32)
        } else {
            TagValue::Inline(reader.u32_at(slot)?)
        }
    } else {
        TagValue::Offset(reader.u32_at(slot)?)
    };

    Ok((
        tag,
        TagEntry {
            data_format,
            components_num,
            value,
            slot,
        },
    ))
}
