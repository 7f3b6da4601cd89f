//! Minimal class-file header reader.
//!
//! Only the constant pool's Utf8 and Class entries, the `this_class` pointer
//! and the class-level `SourceFile` attribute are interpreted. Everything
//! else (interfaces, field and method tables, `Code`, `StackMapTable`, other
//! attributes) is skipped as opaque length-prefixed bytes and never validated.

use serde::Serialize;
use thiserror::Error;

const MAGIC: u32 = 0xCAFEBABE;
const SOURCE_FILE_ATTRIBUTE: &[u8] = b"SourceFile";

#[derive(Debug, Error)]
pub enum ClassDecodeError {
    #[error("unexpected end of class data at offset {offset}")]
    UnexpectedEof { offset: usize },
    #[error("invalid class file magic header {found:#010x}")]
    InvalidMagic { found: u32 },
    #[error("unsupported constant pool tag {tag} at index {index}")]
    UnsupportedConstant { tag: u8, index: usize },
    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },
    #[error("invalid modified UTF-8 in constant pool entry {index}")]
    InvalidUtf8 { index: u16 },
    #[error("malformed {name} attribute: length {length}")]
    MalformedAttribute { name: &'static str, length: u32 },
}

/// Declared name and debug source marker of one compiled class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedClassHeader {
    pub binary_class_name: String,
    pub source_file: Option<String>,
}

impl ParsedClassHeader {
    pub fn package_name(&self) -> &str {
        package_of(&self.binary_class_name)
    }
}

/// Dot-separated prefix of a binary class name, empty for the default package.
pub fn package_of(binary_class_name: &str) -> &str {
    binary_class_name
        .rsplit_once('.')
        .map(|(pkg, _)| pkg)
        .unwrap_or("")
}

pub fn parse_class_header(bytes: &[u8]) -> Result<ParsedClassHeader, ClassDecodeError> {
    let mut reader = ClassReader::new(bytes);
    reader.expect_magic()?;
    let _minor_version = reader.read_u2()?;
    let _major_version = reader.read_u2()?;
    let constant_pool = ConstantPool::parse(&mut reader)?;

    let _access_flags = reader.read_u2()?;
    let this_class = reader.read_u2()?;
    let _super_class = reader.read_u2()?;

    let interfaces_count = reader.read_u2()?;
    reader.skip(interfaces_count as usize * 2)?;

    let fields_count = reader.read_u2()?;
    for _ in 0..fields_count {
        skip_member(&mut reader)?;
    }

    let methods_count = reader.read_u2()?;
    for _ in 0..methods_count {
        skip_member(&mut reader)?;
    }

    let mut source_file = None;
    let attributes_count = reader.read_u2()?;
    for _ in 0..attributes_count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()?;
        if constant_pool.utf8_bytes(name_index)? != SOURCE_FILE_ATTRIBUTE {
            reader.skip(length as usize)?;
            continue;
        }
        if length != 2 {
            return Err(ClassDecodeError::MalformedAttribute {
                name: "SourceFile",
                length,
            });
        }
        let value_index = reader.read_u2()?;
        source_file = Some(constant_pool.utf8(value_index)?);
    }

    let binary_class_name = constant_pool.class_name(this_class)?.replace('/', ".");
    Ok(ParsedClassHeader {
        binary_class_name,
        source_file,
    })
}

#[derive(Debug, Clone, Copy)]
enum Constant<'a> {
    Utf8(&'a [u8]),
    Class { name_index: u16 },
    Other,
    Unusable,
}

struct ConstantPool<'a> {
    entries: Vec<Constant<'a>>,
}

impl<'a> ConstantPool<'a> {
    fn parse(reader: &mut ClassReader<'a>) -> Result<Self, ClassDecodeError> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable); // index 0 unused

        while entries.len() < count {
            let index = entries.len();
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let length = reader.read_u2()? as usize;
                    Constant::Utf8(reader.read_slice(length)?)
                }
                7 => Constant::Class {
                    name_index: reader.read_u2()?,
                },
                // Long and Double take two slots.
                5 | 6 => {
                    reader.skip(8)?;
                    entries.push(Constant::Other);
                    Constant::Unusable
                }
                8 | 16 | 19 | 20 => {
                    reader.skip(2)?;
                    Constant::Other
                }
                15 => {
                    reader.skip(3)?;
                    Constant::Other
                }
                3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                other => {
                    return Err(ClassDecodeError::UnsupportedConstant { tag: other, index });
                }
            };
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<Constant<'a>, ClassDecodeError> {
        self.entries
            .get(index as usize)
            .copied()
            .ok_or(ClassDecodeError::InvalidConstantIndex { index })
    }

    fn utf8_bytes(&self, index: u16) -> Result<&'a [u8], ClassDecodeError> {
        match self.get(index)? {
            Constant::Utf8(bytes) => Ok(bytes),
            _ => Err(ClassDecodeError::InvalidConstantIndex { index }),
        }
    }

    fn utf8(&self, index: u16) -> Result<String, ClassDecodeError> {
        let bytes = self.utf8_bytes(index)?;
        decode_modified_utf8(bytes).ok_or(ClassDecodeError::InvalidUtf8 { index })
    }

    fn class_name(&self, index: u16) -> Result<String, ClassDecodeError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(name_index),
            _ => Err(ClassDecodeError::InvalidConstantIndex { index }),
        }
    }
}

/// Decodes the class-file flavour of UTF-8: NUL is encoded as `C0 80` and
/// supplementary characters as two 3-byte surrogates.
fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Some(s.to_string());
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i] as u16;
        let continuation = |offset: usize| -> Option<u16> {
            let b = *bytes.get(i + offset)?;
            (b & 0xC0 == 0x80).then_some((b & 0x3F) as u16)
        };
        if b0 & 0x80 == 0 {
            units.push(b0);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            units.push(((b0 & 0x1F) << 6) | continuation(1)?);
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            units.push(((b0 & 0x0F) << 12) | (continuation(1)? << 6) | continuation(2)?);
            i += 3;
        } else {
            return None;
        }
    }
    String::from_utf16(&units).ok()
}

struct ClassReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ClassReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn expect_magic(&mut self) -> Result<(), ClassDecodeError> {
        let found = self.read_u4()?;
        if found != MAGIC {
            return Err(ClassDecodeError::InvalidMagic { found });
        }
        Ok(())
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ClassDecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(ClassDecodeError::UnexpectedEof { offset: self.pos })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), ClassDecodeError> {
        self.read_slice(len).map(|_| ())
    }

    fn read_u1(&mut self) -> Result<u8, ClassDecodeError> {
        Ok(self.read_slice(1)?[0])
    }

    fn read_u2(&mut self) -> Result<u16, ClassDecodeError> {
        let b = self.read_slice(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn read_u4(&mut self) -> Result<u32, ClassDecodeError> {
        let b = self.read_slice(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

fn skip_attributes(reader: &mut ClassReader<'_>, count: u16) -> Result<(), ClassDecodeError> {
    for _ in 0..count {
        reader.read_u2()?; // attribute_name_index
        let length = reader.read_u4()? as usize;
        reader.skip(length)?;
    }
    Ok(())
}

fn skip_member(reader: &mut ClassReader<'_>) -> Result<(), ClassDecodeError> {
    reader.read_u2()?; // access_flags
    reader.read_u2()?; // name_index
    reader.read_u2()?; // descriptor_index
    let attributes_count = reader.read_u2()?;
    skip_attributes(reader, attributes_count)
}
