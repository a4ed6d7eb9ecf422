//! Android binary XML (AXML) decoder
//!
//! `AndroidManifest.xml` inside an APK is stored as a compiled resource
//! chunk stream. Only what manifest inspection needs is decoded: the string
//! pool, the resource id map, and start-element chunks with their typed
//! attributes.

use tracing::trace;

use crate::error::{PackageError, Result};

const RES_XML_TYPE: u16 = 0x0003;
const RES_STRING_POOL_TYPE: u16 = 0x0001;
const RES_XML_RESOURCE_MAP_TYPE: u16 = 0x0180;
const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;
const RES_XML_END_ELEMENT_TYPE: u16 = 0x0103;

const UTF8_FLAG: u32 = 1 << 8;
const NO_INDEX: u32 = 0xFFFF_FFFF;

const TYPE_REFERENCE: u8 = 0x01;
const TYPE_STRING: u8 = 0x03;
const TYPE_FLOAT: u8 = 0x04;
const TYPE_INT_DEC: u8 = 0x10;
const TYPE_INT_HEX: u8 = 0x11;
const TYPE_INT_BOOLEAN: u8 = 0x12;

/// Typed attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    String(String),
    Int(i64),
    Bool(bool),
    Float(f32),
    /// Resource reference (`@0x7f0e001b`)
    Reference(u32),
    Other { data_type: u8, data: u32 },
}

impl AttrValue {
    /// Literal text form, `None` for unresolved references
    pub fn as_text(&self) -> Option<String> {
        match self {
            AttrValue::String(s) => Some(s.clone()),
            AttrValue::Int(i) => Some(i.to_string()),
            AttrValue::Bool(b) => Some(b.to_string()),
            AttrValue::Float(f) => Some(f.to_string()),
            AttrValue::Reference(_) | AttrValue::Other { .. } => None,
        }
    }
}

/// A decoded attribute
#[derive(Debug, Clone)]
pub struct XmlAttribute {
    pub name: String,
    /// Framework resource id from the resource map (e.g. `android:versionCode`)
    pub resource_id: Option<u32>,
    pub value: AttrValue,
}

/// A decoded start element
#[derive(Debug, Clone)]
pub struct XmlElement {
    pub name: String,
    pub depth: usize,
    pub attributes: Vec<XmlAttribute>,
}

impl XmlElement {
    /// Find an attribute by local name, falling back to its framework resource id
    pub fn attribute(&self, name: &str, resource_id: u32) -> Option<&AttrValue> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|a| a.resource_id == Some(resource_id))
            })
            .map(|a| &a.value)
    }
}

/// Decode every start element of a binary XML document, in document order
pub fn parse(data: &[u8]) -> Result<Vec<XmlElement>> {
    let reader = Reader::new(data);

    if reader.u16(0)? != RES_XML_TYPE {
        return Err(PackageError::axml(0, "not a binary XML document"));
    }
    let header_size = reader.u16(2)? as usize;
    let total = (reader.u32(4)? as usize).min(data.len());

    let mut strings: Vec<String> = Vec::new();
    let mut resource_ids: Vec<u32> = Vec::new();
    let mut elements = Vec::new();
    let mut depth = 0usize;
    let mut offset = header_size;

    while offset + 8 <= total {
        let chunk_type = reader.u16(offset)?;
        let chunk_header = reader.u16(offset + 2)? as usize;
        let chunk_size = reader.u32(offset + 4)? as usize;
        if chunk_size < 8 || offset + chunk_size > total {
            return Err(PackageError::axml(offset, "chunk size out of bounds"));
        }

        match chunk_type {
            RES_STRING_POOL_TYPE => {
                strings = read_string_pool(&reader, offset, chunk_size)?;
                trace!(count = strings.len(), "decoded string pool");
            }
            RES_XML_RESOURCE_MAP_TYPE => {
                resource_ids = (offset + chunk_header..offset + chunk_size)
                    .step_by(4)
                    .map(|at| reader.u32(at))
                    .collect::<Result<_>>()?;
            }
            RES_XML_START_ELEMENT_TYPE => {
                let element =
                    read_start_element(&reader, offset, chunk_header, depth, &strings, &resource_ids)?;
                elements.push(element);
                depth += 1;
            }
            RES_XML_END_ELEMENT_TYPE => {
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }

        offset += chunk_size;
    }

    Ok(elements)
}

fn read_string_pool(reader: &Reader<'_>, chunk: usize, chunk_size: usize) -> Result<Vec<String>> {
    let string_count = reader.u32(chunk + 8)? as usize;
    let flags = reader.u32(chunk + 16)?;
    let strings_start = reader.u32(chunk + 20)? as usize;
    let header_size = reader.u16(chunk + 2)? as usize;
    let utf8 = flags & UTF8_FLAG != 0;

    // Each string needs a four byte offset inside the chunk
    if string_count > chunk_size.saturating_sub(header_size) / 4 {
        return Err(PackageError::axml(
            chunk,
            format!("string pool declares {string_count} strings, more than the chunk holds"),
        ));
    }

    let mut strings = Vec::with_capacity(string_count);
    for i in 0..string_count {
        let string_offset = reader.u32(chunk + header_size + i * 4)? as usize;
        let at = chunk + strings_start + string_offset;
        let s = if utf8 {
            read_utf8(reader, at)?
        } else {
            read_utf16(reader, at)?
        };
        strings.push(s);
    }
    Ok(strings)
}

fn read_utf8(reader: &Reader<'_>, at: usize) -> Result<String> {
    // Character count, then byte count, each one or two bytes
    let (_, skip) = read_utf8_len(reader, at)?;
    let (len, skip2) = read_utf8_len(reader, at + skip)?;
    let start = at + skip + skip2;
    let bytes = reader.slice(start, len)?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn read_utf8_len(reader: &Reader<'_>, at: usize) -> Result<(usize, usize)> {
    let first = reader.u8(at)? as usize;
    if first & 0x80 != 0 {
        let second = reader.u8(at + 1)? as usize;
        Ok((((first & 0x7f) << 8) | second, 2))
    } else {
        Ok((first, 1))
    }
}

fn read_utf16(reader: &Reader<'_>, at: usize) -> Result<String> {
    let first = reader.u16(at)? as usize;
    let (len, skip) = if first & 0x8000 != 0 {
        let second = reader.u16(at + 2)? as usize;
        ((((first & 0x7fff) << 16) | second), 4)
    } else {
        (first, 2)
    };
    let units = (0..len)
        .map(|i| reader.u16(at + skip + i * 2))
        .collect::<Result<Vec<u16>>>()?;
    Ok(String::from_utf16_lossy(&units))
}

fn read_start_element(
    reader: &Reader<'_>,
    chunk: usize,
    header_size: usize,
    depth: usize,
    strings: &[String],
    resource_ids: &[u32],
) -> Result<XmlElement> {
    let body = chunk + header_size;
    let name_index = reader.u32(body + 4)?;
    let attribute_start = reader.u16(body + 8)? as usize;
    let attribute_size = reader.u16(body + 10)? as usize;
    let attribute_count = reader.u16(body + 12)? as usize;

    let name = lookup(strings, name_index).unwrap_or_default();
    let mut attributes = Vec::with_capacity(attribute_count);

    for i in 0..attribute_count {
        let at = body + attribute_start + i * attribute_size;
        let attr_name = reader.u32(at + 4)?;
        let raw_value = reader.u32(at + 8)?;
        let data_type = reader.u8(at + 15)?;
        let data = reader.u32(at + 16)?;

        let value = if raw_value != NO_INDEX {
            AttrValue::String(lookup(strings, raw_value).unwrap_or_default())
        } else {
            typed_value(data_type, data, strings)
        };

        attributes.push(XmlAttribute {
            name: lookup(strings, attr_name).unwrap_or_default(),
            resource_id: resource_ids.get(attr_name as usize).copied(),
            value,
        });
    }

    Ok(XmlElement {
        name,
        depth,
        attributes,
    })
}

fn typed_value(data_type: u8, data: u32, strings: &[String]) -> AttrValue {
    match data_type {
        TYPE_STRING => AttrValue::String(lookup(strings, data).unwrap_or_default()),
        TYPE_INT_DEC | TYPE_INT_HEX => AttrValue::Int(data as i32 as i64),
        TYPE_INT_BOOLEAN => AttrValue::Bool(data != 0),
        TYPE_FLOAT => AttrValue::Float(f32::from_bits(data)),
        TYPE_REFERENCE => AttrValue::Reference(data),
        _ => AttrValue::Other { data_type, data },
    }
}

fn lookup(strings: &[String], index: u32) -> Option<String> {
    if index == NO_INDEX {
        return None;
    }
    strings.get(index as usize).cloned()
}

/// Bounds-checked little-endian reader
struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn slice(&self, at: usize, len: usize) -> Result<&'a [u8]> {
        at.checked_add(len)
            .and_then(|end| self.data.get(at..end))
            .ok_or_else(|| PackageError::axml(at, "unexpected end of data"))
    }

    fn u8(&self, at: usize) -> Result<u8> {
        Ok(self.slice(at, 1)?[0])
    }

    fn u16(&self, at: usize) -> Result<u16> {
        let b = self.slice(at, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&self, at: usize) -> Result<u32> {
        let b = self.slice(at, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Minimal AXML writer used to build manifest fixtures in tests
#[cfg(test)]
pub(crate) mod builder {
    pub(crate) enum Value<'a> {
        Str(&'a str),
        Int(u32),
        Ref(u32),
    }

    pub(crate) struct Element<'a> {
        pub name: &'a str,
        pub attrs: Vec<(&'a str, Value<'a>)>,
    }

    /// Encode elements as nested children of each other, in order
    pub(crate) fn build(elements: &[Element<'_>]) -> Vec<u8> {
        let mut strings: Vec<String> = Vec::new();
        let intern = |s: &str, strings: &mut Vec<String>| -> u32 {
            if let Some(i) = strings.iter().position(|x| x == s) {
                return i as u32;
            }
            strings.push(s.to_string());
            (strings.len() - 1) as u32
        };

        let mut body = Vec::new();
        for element in elements {
            let name = intern(element.name, &mut strings);
            let mut chunk = Vec::new();
            chunk.extend_from_slice(&0u32.to_le_bytes()); // line
            chunk.extend_from_slice(&u32::MAX.to_le_bytes()); // comment
            chunk.extend_from_slice(&u32::MAX.to_le_bytes()); // ns
            chunk.extend_from_slice(&name.to_le_bytes());
            chunk.extend_from_slice(&20u16.to_le_bytes()); // attribute start
            chunk.extend_from_slice(&20u16.to_le_bytes()); // attribute size
            chunk.extend_from_slice(&(element.attrs.len() as u16).to_le_bytes());
            chunk.extend_from_slice(&[0u8; 6]);
            for (attr, value) in &element.attrs {
                let attr_name = intern(attr, &mut strings);
                let (raw, data_type, data) = match value {
                    Value::Str(s) => {
                        let i = intern(s, &mut strings);
                        (i, 0x03u8, i)
                    }
                    Value::Int(n) => (u32::MAX, 0x10u8, *n),
                    Value::Ref(r) => (u32::MAX, 0x01u8, *r),
                };
                chunk.extend_from_slice(&u32::MAX.to_le_bytes());
                chunk.extend_from_slice(&attr_name.to_le_bytes());
                chunk.extend_from_slice(&raw.to_le_bytes());
                chunk.extend_from_slice(&8u16.to_le_bytes());
                chunk.push(0);
                chunk.push(data_type);
                chunk.extend_from_slice(&data.to_le_bytes());
            }
            body.extend_from_slice(&0x0102u16.to_le_bytes());
            body.extend_from_slice(&16u16.to_le_bytes());
            body.extend_from_slice(&((chunk.len() + 8) as u32).to_le_bytes());
            body.extend_from_slice(&chunk);
        }

        // UTF-16 string pool
        let mut offsets = Vec::new();
        let mut data = Vec::new();
        for s in &strings {
            offsets.extend_from_slice(&(data.len() as u32).to_le_bytes());
            let units: Vec<u16> = s.encode_utf16().collect();
            data.extend_from_slice(&(units.len() as u16).to_le_bytes());
            for u in units {
                data.extend_from_slice(&u.to_le_bytes());
            }
            data.extend_from_slice(&[0, 0]);
        }
        while data.len() % 4 != 0 {
            data.push(0);
        }
        let strings_start = 28 + offsets.len();
        let pool_size = strings_start + data.len();
        let mut pool = Vec::new();
        pool.extend_from_slice(&0x0001u16.to_le_bytes());
        pool.extend_from_slice(&28u16.to_le_bytes());
        pool.extend_from_slice(&(pool_size as u32).to_le_bytes());
        pool.extend_from_slice(&(strings.len() as u32).to_le_bytes());
        pool.extend_from_slice(&0u32.to_le_bytes()); // styles
        pool.extend_from_slice(&0u32.to_le_bytes()); // flags: UTF-16
        pool.extend_from_slice(&(strings_start as u32).to_le_bytes());
        pool.extend_from_slice(&0u32.to_le_bytes());
        pool.extend_from_slice(&offsets);
        pool.extend_from_slice(&data);

        let mut out = Vec::new();
        out.extend_from_slice(&0x0003u16.to_le_bytes());
        out.extend_from_slice(&8u16.to_le_bytes());
        out.extend_from_slice(&((8 + pool.len() + body.len()) as u32).to_le_bytes());
        out.extend_from_slice(&pool);
        out.extend_from_slice(&body);
        out
    }
}
