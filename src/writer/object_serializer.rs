//! PDF object serialization.
//!
//! Writes [`Object`] values in PDF syntax (ISO 32000-1:2008 Section 7.3).
//! Dictionary keys are emitted in sorted order so output is deterministic.

use crate::object::{Dictionary, Object, ObjectRef};
use std::io::{self, Write};

/// Serializer for PDF objects.
#[derive(Debug, Clone, Default)]
pub struct ObjectSerializer {
    /// Minimal whitespace inside dictionaries
    compact: bool,
}

impl ObjectSerializer {
    /// Serializer that puts each dictionary entry on its own line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializer with minimal whitespace.
    pub fn compact() -> Self {
        Self { compact: true }
    }

    /// Serialize an object to bytes.
    pub fn serialize(&self, obj: &Object) -> Vec<u8> {
        let mut buf = Vec::new();
        // writes into a Vec cannot fail
        let _ = self.write_object(&mut buf, obj);
        buf
    }

    /// Serialize an object to a string (tests and debugging).
    pub fn serialize_to_string(&self, obj: &Object) -> String {
        String::from_utf8_lossy(&self.serialize(obj)).into_owned()
    }

    /// Write an indirect object definition: `{id} {gen} obj ... endobj`.
    pub fn write_indirect<W: Write>(&self, w: &mut W, id: ObjectRef, obj: &Object) -> io::Result<()> {
        writeln!(w, "{} {} obj", id.id, id.gen)?;
        self.write_object(w, obj)?;
        write!(w, "\nendobj\n")
    }

    /// Write any object.
    pub fn write_object<W: Write>(&self, w: &mut W, obj: &Object) -> io::Result<()> {
        match obj {
            Object::Null => write!(w, "null"),
            Object::Boolean(b) => write!(w, "{}", b),
            Object::Integer(i) => write!(w, "{}", i),
            Object::Real(r) => write_real(w, *r),
            Object::String(s) => write_string(w, s),
            Object::Name(n) => write_name(w, n),
            Object::Array(items) => {
                write!(w, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(w, " ")?;
                    }
                    self.write_object(w, item)?;
                }
                write!(w, "]")
            },
            Object::Dictionary(dict) => self.write_dictionary(w, dict),
            Object::Stream { dict, data } => {
                let mut dict = dict.clone();
                dict.entry("Length".to_string())
                    .or_insert(Object::Integer(data.len() as i64));
                self.write_dictionary(w, &dict)?;
                write!(w, "\nstream\n")?;
                w.write_all(data)?;
                write!(w, "\nendstream")
            },
            Object::Reference(r) => write!(w, "{}", r),
        }
    }

    fn write_dictionary<W: Write>(&self, w: &mut W, dict: &Dictionary) -> io::Result<()> {
        write!(w, "<<")?;
        let mut keys: Vec<_> = dict.keys().collect();
        keys.sort();
        for key in keys {
            if !self.compact {
                write!(w, "\n  ")?;
            }
            write_name(w, key)?;
            write!(w, " ")?;
            self.write_object(w, &dict[key])?;
        }
        if !self.compact && !dict.is_empty() {
            writeln!(w)?;
        }
        write!(w, ">>")
    }
}

/// Reals are written with at most five decimals and no trailing zeros.
fn write_real<W: Write>(w: &mut W, value: f64) -> io::Result<()> {
    if value.fract() == 0.0 {
        write!(w, "{}", value as i64)
    } else {
        let formatted = format!("{:.5}", value);
        write!(w, "{}", formatted.trim_end_matches('0').trim_end_matches('.'))
    }
}

/// Printable data as a literal string, anything else as a hex string.
fn write_string<W: Write>(w: &mut W, data: &[u8]) -> io::Result<()> {
    let printable = data.iter().all(|&b| (0x20..=0x7E).contains(&b));
    if printable {
        write!(w, "(")?;
        for &byte in data {
            match byte {
                b'(' | b')' | b'\\' => w.write_all(&[b'\\', byte])?,
                _ => w.write_all(&[byte])?,
            }
        }
        write!(w, ")")
    } else {
        write!(w, "<")?;
        for byte in data {
            write!(w, "{:02X}", byte)?;
        }
        write!(w, ">")
    }
}

/// Names escape delimiters, whitespace and non-ASCII bytes as `#xx`.
fn write_name<W: Write>(w: &mut W, name: &str) -> io::Result<()> {
    write!(w, "/")?;
    for byte in name.bytes() {
        let regular = (0x21..=0x7E).contains(&byte)
            && !matches!(byte, b'#' | b'/' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'%');
        if regular {
            w.write_all(&[byte])?;
        } else {
            write!(w, "#{:02X}", byte)?;
        }
    }
    Ok(())
}

/// Helpers for building PDF objects.
impl ObjectSerializer {
    /// Name object.
    pub fn name(s: &str) -> Object {
        Object::Name(s.to_string())
    }

    /// Text string: ASCII as-is, anything else as UTF-16BE with a byte order mark.
    pub fn text_string(s: &str) -> Object {
        if s.is_ascii() {
            Object::String(s.as_bytes().to_vec())
        } else {
            let mut bytes = vec![0xFE, 0xFF];
            for unit in s.encode_utf16() {
                bytes.extend_from_slice(&unit.to_be_bytes());
            }
            Object::String(bytes)
        }
    }

    /// Dictionary object from entries.
    pub fn dict(entries: Vec<(&str, Object)>) -> Object {
        Object::Dictionary(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    /// Reference object.
    pub fn reference(id: ObjectRef) -> Object {
        Object::Reference(id)
    }

    /// Rectangle `[x y x+width y+height]`.
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Object {
        Object::Array(vec![
            Object::Real(x),
            Object::Real(y),
            Object::Real(x + width),
            Object::Real(y + height),
        ])
    }
}
