//! Canonical Encoding
//!
//! A serde serializer that renders a value into the text used for cache
//! keys. The output is JSON-like, with these changes:
//! - `Some(x)` is tagged as `Some(x)`, so `None`, `Some(None)` and a bare
//!   value never share a key
//! - non-finite floats are rejected instead of being written as `null`
//! - map entries are sorted by their encoded key, and keys of any type are
//!   accepted
//! - finite floats keep their sign and fraction (`-0.0`, `1.0`)

use serde::ser::{self, Error as _, Serialize, Serializer};

type Error = serde_json::Error;

/// Encodes `value` into canonical text.
pub(crate) fn to_canonical<T: Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    value.serialize(Canonical)
}

fn quote(text: &str) -> Result<String, Error> {
    serde_json::to_string(text)
}

struct Canonical;

impl Serializer for Canonical {
    type Ok = String;
    type Error = Error;
    type SerializeSeq = Seq;
    type SerializeTuple = Seq;
    type SerializeTupleStruct = Seq;
    type SerializeTupleVariant = Seq;
    type SerializeMap = Map;
    type SerializeStruct = Struct;
    type SerializeStructVariant = Struct;

    fn serialize_bool(self, v: bool) -> Result<String, Error> {
        Ok(v.to_string())
    }

    fn serialize_i8(self, v: i8) -> Result<String, Error> {
        Ok(v.to_string())
    }

    fn serialize_i16(self, v: i16) -> Result<String, Error> {
        Ok(v.to_string())
    }

    fn serialize_i32(self, v: i32) -> Result<String, Error> {
        Ok(v.to_string())
    }

    fn serialize_i64(self, v: i64) -> Result<String, Error> {
        Ok(v.to_string())
    }

    fn serialize_i128(self, v: i128) -> Result<String, Error> {
        Ok(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<String, Error> {
        Ok(v.to_string())
    }

    fn serialize_u16(self, v: u16) -> Result<String, Error> {
        Ok(v.to_string())
    }

    fn serialize_u32(self, v: u32) -> Result<String, Error> {
        Ok(v.to_string())
    }

    fn serialize_u64(self, v: u64) -> Result<String, Error> {
        Ok(v.to_string())
    }

    fn serialize_u128(self, v: u128) -> Result<String, Error> {
        Ok(v.to_string())
    }

    fn serialize_f32(self, v: f32) -> Result<String, Error> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<String, Error> {
        if !v.is_finite() {
            return Err(Error::custom(format!("float {v} has no canonical form")));
        }
        Ok(format!("{v:?}"))
    }

    fn serialize_char(self, v: char) -> Result<String, Error> {
        quote(v.encode_utf8(&mut [0u8; 4]))
    }

    fn serialize_str(self, v: &str) -> Result<String, Error> {
        quote(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<String, Error> {
        let items: Vec<String> = v.iter().map(u8::to_string).collect();
        Ok(format!("[{}]", items.join(",")))
    }

    fn serialize_none(self) -> Result<String, Error> {
        Ok("null".to_string())
    }

    fn serialize_some<T>(self, value: &T) -> Result<String, Error>
    where
        T: ?Sized + Serialize,
    {
        Ok(format!("Some({})", value.serialize(Canonical)?))
    }

    fn serialize_unit(self) -> Result<String, Error> {
        Ok("null".to_string())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String, Error> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String, Error> {
        quote(variant)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<String, Error>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<String, Error>
    where
        T: ?Sized + Serialize,
    {
        Ok(format!("{{{}:{}}}", quote(variant)?, value.serialize(Canonical)?))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Seq, Error> {
        Ok(Seq::open("[".to_string(), "]"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Seq, Error> {
        Ok(Seq::open("[".to_string(), "]"))
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Seq, Error> {
        Ok(Seq::open("[".to_string(), "]"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Seq, Error> {
        Ok(Seq::open(format!("{{{}:[", quote(variant)?), "]}"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Map, Error> {
        Ok(Map {
            entries: Vec::new(),
            key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Struct, Error> {
        Ok(Struct::open("{".to_string(), "}"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Struct, Error> {
        Ok(Struct::open(format!("{{{}:{{", quote(variant)?), "}}"))
    }
}

// == Sequences ==
struct Seq {
    out: String,
    close: &'static str,
    first: bool,
}

impl Seq {
    fn open(out: String, close: &'static str) -> Self {
        Self {
            out,
            close,
            first: true,
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Error> {
        if !self.first {
            self.out.push(',');
        }
        self.first = false;
        self.out.push_str(&value.serialize(Canonical)?);
        Ok(())
    }

    fn finish(mut self) -> Result<String, Error> {
        self.out.push_str(self.close);
        Ok(self.out)
    }
}

impl ser::SerializeSeq for Seq {
    type Ok = String;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<String, Error> {
        self.finish()
    }
}

impl ser::SerializeTuple for Seq {
    type Ok = String;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<String, Error> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for Seq {
    type Ok = String;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<String, Error> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for Seq {
    type Ok = String;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<String, Error> {
        self.finish()
    }
}

// == Maps ==
/// Buffers entries so they can be emitted in key order.
struct Map {
    entries: Vec<(String, String)>,
    key: Option<String>,
}

impl ser::SerializeMap for Map {
    type Ok = String;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        self.key = Some(key.serialize(Canonical)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .key
            .take()
            .ok_or_else(|| Error::custom("map value written before its key"))?;
        self.entries.push((key, value.serialize(Canonical)?));
        Ok(())
    }

    fn end(mut self) -> Result<String, Error> {
        self.entries.sort();
        let body: Vec<String> = self
            .entries
            .into_iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        Ok(format!("{{{}}}", body.join(",")))
    }
}

// == Structs ==
/// Fields keep declaration order, which is fixed by the type.
struct Struct {
    out: String,
    close: &'static str,
    first: bool,
}

impl Struct {
    fn open(out: String, close: &'static str) -> Self {
        Self {
            out,
            close,
            first: true,
        }
    }

    fn field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<(), Error> {
        if !self.first {
            self.out.push(',');
        }
        self.first = false;
        self.out.push_str(&quote(key)?);
        self.out.push(':');
        self.out.push_str(&value.serialize(Canonical)?);
        Ok(())
    }

    fn finish(mut self) -> Result<String, Error> {
        self.out.push_str(self.close);
        Ok(self.out)
    }
}

impl ser::SerializeStruct for Struct {
    type Ok = String;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<String, Error> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for Struct {
    type Ok = String;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<String, Error> {
        self.finish()
    }
}
