use super::{Payload, Shape, ShapeError};
use serde::ser::{self, Serialize};

/// Serializer producing a [`Shape`] instead of bytes.
///
/// Serde gives no hint that a sequence comes from a set, so the static type
/// of the value being serialized decides whether its sequence is unordered.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeSerializer {
    unordered: bool,
}

impl ShapeSerializer {
    /// Serializer for a value of type `T`.
    pub fn for_type<T: ?Sized>() -> Self {
        Self {
            unordered: is_set_type(std::any::type_name::<T>()),
        }
    }
}

const POINTERS: &[&str] = &["alloc::boxed::Box<", "alloc::rc::Rc<", "alloc::sync::Arc<"];
const SET_TYPES: &[&str] = &["::HashSet", "::BTreeSet", "::IndexSet"];

/// Whether `name` is a set, possibly behind references and smart pointers.
fn is_set_type(name: &str) -> bool {
    let mut name = name;
    loop {
        if let Some(rest) = name.strip_prefix('&') {
            name = rest.strip_prefix("mut ").unwrap_or(rest);
            continue;
        }
        match POINTERS.iter().find_map(|pointer| name.strip_prefix(pointer)) {
            Some(rest) => name = rest,
            None => break,
        }
    }
    let base = name.split('<').next().unwrap_or(name);
    SET_TYPES.iter().any(|set| base.ends_with(set))
}

type ShapeResult = Result<Shape, ShapeError>;

pub(super) fn shape_of<T: Serialize + ?Sized>(value: &T) -> ShapeResult {
    value.serialize(ShapeSerializer::for_type::<T>())
}

impl ser::Serializer for ShapeSerializer {
    type Ok = Shape;
    type Error = ShapeError;
    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = SeqBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = StructBuilder;
    type SerializeStructVariant = StructBuilder;

    fn serialize_bool(self, v: bool) -> ShapeResult {
        Ok(Shape::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> ShapeResult {
        Ok(Shape::I8(v))
    }

    fn serialize_i16(self, v: i16) -> ShapeResult {
        Ok(Shape::I16(v))
    }

    fn serialize_i32(self, v: i32) -> ShapeResult {
        Ok(Shape::I32(v))
    }

    fn serialize_i64(self, v: i64) -> ShapeResult {
        Ok(Shape::I64(v))
    }

    fn serialize_i128(self, v: i128) -> ShapeResult {
        Ok(Shape::I128(v))
    }

    fn serialize_u8(self, v: u8) -> ShapeResult {
        Ok(Shape::U8(v))
    }

    fn serialize_u16(self, v: u16) -> ShapeResult {
        Ok(Shape::U16(v))
    }

    fn serialize_u32(self, v: u32) -> ShapeResult {
        Ok(Shape::U32(v))
    }

    fn serialize_u64(self, v: u64) -> ShapeResult {
        Ok(Shape::U64(v))
    }

    fn serialize_u128(self, v: u128) -> ShapeResult {
        Ok(Shape::U128(v))
    }

    fn serialize_f32(self, v: f32) -> ShapeResult {
        Ok(Shape::F32(v))
    }

    fn serialize_f64(self, v: f64) -> ShapeResult {
        Ok(Shape::F64(v))
    }

    fn serialize_char(self, v: char) -> ShapeResult {
        Ok(Shape::Char(v))
    }

    fn serialize_str(self, v: &str) -> ShapeResult {
        Ok(Shape::Str(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> ShapeResult {
        Ok(Shape::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> ShapeResult {
        Ok(Shape::None)
    }

    fn serialize_some<T>(self, value: &T) -> ShapeResult
    where
        T: ?Sized + Serialize,
    {
        Ok(Shape::Some(Box::new(shape_of(value)?)))
    }

    fn serialize_unit(self) -> ShapeResult {
        Ok(Shape::Unit)
    }

    fn serialize_unit_struct(self, name: &'static str) -> ShapeResult {
        Ok(Shape::UnitStruct(name))
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> ShapeResult {
        Ok(Shape::Variant {
            ty: name,
            variant,
            payload: Payload::Unit,
        })
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> ShapeResult
    where
        T: ?Sized + Serialize,
    {
        Ok(Shape::NewtypeStruct(name, Box::new(shape_of(value)?)))
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> ShapeResult
    where
        T: ?Sized + Serialize,
    {
        Ok(Shape::Variant {
            ty: name,
            variant,
            payload: Payload::Newtype(Box::new(shape_of(value)?)),
        })
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder, ShapeError> {
        let kind = if self.unordered {
            SeqKind::Set
        } else {
            SeqKind::Seq
        };
        Ok(SeqBuilder::new(kind, len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder, ShapeError> {
        Ok(SeqBuilder::new(SeqKind::Tuple, len))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, ShapeError> {
        Ok(SeqBuilder::new(SeqKind::TupleStruct(name), len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, ShapeError> {
        Ok(SeqBuilder::new(SeqKind::TupleVariant(name, variant), len))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder, ShapeError> {
        Ok(MapBuilder {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<StructBuilder, ShapeError> {
        Ok(StructBuilder {
            ty: name,
            variant: None,
            fields: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<StructBuilder, ShapeError> {
        Ok(StructBuilder {
            ty: name,
            variant: Some(variant),
            fields: Vec::with_capacity(len),
        })
    }
}

enum SeqKind {
    Seq,
    Set,
    Tuple,
    TupleStruct(&'static str),
    TupleVariant(&'static str, &'static str),
}

/// Collects the elements of every sequence-like value.
pub struct SeqBuilder {
    kind: SeqKind,
    items: Vec<Shape>,
}

impl SeqBuilder {
    fn new(kind: SeqKind, len: usize) -> Self {
        Self {
            kind,
            items: Vec::with_capacity(len),
        }
    }

    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ShapeError> {
        self.items.push(shape_of(value)?);
        Ok(())
    }

    fn finish(self) -> ShapeResult {
        Ok(match self.kind {
            SeqKind::Seq => Shape::Seq(self.items),
            SeqKind::Set => Shape::Set(self.items),
            SeqKind::Tuple => Shape::Tuple(self.items),
            SeqKind::TupleStruct(name) => Shape::TupleStruct(name, self.items),
            SeqKind::TupleVariant(ty, variant) => Shape::Variant {
                ty,
                variant,
                payload: Payload::Tuple(self.items),
            },
        })
    }
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Shape;
    type Error = ShapeError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), ShapeError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> ShapeResult {
        self.finish()
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Shape;
    type Error = ShapeError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), ShapeError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> ShapeResult {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = Shape;
    type Error = ShapeError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), ShapeError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> ShapeResult {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for SeqBuilder {
    type Ok = Shape;
    type Error = ShapeError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), ShapeError>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> ShapeResult {
        self.finish()
    }
}

/// Collects map entries, keeping the key until its value arrives.
pub struct MapBuilder {
    entries: Vec<(Shape, Shape)>,
    key: Option<Shape>,
}

impl ser::SerializeMap for MapBuilder {
    type Ok = Shape;
    type Error = ShapeError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), ShapeError>
    where
        T: ?Sized + Serialize,
    {
        self.key = Some(shape_of(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), ShapeError>
    where
        T: ?Sized + Serialize,
    {
        let key = self.key.take().ok_or(ShapeError::MissingKey)?;
        self.entries.push((key, shape_of(value)?));
        Ok(())
    }

    fn end(self) -> ShapeResult {
        Ok(Shape::Map(self.entries))
    }
}

/// Collects named fields of structs and struct variants.
pub struct StructBuilder {
    ty: &'static str,
    variant: Option<&'static str>,
    fields: Vec<(&'static str, Shape)>,
}

impl StructBuilder {
    fn push<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), ShapeError> {
        self.fields.push((key, shape_of(value)?));
        Ok(())
    }

    fn finish(self) -> ShapeResult {
        Ok(match self.variant {
            Some(variant) => Shape::Variant {
                ty: self.ty,
                variant,
                payload: Payload::Struct(self.fields),
            },
            None => Shape::Struct(self.ty, self.fields),
        })
    }
}

impl ser::SerializeStruct for StructBuilder {
    type Ok = Shape;
    type Error = ShapeError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), ShapeError>
    where
        T: ?Sized + Serialize,
    {
        self.push(key, value)
    }

    fn end(self) -> ShapeResult {
        self.finish()
    }
}

impl ser::SerializeStructVariant for StructBuilder {
    type Ok = Shape;
    type Error = ShapeError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), ShapeError>
    where
        T: ?Sized + Serialize,
    {
        self.push(key, value)
    }

    fn end(self) -> ShapeResult {
        self.finish()
    }
}
