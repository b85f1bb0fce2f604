//! Structural view of any serializable value, used for deep equality.
//!
//! A value is turned into a [`Shape`] tree through serde, then two trees are
//! compared node by node. Nodes of different kinds never compare equal, so an
//! `i32` is not an `i64` and a `Vec` is not a tuple, whatever their contents.

mod serializer;

use log::trace;
use serde::Serialize;

pub use serializer::ShapeSerializer;

/// Error raised while building a [`Shape`] out of a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    /// The value's own `Serialize` implementation reported an error
    #[error("value could not be inspected: {0}")]
    Custom(String),

    /// A map entry value was given without its key
    #[error("map value serialized without a key")]
    MissingKey,
}

impl serde::ser::Error for ShapeError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        ShapeError::Custom(msg.to_string())
    }
}

/// Payload of an enum variant
#[derive(Debug, Clone)]
pub enum Payload {
    Unit,
    Newtype(Box<Shape>),
    Tuple(Vec<Shape>),
    Struct(Vec<(&'static str, Shape)>),
}

/// Type-aware tree mirroring the serde data model.
///
/// References and smart pointers serialize as their pointee, so they do not
/// show up in the tree.
#[derive(Debug, Clone)]
pub enum Shape {
    Unit,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    F32(f32),
    F64(f64),
    Char(char),
    Str(String),
    Bytes(Vec<u8>),
    None,
    Some(Box<Shape>),
    Seq(Vec<Shape>),
    /// Sequence produced by a set, compared without regard to order
    Set(Vec<Shape>),
    Tuple(Vec<Shape>),
    Map(Vec<(Shape, Shape)>),
    UnitStruct(&'static str),
    NewtypeStruct(&'static str, Box<Shape>),
    TupleStruct(&'static str, Vec<Shape>),
    Struct(&'static str, Vec<(&'static str, Shape)>),
    Variant {
        ty: &'static str,
        variant: &'static str,
        payload: Payload,
    },
}

impl Shape {
    /// Build the shape of `value`.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Shape, ShapeError> {
        serializer::shape_of(value)
    }

    /// Short name of the node kind, for log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Unit => "unit",
            Shape::Bool(_) => "bool",
            Shape::I8(_) => "i8",
            Shape::I16(_) => "i16",
            Shape::I32(_) => "i32",
            Shape::I64(_) => "i64",
            Shape::I128(_) => "i128",
            Shape::U8(_) => "u8",
            Shape::U16(_) => "u16",
            Shape::U32(_) => "u32",
            Shape::U64(_) => "u64",
            Shape::U128(_) => "u128",
            Shape::F32(_) => "f32",
            Shape::F64(_) => "f64",
            Shape::Char(_) => "char",
            Shape::Str(_) => "string",
            Shape::Bytes(_) => "bytes",
            Shape::None | Shape::Some(_) => "option",
            Shape::Seq(_) => "sequence",
            Shape::Set(_) => "set",
            Shape::Tuple(_) => "tuple",
            Shape::Map(_) => "map",
            Shape::UnitStruct(name)
            | Shape::NewtypeStruct(name, _)
            | Shape::TupleStruct(name, _)
            | Shape::Struct(name, _) => *name,
            Shape::Variant { ty, .. } => *ty,
        }
    }
}

/// Compare two values by structure and content.
///
/// Fails only when one of the values can't be turned into a [`Shape`].
pub fn deep_equal<A, B>(a: &A, b: &B) -> Result<bool, ShapeError>
where
    A: Serialize + ?Sized,
    B: Serialize + ?Sized,
{
    let a = Shape::of(a)?;
    let b = Shape::of(b)?;
    let equal = a == b;
    trace!("deep equality of {} and {}: {equal}", a.kind(), b.kind());
    Ok(equal)
}

fn float_eq<F: PartialEq + Copy>(a: F, b: F) -> bool {
    // NaN is only unequal to itself
    #[allow(clippy::eq_op)]
    let both_nan = a != a && b != b;
    a == b || both_nan
}

fn all_eq(a: &[Shape], b: &[Shape]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
}

fn fields_eq(a: &[(&'static str, Shape)], b: &[(&'static str, Shape)]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|((name_a, x), (name_b, y))| name_a == name_b && x == y)
}

/// Maps and sets are unordered: every item must be matched by exactly one
/// item on the other side.
///
/// Quadratic in the number of items, which is fine for test fixtures but not
/// for large collections.
fn unordered_eq<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    for item in a {
        let found = b
            .iter()
            .enumerate()
            .find(|(i, other)| !used[*i] && *other == item)
            .map(|(i, _)| i);
        match found {
            Some(i) => used[i] = true,
            None => return false,
        }
    }
    true
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Payload::Unit, Payload::Unit) => true,
            (Payload::Newtype(a), Payload::Newtype(b)) => a == b,
            (Payload::Tuple(a), Payload::Tuple(b)) => all_eq(a, b),
            (Payload::Struct(a), Payload::Struct(b)) => fields_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        use Shape::*;
        match (self, other) {
            (Unit, Unit) | (None, None) => true,
            (Bool(a), Bool(b)) => a == b,
            (I8(a), I8(b)) => a == b,
            (I16(a), I16(b)) => a == b,
            (I32(a), I32(b)) => a == b,
            (I64(a), I64(b)) => a == b,
            (I128(a), I128(b)) => a == b,
            (U8(a), U8(b)) => a == b,
            (U16(a), U16(b)) => a == b,
            (U32(a), U32(b)) => a == b,
            (U64(a), U64(b)) => a == b,
            (U128(a), U128(b)) => a == b,
            (F32(a), F32(b)) => float_eq(*a, *b),
            (F64(a), F64(b)) => float_eq(*a, *b),
            (Char(a), Char(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Some(a), Some(b)) => a == b,
            (Seq(a), Seq(b)) | (Tuple(a), Tuple(b)) => all_eq(a, b),
            (Map(a), Map(b)) => unordered_eq(a, b),
            (Set(a), Set(b)) => unordered_eq(a, b),
            (UnitStruct(a), UnitStruct(b)) => a == b,
            (NewtypeStruct(name_a, a), NewtypeStruct(name_b, b)) => name_a == name_b && a == b,
            (TupleStruct(name_a, a), TupleStruct(name_b, b)) => name_a == name_b && all_eq(a, b),
            (Struct(name_a, a), Struct(name_b, b)) => name_a == name_b && fields_eq(a, b),
            (
                Variant {
                    ty: ty_a,
                    variant: variant_a,
                    payload: a,
                },
                Variant {
                    ty: ty_b,
                    variant: variant_b,
                    payload: b,
                },
            ) => ty_a == ty_b && variant_a == variant_b && a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{deep_equal, Shape};
    use crate::utils::test_env;
    use serde::Serialize;
    use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
    use std::rc::Rc;

    #[derive(Serialize, Debug, Clone)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Serialize)]
    struct OtherPoint {
        x: i32,
        y: i32,
    }

    #[derive(Serialize, Debug, Clone)]
    struct Tree {
        label: String,
        weight: f64,
        children: Vec<Tree>,
        tags: BTreeMap<String, Option<u8>>,
    }

    #[derive(Serialize)]
    enum Event {
        Started,
        Moved(Point),
        Scaled(f32, f32),
        Renamed { from: String, to: String },
    }

    fn leaf(label: &str) -> Tree {
        Tree {
            label: label.to_string(),
            weight: 1.5,
            children: vec![],
            tags: BTreeMap::new(),
        }
    }

    fn nested() -> Tree {
        let mut tags = BTreeMap::new();
        tags.insert("colour".to_string(), Some(3));
        tags.insert("shape".to_string(), None);
        Tree {
            label: "root".to_string(),
            weight: f64::NAN,
            children: vec![leaf("a"), leaf("b")],
            tags,
        }
    }

    #[test]
    fn test_sequences() {
        test_env::setup();
        assert_eq!(deep_equal(&[1, 2, 3][..], &vec![1, 2, 3]), Ok(true));
        assert_eq!(deep_equal(&vec![1, 2, 3], &vec![1, 2, 4]), Ok(false));
        assert_eq!(deep_equal(&vec![1, 2, 3], &vec![1, 2]), Ok(false));
    }

    #[test]
    fn test_kinds_differ() {
        test_env::setup();
        assert_eq!(deep_equal(&1i32, &1i64), Ok(false));
        assert_eq!(deep_equal(&1u8, &1i8), Ok(false));
        assert_eq!(deep_equal(&vec![1, 2], &(1, 2)), Ok(false));
        assert_eq!(deep_equal(&"a", &'a'), Ok(false));
        assert_eq!(deep_equal(&None::<i32>, &()), Ok(false));
    }

    #[test]
    fn test_records_compare_type_names() {
        test_env::setup();
        let p = Point { x: 1, y: 2 };
        assert_eq!(deep_equal(&p, &Point { x: 1, y: 2 }), Ok(true));
        assert_eq!(deep_equal(&p, &Point { x: 1, y: 3 }), Ok(false));
        assert_eq!(deep_equal(&p, &OtherPoint { x: 1, y: 2 }), Ok(false));
    }

    #[test]
    fn test_pointers_are_transparent() {
        test_env::setup();
        let p = Point { x: 4, y: 5 };
        assert_eq!(deep_equal(&Box::new(p.clone()), &Rc::new(p.clone())), Ok(true));
        assert_eq!(deep_equal(&&p, &p), Ok(true));
    }

    #[test]
    fn test_enum_variants() {
        test_env::setup();
        let moved = Event::Moved(Point { x: 0, y: 1 });
        assert_eq!(deep_equal(&moved, &Event::Moved(Point { x: 0, y: 1 })), Ok(true));
        assert_eq!(deep_equal(&moved, &Event::Moved(Point { x: 1, y: 1 })), Ok(false));
        assert_eq!(deep_equal(&Event::Started, &Event::Started), Ok(true));
        assert_eq!(deep_equal(&Event::Started, &moved), Ok(false));
        assert_eq!(
            deep_equal(&Event::Scaled(1.0, 2.0), &Event::Scaled(1.0, 2.0)),
            Ok(true)
        );
        let renamed = |to: &str| Event::Renamed {
            from: "a".to_string(),
            to: to.to_string(),
        };
        assert_eq!(deep_equal(&renamed("b"), &renamed("b")), Ok(true));
        assert_eq!(deep_equal(&renamed("b"), &renamed("c")), Ok(false));
    }

    #[test]
    fn test_maps_ignore_order() {
        test_env::setup();
        let mut a = HashMap::new();
        let mut b = HashMap::new();
        for i in 0..32 {
            a.insert(i, format!("v{i}"));
        }
        for i in (0..32).rev() {
            b.insert(i, format!("v{i}"));
        }
        assert_eq!(deep_equal(&a, &b), Ok(true));
        b.insert(7, "other".to_string());
        assert_eq!(deep_equal(&a, &b), Ok(false));
        b.remove(&7);
        assert_eq!(deep_equal(&a, &b), Ok(false));
    }

    #[test]
    fn test_nested_reflexive_and_symmetric() {
        test_env::setup();
        let tree = nested();
        assert_eq!(deep_equal(&tree, &tree), Ok(true));
        assert_eq!(deep_equal(&tree, &tree.clone()), Ok(true));

        let mut changed = nested();
        changed.children[1].children.push(leaf("c"));
        assert_eq!(deep_equal(&tree, &changed), Ok(false));
        assert_eq!(deep_equal(&changed, &tree), Ok(false));
    }

    #[test]
    fn test_nan_is_reflexive() {
        test_env::setup();
        assert_eq!(deep_equal(&f64::NAN, &f64::NAN), Ok(true));
        assert_eq!(deep_equal(&f32::NAN, &0.0f32), Ok(false));
        assert_eq!(deep_equal(&0.0f64, &-0.0f64), Ok(true));
    }

    #[test]
    fn test_sets_ignore_order() {
        test_env::setup();
        let a: HashSet<u32> = (0..64).collect();
        let b: HashSet<u32> = (0..64).rev().collect();
        assert_eq!(deep_equal(&a, &b), Ok(true));
        assert_eq!(deep_equal(&b, &a), Ok(true));
        assert_eq!(deep_equal(&Box::new(a.clone()), &b), Ok(true));

        let c: HashSet<u32> = (1..65).collect();
        assert_eq!(deep_equal(&a, &c), Ok(false));

        let ordered: BTreeSet<u32> = (0..64).collect();
        assert_eq!(deep_equal(&ordered, &ordered.clone()), Ok(true));
        // a set is not a sequence, even with the same items
        assert_eq!(deep_equal(&ordered, &(0..64).collect::<Vec<u32>>()), Ok(false));
    }

    #[test]
    fn test_nested_sets_ignore_order() {
        test_env::setup();
        #[derive(Serialize)]
        struct Crafting {
            name: &'static str,
            unlocked: HashSet<String>,
            by_tier: Vec<Option<HashSet<u8>>>,
        }
        let build = |reversed: bool| {
            let mut names: Vec<String> = (0..40).map(|i| format!("recipe{i}")).collect();
            let mut tiers: Vec<u8> = (0..40).collect();
            if reversed {
                names.reverse();
                tiers.reverse();
            }
            Crafting {
                name: "assembler",
                unlocked: names.into_iter().collect(),
                by_tier: vec![None, Some(tiers.into_iter().collect())],
            }
        };
        assert_eq!(deep_equal(&build(false), &build(true)), Ok(true));

        let mut other = build(true);
        other.unlocked.remove("recipe3");
        other.unlocked.insert("recipe99".to_string());
        assert_eq!(deep_equal(&build(false), &other), Ok(false));
    }

    #[test]
    fn test_shape_kind() {
        let shape = Shape::of(&Point { x: 1, y: 1 }).expect("point has a shape");
        assert_eq!(shape.kind(), "Point");
        assert_eq!(Shape::of(&vec![1u8]).map(|s| s.kind()), Ok("sequence"));
    }
}
