use crate::document::{Document, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::any::TypeId;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Runtime identity of a Rust type plus its name for diagnostics.
///
/// Equality and hashing only consider the `TypeId`.
#[derive(Debug, Clone, Copy)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
}

impl TypeDescriptor {
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeDescriptor {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The set of types a document can store directly, without mapping them
/// through an entity.
#[derive(Debug, Clone)]
pub struct SimpleTypeHolder {
    types: HashSet<TypeDescriptor>,
}

impl Default for SimpleTypeHolder {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleTypeHolder {
    /// A holder pre-populated with the built-in storable types.
    pub fn new() -> Self {
        let types = [
            TypeDescriptor::of::<String>(),
            TypeDescriptor::of::<&'static str>(),
            TypeDescriptor::of::<bool>(),
            TypeDescriptor::of::<char>(),
            TypeDescriptor::of::<i8>(),
            TypeDescriptor::of::<i16>(),
            TypeDescriptor::of::<i32>(),
            TypeDescriptor::of::<i64>(),
            TypeDescriptor::of::<i128>(),
            TypeDescriptor::of::<u8>(),
            TypeDescriptor::of::<u16>(),
            TypeDescriptor::of::<u32>(),
            TypeDescriptor::of::<u64>(),
            TypeDescriptor::of::<u128>(),
            TypeDescriptor::of::<isize>(),
            TypeDescriptor::of::<usize>(),
            TypeDescriptor::of::<f32>(),
            TypeDescriptor::of::<f64>(),
            TypeDescriptor::of::<Vec<u8>>(),
            TypeDescriptor::of::<Document>(),
            TypeDescriptor::of::<Value>(),
            TypeDescriptor::of::<DateTime<Utc>>(),
            TypeDescriptor::of::<NaiveDate>(),
            TypeDescriptor::of::<NaiveDateTime>(),
            TypeDescriptor::of::<TypeDescriptor>(),
        ];

        SimpleTypeHolder {
            types: types.into_iter().collect(),
        }
    }

    /// Marks `T` as directly storable.
    pub fn register<T: ?Sized + 'static>(&mut self) {
        self.register_descriptor(TypeDescriptor::of::<T>());
    }

    pub fn register_descriptor(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor);
    }

    pub fn is_simple(&self, descriptor: &TypeDescriptor) -> bool {
        self.types.contains(descriptor)
    }

    pub fn is_simple_type<T: ?Sized + 'static>(&self) -> bool {
        self.is_simple(&TypeDescriptor::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
