use crate::convert::{ConversionPolicy, ConverterRegistration, SimpleTypeHolder, TypeDescriptor};
use crate::errors::{DocmapError, DocmapResult, ErrorKind};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

type ConvertFn = dyn Fn(&dyn Any) -> DocmapResult<Box<dyn Any + Send>> + Send + Sync;
type ConvertiblePair = (TypeDescriptor, TypeDescriptor);

/// A type-erased conversion from `S` to `T`.
///
/// ```rust,ignore
/// let to_string = Converter::new(|person: &Person| Ok(person.name.clone()));
/// let from_string = Converter::new(|name: &String| Ok(Person::named(name)))
///     .with_policy(ConversionPolicy::ReadingOnly);
/// ```
#[derive(Clone)]
pub struct Converter {
    source: TypeDescriptor,
    target: TypeDescriptor,
    policy: ConversionPolicy,
    convert: Arc<ConvertFn>,
}

impl Converter {
    pub fn new<S, T, F>(convert: F) -> Self
    where
        S: 'static,
        T: Send + 'static,
        F: Fn(&S) -> DocmapResult<T> + Send + Sync + 'static,
    {
        let source = TypeDescriptor::of::<S>();
        let erased = move |value: &dyn Any| -> DocmapResult<Box<dyn Any + Send>> {
            let value = value.downcast_ref::<S>().ok_or_else(|| {
                log::error!("Converter input is not a {}", source);
                DocmapError::new(
                    &format!("Converter expects a value of type {}", source),
                    ErrorKind::ObjectMappingError,
                )
            })?;
            Ok(Box::new(convert(value)?))
        };

        Converter {
            source,
            target: TypeDescriptor::of::<T>(),
            policy: ConversionPolicy::Inferred,
            convert: Arc::new(erased),
        }
    }

    /// Declares the converter's direction explicitly.
    pub fn with_policy(mut self, policy: ConversionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn source(&self) -> TypeDescriptor {
        self.source
    }

    pub fn target(&self) -> TypeDescriptor {
        self.target
    }

    pub fn policy(&self) -> ConversionPolicy {
        self.policy
    }

    fn convert_any(&self, value: &dyn Any) -> DocmapResult<Box<dyn Any + Send>> {
        (self.convert)(value)
    }
}

/// Registry of custom converters, indexed by the direction each one applies
/// in.
///
/// Every registered converter gets a [ConverterRegistration]. Reading
/// registrations are used when values come out of a document, writing ones
/// when values go in. The source type of a writing converter becomes a
/// custom simple type: it no longer needs entity mapping because the
/// converter takes care of it.
///
/// Clones share the same registry.
#[derive(Clone)]
pub struct CustomConversions {
    inner: Arc<CustomConversionsInner>,
}

struct CustomConversionsInner {
    simple_types: SimpleTypeHolder,
    state: RwLock<ConversionState>,
}

#[derive(Default)]
struct ConversionState {
    converters: HashMap<ConvertiblePair, Converter>,
    registrations: Vec<ConverterRegistration>,
    reading_pairs: Vec<ConvertiblePair>,
    writing_pairs: Vec<ConvertiblePair>,
}

impl Default for CustomConversions {
    fn default() -> Self {
        Self::new(SimpleTypeHolder::new())
    }
}

impl CustomConversions {
    pub fn new(simple_types: SimpleTypeHolder) -> Self {
        CustomConversions {
            inner: Arc::new(CustomConversionsInner {
                simple_types,
                state: RwLock::new(ConversionState::default()),
            }),
        }
    }

    /// Registers a converter and returns the registration it resolved to.
    ///
    /// A converter for a pair that is already registered replaces the
    /// previous one.
    pub fn register(&self, converter: Converter) -> ConverterRegistration {
        let registration = ConverterRegistration::new(
            converter.source(),
            converter.target(),
            converter.policy(),
            &self.inner.simple_types,
        );
        let pair = (converter.source(), converter.target());

        if registration.is_reading() && !registration.is_simple_source_type() {
            log::warn!(
                "Registering converter from {} to {} as reading converter although it doesn't convert from a storable type",
                pair.0,
                pair.1
            );
        }
        if registration.is_writing() && !registration.is_simple_target_type() {
            log::warn!(
                "Registering converter from {} to {} as writing converter although it doesn't convert to a storable type",
                pair.0,
                pair.1
            );
        }
        if !registration.is_reading() && !registration.is_writing() {
            log::warn!(
                "Converter from {} to {} is neither reading nor writing and will never be used",
                pair.0,
                pair.1
            );
        }

        let mut state = self.inner.state.write();
        state.reading_pairs.retain(|p| *p != pair);
        state.writing_pairs.retain(|p| *p != pair);
        state
            .registrations
            .retain(|r| (r.source(), r.target()) != pair);

        if registration.is_reading() {
            state.reading_pairs.push(pair);
        }
        if registration.is_writing() {
            state.writing_pairs.push(pair);
        }
        state.registrations.push(registration);
        state.converters.insert(pair, converter);

        log::debug!("Registered converter {}", registration);
        registration
    }

    pub fn registrations(&self) -> Vec<ConverterRegistration> {
        self.inner.state.read().registrations.clone()
    }

    pub fn has_custom_write_target(&self, source: &TypeDescriptor) -> bool {
        self.custom_write_target(source).is_some()
    }

    /// Target type of the first writing converter registered for `source`.
    pub fn custom_write_target(&self, source: &TypeDescriptor) -> Option<TypeDescriptor> {
        self.inner
            .state
            .read()
            .writing_pairs
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, target)| *target)
    }

    pub fn has_custom_write_target_for(
        &self,
        source: &TypeDescriptor,
        target: &TypeDescriptor,
    ) -> bool {
        self.inner
            .state
            .read()
            .writing_pairs
            .iter()
            .any(|(s, t)| s == source && t == target)
    }

    pub fn has_custom_read_target(&self, source: &TypeDescriptor, target: &TypeDescriptor) -> bool {
        self.inner
            .state
            .read()
            .reading_pairs
            .iter()
            .any(|(s, t)| s == source && t == target)
    }

    /// Whether values of `descriptor` can be stored without entity mapping,
    /// either natively or through a currently registered writing converter.
    pub fn is_simple_type(&self, descriptor: &TypeDescriptor) -> bool {
        self.inner.simple_types.is_simple(descriptor)
            || self
                .inner
                .state
                .read()
                .writing_pairs
                .iter()
                .any(|(source, _)| source == descriptor)
    }

    /// Converts with the converter registered for `S -> T`, regardless of
    /// its direction.
    ///
    /// # Errors
    /// Returns `NotFound` if no converter is registered for the pair, or the
    /// converter's own error.
    pub fn convert<S: 'static, T: 'static>(&self, source: &S) -> DocmapResult<T> {
        let pair = (TypeDescriptor::of::<S>(), TypeDescriptor::of::<T>());
        let converter = self.inner.state.read().converters.get(&pair).cloned();
        let converter = converter.ok_or_else(|| {
            log::error!("No converter registered from {} to {}", pair.0, pair.1);
            DocmapError::new(
                &format!("No converter registered from {} to {}", pair.0, pair.1),
                ErrorKind::NotFound,
            )
        })?;

        let converted = converter.convert_any(source)?;
        converted.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
            log::error!("Converter from {} produced a value that is not a {}", pair.0, pair.1);
            DocmapError::new(
                &format!("Converter did not produce a value of type {}", pair.1),
                ErrorKind::ObjectMappingError,
            )
        })
    }

    /// Converts a value on its way into a document.
    ///
    /// # Errors
    /// Returns `NotFound` unless a writing converter exists for `S -> T`.
    pub fn write<S: 'static, T: 'static>(&self, source: &S) -> DocmapResult<T> {
        let (s, t) = (TypeDescriptor::of::<S>(), TypeDescriptor::of::<T>());
        if !self.has_custom_write_target_for(&s, &t) {
            log::error!("No writing converter registered from {} to {}", s, t);
            return Err(DocmapError::new(
                &format!("No writing converter registered from {} to {}", s, t),
                ErrorKind::NotFound,
            ));
        }
        self.convert(source)
    }

    /// Converts a value read out of a document.
    ///
    /// # Errors
    /// Returns `NotFound` unless a reading converter exists for `S -> T`.
    pub fn read<S: 'static, T: 'static>(&self, source: &S) -> DocmapResult<T> {
        let (s, t) = (TypeDescriptor::of::<S>(), TypeDescriptor::of::<T>());
        if !self.has_custom_read_target(&s, &t) {
            log::error!("No reading converter registered from {} to {}", s, t);
            return Err(DocmapError::new(
                &format!("No reading converter registered from {} to {}", s, t),
                ErrorKind::NotFound,
            ));
        }
        self.convert(source)
    }
}
