use crate::convert::{SimpleTypeHolder, TypeDescriptor};
use std::fmt::{Display, Formatter};

/// Explicit direction a converter was declared for.
///
/// `Inferred` means no explicit declaration: the direction is derived from
/// which side of the conversion is a simple type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConversionPolicy {
    #[default]
    Inferred,
    ReadingOnly,
    WritingOnly,
    ReadingAndWriting,
}

impl ConversionPolicy {
    /// Builds a policy from explicit reading/writing declarations.
    pub fn from_flags(reading: bool, writing: bool) -> Self {
        match (reading, writing) {
            (false, false) => ConversionPolicy::Inferred,
            (true, false) => ConversionPolicy::ReadingOnly,
            (false, true) => ConversionPolicy::WritingOnly,
            (true, true) => ConversionPolicy::ReadingAndWriting,
        }
    }

    pub fn forces_reading(&self) -> bool {
        matches!(
            self,
            ConversionPolicy::ReadingOnly | ConversionPolicy::ReadingAndWriting
        )
    }

    pub fn forces_writing(&self) -> bool {
        matches!(
            self,
            ConversionPolicy::WritingOnly | ConversionPolicy::ReadingAndWriting
        )
    }
}

/// A converter's source/target pair together with the resolved direction.
///
/// A converter is *writing* when it produces values that go into a document
/// and *reading* when it produces values read back out of one. Explicit
/// declarations always win. Without them, a converter whose target is a
/// simple type writes, and one whose source is a simple type reads. When both
/// sides are simple the converter does both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConverterRegistration {
    source: TypeDescriptor,
    target: TypeDescriptor,
    policy: ConversionPolicy,
    simple_source: bool,
    simple_target: bool,
}

impl ConverterRegistration {
    pub fn new(
        source: TypeDescriptor,
        target: TypeDescriptor,
        policy: ConversionPolicy,
        simple_types: &SimpleTypeHolder,
    ) -> Self {
        ConverterRegistration {
            source,
            target,
            policy,
            simple_source: simple_types.is_simple(&source),
            simple_target: simple_types.is_simple(&target),
        }
    }

    /// Registration for the converter `S -> T`.
    pub fn of<S: ?Sized + 'static, T: ?Sized + 'static>(
        policy: ConversionPolicy,
        simple_types: &SimpleTypeHolder,
    ) -> Self {
        Self::new(
            TypeDescriptor::of::<S>(),
            TypeDescriptor::of::<T>(),
            policy,
            simple_types,
        )
    }

    pub fn is_writing(&self) -> bool {
        self.policy.forces_writing() || (!self.policy.forces_reading() && self.simple_target)
    }

    pub fn is_reading(&self) -> bool {
        self.policy.forces_reading() || (!self.policy.forces_writing() && self.simple_source)
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

    pub fn is_simple_source_type(&self) -> bool {
        self.simple_source
    }

    pub fn is_simple_target_type(&self) -> bool {
        self.simple_target
    }
}

impl Display for ConverterRegistration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} (reading: {}, writing: {})",
            self.source,
            self.target,
            self.is_reading(),
            self.is_writing()
        )
    }
}
