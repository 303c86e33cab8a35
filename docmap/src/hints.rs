//! Runtime-hint manifest.
//!
//! A manifest lists the callback and dispatcher types that must stay
//! reachable for the driver flavours compiled into the application.
//! Registrars fill a [RuntimeHints] manifest. The callback registries
//! consult it and refuse callbacks whose type it does not list.

use indexmap::IndexMap;
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};

/// Which driver flavours are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DriverSupport {
    blocking: bool,
    reactive: bool,
}

impl Default for DriverSupport {
    fn default() -> Self {
        Self::detect()
    }
}

impl DriverSupport {
    pub fn new(blocking: bool, reactive: bool) -> Self {
        DriverSupport { blocking, reactive }
    }

    /// Reads the flavours from the crate's enabled cargo features.
    pub fn detect() -> Self {
        DriverSupport {
            blocking: cfg!(feature = "blocking"),
            reactive: cfg!(feature = "reactive"),
        }
    }

    pub fn is_blocking_present(&self) -> bool {
        self.blocking
    }

    pub fn is_reactive_present(&self) -> bool {
        self.reactive
    }
}

/// The lifecycle point a callback hooks into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    BeforeConvert,
    BeforeSave,
    AfterConvert,
    AfterSave,
}

impl CallbackKind {
    pub const ALL: [CallbackKind; 4] = [
        CallbackKind::BeforeConvert,
        CallbackKind::BeforeSave,
        CallbackKind::AfterConvert,
        CallbackKind::AfterSave,
    ];

    fn trait_suffix(&self) -> &'static str {
        match self {
            CallbackKind::BeforeConvert => "BeforeConvertCallback",
            CallbackKind::BeforeSave => "BeforeSaveCallback",
            CallbackKind::AfterConvert => "AfterConvertCallback",
            CallbackKind::AfterSave => "AfterSaveCallback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackFlavor {
    Blocking,
    Reactive,
}

/// A callback trait identified by lifecycle point and flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackType {
    kind: CallbackKind,
    flavor: CallbackFlavor,
}

impl CallbackType {
    pub fn new(kind: CallbackKind, flavor: CallbackFlavor) -> Self {
        CallbackType { kind, flavor }
    }

    pub fn blocking(kind: CallbackKind) -> Self {
        Self::new(kind, CallbackFlavor::Blocking)
    }

    pub fn reactive(kind: CallbackKind) -> Self {
        Self::new(kind, CallbackFlavor::Reactive)
    }

    pub fn kind(&self) -> CallbackKind {
        self.kind
    }

    pub fn flavor(&self) -> CallbackFlavor {
        self.flavor
    }

    /// Fully qualified name of the callback trait, stable across builds.
    pub fn type_name(&self) -> String {
        match self.flavor {
            CallbackFlavor::Blocking => format!("docmap::mapping::{}", self.kind.trait_suffix()),
            CallbackFlavor::Reactive => {
                format!("docmap::mapping::Reactive{}", self.kind.trait_suffix())
            }
        }
    }
}

impl Display for CallbackType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// What has to stay reachable on a hinted type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberCategory {
    InvokeDeclaredConstructors,
    InvokePublicMethods,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHint {
    type_name: String,
    members: SmallVec<[MemberCategory; 2]>,
}

impl TypeHint {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn members(&self) -> &[MemberCategory] {
        &self.members
    }
}

/// Ordered set of type hints, keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct RuntimeHints {
    types: IndexMap<String, TypeHint>,
}

impl RuntimeHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a hint for `type_name`. Registering a known type again merges
    /// the member categories and keeps its original position.
    pub fn register_type(&mut self, type_name: &str, members: &[MemberCategory]) {
        let hint = self
            .types
            .entry(type_name.to_string())
            .or_insert_with(|| TypeHint {
                type_name: type_name.to_string(),
                members: SmallVec::new(),
            });
        for member in members {
            if !hint.members.contains(member) {
                hint.members.push(*member);
            }
        }
    }

    pub fn register_callback(&mut self, callback_type: CallbackType, members: &[MemberCategory]) {
        self.register_type(&callback_type.type_name(), members);
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn contains_callback(&self, callback_type: CallbackType) -> bool {
        self.contains(&callback_type.type_name())
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeHint> {
        self.types.get(type_name)
    }

    pub fn type_hints(&self) -> impl Iterator<Item = &TypeHint> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Contributes entries to a [RuntimeHints] manifest.
///
/// Registrars must not fail: a driver flavour that is absent simply
/// contributes nothing.
pub trait HintsRegistrar: Send + Sync {
    fn register_hints(&self, hints: &mut RuntimeHints, drivers: &DriverSupport);
}

const CALLBACK_MEMBERS: [MemberCategory; 2] = [
    MemberCategory::InvokeDeclaredConstructors,
    MemberCategory::InvokePublicMethods,
];

/// Registers the entity callback traits.
///
/// The four blocking callback traits are always listed. Their reactive
/// counterparts are listed only when the reactive driver is present.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallbackRuntimeHints;

impl HintsRegistrar for CallbackRuntimeHints {
    fn register_hints(&self, hints: &mut RuntimeHints, drivers: &DriverSupport) {
        for kind in CallbackKind::ALL {
            hints.register_callback(CallbackType::blocking(kind), &CALLBACK_MEMBERS);
        }

        if drivers.is_reactive_present() {
            for kind in CallbackKind::ALL {
                hints.register_callback(CallbackType::reactive(kind), &CALLBACK_MEMBERS);
            }
        } else {
            log::debug!("Reactive driver not present, skipping reactive callback hints");
        }
    }
}

pub const BLOCKING_DISPATCHER: &str = "docmap::mapping::EntityCallbacks";
pub const REACTIVE_DISPATCHER: &str = "docmap::mapping::ReactiveEntityCallbacks";

/// Registers the callback dispatchers of each present driver flavour.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatcherRuntimeHints;

impl HintsRegistrar for DispatcherRuntimeHints {
    fn register_hints(&self, hints: &mut RuntimeHints, drivers: &DriverSupport) {
        if drivers.is_blocking_present() {
            hints.register_type(BLOCKING_DISPATCHER, &[MemberCategory::InvokePublicMethods]);
        }
        if drivers.is_reactive_present() {
            hints.register_type(REACTIVE_DISPATCHER, &[MemberCategory::InvokePublicMethods]);
        }
    }
}

/// Builds the complete manifest for `drivers`.
pub fn runtime_hints_for(drivers: &DriverSupport) -> RuntimeHints {
    let registrars: [&dyn HintsRegistrar; 2] = [&CallbackRuntimeHints, &DispatcherRuntimeHints];
    let mut hints = RuntimeHints::new();
    for registrar in registrars {
        registrar.register_hints(&mut hints, drivers);
    }
    hints
}
