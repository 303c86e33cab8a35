//! Configuration shared by the mapping components.

use crate::aggregation::{FieldMappingContext, FieldMappingContextBuilder};
use crate::convert::{CustomConversions, SimpleTypeHolder};
use crate::errors::{DocmapError, DocmapResult, ErrorKind};
use crate::hints::{runtime_hints_for, DriverSupport, RuntimeHints};
use std::sync::{Arc, OnceLock};

/// Switches for the auditing handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditingConfig {
    modify_on_creation: bool,
    dates_enabled: bool,
}

impl Default for AuditingConfig {
    fn default() -> Self {
        AuditingConfig {
            modify_on_creation: true,
            dates_enabled: true,
        }
    }
}

impl AuditingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether creating an entity also stamps its last-modified fields.
    pub fn modify_on_creation(&self) -> bool {
        self.modify_on_creation
    }

    pub fn dates_enabled(&self) -> bool {
        self.dates_enabled
    }

    pub fn with_modify_on_creation(mut self, modify_on_creation: bool) -> Self {
        self.modify_on_creation = modify_on_creation;
        self
    }

    pub fn with_dates_enabled(mut self, dates_enabled: bool) -> Self {
        self.dates_enabled = dates_enabled;
        self
    }
}

/// Shared configuration.
///
/// Clones share the same settings. The runtime-hint manifest is derived
/// from the driver support on first access and cached.
///
/// # Examples
///
/// ```rust,ignore
/// let config = DocmapConfig::builder()
///     .driver_support(DriverSupport::new(true, false))
///     .strict_field_mapping(true)
///     .build()?;
/// ```
#[derive(Clone)]
pub struct DocmapConfig {
    inner: Arc<DocmapConfigInner>,
}

impl Default for DocmapConfig {
    fn default() -> Self {
        DocmapConfig {
            inner: Arc::new(DocmapConfigInner {
                driver_support: DriverSupport::detect(),
                auditing: AuditingConfig::default(),
                simple_types: SimpleTypeHolder::new(),
                strict_field_mapping: false,
                runtime_hints: OnceLock::new(),
            }),
        }
    }
}

impl DocmapConfig {
    pub fn builder() -> DocmapConfigBuilder {
        DocmapConfigBuilder::new()
    }

    pub fn driver_support(&self) -> DriverSupport {
        self.inner.driver_support
    }

    pub fn auditing(&self) -> AuditingConfig {
        self.inner.auditing
    }

    pub fn simple_types(&self) -> &SimpleTypeHolder {
        &self.inner.simple_types
    }

    pub fn strict_field_mapping(&self) -> bool {
        self.inner.strict_field_mapping
    }

    /// The manifest registered for the configured driver support.
    pub fn runtime_hints(&self) -> &RuntimeHints {
        self.inner
            .runtime_hints
            .get_or_init(|| runtime_hints_for(&self.inner.driver_support))
    }

    /// A fresh conversion registry over the configured simple types.
    pub fn custom_conversions(&self) -> CustomConversions {
        CustomConversions::new(self.inner.simple_types.clone())
    }

    /// A field-mapping builder that inherits the strict flag.
    pub fn field_mapping(&self) -> FieldMappingContextBuilder {
        FieldMappingContext::builder().strict(self.inner.strict_field_mapping)
    }
}

struct DocmapConfigInner {
    driver_support: DriverSupport,
    auditing: AuditingConfig,
    simple_types: SimpleTypeHolder,
    strict_field_mapping: bool,
    runtime_hints: OnceLock<RuntimeHints>,
}

/// Builder for [DocmapConfig].
///
/// Invalid settings are captured and reported by [DocmapConfigBuilder::build].
pub struct DocmapConfigBuilder {
    error: Option<DocmapError>,
    driver_support: DriverSupport,
    auditing: AuditingConfig,
    simple_types: SimpleTypeHolder,
    strict_field_mapping: bool,
}

impl Default for DocmapConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocmapConfigBuilder {
    pub fn new() -> Self {
        DocmapConfigBuilder {
            error: None,
            driver_support: DriverSupport::detect(),
            auditing: AuditingConfig::default(),
            simple_types: SimpleTypeHolder::new(),
            strict_field_mapping: false,
        }
    }

    /// Overrides the detected driver flavours. At least one flavour must be
    /// present.
    pub fn driver_support(mut self, driver_support: DriverSupport) -> Self {
        if self.error.is_none()
            && !driver_support.is_blocking_present()
            && !driver_support.is_reactive_present()
        {
            log::error!("Driver support must include at least one driver flavour");
            self.error = Some(DocmapError::new(
                "Driver support must include at least one driver flavour",
                ErrorKind::InvalidOperation,
            ));
        }
        self.driver_support = driver_support;
        self
    }

    pub fn auditing(mut self, auditing: AuditingConfig) -> Self {
        self.auditing = auditing;
        self
    }

    /// Marks `T` as directly storable.
    pub fn simple_type<T: ?Sized + 'static>(mut self) -> Self {
        self.simple_types.register::<T>();
        self
    }

    pub fn strict_field_mapping(mut self, strict: bool) -> Self {
        self.strict_field_mapping = strict;
        self
    }

    /// # Errors
    /// Returns the first error captured while configuring.
    pub fn build(self) -> DocmapResult<DocmapConfig> {
        if let Some(error) = self.error {
            return Err(error);
        }

        Ok(DocmapConfig {
            inner: Arc::new(DocmapConfigInner {
                driver_support: self.driver_support,
                auditing: self.auditing,
                simple_types: self.simple_types,
                strict_field_mapping: self.strict_field_mapping,
                runtime_hints: OnceLock::new(),
            }),
        })
    }
}
