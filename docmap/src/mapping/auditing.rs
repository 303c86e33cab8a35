use crate::config::AuditingConfig;
use crate::errors::DocmapResult;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// An entity that carries audit metadata.
///
/// Only `is_new` is required. Entities override the setters for the audit
/// fields they actually have.
pub trait Auditable {
    /// Whether the entity has never been persisted.
    fn is_new(&self) -> bool;

    fn set_created_by(&mut self, _auditor: &str) {}

    fn set_created_date(&mut self, _date: DateTime<Utc>) {}

    fn set_last_modified_by(&mut self, _auditor: &str) {}

    fn set_last_modified_date(&mut self, _date: DateTime<Utc>) {}
}

/// Stamps audit metadata on an entity.
pub trait AuditingHandler<E>: Send + Sync {
    /// Returns the audited entity. Implementations may return a different
    /// instance than the one passed in.
    fn mark_audited(&self, entity: E) -> DocmapResult<E>;
}

/// Supplies the current auditor, typically the signed-in user.
pub trait AuditorAware: Send + Sync {
    fn current_auditor(&self) -> DocmapResult<Option<String>>;
}

/// Supplies the timestamp used for audit dates.
pub trait DateTimeProvider: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentDateTimeProvider;

impl DateTimeProvider for CurrentDateTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// An auditor that never changes.
#[derive(Debug, Clone)]
pub struct FixedAuditor(String);

impl FixedAuditor {
    pub fn new(auditor: &str) -> Self {
        FixedAuditor(auditor.to_string())
    }
}

impl AuditorAware for FixedAuditor {
    fn current_auditor(&self) -> DocmapResult<Option<String>> {
        Ok(Some(self.0.clone()))
    }
}

/// Auditing handler that tells creation from modification through
/// [Auditable::is_new].
///
/// New entities get their created-by and created-date fields stamped, and
/// also their last-modified fields unless `modify_on_creation` is off.
/// Existing entities only get their last-modified fields stamped. Auditor
/// fields are left alone when no [AuditorAware] is configured or it has no
/// current auditor. Date fields are left alone when dates are disabled.
#[derive(Clone)]
pub struct IsNewAwareAuditingHandler {
    config: AuditingConfig,
    auditor_aware: Option<Arc<dyn AuditorAware>>,
    date_time_provider: Arc<dyn DateTimeProvider>,
}

impl Default for IsNewAwareAuditingHandler {
    fn default() -> Self {
        Self::new(AuditingConfig::default())
    }
}

impl IsNewAwareAuditingHandler {
    pub fn new(config: AuditingConfig) -> Self {
        IsNewAwareAuditingHandler {
            config,
            auditor_aware: None,
            date_time_provider: Arc::new(CurrentDateTimeProvider),
        }
    }

    pub fn with_auditor_aware<A: AuditorAware + 'static>(mut self, auditor_aware: A) -> Self {
        self.auditor_aware = Some(Arc::new(auditor_aware));
        self
    }

    pub fn with_date_time_provider<P: DateTimeProvider + 'static>(mut self, provider: P) -> Self {
        self.date_time_provider = Arc::new(provider);
        self
    }

    pub fn config(&self) -> AuditingConfig {
        self.config
    }

    /// Stamps creation metadata.
    pub fn mark_created<E: Auditable>(&self, entity: E) -> DocmapResult<E> {
        self.touch(entity, true)
    }

    /// Stamps modification metadata.
    pub fn mark_modified<E: Auditable>(&self, entity: E) -> DocmapResult<E> {
        self.touch(entity, false)
    }

    fn touch<E: Auditable>(&self, mut entity: E, is_new: bool) -> DocmapResult<E> {
        let stamp_modified = !is_new || self.config.modify_on_creation();

        let auditor = match &self.auditor_aware {
            Some(auditor_aware) => auditor_aware.current_auditor()?,
            None => None,
        };
        if let Some(auditor) = auditor {
            if is_new {
                entity.set_created_by(&auditor);
            }
            if stamp_modified {
                entity.set_last_modified_by(&auditor);
            }
        }

        if self.config.dates_enabled() {
            let now = self.date_time_provider.now();
            if is_new {
                entity.set_created_date(now);
            }
            if stamp_modified {
                entity.set_last_modified_date(now);
            }
        }

        Ok(entity)
    }
}

impl<E: Auditable> AuditingHandler<E> for IsNewAwareAuditingHandler {
    fn mark_audited(&self, entity: E) -> DocmapResult<E> {
        if entity.is_new() {
            self.mark_created(entity)
        } else {
            self.mark_modified(entity)
        }
    }
}
