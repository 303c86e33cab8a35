use crate::errors::DocmapResult;
use crate::mapping::{AuditingHandler, BeforeConvertCallback, Ordered};
use std::sync::{Arc, OnceLock};

/// Default order of the auditing callbacks.
pub const AUDITING_CALLBACK_ORDER: i32 = 100;

type HandlerProvider<E> = dyn Fn() -> Arc<dyn AuditingHandler<E>> + Send + Sync;

/// Lazily resolves an auditing handler on first use and caches it.
pub(crate) struct LazyHandler<E> {
    provider: Arc<HandlerProvider<E>>,
    handler: OnceLock<Arc<dyn AuditingHandler<E>>>,
}

impl<E> LazyHandler<E> {
    pub(crate) fn new<F>(provider: F) -> Self
    where
        F: Fn() -> Arc<dyn AuditingHandler<E>> + Send + Sync + 'static,
    {
        LazyHandler {
            provider: Arc::new(provider),
            handler: OnceLock::new(),
        }
    }

    pub(crate) fn get(&self) -> &Arc<dyn AuditingHandler<E>> {
        self.handler.get_or_init(|| {
            log::debug!("Resolving auditing handler");
            (self.provider)()
        })
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.handler.get().is_some()
    }
}

/// Before-convert callback that marks entities as audited.
///
/// The handler comes from a provider closure and is only resolved when the
/// first entity passes through, so constructing the callback never builds
/// the handler. Runs with order [AUDITING_CALLBACK_ORDER] unless changed.
///
/// # Examples
///
/// ```rust,ignore
/// let handler = Arc::new(IsNewAwareAuditingHandler::default());
/// let callback = AuditingEntityCallback::<Order>::new(move || handler.clone());
/// callbacks.add_before_convert(callback);
/// ```
pub struct AuditingEntityCallback<E> {
    handler: LazyHandler<E>,
    order: i32,
}

impl<E> AuditingEntityCallback<E> {
    pub fn new<F>(provider: F) -> Self
    where
        F: Fn() -> Arc<dyn AuditingHandler<E>> + Send + Sync + 'static,
    {
        AuditingEntityCallback {
            handler: LazyHandler::new(provider),
            order: AUDITING_CALLBACK_ORDER,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn set_order(&mut self, order: i32) {
        self.order = order;
    }

    /// Whether the handler has been resolved yet.
    pub fn is_handler_resolved(&self) -> bool {
        self.handler.is_resolved()
    }
}

impl<E> Ordered for AuditingEntityCallback<E> {
    fn order(&self) -> i32 {
        self.order
    }
}

impl<E> BeforeConvertCallback<E> for AuditingEntityCallback<E> {
    fn on_before_convert(&self, entity: E, _collection: &str) -> DocmapResult<E> {
        self.handler.get().mark_audited(entity)
    }
}
