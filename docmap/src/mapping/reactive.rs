//! Asynchronous entity callbacks for the reactive driver.

use crate::config::DocmapConfig;
use crate::document::Document;
use crate::errors::DocmapResult;
use crate::hints::{CallbackKind, CallbackType, RuntimeHints};
use crate::mapping::auditing_callback::{LazyHandler, AUDITING_CALLBACK_ORDER};
use crate::mapping::callback::insert_ordered;
use crate::mapping::{AuditingHandler, Ordered};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

#[async_trait]
pub trait ReactiveBeforeConvertCallback<E: Send + 'static>: Ordered + Send + Sync {
    async fn on_before_convert(&self, entity: E, collection: &str) -> DocmapResult<E>;
}

#[async_trait]
pub trait ReactiveBeforeSaveCallback<E: Send + 'static>: Ordered + Send + Sync {
    async fn on_before_save(
        &self,
        entity: E,
        document: &mut Document,
        collection: &str,
    ) -> DocmapResult<E>;
}

#[async_trait]
pub trait ReactiveAfterConvertCallback<E: Send + 'static>: Ordered + Send + Sync {
    async fn on_after_convert(
        &self,
        entity: E,
        document: &Document,
        collection: &str,
    ) -> DocmapResult<E>;
}

#[async_trait]
pub trait ReactiveAfterSaveCallback<E: Send + 'static>: Ordered + Send + Sync {
    async fn on_after_save(
        &self,
        entity: E,
        document: &Document,
        collection: &str,
    ) -> DocmapResult<E>;
}

/// Asynchronous counterpart of [crate::mapping::EntityCallbacks].
///
/// Registrations are checked against the reactive entries of the runtime
/// hint manifest, so nothing is accepted when the reactive driver is absent.
pub struct ReactiveEntityCallbacks<E: Send + 'static> {
    inner: Arc<ReactiveCallbacksInner<E>>,
}

impl<E: Send + 'static> Clone for ReactiveEntityCallbacks<E> {
    fn clone(&self) -> Self {
        ReactiveEntityCallbacks {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Send + 'static> Default for ReactiveEntityCallbacks<E> {
    fn default() -> Self {
        Self::from_config(&DocmapConfig::default())
    }
}

impl<E: Send + 'static> ReactiveEntityCallbacks<E> {
    pub fn new(hints: RuntimeHints) -> Self {
        ReactiveEntityCallbacks {
            inner: Arc::new(ReactiveCallbacksInner {
                hints,
                before_convert: RwLock::new(Vec::new()),
                before_save: RwLock::new(Vec::new()),
                after_convert: RwLock::new(Vec::new()),
                after_save: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn from_config(config: &DocmapConfig) -> Self {
        Self::new(config.runtime_hints().clone())
    }

    pub fn add_before_convert<C>(&self, callback: C) -> bool
    where
        C: ReactiveBeforeConvertCallback<E> + 'static,
    {
        if !self.inner.is_hinted(CallbackKind::BeforeConvert) {
            return false;
        }
        let callback: Arc<dyn ReactiveBeforeConvertCallback<E>> = Arc::new(callback);
        insert_ordered(&mut *self.inner.before_convert.write(), callback);
        true
    }

    pub fn add_before_save<C>(&self, callback: C) -> bool
    where
        C: ReactiveBeforeSaveCallback<E> + 'static,
    {
        if !self.inner.is_hinted(CallbackKind::BeforeSave) {
            return false;
        }
        let callback: Arc<dyn ReactiveBeforeSaveCallback<E>> = Arc::new(callback);
        insert_ordered(&mut *self.inner.before_save.write(), callback);
        true
    }

    pub fn add_after_convert<C>(&self, callback: C) -> bool
    where
        C: ReactiveAfterConvertCallback<E> + 'static,
    {
        if !self.inner.is_hinted(CallbackKind::AfterConvert) {
            return false;
        }
        let callback: Arc<dyn ReactiveAfterConvertCallback<E>> = Arc::new(callback);
        insert_ordered(&mut *self.inner.after_convert.write(), callback);
        true
    }

    pub fn add_after_save<C>(&self, callback: C) -> bool
    where
        C: ReactiveAfterSaveCallback<E> + 'static,
    {
        if !self.inner.is_hinted(CallbackKind::AfterSave) {
            return false;
        }
        let callback: Arc<dyn ReactiveAfterSaveCallback<E>> = Arc::new(callback);
        insert_ordered(&mut *self.inner.after_save.write(), callback);
        true
    }

    pub async fn callback_before_convert(&self, entity: E, collection: &str) -> DocmapResult<E> {
        let callbacks = self.inner.before_convert.read().clone();
        let mut entity = entity;
        for callback in callbacks {
            entity = callback.on_before_convert(entity, collection).await?;
        }
        Ok(entity)
    }

    pub async fn callback_before_save(
        &self,
        entity: E,
        document: &mut Document,
        collection: &str,
    ) -> DocmapResult<E> {
        let callbacks = self.inner.before_save.read().clone();
        let mut entity = entity;
        for callback in callbacks {
            entity = callback.on_before_save(entity, document, collection).await?;
        }
        Ok(entity)
    }

    pub async fn callback_after_convert(
        &self,
        entity: E,
        document: &Document,
        collection: &str,
    ) -> DocmapResult<E> {
        let callbacks = self.inner.after_convert.read().clone();
        let mut entity = entity;
        for callback in callbacks {
            entity = callback.on_after_convert(entity, document, collection).await?;
        }
        Ok(entity)
    }

    pub async fn callback_after_save(
        &self,
        entity: E,
        document: &Document,
        collection: &str,
    ) -> DocmapResult<E> {
        let callbacks = self.inner.after_save.read().clone();
        let mut entity = entity;
        for callback in callbacks {
            entity = callback.on_after_save(entity, document, collection).await?;
        }
        Ok(entity)
    }

    pub fn count(&self, kind: CallbackKind) -> usize {
        match kind {
            CallbackKind::BeforeConvert => self.inner.before_convert.read().len(),
            CallbackKind::BeforeSave => self.inner.before_save.read().len(),
            CallbackKind::AfterConvert => self.inner.after_convert.read().len(),
            CallbackKind::AfterSave => self.inner.after_save.read().len(),
        }
    }
}

struct ReactiveCallbacksInner<E: Send + 'static> {
    hints: RuntimeHints,
    before_convert: RwLock<Vec<Arc<dyn ReactiveBeforeConvertCallback<E>>>>,
    before_save: RwLock<Vec<Arc<dyn ReactiveBeforeSaveCallback<E>>>>,
    after_convert: RwLock<Vec<Arc<dyn ReactiveAfterConvertCallback<E>>>>,
    after_save: RwLock<Vec<Arc<dyn ReactiveAfterSaveCallback<E>>>>,
}

impl<E: Send + 'static> ReactiveCallbacksInner<E> {
    fn is_hinted(&self, kind: CallbackKind) -> bool {
        let callback_type = CallbackType::reactive(kind);
        if self.hints.contains_callback(callback_type) {
            true
        } else {
            log::warn!(
                "{} is not listed in the runtime hints, skipping callback registration",
                callback_type
            );
            false
        }
    }
}

/// Reactive before-convert callback that marks entities as audited.
///
/// Same contract as [crate::mapping::AuditingEntityCallback]: lazily
/// resolved handler, order 100 by default, handler result returned as is.
pub struct ReactiveAuditingEntityCallback<E> {
    handler: LazyHandler<E>,
    order: i32,
}

impl<E> ReactiveAuditingEntityCallback<E> {
    pub fn new<F>(provider: F) -> Self
    where
        F: Fn() -> Arc<dyn AuditingHandler<E>> + Send + Sync + 'static,
    {
        ReactiveAuditingEntityCallback {
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
}

impl<E> Ordered for ReactiveAuditingEntityCallback<E> {
    fn order(&self) -> i32 {
        self.order
    }
}

#[async_trait]
impl<E: Send + 'static> ReactiveBeforeConvertCallback<E> for ReactiveAuditingEntityCallback<E> {
    async fn on_before_convert(&self, entity: E, _collection: &str) -> DocmapResult<E> {
        self.handler.get().mark_audited(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DocmapError, ErrorKind};
    use crate::hints::{CallbackRuntimeHints, DriverSupport, HintsRegistrar};
    use futures::executor::block_on;

    fn hints(reactive: bool) -> RuntimeHints {
        let mut hints = RuntimeHints::new();
        CallbackRuntimeHints.register_hints(&mut hints, &DriverSupport::new(true, reactive));
        hints
    }

    struct Append(&'static str, i32);

    impl Ordered for Append {
        fn order(&self) -> i32 {
            self.1
        }
    }

    #[async_trait]
    impl ReactiveBeforeConvertCallback<String> for Append {
        async fn on_before_convert(&self, entity: String, _collection: &str) -> DocmapResult<String> {
            Ok(format!("{}{}", entity, self.0))
        }
    }

    struct Reject;

    impl Ordered for Reject {}

    #[async_trait]
    impl ReactiveBeforeSaveCallback<String> for Reject {
        async fn on_before_save(
            &self,
            _entity: String,
            _document: &mut Document,
            _collection: &str,
        ) -> DocmapResult<String> {
            Err(DocmapError::new("not now", ErrorKind::CallbackError))
        }
    }

    struct Upper;

    impl AuditingHandler<String> for Upper {
        fn mark_audited(&self, entity: String) -> DocmapResult<String> {
            Ok(entity.to_uppercase())
        }
    }

    #[test]
    fn runs_async_callbacks_in_order() {
        let callbacks = ReactiveEntityCallbacks::<String>::new(hints(true));
        callbacks.add_before_convert(Append("b", 2));
        callbacks.add_before_convert(Append("a", 1));

        let entity = block_on(callbacks.callback_before_convert(String::new(), "c")).unwrap();
        assert_eq!(entity, "ab");
    }

    #[test]
    fn errors_propagate() {
        let callbacks = ReactiveEntityCallbacks::<String>::new(hints(true));
        callbacks.add_before_save(Reject);

        let mut document = Document::new();
        let err = block_on(callbacks.callback_before_save("x".to_string(), &mut document, "c"))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::CallbackError);
    }

    #[test]
    fn refuses_registrations_without_reactive_driver() {
        let callbacks = ReactiveEntityCallbacks::<String>::new(hints(false));
        assert!(!callbacks.add_before_convert(Append("a", 1)));
        assert_eq!(callbacks.count(CallbackKind::BeforeConvert), 0);

        let entity = block_on(callbacks.callback_before_convert("x".to_string(), "c")).unwrap();
        assert_eq!(entity, "x");
    }

    #[test]
    fn auditing_callback_returns_handler_result() {
        let callback = ReactiveAuditingEntityCallback::<String>::new(|| Arc::new(Upper));
        assert_eq!(callback.order(), 100);

        let callbacks = ReactiveEntityCallbacks::<String>::new(hints(true));
        callbacks.add_before_convert(callback);
        callbacks.add_before_convert(Append("!", 200));

        let entity = block_on(callbacks.callback_before_convert("ada".to_string(), "c")).unwrap();
        assert_eq!(entity, "ADA!");
    }
}
