use crate::config::DocmapConfig;
use crate::document::Document;
use crate::errors::DocmapResult;
use crate::hints::{CallbackKind, CallbackType, RuntimeHints};
use parking_lot::RwLock;
use std::sync::Arc;

pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// Ordering of callbacks. Lower values run first.
pub trait Ordered {
    fn order(&self) -> i32 {
        LOWEST_PRECEDENCE
    }
}

/// Invoked before an entity is converted into a document.
pub trait BeforeConvertCallback<E>: Ordered + Send + Sync {
    /// Returns the entity to convert, either `entity` or a replacement.
    fn on_before_convert(&self, entity: E, collection: &str) -> DocmapResult<E>;
}

/// Invoked after conversion, right before the document is saved.
///
/// The document is the one about to be written. Changes made to it are
/// persisted, changes made to the entity are not.
pub trait BeforeSaveCallback<E>: Ordered + Send + Sync {
    fn on_before_save(&self, entity: E, document: &mut Document, collection: &str)
        -> DocmapResult<E>;
}

/// Invoked after a document read from a collection was converted into an
/// entity.
pub trait AfterConvertCallback<E>: Ordered + Send + Sync {
    fn on_after_convert(&self, entity: E, document: &Document, collection: &str)
        -> DocmapResult<E>;
}

/// Invoked after an entity was saved.
pub trait AfterSaveCallback<E>: Ordered + Send + Sync {
    fn on_after_save(&self, entity: E, document: &Document, collection: &str) -> DocmapResult<E>;
}

/// Inserts after every callback with an order lower than or equal to
/// `callback`'s, which keeps registration order among equal orders.
pub(crate) fn insert_ordered<C: Ordered + ?Sized>(list: &mut Vec<Arc<C>>, callback: Arc<C>) {
    let order = callback.order();
    let position = list.partition_point(|existing| existing.order() <= order);
    list.insert(position, callback);
}

/// Dispatches entity lifecycle callbacks for entities of type `E`.
///
/// Callbacks run sorted by [Ordered::order]. Each one receives the entity
/// returned by the previous one, and the first error stops the chain.
/// Callbacks are only accepted when their callback type is listed in the
/// runtime-hint manifest; others are skipped with a warning.
///
/// Clones share the same registrations.
pub struct EntityCallbacks<E> {
    inner: Arc<EntityCallbacksInner<E>>,
}

impl<E> Clone for EntityCallbacks<E> {
    fn clone(&self) -> Self {
        EntityCallbacks {
            inner: self.inner.clone(),
        }
    }
}

impl<E: 'static> Default for EntityCallbacks<E> {
    fn default() -> Self {
        Self::from_config(&DocmapConfig::default())
    }
}

impl<E: 'static> EntityCallbacks<E> {
    /// Creates an empty dispatcher that checks registrations against `hints`.
    pub fn new(hints: RuntimeHints) -> Self {
        EntityCallbacks {
            inner: Arc::new(EntityCallbacksInner {
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

    /// Registers a before-convert callback. Returns whether it was accepted.
    pub fn add_before_convert<C: BeforeConvertCallback<E> + 'static>(&self, callback: C) -> bool {
        if !self.inner.is_hinted(CallbackKind::BeforeConvert) {
            return false;
        }
        let callback: Arc<dyn BeforeConvertCallback<E>> = Arc::new(callback);
        insert_ordered(&mut *self.inner.before_convert.write(), callback);
        true
    }

    /// Registers a before-save callback. Returns whether it was accepted.
    pub fn add_before_save<C: BeforeSaveCallback<E> + 'static>(&self, callback: C) -> bool {
        if !self.inner.is_hinted(CallbackKind::BeforeSave) {
            return false;
        }
        let callback: Arc<dyn BeforeSaveCallback<E>> = Arc::new(callback);
        insert_ordered(&mut *self.inner.before_save.write(), callback);
        true
    }

    /// Registers an after-convert callback. Returns whether it was accepted.
    pub fn add_after_convert<C: AfterConvertCallback<E> + 'static>(&self, callback: C) -> bool {
        if !self.inner.is_hinted(CallbackKind::AfterConvert) {
            return false;
        }
        let callback: Arc<dyn AfterConvertCallback<E>> = Arc::new(callback);
        insert_ordered(&mut *self.inner.after_convert.write(), callback);
        true
    }

    /// Registers an after-save callback. Returns whether it was accepted.
    pub fn add_after_save<C: AfterSaveCallback<E> + 'static>(&self, callback: C) -> bool {
        if !self.inner.is_hinted(CallbackKind::AfterSave) {
            return false;
        }
        let callback: Arc<dyn AfterSaveCallback<E>> = Arc::new(callback);
        insert_ordered(&mut *self.inner.after_save.write(), callback);
        true
    }

    pub fn callback_before_convert(&self, entity: E, collection: &str) -> DocmapResult<E> {
        let callbacks = self.inner.before_convert.read().clone();
        let mut entity = entity;
        for callback in callbacks {
            entity = callback.on_before_convert(entity, collection)?;
        }
        Ok(entity)
    }

    pub fn callback_before_save(
        &self,
        entity: E,
        document: &mut Document,
        collection: &str,
    ) -> DocmapResult<E> {
        let callbacks = self.inner.before_save.read().clone();
        let mut entity = entity;
        for callback in callbacks {
            entity = callback.on_before_save(entity, document, collection)?;
        }
        Ok(entity)
    }

    pub fn callback_after_convert(
        &self,
        entity: E,
        document: &Document,
        collection: &str,
    ) -> DocmapResult<E> {
        let callbacks = self.inner.after_convert.read().clone();
        let mut entity = entity;
        for callback in callbacks {
            entity = callback.on_after_convert(entity, document, collection)?;
        }
        Ok(entity)
    }

    pub fn callback_after_save(
        &self,
        entity: E,
        document: &Document,
        collection: &str,
    ) -> DocmapResult<E> {
        let callbacks = self.inner.after_save.read().clone();
        let mut entity = entity;
        for callback in callbacks {
            entity = callback.on_after_save(entity, document, collection)?;
        }
        Ok(entity)
    }

    /// Number of registered callbacks of `kind`.
    pub fn count(&self, kind: CallbackKind) -> usize {
        match kind {
            CallbackKind::BeforeConvert => self.inner.before_convert.read().len(),
            CallbackKind::BeforeSave => self.inner.before_save.read().len(),
            CallbackKind::AfterConvert => self.inner.after_convert.read().len(),
            CallbackKind::AfterSave => self.inner.after_save.read().len(),
        }
    }
}

struct EntityCallbacksInner<E> {
    hints: RuntimeHints,
    before_convert: RwLock<Vec<Arc<dyn BeforeConvertCallback<E>>>>,
    before_save: RwLock<Vec<Arc<dyn BeforeSaveCallback<E>>>>,
    after_convert: RwLock<Vec<Arc<dyn AfterConvertCallback<E>>>>,
    after_save: RwLock<Vec<Arc<dyn AfterSaveCallback<E>>>>,
}

impl<E> EntityCallbacksInner<E> {
    fn is_hinted(&self, kind: CallbackKind) -> bool {
        let callback_type = CallbackType::blocking(kind);
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
