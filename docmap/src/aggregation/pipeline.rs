use crate::aggregation::{AggregationOperation, AggregationOperationContext, GEO_NEAR};
use crate::document::Document;
use crate::errors::{DocmapError, DocmapResult, ErrorKind};
use std::sync::Arc;

/// An ordered list of aggregation operations.
///
/// Operations are shared, so cloning an `Aggregation` or reusing an
/// operation in several pipelines is cheap.
#[derive(Clone, Default)]
pub struct Aggregation {
    operations: Vec<Arc<dyn AggregationOperation>>,
}

impl Aggregation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an operation.
    pub fn stage<T: AggregationOperation + 'static>(mut self, operation: T) -> Self {
        self.operations.push(Arc::new(operation));
        self
    }

    /// Appends an already shared operation.
    pub fn shared_stage(mut self, operation: Arc<dyn AggregationOperation>) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Renders every operation, in order, into pipeline stage documents.
    ///
    /// # Errors
    /// Returns a validation error if a `$geoNear` operation is not the first
    /// operation, and propagates rendering errors from the operations.
    pub fn to_pipeline(
        &self,
        context: &dyn AggregationOperationContext,
    ) -> DocmapResult<Vec<Document>> {
        let mut pipeline = Vec::with_capacity(self.operations.len());
        for (position, operation) in self.operations.iter().enumerate() {
            if position > 0 && operation.operator() == GEO_NEAR {
                log::error!("$geoNear found at position {} of the pipeline", position);
                return Err(DocmapError::new(
                    "$geoNear is only valid as the first stage in a pipeline",
                    ErrorKind::ValidationError,
                ));
            }
            pipeline.extend(operation.to_pipeline_stages(context)?);
        }

        log::debug!(
            "Rendered aggregation with {} operations into {} stages",
            self.operations.len(),
            pipeline.len()
        );
        Ok(pipeline)
    }
}
