use crate::aggregation::AggregationOperationContext;
use crate::document::Document;
use crate::errors::DocmapResult;

/// One step of an aggregation pipeline.
///
/// Implementations are immutable values. Serialization happens only when the
/// pipeline is rendered, against the context supplied at that time.
pub trait AggregationOperation: Send + Sync {
    /// The stage operator, e.g. `$geoNear`.
    fn operator(&self) -> &str;

    /// Renders the operation as a single-key stage document.
    fn to_document(&self, context: &dyn AggregationOperationContext) -> DocmapResult<Document>;

    /// Renders the operation as one or more stages. Most operations produce
    /// exactly one.
    fn to_pipeline_stages(
        &self,
        context: &dyn AggregationOperationContext,
    ) -> DocmapResult<Vec<Document>> {
        Ok(vec![self.to_document(context)?])
    }
}
