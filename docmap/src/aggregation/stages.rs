use crate::aggregation::{AggregationOperation, AggregationOperationContext};
use crate::document::{Document, Value};
use crate::errors::{DocmapError, DocmapResult, ErrorKind};

/// `$match`: filters documents with a query expressed in property names.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOperation {
    criteria: Document,
}

impl MatchOperation {
    pub fn new(criteria: Document) -> Self {
        MatchOperation { criteria }
    }

    pub fn criteria(&self) -> &Document {
        &self.criteria
    }
}

impl AggregationOperation for MatchOperation {
    fn operator(&self) -> &str {
        "$match"
    }

    fn to_document(&self, context: &dyn AggregationOperationContext) -> DocmapResult<Document> {
        Document::single(self.operator(), context.get_mapped_object(&self.criteria)?)
    }
}

/// `$skip`: drops the first `n` documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipOperation {
    skip: u64,
}

impl SkipOperation {
    pub fn new(skip: u64) -> Self {
        SkipOperation { skip }
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }
}

impl AggregationOperation for SkipOperation {
    fn operator(&self) -> &str {
        "$skip"
    }

    fn to_document(&self, _context: &dyn AggregationOperationContext) -> DocmapResult<Document> {
        Document::single(self.operator(), Value::try_from(self.skip)?)
    }
}

/// `$limit`: passes at most `n` documents on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitOperation {
    limit: u64,
}

impl LimitOperation {
    /// # Errors
    /// Returns a validation error if `limit` is zero.
    pub fn new(limit: u64) -> DocmapResult<Self> {
        if limit == 0 {
            log::error!("Limit must be greater than zero");
            return Err(DocmapError::new(
                "Limit must be greater than zero",
                ErrorKind::ValidationError,
            ));
        }
        Ok(LimitOperation { limit })
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl AggregationOperation for LimitOperation {
    fn operator(&self) -> &str {
        "$limit"
    }

    fn to_document(&self, _context: &dyn AggregationOperationContext) -> DocmapResult<Document> {
        Document::single(self.operator(), Value::try_from(self.limit)?)
    }
}
