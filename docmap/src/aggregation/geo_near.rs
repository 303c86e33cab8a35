use crate::aggregation::{AggregationOperation, AggregationOperationContext};
use crate::document::{Document, Value};
use crate::errors::{DocmapError, DocmapResult, ErrorKind};
use crate::geo::NearQuery;

pub const GEO_NEAR: &str = "$geoNear";
const DISTANCE_FIELD: &str = "distanceField";
const INDEX_KEY: &str = "key";
const NUM: &str = "num";
const COLLATION: &str = "collation";

/// The `$geoNear` aggregation stage.
///
/// Outputs documents ordered by distance from the near-query's origin and
/// writes the computed distance into `distance_field`.
///
/// The stage is an immutable value: [`use_index`](Self::use_index) returns a
/// new operation and leaves the receiver untouched.
///
/// ```rust,ignore
/// let op = GeoNearOperation::new(near_query, "dist.calculated")?.use_index("location");
/// let stage = op.to_document(&NoOpAggregationContext)?;
/// // { "$geoNear": { ..., "distanceField": "dist.calculated", "key": "location" } }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GeoNearOperation {
    near_query: NearQuery,
    distance_field: String,
    index_key: Option<String>,
}

impl GeoNearOperation {
    /// Creates a `$geoNear` stage.
    ///
    /// # Errors
    /// Returns a validation error if `distance_field` is empty or blank.
    pub fn new(near_query: NearQuery, distance_field: impl Into<String>) -> DocmapResult<Self> {
        let distance_field = distance_field.into();
        if distance_field.trim().is_empty() {
            log::error!("Distance field must not be empty");
            return Err(DocmapError::new(
                "Distance field must not be null or empty",
                ErrorKind::ValidationError,
            ));
        }

        Ok(GeoNearOperation {
            near_query,
            distance_field,
            index_key: None,
        })
    }

    /// Returns a copy of this stage that names the geospatial index to use.
    ///
    /// An empty or blank key leaves the `key` entry out of the rendered stage.
    pub fn use_index(&self, key: impl Into<String>) -> Self {
        GeoNearOperation {
            near_query: self.near_query.clone(),
            distance_field: self.distance_field.clone(),
            index_key: Some(key.into()),
        }
    }

    pub fn near_query(&self) -> &NearQuery {
        &self.near_query
    }

    pub fn distance_field(&self) -> &str {
        &self.distance_field
    }

    pub fn index_key(&self) -> Option<&str> {
        self.index_key.as_deref()
    }

    fn effective_index_key(&self) -> Option<&str> {
        self.index_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }
}

impl AggregationOperation for GeoNearOperation {
    fn operator(&self) -> &str {
        GEO_NEAR
    }

    fn to_document(&self, context: &dyn AggregationOperationContext) -> DocmapResult<Document> {
        let mut command = context.get_mapped_command(&self.near_query.to_document()?)?;
        command.remove(COLLATION);
        command.put(DISTANCE_FIELD, self.distance_field.as_str())?;

        if let Some(key) = self.effective_index_key() {
            command.put(INDEX_KEY, key)?;
        }

        Document::single(GEO_NEAR, command)
    }

    /// Renders `$geoNear` followed by `$skip` and `$limit` stages.
    ///
    /// The server no longer accepts `num` inside `$geoNear`, so a limit is
    /// moved into its own stage.
    fn to_pipeline_stages(
        &self,
        context: &dyn AggregationOperationContext,
    ) -> DocmapResult<Vec<Document>> {
        let mut stage = self.to_document(context)?;
        let limit = stage
            .get_document_mut(GEO_NEAR)
            .and_then(|command| command.remove(NUM));

        let mut stages = vec![stage];
        if let Some(skip) = self.near_query.skip().filter(|skip| *skip > 0) {
            stages.push(Document::single("$skip", Value::try_from(skip)?)?);
        }
        if let Some(limit) = limit {
            let limit = limit.as_i64().ok_or_else(|| {
                log::error!("Near query limit rendered as {}", limit.type_name());
                DocmapError::new(
                    "Near query limit must be an integer",
                    ErrorKind::InvalidDataType,
                )
            })?;
            stages.push(Document::single("$limit", Value::I64(limit))?);
        }

        log::debug!("Rendered {} as {} pipeline stages", GEO_NEAR, stages.len());
        Ok(stages)
    }
}
