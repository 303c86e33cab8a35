use crate::document::{Document, Value};
use crate::errors::{DocmapError, DocmapResult, ErrorKind};
use crate::geo::{Distance, Metric, Point};

/// A typed geospatial proximity query: an origin, optional distance bounds,
/// the metric results are reported in, and an optional filter.
///
/// A `NearQuery` is built once and then only read. Every builder method
/// consumes the query and returns the updated value.
///
/// ```rust,ignore
/// let query = NearQuery::near(Point::new(-73.99, 40.73))
///     .in_metric(Metric::Kilometers)
///     .with_max_distance(Distance::new(10.0, Metric::Kilometers)?)
///     .with_limit(20)?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NearQuery {
    point: Point,
    geo_json: bool,
    metric: Metric,
    max_distance: Option<Distance>,
    min_distance: Option<Distance>,
    spherical: bool,
    query: Option<Document>,
    limit: Option<u64>,
    skip: Option<u64>,
}

impl NearQuery {
    /// A query around a legacy coordinate pair in neutral units.
    pub fn near(point: Point) -> Self {
        Self::near_with_metric(point, Metric::Neutral)
    }

    /// A query around a legacy coordinate pair reporting distances in `metric`.
    pub fn near_with_metric(point: Point, metric: Metric) -> Self {
        NearQuery {
            point,
            geo_json: false,
            metric: Metric::Neutral,
            max_distance: None,
            min_distance: None,
            spherical: false,
            query: None,
            limit: None,
            skip: None,
        }
        .in_metric(metric)
    }

    /// A query around a GeoJSON point. Distances are sent in meters and the
    /// query is always spherical.
    pub fn near_geo_json(point: Point) -> Self {
        NearQuery {
            geo_json: true,
            ..Self::near(point)
        }
    }

    /// Reports distances in `metric`. A non-neutral metric makes the query
    /// spherical.
    pub fn in_metric(mut self, metric: Metric) -> Self {
        if metric != Metric::Neutral {
            self.spherical = true;
        }
        self.metric = metric;
        self
    }

    pub fn with_spherical(mut self, spherical: bool) -> Self {
        self.spherical = spherical;
        self
    }

    /// Sets the upper distance bound. A non-neutral distance makes the query
    /// spherical, and its metric is adopted while the query metric is still
    /// neutral.
    pub fn with_max_distance(mut self, distance: Distance) -> Self {
        self = self.adopt_metric(&distance);
        self.max_distance = Some(distance);
        self
    }

    /// Sets the upper distance bound in the query's current metric.
    ///
    /// # Errors
    /// Returns an error for negative or non-finite values.
    pub fn with_max_distance_value(self, value: f64) -> DocmapResult<Self> {
        let distance = Distance::new(value, self.metric)?;
        Ok(self.with_max_distance(distance))
    }

    /// Sets the lower distance bound, with the same metric rules as
    /// [`with_max_distance`](Self::with_max_distance).
    pub fn with_min_distance(mut self, distance: Distance) -> Self {
        self = self.adopt_metric(&distance);
        self.min_distance = Some(distance);
        self
    }

    /// Sets the lower distance bound in the query's current metric.
    ///
    /// # Errors
    /// Returns an error for negative or non-finite values.
    pub fn with_min_distance_value(self, value: f64) -> DocmapResult<Self> {
        let distance = Distance::new(value, self.metric)?;
        Ok(self.with_min_distance(distance))
    }

    /// Restricts candidate documents with a filter query.
    pub fn with_query(mut self, query: Document) -> Self {
        self.query = Some(query);
        self
    }

    /// Caps the number of results.
    ///
    /// # Errors
    /// Returns an error if `limit` is zero.
    pub fn with_limit(mut self, limit: u64) -> DocmapResult<Self> {
        if limit == 0 {
            log::error!("Near query limit must be greater than zero");
            return Err(DocmapError::new(
                "Near query limit must be greater than zero",
                ErrorKind::ValidationError,
            ));
        }
        self.limit = Some(limit);
        Ok(self)
    }

    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    fn adopt_metric(mut self, distance: &Distance) -> Self {
        if distance.metric() != Metric::Neutral {
            self.spherical = true;
        }
        if self.metric == Metric::Neutral {
            self.metric = distance.metric();
        }
        self
    }

    pub fn point(&self) -> &Point {
        &self.point
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn max_distance(&self) -> Option<&Distance> {
        self.max_distance.as_ref()
    }

    pub fn min_distance(&self) -> Option<&Distance> {
        self.min_distance.as_ref()
    }

    pub fn is_spherical(&self) -> bool {
        self.spherical || self.geo_json
    }

    pub fn uses_geo_json(&self) -> bool {
        self.geo_json
    }

    pub fn query(&self) -> Option<&Document> {
        self.query.as_ref()
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn skip(&self) -> Option<u64> {
        self.skip
    }

    /// Multiplier the server applies to computed distances so they come back
    /// in the query metric.
    pub fn distance_multiplier(&self) -> f64 {
        if self.geo_json {
            1.0 / self.metric.meters_per_unit()
        } else {
            self.metric.multiplier()
        }
    }

    fn distance_on_wire(&self, distance: &Distance) -> f64 {
        if self.geo_json {
            distance.in_meters()
        } else {
            distance.normalized_value()
        }
    }

    /// Serializes the query into the body of a `$geoNear` command, before any
    /// field-name mapping is applied.
    ///
    /// Key order: `query`, `maxDistance`, `minDistance`, `distanceMultiplier`,
    /// `num`, `near`, `spherical`.
    pub fn to_document(&self) -> DocmapResult<Document> {
        let mut document = Document::new();

        if let Some(query) = &self.query {
            document.put("query", query.clone())?;
        }
        if let Some(max_distance) = &self.max_distance {
            document.put("maxDistance", self.distance_on_wire(max_distance))?;
        }
        if let Some(min_distance) = &self.min_distance {
            document.put("minDistance", self.distance_on_wire(min_distance))?;
        }
        document.put("distanceMultiplier", self.distance_multiplier())?;
        if let Some(limit) = self.limit {
            document.put("num", Value::try_from(limit)?)?;
        }
        if self.geo_json {
            document.put("near", self.point.to_geo_json()?)?;
        } else {
            document.put("near", self.point.to_legacy_pair())?;
        }
        document.put("spherical", self.is_spherical())?;

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn origin() -> Point {
        Point::new(-73.99, 40.73)
    }

    #[test]
    fn minimal_query_serializes_near_multiplier_and_spherical() {
        let doc = NearQuery::near(origin()).to_document().unwrap();
        assert_eq!(
            doc.keys().collect::<Vec<_>>(),
            vec!["distanceMultiplier", "near", "spherical"]
        );
        assert_eq!(doc.get("distanceMultiplier"), Some(&Value::F64(1.0)));
        assert_eq!(doc.get("spherical"), Some(&Value::Bool(false)));
        assert_eq!(doc.get("near"), Some(&origin().to_legacy_pair()));
    }

    #[test]
    fn kilometer_distances_are_sent_in_radians() {
        let query = NearQuery::near(origin())
            .with_max_distance(Distance::new(6378.137, Metric::Kilometers).unwrap());
        assert_eq!(query.metric(), Metric::Kilometers);
        assert!(query.is_spherical());

        let doc = query.to_document().unwrap();
        let max = doc.get("maxDistance").and_then(Value::as_f64).unwrap();
        assert!((max - 1.0).abs() < 1e-12);
        assert_eq!(doc.get("distanceMultiplier"), Some(&Value::F64(6378.137)));
        assert_eq!(doc.get("spherical"), Some(&Value::Bool(true)));
    }

    #[test]
    fn geo_json_distances_are_sent_in_meters() {
        let query = NearQuery::near_geo_json(origin())
            .in_metric(Metric::Kilometers)
            .with_min_distance(Distance::new(1.0, Metric::Kilometers).unwrap())
            .with_max_distance(Distance::new(2.5, Metric::Kilometers).unwrap());
        let doc = query.to_document().unwrap();

        assert_eq!(doc.get("minDistance"), Some(&Value::F64(1000.0)));
        assert_eq!(doc.get("maxDistance"), Some(&Value::F64(2500.0)));
        assert_eq!(doc.get("distanceMultiplier"), Some(&Value::F64(0.001)));
        assert_eq!(doc.get("spherical"), Some(&Value::Bool(true)));
        let near = doc.get_document("near").unwrap();
        assert_eq!(near.get("type"), Some(&Value::from("Point")));
    }

    #[test]
    fn geo_json_is_spherical_even_in_neutral_metric() {
        let doc = NearQuery::near_geo_json(origin()).to_document().unwrap();
        assert_eq!(doc.get("spherical"), Some(&Value::Bool(true)));
    }

    #[test]
    fn neutral_distance_keeps_explicit_metric() {
        let query = NearQuery::near_with_metric(origin(), Metric::Miles)
            .with_max_distance(Distance::neutral(0.5).unwrap());
        assert_eq!(query.metric(), Metric::Miles);
        let doc = query.to_document().unwrap();
        assert_eq!(doc.get("maxDistance"), Some(&Value::F64(0.5)));
        assert_eq!(doc.get("distanceMultiplier"), Some(&Value::F64(3963.191)));
    }

    #[test]
    fn distance_value_uses_current_metric() {
        let query = NearQuery::near_with_metric(origin(), Metric::Miles)
            .with_max_distance_value(3963.191)
            .unwrap();
        assert_eq!(query.max_distance().map(|d| d.metric()), Some(Metric::Miles));
        let max = query.to_document().unwrap().get("maxDistance").and_then(Value::as_f64).unwrap();
        assert!((max - 1.0).abs() < 1e-12);
        assert!(NearQuery::near(origin()).with_min_distance_value(-2.0).is_err());
    }

    #[test]
    fn query_and_limit_are_serialized() {
        let doc = NearQuery::near(origin())
            .with_query(doc! { "category": "cafe" })
            .with_limit(10)
            .unwrap()
            .to_document()
            .unwrap();
        assert_eq!(doc.first_key(), Some("query"));
        assert_eq!(doc.get("num"), Some(&Value::I64(10)));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = NearQuery::near(origin()).with_limit(0).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn skip_is_not_part_of_the_command() {
        let query = NearQuery::near(origin()).with_skip(5);
        assert_eq!(query.skip(), Some(5));
        assert!(!query.to_document().unwrap().contains_key("skip"));
    }

    #[test]
    fn oversized_limit_fails_to_serialize() {
        let query = NearQuery::near(origin()).with_limit(u64::MAX).unwrap();
        let err = query.to_document().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn spherical_can_be_forced_on_legacy_pairs() {
        let doc = NearQuery::near(origin()).with_spherical(true).to_document().unwrap();
        assert_eq!(doc.get("spherical"), Some(&Value::Bool(true)));
    }
}
