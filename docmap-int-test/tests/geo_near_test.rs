use docmap::aggregation::{
    AggregationOperation, AggregationOperationContext, FieldMappingContext, GeoNearOperation,
    NoOpAggregationContext,
};
use docmap::doc;
use docmap::document::{Document, Value};
use docmap::errors::{DocmapResult, ErrorKind};
use docmap::geo::{Distance, Metric, NearQuery, Point};
use docmap_int_test::test_util::person_field_mapping;
use std::sync::atomic::{AtomicUsize, Ordering};

#[ctor::ctor]
fn init() {
    colog::init();
}

struct CountingContext {
    calls: AtomicUsize,
}

impl AggregationOperationContext for CountingContext {
    fn get_mapped_object(&self, document: &Document) -> DocmapResult<Document> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut mapped = document.clone();
        mapped.put("collation", doc! { "locale": "en" })?;
        Ok(mapped)
    }
}

fn origin() -> Point {
    Point::new(-73.99, 40.73)
}

fn command(stage: &Document) -> &Document {
    stage.get_document("$geoNear").unwrap()
}

fn as_f64(document: &Document, key: &str) -> f64 {
    document.get(key).and_then(Value::as_f64).unwrap()
}

#[test]
fn test_rejects_empty_and_blank_distance_fields() {
    for field in ["", "   "] {
        let err = GeoNearOperation::new(NearQuery::near(origin()), field).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
        assert_eq!(err.message(), "Distance field must not be null or empty");
    }
}

#[test]
fn test_renders_single_geo_near_stage() {
    let op = GeoNearOperation::new(NearQuery::near(origin()), "dist").unwrap();
    let stage = op.to_document(&NoOpAggregationContext).unwrap();

    assert_eq!(stage.size(), 1);
    assert_eq!(stage.first_key(), Some("$geoNear"));
    let command = command(&stage);
    assert_eq!(command.get("distanceField"), Some(&Value::from("dist")));
    assert!(!command.contains_key("key"));
    assert_eq!(
        command.keys().collect::<Vec<_>>(),
        vec!["distanceMultiplier", "near", "spherical", "distanceField"]
    );
}

#[test]
fn test_use_index_returns_new_operation() {
    let op = GeoNearOperation::new(NearQuery::near(origin()), "dist").unwrap();
    let indexed = op.use_index("location");

    assert_eq!(op.index_key(), None);
    assert_eq!(indexed.index_key(), Some("location"));

    let stage = indexed.to_document(&NoOpAggregationContext).unwrap();
    assert_eq!(command(&stage).get("key"), Some(&Value::from("location")));
    assert_eq!(command(&stage).keys().last(), Some("key"));

    let stage = op.to_document(&NoOpAggregationContext).unwrap();
    assert!(!command(&stage).contains_key("key"));
}

#[test]
fn test_blank_index_key_is_omitted() {
    let op = GeoNearOperation::new(NearQuery::near(origin()), "dist")
        .unwrap()
        .use_index(" ");
    let stage = op.to_document(&NoOpAggregationContext).unwrap();
    assert!(!command(&stage).contains_key("key"));
}

#[test]
fn test_context_called_once_and_collation_removed() {
    let context = CountingContext {
        calls: AtomicUsize::new(0),
    };
    let op = GeoNearOperation::new(NearQuery::near(origin()), "dist").unwrap();
    let stage = op.to_document(&context).unwrap();

    assert_eq!(context.calls.load(Ordering::SeqCst), 1);
    assert!(!command(&stage).contains_key("collation"));
}

#[test]
fn test_query_fields_are_mapped() {
    let query = NearQuery::near(origin()).with_query(doc! {
        "name": "Ada",
        "address.city": { "$in": ["Paris", "Rome"] },
    });
    let op = GeoNearOperation::new(query, "dist").unwrap();
    let stage = op.to_document(&person_field_mapping(true)).unwrap();

    let mapped_query = command(&stage).get_document("query").unwrap();
    assert_eq!(mapped_query.keys().collect::<Vec<_>>(), vec!["n", "addr.c"]);
    assert!(mapped_query.get_document("addr.c").unwrap().contains_key("$in"));
}

#[test]
fn test_geo_json_command_is_not_renamed() {
    let query = NearQuery::near_geo_json(Point::new(1.0, 2.0)).with_query(doc! { "name": "Ada" });
    let op = GeoNearOperation::new(query, "dist").unwrap();
    let mapping = FieldMappingContext::builder()
        .map_property("name", "n")
        .map_property("type", "kind")
        .map_property("near", "nearBy")
        .build();

    let stage = op.to_document(&mapping).unwrap();
    let body = command(&stage);
    assert!(body.contains_key("near"));
    assert!(!body.contains_key("nearBy"));
    let near = body.get_document("near").unwrap();
    assert_eq!(near.keys().collect::<Vec<_>>(), vec!["type", "coordinates"]);
    assert!(body.get_document("query").unwrap().contains_key("n"));
}

#[test]
fn test_strict_mapping_rejects_unknown_query_fields() {
    let query = NearQuery::near(origin()).with_query(doc! { "nickname": "ada" });
    let op = GeoNearOperation::new(query, "dist").unwrap();

    let err = op.to_document(&person_field_mapping(true)).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidFieldName);

    let stage = op.to_document(&person_field_mapping(false)).unwrap();
    let query = command(&stage).get_document("query").unwrap();
    assert!(query.contains_key("nickname"));
}

#[test]
fn test_kilometers_are_normalized_for_legacy_points() {
    let query = NearQuery::near(origin())
        .with_max_distance(Distance::new(10.0, Metric::Kilometers).unwrap())
        .with_min_distance(Distance::new(1.0, Metric::Kilometers).unwrap());
    let op = GeoNearOperation::new(query, "dist").unwrap();
    let stage = op.to_document(&NoOpAggregationContext).unwrap();
    let command = command(&stage);

    assert!((as_f64(command, "maxDistance") - 10.0 / 6378.137).abs() < 1e-12);
    assert!((as_f64(command, "minDistance") - 1.0 / 6378.137).abs() < 1e-12);
    assert!((as_f64(command, "distanceMultiplier") - 6378.137).abs() < 1e-9);
    assert_eq!(command.get("spherical"), Some(&Value::Bool(true)));
}

#[test]
fn test_geo_json_distances_are_sent_in_meters() {
    let query = NearQuery::near_geo_json(origin())
        .with_max_distance(Distance::new(2.0, Metric::Miles).unwrap());
    let op = GeoNearOperation::new(query, "dist").unwrap();
    let stage = op.to_document(&NoOpAggregationContext).unwrap();
    let command = command(&stage);

    assert!((as_f64(command, "maxDistance") - 2.0 * 1609.344).abs() < 1e-9);
    assert!((as_f64(command, "distanceMultiplier") - 1.0 / 1609.344).abs() < 1e-12);
    let near = command.get_document("near").unwrap();
    assert_eq!(near.get("type"), Some(&Value::from("Point")));
    assert_eq!(command.get("spherical"), Some(&Value::Bool(true)));
}

#[test]
fn test_pipeline_stages_move_limit_and_skip_out() {
    let query = NearQuery::near(origin())
        .with_limit(10)
        .unwrap()
        .with_skip(5);
    let op = GeoNearOperation::new(query, "dist").unwrap();

    let single = op.to_document(&NoOpAggregationContext).unwrap();
    assert_eq!(command(&single).get("num"), Some(&Value::I64(10)));

    let stages = op.to_pipeline_stages(&NoOpAggregationContext).unwrap();
    assert_eq!(stages.len(), 3);
    assert!(!command(&stages[0]).contains_key("num"));
    assert_eq!(stages[1].get("$skip"), Some(&Value::I64(5)));
    assert_eq!(stages[2].get("$limit"), Some(&Value::I64(10)));
}
