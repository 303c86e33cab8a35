use docmap::aggregation::{
    Aggregation, GeoNearOperation, LimitOperation, MatchOperation, NoOpAggregationContext,
    SkipOperation,
};
use docmap::doc;
use docmap::document::Value;
use docmap::errors::ErrorKind;
use docmap::geo::{Distance, Metric, NearQuery, Point};
use docmap_int_test::test_util::person_field_mapping;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_geo_near_pipeline_with_mapping() {
    let query = NearQuery::near(Point::new(2.35, 48.85))
        .with_max_distance(Distance::new(5.0, Metric::Kilometers).unwrap())
        .with_query(doc! { "name": "Ada" })
        .with_limit(25)
        .unwrap();
    let geo_near = GeoNearOperation::new(query, "distance")
        .unwrap()
        .use_index("location");

    let pipeline = Aggregation::new()
        .stage(geo_near)
        .stage(MatchOperation::new(doc! { "address.city": "Paris" }))
        .stage(SkipOperation::new(10))
        .to_pipeline(&person_field_mapping(false))
        .unwrap();

    let operators: Vec<_> = pipeline.iter().filter_map(|s| s.first_key()).collect();
    assert_eq!(operators, vec!["$geoNear", "$limit", "$match", "$skip"]);

    let command = pipeline[0].get_document("$geoNear").unwrap();
    assert!(command.get_document("query").unwrap().contains_key("n"));
    assert_eq!(command.get("key"), Some(&Value::from("location")));
    assert!(!command.contains_key("num"));
    assert_eq!(pipeline[1].get("$limit"), Some(&Value::I64(25)));
    assert!(pipeline[2]
        .get_document("$match")
        .unwrap()
        .contains_key("addr.c"));
}

#[test]
fn test_geo_near_after_other_stages_is_rejected() {
    let geo_near = GeoNearOperation::new(NearQuery::near(Point::new(0.0, 0.0)), "d").unwrap();
    let err = Aggregation::new()
        .stage(LimitOperation::new(1).unwrap())
        .stage(geo_near)
        .to_pipeline(&NoOpAggregationContext)
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::ValidationError);
}

#[test]
fn test_zero_limit_is_rejected() {
    assert!(LimitOperation::new(0).is_err());
    assert!(NearQuery::near(Point::new(0.0, 0.0)).with_limit(0).is_err());
}
