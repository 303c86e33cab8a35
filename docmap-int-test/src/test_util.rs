use chrono::{DateTime, TimeZone, Utc};
use docmap::aggregation::FieldMappingContext;
use docmap::config::{AuditingConfig, DocmapConfig};
use docmap::errors::DocmapResult;
use docmap::hints::DriverSupport;
use docmap::mapping::{
    Auditable, AuditingEntityCallback, AuditingHandler, DateTimeProvider, EntityCallbacks,
    FixedAuditor, IsNewAwareAuditingHandler,
};
use std::sync::Arc;

/// Runs `test` between `before` and `after`, panicking with the first error.
///
/// `after` also runs when the test fails.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> DocmapResult<()>,
    B: Fn() -> DocmapResult<TestContext>,
    A: Fn(TestContext) -> DocmapResult<()>,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let test_result = test(ctx.clone());
    let after_result = after(ctx);

    if let Err(e) = test_result {
        panic!("Test failed: {:?}", e);
    }
    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

/// Shared state handed to every integration test.
#[derive(Clone)]
pub struct TestContext {
    config: DocmapConfig,
    callbacks: EntityCallbacks<Person>,
}

impl TestContext {
    pub fn config(&self) -> &DocmapConfig {
        &self.config
    }

    pub fn callbacks(&self) -> &EntityCallbacks<Person> {
        &self.callbacks
    }
}

pub fn create_test_context() -> DocmapResult<TestContext> {
    create_context_with(DriverSupport::new(true, true), AuditingConfig::default())
}

pub fn create_blocking_test_context() -> DocmapResult<TestContext> {
    create_context_with(DriverSupport::new(true, false), AuditingConfig::default())
}

pub fn create_context_with(
    drivers: DriverSupport,
    auditing: AuditingConfig,
) -> DocmapResult<TestContext> {
    let config = DocmapConfig::builder()
        .driver_support(drivers)
        .auditing(auditing)
        .build()?;
    let callbacks = EntityCallbacks::from_config(&config);
    Ok(TestContext { config, callbacks })
}

/// Registers an auditing callback that stamps `auditor` at [fixed_instant].
pub fn register_auditing(ctx: &TestContext, auditor: &str) -> bool {
    let handler: Arc<dyn AuditingHandler<Person>> = Arc::new(
        IsNewAwareAuditingHandler::new(ctx.config().auditing())
            .with_auditor_aware(FixedAuditor::new(auditor))
            .with_date_time_provider(FixedClock(fixed_instant())),
    );
    ctx.callbacks()
        .add_before_convert(AuditingEntityCallback::new(move || handler.clone()))
}

pub fn cleanup(_ctx: TestContext) -> DocmapResult<()> {
    Ok(())
}

pub fn fixed_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0)
        .single()
        .unwrap()
}

pub struct FixedClock(pub DateTime<Utc>);

impl DateTimeProvider for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Field mapping of [Person] properties to storage field names.
pub fn person_field_mapping(strict: bool) -> FieldMappingContext {
    FieldMappingContext::builder()
        .map_property("id", "_id")
        .map_property("name", "n")
        .map_property("address", "addr")
        .map_property("address.city", "addr.c")
        .map_property("location", "loc")
        .strict(strict)
        .build()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub id: Option<u64>,
    pub name: String,
    pub created_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_by: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Person {
    pub fn new(name: &str) -> Self {
        Person {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn persisted(id: u64, name: &str) -> Self {
        Person {
            id: Some(id),
            ..Self::new(name)
        }
    }
}

impl Auditable for Person {
    fn is_new(&self) -> bool {
        self.id.is_none()
    }

    fn set_created_by(&mut self, auditor: &str) {
        self.created_by = Some(auditor.to_string());
    }

    fn set_created_date(&mut self, date: DateTime<Utc>) {
        self.created_at = Some(date);
    }

    fn set_last_modified_by(&mut self, auditor: &str) {
        self.modified_by = Some(auditor.to_string());
    }

    fn set_last_modified_date(&mut self, date: DateTime<Utc>) {
        self.modified_at = Some(date);
    }
}
