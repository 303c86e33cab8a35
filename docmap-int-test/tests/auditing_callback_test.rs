use docmap::config::AuditingConfig;
use docmap::doc;
use docmap::errors::{DocmapError, DocmapResult, ErrorKind};
use docmap::hints::{CallbackKind, DriverSupport};
use docmap::mapping::{
    AuditingEntityCallback, AuditingHandler, BeforeConvertCallback, BeforeSaveCallback, Ordered,
};
use docmap::document::Document;
use docmap_int_test::test_util::{
    cleanup, create_blocking_test_context, create_context_with, create_test_context,
    fixed_instant, register_auditing, run_test, Person,
};
use std::sync::Arc;

#[ctor::ctor]
fn init() {
    colog::init();
}

struct Rename(&'static str, i32);

impl Ordered for Rename {
    fn order(&self) -> i32 {
        self.1
    }
}

impl BeforeConvertCallback<Person> for Rename {
    fn on_before_convert(&self, mut entity: Person, _collection: &str) -> DocmapResult<Person> {
        entity.name = self.0.to_string();
        Ok(entity)
    }
}

struct WriteAuditor;

impl Ordered for WriteAuditor {}

impl BeforeSaveCallback<Person> for WriteAuditor {
    fn on_before_save(
        &self,
        entity: Person,
        document: &mut Document,
        _collection: &str,
    ) -> DocmapResult<Person> {
        if let Some(auditor) = &entity.created_by {
            document.put("createdBy", auditor.as_str())?;
        }
        Ok(entity)
    }
}

struct Rejecting;

impl AuditingHandler<Person> for Rejecting {
    fn mark_audited(&self, _entity: Person) -> DocmapResult<Person> {
        Err(DocmapError::new("auditing failed", ErrorKind::AuditingError))
    }
}

#[test]
fn test_new_entity_is_stamped_before_convert() {
    run_test(
        create_test_context,
        |ctx| {
            assert!(register_auditing(&ctx, "ada"));
            let person = ctx
                .callbacks()
                .callback_before_convert(Person::new("Grace"), "people")?;

            assert_eq!(person.created_by.as_deref(), Some("ada"));
            assert_eq!(person.created_at, Some(fixed_instant()));
            assert_eq!(person.modified_by.as_deref(), Some("ada"));
            assert_eq!(person.modified_at, Some(fixed_instant()));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_existing_entity_only_gets_modified() {
    run_test(
        create_test_context,
        |ctx| {
            register_auditing(&ctx, "ada");
            let person = ctx
                .callbacks()
                .callback_before_convert(Person::persisted(3, "Grace"), "people")?;

            assert!(person.created_by.is_none());
            assert!(person.created_at.is_none());
            assert_eq!(person.modified_by.as_deref(), Some("ada"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_auditing_config_is_honoured() {
    run_test(
        || {
            create_context_with(
                DriverSupport::new(true, false),
                AuditingConfig::new()
                    .with_modify_on_creation(false)
                    .with_dates_enabled(false),
            )
        },
        |ctx| {
            register_auditing(&ctx, "ada");
            let person = ctx
                .callbacks()
                .callback_before_convert(Person::new("Grace"), "people")?;

            assert_eq!(person.created_by.as_deref(), Some("ada"));
            assert!(person.created_at.is_none());
            assert!(person.modified_by.is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_auditing_runs_by_order_among_other_callbacks() {
    run_test(
        create_blocking_test_context,
        |ctx| {
            ctx.callbacks().add_before_convert(Rename("late", 200));
            register_auditing(&ctx, "ada");
            ctx.callbacks().add_before_convert(Rename("early", 1));
            assert_eq!(ctx.callbacks().count(CallbackKind::BeforeConvert), 3);

            let person = ctx
                .callbacks()
                .callback_before_convert(Person::new("Grace"), "people")?;
            assert_eq!(person.name, "late");
            assert!(person.created_by.is_some());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_audited_entity_reaches_before_save() {
    run_test(
        create_test_context,
        |ctx| {
            register_auditing(&ctx, "ada");
            ctx.callbacks().add_before_save(WriteAuditor);

            let person = ctx
                .callbacks()
                .callback_before_convert(Person::new("Grace"), "people")?;
            let mut document = doc! { "name": "Grace" };
            ctx.callbacks()
                .callback_before_save(person, &mut document, "people")?;

            assert_eq!(
                document.get("createdBy").and_then(|v| v.as_str()),
                Some("ada")
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_handler_failure_propagates() {
    run_test(
        create_test_context,
        |ctx| {
            let handler: Arc<dyn AuditingHandler<Person>> = Arc::new(Rejecting);
            ctx.callbacks()
                .add_before_convert(AuditingEntityCallback::new(move || handler.clone()));

            let err = ctx
                .callbacks()
                .callback_before_convert(Person::new("Grace"), "people")
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::AuditingError);
            assert_eq!(err.message(), "auditing failed");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_callback_order_defaults_to_100() {
    let callback = AuditingEntityCallback::<Person>::new(|| Arc::new(Rejecting));
    assert_eq!(callback.order(), 100);
    assert!(!callback.is_handler_resolved());
}

#[test]
fn test_fixed_instant_is_deterministic() {
    assert_eq!(fixed_instant().to_rfc3339(), "2024-01-15T09:30:00+00:00");
    assert_eq!(fixed_instant(), fixed_instant());
}
