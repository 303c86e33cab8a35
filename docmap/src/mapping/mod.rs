//! Entity lifecycle callbacks and auditing.

mod auditing;
mod auditing_callback;
mod callback;
#[cfg(feature = "reactive")]
mod reactive;

pub use auditing::*;
pub use auditing_callback::AuditingEntityCallback;
pub use auditing_callback::AUDITING_CALLBACK_ORDER;
pub use callback::{
    AfterConvertCallback, AfterSaveCallback, BeforeConvertCallback, BeforeSaveCallback,
    EntityCallbacks, Ordered, HIGHEST_PRECEDENCE, LOWEST_PRECEDENCE,
};
#[cfg(feature = "reactive")]
pub use reactive::*;
