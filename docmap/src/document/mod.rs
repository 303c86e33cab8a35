//! Wire-format documents and values.

#[allow(clippy::module_inception)]
mod document;
mod value;

pub use document::*;
pub use value::*;

/// Creates a [Document] from key/value pairs.
///
/// Keys are string literals or identifiers. Values are literals, nested
/// `{ ... }` documents, `[ ... ]` arrays or parenthesised expressions.
///
/// ```rust,ignore
/// let stage = doc! {
///     "$geoNear": {
///         "near": [(-73.99), 40.73],
///         "distanceField": "dist.calculated",
///         "maxDistance": (max / 6378.137),
///     }
/// };
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::document::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::document::Document::new();
            $(
                doc.put(&$crate::document::normalize(stringify!($key)), $crate::doc_value!($value))
                    .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro converting values for [`doc!`].
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::document::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::document::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::document::Value::from($value)
    };
}
