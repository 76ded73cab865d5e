//! Canonical data values with dot-path addressing, deep merge and patches.
//!
//! Documents are trees of a small closed set of value kinds. They can be
//! built from host types, addressed with dot-delimited paths, merged,
//! patched, stored as tagged text and decoded back into host types.
//!
//! # Key Features
//!
//! - **Canonical values**: integer widths collapse to `Int`/`UInt`, float widths to `Float`
//! - **Dot paths**: `a.0.c` addresses mapping keys and sequence indices alike
//! - **Additive merge**: mappings union, same-shaped sequences append, `Null` never overwrites
//! - **Patches**: ordered delete-then-merge actions applied to a private copy
//! - **Stable text form**: `<json>{...}` with keys in ascending order
//!
//! # Architecture
//!
//! - [`Value`]: a canonical value; [`Mapping`] is its key → value table
//! - [`Data`]: a top-level document, whose root is always a mapping
//! - [`Path`]: a parsed dot-delimited query
//! - [`merge`]/[`merge_into`]: the deep merge engine
//! - [`Patch`]/[`PatchAction`]: ordered document updates
//! - [`Encoder`]/[`to_value`]: building values from any `Serialize` type
//! - [`from_value`]/[`Data::decode_query`]: reading values into any `Deserialize` type
//!
//! # Example
//!
//! ```rust
//! use quarto_data::{Data, Patch, PatchAction, Value};
//!
//! let base = Data::parse(r#"<json>{"format":{"toc":false},"filters":["a"]}"#)?;
//! let patch = Patch::new().with_action(
//!     PatchAction::new()
//!         .delete("format.toc")
//!         .update("", Data::parse(r#"<json>{"filters":["b"]}"#)?),
//! );
//!
//! let patched = patch.apply(&base)?;
//! assert_eq!(patched.query("filters.1"), Some(&Value::from("b")));
//! assert_eq!(patched.to_string(), r#"<json>{"filters":["a","b"],"format":{}}"#);
//! # Ok::<(), quarto_data::DataError>(())
//! ```

mod codec;
mod data;
mod de;
mod error;
mod merge;
mod patch;
mod path;
mod ser;
mod value;

pub use value::{
    Mapping,
    Shape,
    Value,
    ValueKind,
};

pub use path::{
    PATH_SEPARATOR,
    Path,
};

pub use merge::{
    merge,
    merge_into,
};

pub use data::Data;

pub use patch::{
    Patch,
    PatchAction,
};

pub use codec::{
    FORMAT_BEGIN,
    FORMAT_END,
    JSON_FORMAT,
    JsonStyle,
};

pub use ser::{
    Encoder,
    to_data,
    to_value,
};

pub use de::from_value;

pub use error::{
    DataError,
    Result,
};
