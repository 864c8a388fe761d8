//! # Graph Module
//!
//! The graph is the intermediate representation every generation stage reads:
//! schemas (data models), controllers (request handlers) and routes.
//!
//! ## Overview
//!
//! Upstream producers (a canvas editor, a script, a hand-written JSON file) hand
//! us whatever they have. [`normalize`] repairs that into a well-formed
//! [`Graph`] and never fails:
//!
//! - non-object schema entries and field definitions are discarded
//! - field types are reduced to their first token and canonicalized
//!   (`"string"`, `"STRING"`, `"String email"` → `String`)
//! - every `User` schema gets the bcrypt `pre-save` hook
//! - the user-management slice (three controllers, three routes) is always present
//!
//! ```rust
//! use serde_json::json;
//! use skelgen::graph::{normalize, FieldType};
//!
//! let graph = normalize(&json!({
//!     "schemas": [{ "name": "Product", "fields": { "price": { "type": "number" } } }]
//! }));
//! assert_eq!(graph.routes.len(), 3);
//! let price = graph.schemas[0].fields.get("price").unwrap();
//! assert_eq!(price.ty, FieldType::Number);
//! ```
//!
//! ## Ordering
//!
//! Field and hook maps are [`OrderedMap`]s and groups follow first appearance,
//! so prompts and documentation come out identical across runs.

mod normalize;
mod ordered;
mod types;

pub use normalize::{
    normalize, normalize_with, HandlerScope, CANONICAL_HANDLERS, CANONICAL_ROUTES,
    DEFAULT_SCHEMA_NAME, USERS_PROJECT_NAME, USER_PRE_SAVE_HOOK,
};
pub use ordered::OrderedMap;
pub use types::{
    Field, FieldMap, FieldType, Graph, Handler, HookMap, HttpMethod, Route, Schema,
    DEFAULT_PROJECT_NAME,
};
