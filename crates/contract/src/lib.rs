//! Declarative runtime contracts for untyped data.
//!
//! A contract type declares typed fields ("properties") that validate themselves on every
//! read and write, can be populated from an untyped mapping (usually a decoded JSON document)
//! and can be serialized back into one. Application code declares the shape once instead of
//! hand-writing parse, validate and serialize logic for every type.
//!
//! # Core Concepts
//!
//! - **[`Property`]**: a validating slot with nullability, required/default and
//!   serialization rules. Its semantic type comes from a [`PropertyKind`], the extension point
//!   implemented by concrete scalar and composite property types.
//! - **[`Schema`]**: the immutable field table of a contract type, discovered once across the
//!   ancestor chain at registration. Derived declarations override inherited ones.
//! - **[`Contract`]**: the trait implemented by contract types, usually via [`contract`].
//! - **[`Policy`]**: what happens to source keys that match no field (strict, lenient, dynamic).
//!
//! # Errors
//!
//! All failures are [`ContractError`]s. Validation errors render as
//! `<TypeName><path>: <reason>`; failures inside nested contracts are re-wrapped by each
//! enclosing layer so the path leads from the outermost contract to the failing leaf.
//!
//! # Example
//!
//! ```rust
//! use lazycontract::prelude::*;
//! use serde_json::json;
//! use std::borrow::Cow;
//!
//! struct Text;
//!
//! impl PropertyKind for Text {
//!     fn type_name(&self) -> Cow<'static, str> {
//!         "string".into()
//!     }
//!
//!     fn conforms(&self, value: &Value) -> bool {
//!         value.is_string()
//!     }
//! }
//!
//! #[contract(schema = person_schema)]
//! struct Person;
//!
//! fn person_schema() -> Result<Schema, ContractError> {
//!     Schema::builder()
//!         .name("Person")
//!         .policy(Policy::Strict)
//!         .field("name", Property::builder(Text).required(true))
//!         .field("nickname", Property::builder(Text).name("nick"))
//!         .build()
//! }
//!
//! # fn main() -> Result<(), ContractError> {
//! let person = Person::from_value(json!({ "name": "Ada", "nick": "countess" }))?;
//! assert_eq!(person.get("nickname")?, "countess");
//! assert_eq!(person.to_value()?, json!({ "name": "Ada", "nick": "countess" }));
//!
//! let err = Person::from_value(json!({ "name": "Ada", "age": 36 })).unwrap_err();
//! assert_eq!(err.to_string(), "Person.age: no attribute 'age'");
//! # Ok(())
//! # }
//! ```

extern crate self as lazycontract;

mod contract;
mod error;
mod policy;
mod property;
mod record;
mod schema;

pub use contract::Contract;
pub use error::{Cause, ContractError, ContractErrorExt, Violation};
pub use lazycontract_derive::{contract, contract_error};
pub use policy::Policy;
pub use property::{ANONYMOUS, Property, PropertyBuilder, PropertyKind, Slots};
pub use record::Record;
pub use schema::{Schema, SchemaBuilder, SchemaCell};
pub use serde;
pub use serde_json::{Map, Value};

pub mod prelude {
    pub use crate::contract::Contract;
    pub use crate::error::{ContractError, ContractErrorExt, Violation};
    pub use crate::policy::Policy;
    pub use crate::property::{Property, PropertyKind};
    pub use crate::schema::Schema;
    pub use lazycontract_derive::contract;
    pub use serde_json::Value;
}

pub mod builders {
    pub use crate::schema::{NoName, WithName};
}
