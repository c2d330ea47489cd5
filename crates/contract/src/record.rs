//! # Contract Records
//!
//! A [`Record`] is the state of one contract instance: the validated field values keyed by
//! identifier, plus, for [`Policy::Dynamic`] schemas, the raw extras that matched no field.
//!
//! Construction is fail-fast. The first failure aborts population and no partial record is
//! returned.

use crate::error::{ContractError, Violation};
use crate::policy::Policy;
use crate::property::Slots;
use crate::schema::Schema;
use serde::ser::{Error as _, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// The validated state of a contract instance.
#[derive(Clone)]
pub struct Record {
    schema: Arc<Schema>,
    slots: Slots,
    extras: Vec<(String, Value)>,
}

impl Record {
    /// Builds a record from either a source mapping or named field values, never both.
    ///
    /// # Errors
    /// - [`ContractError::Configuration`] if both `document` and non-empty `fields` are given.
    /// - [`ContractError::Validation`] for any population failure.
    pub fn new(
        schema: Arc<Schema>,
        document: Option<Value>,
        fields: Map<String, Value>,
    ) -> Result<Self, ContractError> {
        let source = match document {
            Some(_) if !fields.is_empty() => {
                return Err(ContractError::Configuration {
                    message: "both a source mapping and named fields were provided".into(),
                    context: Some(format!("contract {}", schema.name()).into()),
                });
            },
            Some(document) => document,
            None => Value::Object(fields),
        };
        Self::from_value(schema, source)
    }

    /// Builds a record from a source mapping.
    ///
    /// # Errors
    /// Returns [`ContractError::Validation`] if `source` is not a mapping, a required or
    /// non-nullable field is missing, or any value fails its property.
    pub fn from_value(schema: Arc<Schema>, source: Value) -> Result<Self, ContractError> {
        let result = Self::populate(schema, source);
        if let Err(err) = &result {
            debug!(error = %err, "Contract construction failed");
        }
        result
    }

    fn populate(schema: Arc<Schema>, source: Value) -> Result<Self, ContractError> {
        let source = match source {
            Value::Object(map) => map,
            other => {
                return Err(ContractError::validation(
                    schema.name().to_owned(),
                    "",
                    Violation::NotMapping,
                    format!("'{other}' is not a mapping"),
                ));
            },
        };
        schema.check_presence(&source)?;

        let mut record = Self { schema, slots: Slots::default(), extras: Vec::new() };
        match record.schema.policy() {
            Policy::Dynamic => {
                let (declared, extras): (Map<String, Value>, Map<String, Value>) =
                    source.into_iter().partition(|(key, _)| record.schema.is_declared_key(key));
                record.assign_all(declared, false)?;
                for (key, value) in extras {
                    trace!(contract = %record.schema.name(), key = %key, "Captured undeclared key");
                    record.extras.push((key, value));
                }
            },
            policy => record.assign_all(source, policy.rejects_undeclared())?,
        }
        Ok(record)
    }

    fn assign_all(&mut self, source: Map<String, Value>, strict: bool) -> Result<(), ContractError> {
        let schema = Arc::clone(&self.schema);
        for (key, value) in source {
            let ident = schema.resolve(&key);
            let Some(property) = schema.field(ident) else {
                if strict {
                    return Err(ContractError::validation(
                        schema.name().to_owned(),
                        format!(".{ident}"),
                        Violation::InvalidAttr,
                        format!("no attribute '{ident}'"),
                    ));
                }
                trace!(contract = %schema.name(), key = %key, "Dropped undeclared key");
                continue;
            };

            let value = if value.is_null() {
                value
            } else {
                property
                    .deserialize(value)
                    .map_err(|err| err.nest(schema.name(), ident, Violation::Deserialize))?
            };
            property.write(&mut self.slots, value).map_err(|err| err.scoped(schema.name()))?;
        }
        Ok(())
    }

    /// The schema of the contract type this record belongs to.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Reads a field by identifier, re-validating the value.
    ///
    /// # Errors
    /// - [`Violation::InvalidAttr`] if the field is not declared.
    /// - A validation error if the stored value (or default) no longer validates.
    pub fn get(&self, ident: &str) -> Result<&Value, ContractError> {
        let property = self.schema.field(ident).ok_or_else(|| self.undeclared(ident))?;
        property.read(&self.slots).map_err(|err| err.scoped(self.schema.name()))
    }

    /// Writes a field by identifier or external name after validating the value.
    ///
    /// External names resolve to their field, as during population. On a [`Policy::Dynamic`]
    /// schema any other undeclared key replaces or appends an extra instead.
    ///
    /// # Errors
    /// - [`Violation::InvalidAttr`] if the field is not declared and the policy keeps no extras.
    /// - A validation error if `value` fails the property; the previous value is kept.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), ContractError> {
        let schema = Arc::clone(&self.schema);
        let ident = schema.resolve(key);
        if let Some(property) = schema.field(ident) {
            return property.write(&mut self.slots, value).map_err(|err| err.scoped(schema.name()));
        }
        if !schema.policy().keeps_extras() {
            return Err(self.undeclared(ident));
        }

        if let Some(slot) = self.extras.iter_mut().find(|(extra, _)| extra == ident) {
            slot.1 = value;
        } else {
            self.extras.push((ident.to_owned(), value));
        }
        Ok(())
    }

    /// Raw values of undeclared keys retained by a [`Policy::Dynamic`] schema, in source order.
    #[must_use]
    pub fn extras(&self) -> &[(String, Value)] {
        &self.extras
    }

    /// A single retained extra, by key.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extras.iter().find(|(extra, _)| extra == key).map(|(_, value)| value)
    }

    /// Serializes every declared field, in discovery order, under its external name.
    ///
    /// Null values are omitted for properties that exclude them, and external names starting
    /// with `_` are private and never serialized. Extras are not serialized.
    ///
    /// # Errors
    /// Returns a validation error if a value no longer validates, or any failure raised by a
    /// property kind's serializer.
    pub fn to_map(&self) -> Result<Map<String, Value>, ContractError> {
        let name = self.schema.name();
        let mut map = Map::with_capacity(self.schema.len());
        for property in self.schema.fields() {
            let value = property.read(&self.slots).map_err(|err| err.scoped(name))?;
            if property.name().starts_with('_') || (value.is_null() && property.excludes_if_none())
            {
                continue;
            }
            let ident = property.ident().unwrap_or_default();
            let serialized = property
                .serialize(value)
                .map_err(|err| err.nest(name, ident, Violation::Serialize))?;
            map.insert(property.name().to_owned(), serialized);
        }
        Ok(map)
    }

    /// [`Record::to_map`] wrapped as a JSON object.
    ///
    /// # Errors
    /// See [`Record::to_map`].
    pub fn to_value(&self) -> Result<Value, ContractError> {
        self.to_map().map(Value::Object)
    }

    fn undeclared(&self, ident: &str) -> ContractError {
        ContractError::validation(
            self.schema.name().to_owned(),
            format!(".{ident}"),
            Violation::InvalidAttr,
            format!("no attribute '{ident}'"),
        )
    }

    fn values(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.schema
            .fields()
            .map(|property| (property.ident().unwrap_or_default(), property.read(&self.slots).ok()))
    }
}

/// Structural equality: same contract type and equal declared fields. Extras are ignored.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema)
            && self.values().zip(other.values()).all(|((_, left), (_, right))| {
                matches!((left, right), (Some(left), Some(right)) if left == right)
            })
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct(self.schema.name());
        for (ident, value) in self.values() {
            match value {
                Some(value) => builder.field(ident, value),
                None => builder.field(ident, &format_args!("<invalid>")),
            };
        }
        builder.finish()
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_map().map_err(S::Error::custom)?.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{Property, PropertyKind};
    use serde_json::json;
    use std::borrow::Cow;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Number;

    impl PropertyKind for Number {
        fn type_name(&self) -> Cow<'static, str> {
            "number".into()
        }

        fn conforms(&self, value: &Value) -> bool {
            value.is_number()
        }
    }

    static REVOKED: AtomicBool = AtomicBool::new(false);

    /// Strings, until `REVOKED` is set.
    struct Revocable;

    impl PropertyKind for Revocable {
        fn type_name(&self) -> Cow<'static, str> {
            "text".into()
        }

        fn conforms(&self, value: &Value) -> bool {
            value.is_string() && !REVOKED.load(Ordering::SeqCst)
        }
    }

    struct Opaque;

    impl PropertyKind for Opaque {
        fn type_name(&self) -> Cow<'static, str> {
            "opaque".into()
        }

        fn conforms(&self, _value: &Value) -> bool {
            true
        }

        fn serialize(&self, _value: &Value) -> Result<Value, ContractError> {
            Err(ContractError::coercion("opaque values cannot be serialized"))
        }
    }

    fn schema(policy: Policy) -> Arc<Schema> {
        Arc::new(
            Schema::builder()
                .name("Point")
                .policy(policy)
                .field("x", Property::builder(Number).required(true))
                .field("y", Property::builder(Number).default(0))
                .build()
                .expect("valid schema"),
        )
    }

    #[test]
    fn scalar_source_is_not_a_mapping() {
        let err = Record::from_value(schema(Policy::Lenient), json!(5)).expect_err("not a mapping");
        assert_eq!(err.violation(), Some(Violation::NotMapping));
        assert_eq!(err.to_string(), "Point: '5' is not a mapping");
    }

    #[test]
    fn absent_optional_field_reads_default() {
        let record = Record::from_value(schema(Policy::Lenient), json!({ "x": 1 })).expect("valid");
        assert_eq!(record.get("y").expect("default"), &json!(0));
    }

    #[test]
    fn debug_renders_type_and_fields() {
        let record = Record::from_value(schema(Policy::Lenient), json!({ "x": 1 })).expect("valid");
        assert_eq!(format!("{record:?}"), "Point { x: Number(1), y: Number(0) }");
    }

    #[test]
    fn dynamic_set_upserts_extras() {
        let mut record =
            Record::from_value(schema(Policy::Dynamic), json!({ "x": 1, "tag": "a" })).expect("valid");
        record.set("tag", json!("b")).expect("extra replaced");
        record.set("note", json!(true)).expect("extra appended");
        assert_eq!(record.extras(), [("tag".to_owned(), json!("b")), ("note".to_owned(), json!(true))]);
    }

    #[test]
    fn lenient_set_rejects_undeclared() {
        let mut record = Record::from_value(schema(Policy::Lenient), json!({ "x": 1 })).expect("valid");
        let err = record.set("z", json!(1)).expect_err("undeclared");
        assert_eq!(err.to_string(), "Point.z: no attribute 'z'");
    }

    #[test]
    fn stored_value_is_revalidated_on_every_read() {
        let schema = Arc::new(
            Schema::builder()
                .name("Note")
                .field("body", Property::builder(Revocable))
                .build()
                .expect("valid schema"),
        );
        let record = Record::from_value(schema, json!({ "body": "hi" })).expect("valid");
        let copy = record.clone();
        assert_eq!(record, copy);

        REVOKED.store(true, Ordering::SeqCst);

        let err = record.get("body").expect_err("value no longer conforms");
        assert_eq!(err.violation(), Some(Violation::AttrType));
        assert_eq!(err.to_string(), r#"Note.body: value "hi" is not of type text"#);
        assert!(record.to_map().is_err());
        assert_ne!(record, copy);
        assert_eq!(format!("{record:?}"), "Note { body: <invalid> }");
    }

    #[test]
    fn serialization_failure_is_located_at_the_field() {
        let schema = Arc::new(
            Schema::builder()
                .name("Blob")
                .field("data", Property::builder(Opaque).name("payload"))
                .build()
                .expect("valid schema"),
        );
        let record = Record::from_value(schema, json!({ "payload": 1 })).expect("valid");

        let err = record.to_map().expect_err("opaque kind refuses to serialize");
        assert_eq!(err.violation(), Some(Violation::Serialize));
        assert_eq!(err.path(), Some(".data"));
        assert_eq!(
            err.to_string(),
            "Blob.data: Type coercion failed: opaque values cannot be serialized"
        );
        assert!(serde_json::to_value(&record).is_err());
    }
}
