//! # Property Descriptors
//!
//! A [`Property`] is a typed, validating slot definition. Its semantic type is supplied by a
//! [`PropertyKind`], the extension point implemented by concrete scalar and composite property
//! types; the descriptor itself owns the nullability, required/default and serialization policy.
//!
//! Descriptors are built once with [`Property::builder`] and bound to a field identifier when a
//! schema is registered. An unbound descriptor reports the name [`ANONYMOUS`].

use crate::error::{ContractError, Violation};
use fxhash::FxHashMap;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Display name of a descriptor that is not attached to a field (e.g. a container element).
pub const ANONYMOUS: &str = "(anonymous)";

/// Per-instance value store keyed by field identifier.
pub type Slots = FxHashMap<Cow<'static, str>, Value>;

/// The semantic type of a property.
///
/// Implementors declare what a conforming value looks like and, optionally, how raw values
/// are coerced into it and how stored values are encoded for serialization.
pub trait PropertyKind: Send + Sync + 'static {
    /// Semantic type name used in diagnostics (e.g. `"string"`).
    fn type_name(&self) -> Cow<'static, str>;

    /// Returns `true` if a non-null `value` conforms to this semantic type.
    fn conforms(&self, value: &Value) -> bool;

    /// Attempts to turn a non-conforming raw value into a conforming one.
    ///
    /// # Errors
    /// The default implementation always fails with [`ContractError::Coercion`].
    fn coerce(&self, raw: Value) -> Result<Value, ContractError> {
        Err(ContractError::coercion(format!("cannot convert {raw} into {}", self.type_name())))
    }

    /// Converts a raw source value into the stored representation.
    ///
    /// # Errors
    /// Any error is re-wrapped by the enclosing contract with the field's path.
    fn deserialize(&self, raw: Value) -> Result<Value, ContractError> {
        if self.conforms(&raw) { Ok(raw) } else { self.coerce(raw) }
    }

    /// Converts a stored value into its serialized representation. Identity by default.
    ///
    /// # Errors
    /// Composite kinds may fail when an inner value cannot be serialized.
    fn serialize(&self, value: &Value) -> Result<Value, ContractError> {
        Ok(value.clone())
    }
}

/// A typed, validating field definition.
#[derive(Clone)]
pub struct Property {
    ident: Option<Cow<'static, str>>,
    external: Option<Cow<'static, str>>,
    default: Value,
    required: bool,
    not_none: bool,
    exclude_if_none: bool,
    kind: Arc<dyn PropertyKind>,
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name())
            .field("kind", &self.kind.type_name())
            .field("default", &self.default)
            .field("required", &self.required)
            .field("not_none", &self.not_none)
            .field("exclude_if_none", &self.exclude_if_none)
            .finish()
    }
}

impl Property {
    /// Starts declaring a property of the given semantic type.
    #[must_use = "The builder must be finished with `build` or handed to a schema"]
    pub fn builder(kind: impl PropertyKind) -> PropertyBuilder {
        PropertyBuilder::new(Arc::new(kind))
    }

    /// The name used for (de)serialization: the explicit external name, else the field
    /// identifier, else [`ANONYMOUS`].
    #[must_use]
    pub fn name(&self) -> &str {
        self.external.as_deref().or(self.ident.as_deref()).unwrap_or(ANONYMOUS)
    }

    /// The field identifier, once bound to a schema.
    #[must_use]
    pub fn ident(&self) -> Option<&str> {
        self.ident.as_deref()
    }

    /// `true` if an explicit external name differs from the field identifier.
    #[must_use]
    pub fn is_renamed(&self) -> bool {
        self.external.as_deref().is_some_and(|external| Some(external) != self.ident())
    }

    #[must_use]
    pub const fn default_value(&self) -> &Value {
        &self.default
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub const fn is_not_none(&self) -> bool {
        self.not_none
    }

    #[must_use]
    pub const fn excludes_if_none(&self) -> bool {
        self.exclude_if_none
    }

    #[must_use]
    pub fn kind(&self) -> &dyn PropertyKind {
        self.kind.as_ref()
    }

    /// Attaches the descriptor to a field identifier.
    pub(crate) fn bind(mut self, ident: impl Into<Cow<'static, str>>) -> Self {
        self.ident = Some(ident.into());
        self
    }

    /// Checks nullability and semantic-type conformance of `value`.
    ///
    /// # Errors
    /// - [`Violation::NotNone`] if `value` is null and the property is non-nullable.
    /// - [`Violation::AttrType`] if a non-null `value` does not conform to the kind.
    pub fn validate(&self, value: &Value) -> Result<(), ContractError> {
        if value.is_null() {
            if self.not_none {
                return Err(ContractError::validation(
                    self.kind.type_name(),
                    "",
                    Violation::NotNone,
                    format!("{} must not be null", self.name()),
                ));
            }
            return Ok(());
        }

        if !self.kind.conforms(value) {
            return Err(ContractError::validation(
                self.kind.type_name(),
                format!(".{}", self.name()),
                Violation::AttrType,
                format!("value {value} is not of type {}", self.kind.type_name()),
            ));
        }

        Ok(())
    }

    /// Returns the stored value, or the default if none is stored, after re-validating it.
    ///
    /// # Errors
    /// Returns a validation error if the value no longer satisfies [`Property::validate`].
    pub fn read<'a>(&'a self, slots: &'a Slots) -> Result<&'a Value, ContractError> {
        let value = self.ident().and_then(|ident| slots.get(ident)).unwrap_or(&self.default);
        self.validate(value)?;
        Ok(value)
    }

    /// Validates `value` and stores it; nothing is stored on failure.
    ///
    /// # Errors
    /// Returns a validation error if `value` fails [`Property::validate`], or a configuration
    /// error if the descriptor is not bound to a field.
    pub fn write(&self, slots: &mut Slots, value: Value) -> Result<(), ContractError> {
        self.validate(&value)?;
        let Some(ident) = &self.ident else {
            return Err(ContractError::configuration("cannot store into an anonymous property"));
        };
        slots.insert(ident.clone(), value);
        Ok(())
    }

    /// Encodes a stored value through the kind.
    ///
    /// # Errors
    /// Propagates kind-specific serialization failures.
    pub fn serialize(&self, value: &Value) -> Result<Value, ContractError> {
        self.kind.serialize(value)
    }

    /// Decodes a raw value through the kind.
    ///
    /// # Errors
    /// Propagates kind-specific failures; callers re-wrap them with a path.
    pub fn deserialize(&self, raw: Value) -> Result<Value, ContractError> {
        self.kind.deserialize(raw)
    }
}

/// Fluent builder for [`Property`].
#[derive(Clone)]
pub struct PropertyBuilder {
    external: Option<Cow<'static, str>>,
    default: Value,
    required: bool,
    not_none: bool,
    exclude_if_none: bool,
    kind: Arc<dyn PropertyKind>,
}

impl fmt::Debug for PropertyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBuilder")
            .field("external", &self.external)
            .field("kind", &self.kind.type_name())
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

impl PropertyBuilder {
    fn new(kind: Arc<dyn PropertyKind>) -> Self {
        Self {
            external: None,
            default: Value::Null,
            required: false,
            not_none: false,
            exclude_if_none: true,
            kind,
        }
    }

    /// Sets the external name used for (de)serialization.
    #[must_use = "The builder must be finished with `build` or handed to a schema"]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.external = Some(name.into());
        self
    }

    /// Sets the value used when the field is absent from source data.
    #[must_use = "The builder must be finished with `build` or handed to a schema"]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    /// Makes absence from source data a hard error.
    #[must_use = "The builder must be finished with `build` or handed to a schema"]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Makes a null value a hard error unless a non-null default exists.
    #[must_use = "The builder must be finished with `build` or handed to a schema"]
    pub const fn not_none(mut self, not_none: bool) -> Self {
        self.not_none = not_none;
        self
    }

    /// Controls whether a null value is omitted during serialization (default `true`).
    #[must_use = "The builder must be finished with `build` or handed to a schema"]
    pub const fn exclude_if_none(mut self, exclude: bool) -> Self {
        self.exclude_if_none = exclude;
        self
    }

    /// Finishes the declaration.
    ///
    /// # Errors
    /// Returns [`ContractError::Configuration`] if:
    /// - The property is both required and has a non-null default.
    /// - A non-null default does not conform to the property kind.
    pub fn build(self) -> Result<Property, ContractError> {
        if self.required && !self.default.is_null() {
            return Err(ContractError::configuration("default specified for required property"));
        }
        if !self.default.is_null() && !self.kind.conforms(&self.default) {
            return Err(ContractError::configuration(format!(
                "default {} is not of type {}",
                self.default,
                self.kind.type_name()
            )));
        }

        Ok(Property {
            ident: None,
            external: self.external,
            default: self.default,
            required: self.required,
            not_none: self.not_none,
            exclude_if_none: self.exclude_if_none,
            kind: self.kind,
        })
    }
}
