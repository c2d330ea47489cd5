//! # Contract Schemas
//!
//! A [`Schema`] is the immutable, per-type result of discovery: the linearized ancestor layers,
//! the field table in discovery order, and the external-name table. It is built exactly once,
//! at registration, and then shared through an [`Arc`]; instance construction only reads it.
//!
//! ## Discovery order
//!
//! Ancestors are iterated base-first. A field declared again by a later layer replaces the
//! earlier descriptor but keeps the position of the first declaration, so derived types can
//! narrow or rename inherited fields without touching base-type code. When a schema extends
//! several parents, earlier-listed parents take precedence over later ones.

use crate::error::{ContractError, ContractErrorExt, Violation};
use crate::policy::Policy;
use crate::property::{Property, PropertyBuilder};
use fxhash::FxHashMap;
use private::Sealed;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// The properties declared directly by one contract type.
#[derive(Debug)]
pub(crate) struct Layer {
    name: Cow<'static, str>,
    declared: Vec<Arc<Property>>,
}

/// Immutable field table of a contract type.
#[derive(Debug)]
pub struct Schema {
    name: Cow<'static, str>,
    policy: Policy,
    layers: Vec<Arc<Layer>>,
    fields: Vec<Arc<Property>>,
    index: FxHashMap<Cow<'static, str>, usize>,
    external_to_field: FxHashMap<Cow<'static, str>, Cow<'static, str>>,
}

impl Schema {
    /// Starts declaring a contract type.
    #[must_use = "The builder must be configured before it can build a schema"]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// The contract type name, used to scope validation errors.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn policy(&self) -> Policy {
        self.policy
    }

    /// All discovered fields, in discovery order.
    pub fn fields(&self) -> impl ExactSizeIterator<Item = &Property> {
        self.fields.iter().map(|field| &**field)
    }

    /// Number of discovered fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a field by identifier.
    #[must_use]
    pub fn field(&self, ident: &str) -> Option<&Property> {
        self.index.get(ident).map(|&position| self.fields[position].as_ref())
    }

    /// Maps a source key to a field identifier through the external-name table.
    ///
    /// Keys without a mapping are returned unchanged.
    #[must_use]
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.external_to_field.get(key).map_or(key, |ident| &**ident)
    }

    /// `true` if `key` is a field identifier or a mapped external name.
    #[must_use]
    pub fn is_declared_key(&self, key: &str) -> bool {
        self.index.contains_key(key) || self.external_to_field.contains_key(key)
    }

    /// Names of the linearized ancestor chain, base-first, ending with this type.
    pub fn lineage(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|layer| &*layer.name)
    }

    /// Properties declared directly by this type, excluding inherited ones.
    pub fn declared_properties(&self) -> impl Iterator<Item = &Property> {
        self.layers.last().into_iter().flat_map(|layer| layer.declared.iter().map(|field| &**field))
    }

    /// Checks that every required or non-nullable field is present in `source`, under either
    /// its external name or its identifier.
    ///
    /// # Errors
    /// - [`Violation::Required`] for an absent required field.
    /// - [`Violation::NotNone`] for an absent non-nullable field without a default.
    pub(crate) fn check_presence(&self, source: &Map<String, Value>) -> Result<(), ContractError> {
        for property in self.fields() {
            let ident = property.ident().unwrap_or_default();
            if source.contains_key(property.name()) || source.contains_key(ident) {
                continue;
            }

            if property.is_required() {
                return Err(ContractError::validation(
                    self.name.clone(),
                    format!(".{ident}"),
                    Violation::Required,
                    format!("'{}' not found in {}", property.name(), Value::Object(source.clone())),
                ));
            }

            if property.is_not_none() && property.default_value().is_null() {
                return Err(ContractError::validation(
                    self.name.clone(),
                    format!(".{ident}"),
                    Violation::NotNone,
                    format!("{} must not be null", property.name()),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(Cow<'static, str>);

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}

/// A builder for contract schemas; a name is required before [`SchemaBuilder::build`].
#[derive(Debug)]
pub struct SchemaBuilder<S: Sealed = NoName> {
    state: S,
    policy: Policy,
    parents: Vec<Arc<Schema>>,
    declared: Vec<(Cow<'static, str>, PropertyBuilder)>,
}

impl Default for SchemaBuilder<NoName> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sealed> SchemaBuilder<S> {
    /// Sets how undeclared source keys are treated (default [`Policy::Lenient`]).
    #[must_use = "The builder must be configured before it can build a schema"]
    pub const fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Inherits the fields of an already registered contract type.
    #[must_use = "The builder must be configured before it can build a schema"]
    pub fn extends(mut self, parent: Arc<Schema>) -> Self {
        self.parents.push(parent);
        self
    }

    /// Declares a field on this contract type.
    #[must_use = "The builder must be configured before it can build a schema"]
    pub fn field(mut self, ident: impl Into<Cow<'static, str>>, property: PropertyBuilder) -> Self {
        self.declared.push((ident.into(), property));
        self
    }

    fn transition<N: Sealed>(self, state: N) -> SchemaBuilder<N> {
        SchemaBuilder { state, policy: self.policy, parents: self.parents, declared: self.declared }
    }
}

impl SchemaBuilder<NoName> {
    #[must_use = "The builder must be configured before it can build a schema"]
    pub fn new() -> Self {
        Self { state: NoName, policy: Policy::default(), parents: Vec::new(), declared: Vec::new() }
    }

    /// Sets the contract type name.
    #[must_use = "The builder must be configured before it can build a schema"]
    pub fn name(self, name: impl Into<Cow<'static, str>>) -> SchemaBuilder<WithName> {
        self.transition(WithName(name.into()))
    }
}

impl SchemaBuilder<WithName> {
    /// Runs discovery and freezes the schema.
    ///
    /// This method performs the following sequence:
    /// 1. **Declaration**: Finishes every declared property and binds it to its identifier.
    /// 2. **Linearization**: Collects the ancestor layers of all parents, base-first.
    /// 3. **Discovery**: Registers fields layer by layer (derived wins) and resolves external
    ///    names exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Configuration`] if:
    /// - The type name is empty.
    /// - A field identifier is not a valid identifier, or is declared twice on this type.
    /// - A property is both required and has a non-null default.
    /// - Two fields claim the same external name.
    pub fn build(self) -> Result<Schema, ContractError> {
        let name = self.state.0;
        if name.trim().is_empty() {
            return Err(ContractError::configuration("contract type name cannot be empty"));
        }

        let own = Arc::new(Layer { name: name.clone(), declared: declare(&name, self.declared)? });

        let mut layers: Vec<Arc<Layer>> = Vec::new();
        for parent in self.parents.iter().rev() {
            for layer in &parent.layers {
                if !layers.iter().any(|seen| Arc::ptr_eq(seen, layer)) {
                    layers.push(Arc::clone(layer));
                }
            }
        }
        layers.push(own);

        let mut fields: Vec<Arc<Property>> = Vec::new();
        let mut index: FxHashMap<Cow<'static, str>, usize> = FxHashMap::default();
        for property in layers.iter().flat_map(|layer| layer.declared.iter()) {
            let ident = Cow::Owned(property.ident().unwrap_or_default().to_owned());
            if let Some(&position) = index.get(&ident) {
                fields[position] = Arc::clone(property);
            } else {
                index.insert(ident, fields.len());
                fields.push(Arc::clone(property));
            }
        }

        let mut external_to_field: FxHashMap<Cow<'static, str>, Cow<'static, str>> =
            FxHashMap::default();
        for property in fields.iter().filter(|property| property.is_renamed()) {
            let ident = property.ident().unwrap_or_default();
            let external = Cow::Owned(property.name().to_owned());
            if let Some(previous) = external_to_field.insert(external, Cow::Owned(ident.to_owned()))
            {
                return Err(ContractError::Configuration {
                    message: format!(
                        "external name '{}' maps to both '{previous}' and '{ident}'",
                        property.name()
                    )
                    .into(),
                    context: Some(format!("contract {name}").into()),
                });
            }
        }

        let schema = Schema { name, policy: self.policy, layers, fields, index, external_to_field };
        debug!(
            contract = %schema.name,
            fields = schema.fields.len(),
            ancestors = schema.layers.len() - 1,
            policy = %schema.policy,
            "Registered contract schema"
        );
        Ok(schema)
    }
}

fn declare(
    owner: &str,
    declared: Vec<(Cow<'static, str>, PropertyBuilder)>,
) -> Result<Vec<Arc<Property>>, ContractError> {
    let mut properties: Vec<Arc<Property>> = Vec::with_capacity(declared.len());
    for (ident, builder) in declared {
        if !is_identifier(&ident) {
            return Err(ContractError::Configuration {
                message: format!("'{ident}' is not a valid field identifier").into(),
                context: Some(format!("contract {owner}").into()),
            });
        }
        if properties.iter().any(|property| property.ident() == Some(ident.as_ref())) {
            return Err(ContractError::Configuration {
                message: format!("field '{ident}' is declared twice").into(),
                context: Some(format!("contract {owner}").into()),
            });
        }
        let property = builder.build().context(format!("field {owner}.{ident}"))?;
        properties.push(Arc::new(property.bind(ident)));
    }
    Ok(properties)
}

fn is_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// One-time registration slot for a contract type's schema.
///
/// The registration function runs on first access only; its result, including a failure,
/// is cached for the lifetime of the process.
#[derive(Debug)]
pub struct SchemaCell {
    cell: OnceLock<Result<Arc<Schema>, Cow<'static, str>>>,
}

impl Default for SchemaCell {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCell {
    #[must_use]
    pub const fn new() -> Self {
        Self { cell: OnceLock::new() }
    }

    /// Returns the registered schema, registering it on first access.
    ///
    /// # Errors
    /// Returns [`ContractError::Configuration`] if registration failed, now or earlier.
    pub fn get_or_register(
        &self,
        register: fn() -> Result<Schema, ContractError>,
    ) -> Result<Arc<Schema>, ContractError> {
        let registered = self.cell.get_or_init(|| {
            register().map(Arc::new).map_err(|err| {
                warn!(error = %err, "Contract schema registration failed");
                Cow::Owned(err.to_string())
            })
        });

        match registered {
            Ok(schema) => Ok(Arc::clone(schema)),
            Err(message) => Err(ContractError::Configuration {
                message: message.clone(),
                context: Some("contract registration".into()),
            }),
        }
    }
}
