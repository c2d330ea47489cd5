use crate::error::{ContractError, ContractErrorExt};
use crate::record::Record;
use crate::schema::Schema;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

/// A declared data shape whose fields are validating properties.
///
/// Implement it with the `#[contract(schema = ...)]` attribute; every operation beyond the
/// four required methods is provided and delegates to the wrapped [`Record`].
pub trait Contract: Sized {
    /// The registered schema of this contract type.
    ///
    /// # Errors
    /// Returns [`ContractError::Configuration`] if the schema could not be registered.
    fn schema() -> Result<Arc<Schema>, ContractError>;

    fn from_record(record: Record) -> Self;

    fn record(&self) -> &Record;

    fn record_mut(&mut self) -> &mut Record;

    /// Constructs an instance from either a source mapping or named field values.
    ///
    /// # Errors
    /// - [`ContractError::Configuration`] if both inputs are supplied.
    /// - [`ContractError::Validation`] for any population failure.
    fn new(document: Option<Value>, fields: Map<String, Value>) -> Result<Self, ContractError> {
        Record::new(Self::schema()?, document, fields).map(Self::from_record)
    }

    /// Constructs an instance from a source mapping, such as a decoded JSON document.
    ///
    /// # Errors
    /// See [`Contract::new`].
    fn from_value(document: Value) -> Result<Self, ContractError> {
        Record::from_value(Self::schema()?, document).map(Self::from_record)
    }

    /// Constructs an instance from named field values.
    ///
    /// # Errors
    /// See [`Contract::new`].
    fn from_fields<I, K, V>(fields: I) -> Result<Self, ContractError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let fields = fields.into_iter().map(|(key, value)| (key.into(), value.into())).collect();
        Self::new(None, fields)
    }

    /// Reads a field by identifier, re-validating it.
    ///
    /// # Errors
    /// See [`Record::get`].
    fn get(&self, field: &str) -> Result<&Value, ContractError> {
        self.record().get(field)
    }

    /// Reads a field and converts it into a typed Rust value.
    ///
    /// # Errors
    /// Fails like [`Contract::get`], or with [`ContractError::Serde`] if the value does not
    /// fit `T`.
    fn get_as<T: DeserializeOwned>(&self, field: &str) -> Result<T, ContractError> {
        let value = self.get(field)?.clone();
        serde_json::from_value(value).context(format!("reading field '{field}'"))
    }

    /// Writes a field by identifier or external name, validating it first.
    ///
    /// # Errors
    /// See [`Record::set`].
    fn set<V: Into<Value>>(&mut self, field: &str, value: V) -> Result<(), ContractError> {
        self.record_mut().set(field, value.into())
    }

    /// Undeclared keys retained by a dynamic contract.
    fn extras(&self) -> &[(String, Value)] {
        self.record().extras()
    }

    /// A single retained undeclared key.
    fn extra(&self, key: &str) -> Option<&Value> {
        self.record().extra(key)
    }

    /// Serializes the instance into a mapping keyed by external names.
    ///
    /// # Errors
    /// See [`Record::to_map`].
    fn to_map(&self) -> Result<Map<String, Value>, ContractError> {
        self.record().to_map()
    }

    /// Serializes the instance into a JSON object value.
    ///
    /// # Errors
    /// See [`Record::to_map`].
    fn to_value(&self) -> Result<Value, ContractError> {
        self.record().to_value()
    }
}
