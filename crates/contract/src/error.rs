//! # Contract Errors
//!
//! This module defines the [`ContractError`] enum used throughout the crate.
//!
//! Two kinds are fatal:
//! - [`ContractError::Configuration`]: misuse detected while declaring properties or schemas.
//! - [`ContractError::Validation`]: data-time failures, rendered as `<TypeName><path>: <reason>`.
//!
//! The remaining variants are generic failures raised by property kinds (coercion, serde
//! conversion). Population re-wraps them into a scoped validation error.

use std::borrow::Cow;
use std::error::Error as StdError;
use strum_macros::{Display, EnumString};

/// Boxed cause carried by a validation error.
pub type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// Machine-readable reason attached to every validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Violation {
    /// The source handed to a contract is not a key-value mapping.
    NotMapping,
    /// A required field is absent from the source.
    Required,
    /// A null value reached a non-nullable field.
    NotNone,
    /// A value does not conform to the field's semantic type.
    AttrType,
    /// The key is not declared by the contract.
    InvalidAttr,
    /// A property kind failed to deserialize a raw value.
    Deserialize,
    /// A property kind failed to serialize a stored value.
    Serialize,
}

#[lazycontract_derive::contract_error]
pub enum ContractError {
    /// Definition-time misuse of property options or schema declarations.
    #[error("Invalid contract configuration{}: {message}", format_context(.context))]
    Configuration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Data-time failure located by a dotted/bracketed path.
    #[error("{type_name}{path}: {message}{}", format_context(.context))]
    Validation {
        type_name: Cow<'static, str>,
        path: String,
        violation: Violation,
        message: Cow<'static, str>,
        #[source]
        cause: Option<Cause>,
        context: Option<Cow<'static, str>>,
    },

    /// A property kind could not coerce a raw value into its semantic type.
    #[error("Type coercion failed{}: {message}", format_context(.context))]
    Coercion { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Conversion between `serde_json::Value` and a typed Rust value failed.
    #[error("Serde conversion failed{}: {source}", format_context(.context))]
    Serde { source: serde_json::Error, context: Option<Cow<'static, str>> },
}

impl ContractError {
    pub(crate) fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Configuration { message: message.into(), context: None }
    }

    pub(crate) fn validation(
        type_name: impl Into<Cow<'static, str>>,
        path: impl Into<String>,
        violation: Violation,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::Validation {
            type_name: type_name.into(),
            path: path.into(),
            violation,
            message: message.into(),
            cause: None,
            context: None,
        }
    }

    /// Shorthand for property kinds reporting a failed coercion.
    pub fn coercion(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Coercion { message: message.into(), context: None }
    }

    /// The violation code, for validation errors.
    #[must_use]
    pub const fn violation(&self) -> Option<Violation> {
        match self {
            Self::Validation { violation, .. } => Some(*violation),
            _ => None,
        }
    }

    /// The path of a validation error (`""` is the contract root).
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Validation { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The type name a validation error is scoped to.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Validation { type_name, .. } => Some(type_name),
            _ => None,
        }
    }

    /// The human-readable reason of a validation error.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Validation { message, .. } => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Re-scopes a failure raised while converting `field` of `type_name`.
    ///
    /// Validation errors keep their message, violation and cause, and their path is appended
    /// to `.field`. Any other failure becomes the cause of a `fallback` violation.
    pub(crate) fn nest(self, type_name: &str, field: &str, fallback: Violation) -> Self {
        let mut path = format!(".{field}");
        match self {
            Self::Validation { path: inner, violation, message, cause, .. } => {
                path.push_str(&inner);
                Self::Validation {
                    type_name: Cow::Owned(type_name.to_owned()),
                    path,
                    violation,
                    message,
                    cause,
                    context: None,
                }
            },
            other => Self::Validation {
                type_name: Cow::Owned(type_name.to_owned()),
                path,
                violation: fallback,
                message: Cow::Owned(other.to_string()),
                cause: Some(Box::new(other)),
                context: None,
            },
        }
    }

    /// Attributes a validation error to `type_name`, keeping everything else.
    pub(crate) fn scoped(self, type_name: &str) -> Self {
        match self {
            Self::Validation { type_name: owner, path, violation, message, cause, context }
                if owner != type_name =>
            {
                Self::Validation {
                    type_name: Cow::Owned(type_name.to_owned()),
                    path,
                    violation,
                    message,
                    cause,
                    context,
                }
            },
            other => other,
        }
    }
}
