#![allow(dead_code)]

use lazycontract::prelude::*;
use serde_json::json;
use std::borrow::Cow;
use std::marker::PhantomData;

pub struct Text;

impl PropertyKind for Text {
    fn type_name(&self) -> Cow<'static, str> {
        "string".into()
    }

    fn conforms(&self, value: &Value) -> bool {
        value.is_string()
    }
}

/// Integers, coercing numeric strings.
pub struct Integer;

impl PropertyKind for Integer {
    fn type_name(&self) -> Cow<'static, str> {
        "integer".into()
    }

    fn conforms(&self, value: &Value) -> bool {
        value.is_i64() || value.is_u64()
    }

    fn coerce(&self, raw: Value) -> Result<Value, ContractError> {
        match raw.as_str().map(str::parse::<i64>) {
            Some(Ok(number)) => Ok(json!(number)),
            _ => Err(ContractError::coercion(format!("cannot parse {raw} as integer"))),
        }
    }
}

/// A field holding another contract, stored as its serialized mapping.
pub struct Nested<C>(PhantomData<fn() -> C>);

impl<C> Nested<C> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<C: Contract + 'static> PropertyKind for Nested<C> {
    fn type_name(&self) -> Cow<'static, str> {
        C::schema().map_or(Cow::Borrowed("contract"), |schema| Cow::Owned(schema.name().to_owned()))
    }

    fn conforms(&self, value: &Value) -> bool {
        value.is_object() && C::from_value(value.clone()).is_ok()
    }

    fn deserialize(&self, raw: Value) -> Result<Value, ContractError> {
        C::from_value(raw)?.to_value()
    }

    fn serialize(&self, value: &Value) -> Result<Value, ContractError> {
        C::from_value(value.clone())?.to_value()
    }
}

#[contract(schema = person_schema)]
pub struct Person;

fn person_schema() -> Result<Schema, ContractError> {
    Schema::builder()
        .name("Person")
        .field("name", Property::builder(Text).required(true))
        .field("age", Property::builder(Integer))
        .field("nickname", Property::builder(Text).name("nick"))
        .build()
}

#[contract(schema = account_schema)]
pub struct Account;

fn account_schema() -> Result<Schema, ContractError> {
    Schema::builder()
        .name("Account")
        .field("id", Property::builder(Text).required(true))
        .field("email", Property::builder(Text).not_none(true))
        .field("status", Property::builder(Text).not_none(true).default("active"))
        .build()
}

#[contract(schema = closed_schema)]
pub struct Closed;

fn closed_schema() -> Result<Schema, ContractError> {
    Schema::builder()
        .name("Closed")
        .policy(Policy::Strict)
        .field("name", Property::builder(Text))
        .field("label", Property::builder(Text).name("title"))
        .build()
}

#[contract(schema = loose_schema)]
pub struct Loose;

fn loose_schema() -> Result<Schema, ContractError> {
    Schema::builder()
        .name("Loose")
        .field("name", Property::builder(Text))
        .field("label", Property::builder(Text).name("title"))
        .build()
}

#[contract(schema = open_schema)]
pub struct Open;

fn open_schema() -> Result<Schema, ContractError> {
    Schema::builder()
        .name("Open")
        .policy(Policy::Dynamic)
        .field("name", Property::builder(Text))
        .field("label", Property::builder(Text).name("title"))
        .build()
}

#[contract(schema = profile_schema)]
pub struct Profile;

fn profile_schema() -> Result<Schema, ContractError> {
    Schema::builder()
        .name("Profile")
        .field("handle", Property::builder(Text).name("userHandle"))
        .field("bio", Property::builder(Text))
        .field("note", Property::builder(Text).exclude_if_none(false))
        .field("token", Property::builder(Text).name("_token"))
        .build()
}

#[contract(schema = inner_schema)]
pub struct Inner;

fn inner_schema() -> Result<Schema, ContractError> {
    Schema::builder()
        .name("Inner")
        .field("z", Property::builder(Integer).required(true))
        .build()
}

#[contract(schema = outer_schema)]
pub struct Outer;

fn outer_schema() -> Result<Schema, ContractError> {
    Schema::builder()
        .name("Outer")
        .field("b_field", Property::builder(Nested::<Inner>::new()))
        .build()
}

#[contract(schema = envelope_schema)]
pub struct Envelope;

fn envelope_schema() -> Result<Schema, ContractError> {
    Schema::builder()
        .name("Envelope")
        .field("outer", Property::builder(Nested::<Outer>::new()).name("payload"))
        .build()
}

#[contract(schema = animal_schema)]
pub struct Animal;

fn animal_schema() -> Result<Schema, ContractError> {
    Schema::builder()
        .name("Animal")
        .field("name", Property::builder(Text).required(true))
        .field("sound", Property::builder(Text).default("..."))
        .build()
}

#[contract(schema = dog_schema)]
pub struct Dog;

fn dog_schema() -> Result<Schema, ContractError> {
    Schema::builder()
        .name("Dog")
        .extends(Animal::schema()?)
        .field("breed", Property::builder(Text).name("dogBreed"))
        .field("sound", Property::builder(Text).default("woof"))
        .build()
}

#[contract(schema = cat_schema)]
pub struct Cat;

fn cat_schema() -> Result<Schema, ContractError> {
    Schema::builder()
        .name("Cat")
        .extends(Animal::schema()?)
        .field("name", Property::builder(Text).name("catName").required(true))
        .build()
}

#[contract(schema = broken_schema)]
pub struct Broken;

fn broken_schema() -> Result<Schema, ContractError> {
    Schema::builder()
        .name("Broken")
        .field("id", Property::builder(Text).required(true).default("fallback"))
        .build()
}

#[contract(schema = bad_default_schema)]
pub struct BadDefault;

fn bad_default_schema() -> Result<Schema, ContractError> {
    Schema::builder()
        .name("BadDefault")
        .field("label", Property::builder(Text).default(5))
        .build()
}

/// Builds a `Person` from a JSON document.
/// # Panics
/// * If the document does not describe a valid person.
#[must_use]
pub fn person(document: &Value) -> Person {
    Person::from_value(document.clone()).expect("valid person document")
}
