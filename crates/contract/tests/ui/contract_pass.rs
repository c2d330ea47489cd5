use lazycontract::prelude::*;
use serde_json::json;
use std::borrow::Cow;

struct Flag;

impl PropertyKind for Flag {
    fn type_name(&self) -> Cow<'static, str> {
        "bool".into()
    }

    fn conforms(&self, value: &Value) -> bool {
        value.is_boolean()
    }
}

mod model {
    use super::*;

    /// Feature toggle.
    #[contract(schema = toggle_schema)]
    pub struct Toggle;

    pub fn toggle_schema() -> Result<Schema, ContractError> {
        Schema::builder()
            .name("Toggle")
            .field("enabled", Property::builder(Flag).name("isEnabled").default(false))
            .build()
    }
}

fn main() {
    use model::Toggle;

    let toggle = Toggle::from_value(json!({ "isEnabled": true })).unwrap();
    let copy = toggle.clone();
    assert_eq!(toggle, copy);
    assert_eq!(format!("{toggle:?}"), "Toggle { enabled: Bool(true) }");

    let restored: Toggle = serde_json::from_value(serde_json::to_value(&toggle).unwrap()).unwrap();
    assert_eq!(restored, toggle);
}
