use lazycontract::contract;

#[contract(schema = first_schema, schema = second_schema)]
pub struct Shape;

fn main() {}
