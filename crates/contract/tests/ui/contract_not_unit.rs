use lazycontract::contract;

#[contract(schema = shape_schema)]
pub struct Shape {
    sides: u8,
}

fn main() {}
