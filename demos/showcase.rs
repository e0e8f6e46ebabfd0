//! Showcase of fixture creation with randomized data.
//!
//! Registers a definition backed by the `fake` crate, wires a persist
//! handler that prints every created instance, and runs through the
//! supported target shapes.
//!
//! Run with: cargo run --example showcase

use facet::Facet;
use facet_factory::{Data, Factory, FactoryError};
use fake::{Fake, faker::name::en::Name};

#[derive(Facet, Debug, Clone, Default)]
struct Customer {
    id: u64,
    name: String,
}

facet_factory::model!(Customer);

fn main() -> Result<(), FactoryError> {
    let mut factory = Factory::new();

    factory.define::<Customer>(|_| {
        Data::new()
            .set("id", (1u64..100).fake::<u64>())
            .set("name", Name().fake::<String>())
    });

    factory.set_persist_handler(|instance| {
        if let Some(customer) = instance.downcast_ref::<Customer>() {
            println!("persist called for {customer:?}");
        }
    });

    // a single random customer
    let mut customer = Customer::default();
    factory.create(&mut customer)?;
    println!("created: {customer:?}");

    // fixed name, random id
    let mut customer = Customer::default();
    factory.create_with(&mut customer, Data::new().set("name", "bar".to_string()))?;
    println!("created with override: {customer:?}");

    // a batch of three, allocated on demand
    let mut batch: [Option<Box<Customer>>; 3] = [None, None, None];
    factory.create(&mut batch)?;
    for customer in batch.iter().flatten() {
        println!("batch: {customer:?}");
    }

    Ok(())
}
