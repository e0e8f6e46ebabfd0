#![allow(missing_docs)]

use std::{cell::RefCell, rc::Rc};

use facet::Facet;
use facet_factory::{Data, Factory};

#[derive(Facet, Debug, PartialEq, Clone, Default)]
struct TestModel {
    id: u64,
    name: String,
}

facet_factory::model!(TestModel);

fn create_factory() -> Factory {
    let mut factory = Factory::new();
    factory.define::<TestModel>(|_| {
        Data::new().set("id", 1u64).set("name", "foo".to_string())
    });
    factory
}

/// Records the address of every persisted `TestModel` so tests can check
/// call counts and instance identity after `create` returns.
fn recording_handler(factory: &mut Factory) -> Rc<RefCell<Vec<usize>>> {
    let addresses = Rc::new(RefCell::new(Vec::new()));
    let recorded = Rc::clone(&addresses);
    factory.set_persist_handler(move |instance| {
        let model = instance
            .downcast_ref::<TestModel>()
            .expect("persisted instance downcasts to the model type");
        recorded.borrow_mut().push(model as *const TestModel as usize);
    });
    addresses
}

// ============================================================================
// Persist handler
// ============================================================================

#[test]
fn persist_called_once_for_single_instance() {
    let mut factory = create_factory();
    let addresses = recording_handler(&mut factory);

    let mut seed = TestModel::default();
    factory.create(&mut seed).unwrap();

    let addresses = addresses.borrow();
    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0], &seed as *const TestModel as usize);
}

#[test]
fn persist_sees_the_allocated_pointer_instance() {
    let mut factory = create_factory();
    let addresses = recording_handler(&mut factory);

    let mut seed: Option<Box<TestModel>> = None;
    factory.create(&mut seed).unwrap();

    let addresses = addresses.borrow();
    assert_eq!(addresses.len(), 1);
    let stored = seed.as_deref().unwrap() as *const TestModel as usize;
    assert_eq!(addresses[0], stored);
}

#[test]
fn persist_called_per_element_in_index_order() {
    let mut factory = create_factory();
    let addresses = recording_handler(&mut factory);

    let mut seeds: [Option<Box<TestModel>>; 3] = [None, None, None];
    factory.create(&mut seeds).unwrap();

    let addresses = addresses.borrow();
    assert_eq!(addresses.len(), 3);
    for (address, seed) in addresses.iter().zip(&seeds) {
        let stored = seed.as_deref().unwrap() as *const TestModel as usize;
        assert_eq!(*address, stored);
    }
}

#[test]
fn persist_not_called_when_population_fails() {
    let mut factory = create_factory();
    let addresses = recording_handler(&mut factory);

    let mut seed = TestModel::default();
    let result = factory.create_with(&mut seed, Data::new().set("missing", 1u64));

    assert!(result.is_err());
    assert!(addresses.borrow().is_empty());
}

#[test]
fn persist_not_called_for_unregistered_type() {
    let mut factory = Factory::new();
    let addresses = recording_handler(&mut factory);

    let mut seed = TestModel::default();
    let result = factory.create(&mut seed);

    assert!(result.is_err());
    assert!(addresses.borrow().is_empty());
}

#[test]
fn latest_persist_handler_wins() {
    let mut factory = create_factory();
    let first = recording_handler(&mut factory);
    let second = recording_handler(&mut factory);

    let mut seed = TestModel::default();
    factory.create(&mut seed).unwrap();

    assert!(first.borrow().is_empty());
    assert_eq!(second.borrow().len(), 1);
}

#[test]
fn create_works_without_a_persist_handler() {
    let factory = create_factory();
    let mut seed = TestModel::default();

    factory.create(&mut seed).unwrap();

    assert_eq!(seed.id, 1);
}
