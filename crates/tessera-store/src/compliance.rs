//! Backend trait compliance test helpers.
//!
//! These functions verify that a Backend implementation satisfies the
//! contract every frame relies on. Reused by the dense and lite test
//! modules; the image parity check compares against `DenseBackend`.

use tessera_core::{
    AttrCoord, AttrId, AttrValue, AttributeSpec, Backend, ErrorKind, FrameError, NodeSchema,
    SchemaId, SchemaRegistry,
};

use crate::dense::DenseBackend;

const STORAGE: SchemaId = SchemaId(0);
const EMPTY: SchemaId = SchemaId(1);
const CAPACITY: AttrId = AttrId(0);
const PRODUCTS: AttrId = AttrId(1);
const POSITION: AttrId = AttrId(2);
const FACILITY: AttrId = AttrId(3);

fn schemas() -> Vec<NodeSchema> {
    let mut reg = SchemaRegistry::new();
    reg.declare_schema_with(
        "storage",
        [
            AttributeSpec::of::<i32>("capacity"),
            AttributeSpec::of::<i32>("product_number").list(),
            AttributeSpec::of::<f32>("position").slots(2),
            AttributeSpec::of::<i64>("facility_id").constant(),
        ],
    )
    .unwrap();
    reg.declare_schema_with("consumer", [AttributeSpec::of::<u16>("demand")])
        .unwrap();
    reg.into_schemas()
}

fn allocate<B: Backend>(backend: &mut B) {
    let schemas = schemas();
    backend.allocate_pool(&schemas[0], 3).unwrap();
    backend.allocate_pool(&schemas[1], 0).unwrap();
}

fn at(index: usize, attr: AttrId) -> AttrCoord {
    AttrCoord::new(STORAGE, index, attr)
}

fn read_list<B: Backend>(backend: &B, coord: AttrCoord) -> Vec<AttrValue> {
    let mut out = Vec::new();
    backend.read_list(coord, &mut out).unwrap();
    out
}

fn read_fixed<B: Backend>(backend: &B, coord: AttrCoord) -> Vec<AttrValue> {
    let mut out = Vec::new();
    backend.read_fixed(coord, &mut out).unwrap();
    out
}

/// A fixed mutation script shared by the parity checks.
fn apply_script<B: Backend>(backend: &mut B) {
    backend.set(at(1, CAPACITY), 0, AttrValue::Int32(100)).unwrap();
    backend.push_list(at(1, PRODUCTS), AttrValue::Int32(5)).unwrap();
    backend.push_list(at(1, PRODUCTS), AttrValue::Int8(7)).unwrap();
    backend
        .replace_list(at(2, PRODUCTS), &[AttrValue::Int32(1), AttrValue::Int32(2), AttrValue::Int32(3)])
        .unwrap();
    backend
        .write_fixed(at(0, POSITION), &[AttrValue::Float32(1.5), AttrValue::Float64(-2.0)])
        .unwrap();
    backend.set(at(2, FACILITY), 0, AttrValue::UInt32(9)).unwrap();
}

/// Assert that fresh pools read zero and lists start empty.
pub fn assert_zero_initialized<B: Backend>(mut backend: B) {
    allocate(&mut backend);
    assert_eq!(backend.pool_count(), 2);
    assert_eq!(backend.instance_count(STORAGE), Some(3));
    assert_eq!(backend.instance_count(EMPTY), Some(0));
    for index in 0..3 {
        assert_eq!(backend.get(at(index, CAPACITY), 0), Ok(AttrValue::Int32(0)));
        assert_eq!(
            read_fixed(&backend, at(index, POSITION)),
            vec![AttrValue::Float32(0.0); 2]
        );
        assert_eq!(backend.list_len(at(index, PRODUCTS)), Ok(0));
    }
}

/// Assert that slot writes and full-length writes read back exactly.
pub fn assert_fixed_round_trip<B: Backend>(mut backend: B) {
    allocate(&mut backend);
    backend.set(at(2, POSITION), 1, AttrValue::Float32(0.25)).unwrap();
    assert_eq!(backend.get(at(2, POSITION), 1), Ok(AttrValue::Float32(0.25)));
    assert_eq!(backend.get(at(2, POSITION), 0), Ok(AttrValue::Float32(0.0)));

    backend
        .write_fixed(at(1, POSITION), &[AttrValue::Float32(3.0), AttrValue::Float32(4.0)])
        .unwrap();
    assert_eq!(
        read_fixed(&backend, at(1, POSITION)),
        vec![AttrValue::Float32(3.0), AttrValue::Float32(4.0)]
    );
    // Neighbouring instances are untouched.
    assert_eq!(
        read_fixed(&backend, at(0, POSITION)),
        vec![AttrValue::Float32(0.0); 2]
    );
}

/// Assert append order, replacement, and clearing of list attributes.
pub fn assert_list_ops<B: Backend>(mut backend: B) {
    allocate(&mut backend);
    backend.push_list(at(1, PRODUCTS), AttrValue::Int32(5)).unwrap();
    backend.push_list(at(1, PRODUCTS), AttrValue::Int32(7)).unwrap();
    assert_eq!(
        read_list(&backend, at(1, PRODUCTS)),
        vec![AttrValue::Int32(5), AttrValue::Int32(7)]
    );
    assert_eq!(backend.list_len(at(0, PRODUCTS)), Ok(0));

    backend
        .replace_list(at(1, PRODUCTS), &[AttrValue::Int32(9)])
        .unwrap();
    assert_eq!(read_list(&backend, at(1, PRODUCTS)), vec![AttrValue::Int32(9)]);

    backend.replace_list(at(1, PRODUCTS), &[]).unwrap();
    assert_eq!(backend.list_len(at(1, PRODUCTS)), Ok(0));
}

/// Assert the error taxonomy and that failed calls change nothing.
pub fn assert_errors_are_local<B: Backend>(mut backend: B) {
    allocate(&mut backend);
    apply_script(&mut backend);
    let before = backend.snapshot_pool(STORAGE).unwrap();

    let kind = |r: Result<(), FrameError>| r.unwrap_err().kind();
    assert_eq!(
        kind(backend.set(at(0, AttrId(9)), 0, AttrValue::Int32(1))),
        ErrorKind::Schema
    );
    assert_eq!(
        kind(backend.set(at(3, CAPACITY), 0, AttrValue::Int32(1))),
        ErrorKind::IndexOutOfRange
    );
    assert_eq!(
        kind(backend.set(at(0, POSITION), 2, AttrValue::Float32(1.0))),
        ErrorKind::IndexOutOfRange
    );
    assert_eq!(
        kind(backend.set(at(0, CAPACITY), 0, AttrValue::Float64(1.0))),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        kind(backend.set(at(0, PRODUCTS), 0, AttrValue::Int32(1))),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        kind(backend.push_list(at(0, CAPACITY), AttrValue::Int32(1))),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        kind(backend.write_fixed(at(0, POSITION), &[AttrValue::Float32(1.0)])),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        kind(backend.replace_list(
            at(1, PRODUCTS),
            &[AttrValue::Int32(1), AttrValue::Float32(0.5)]
        )),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        kind(backend.set(AttrCoord::new(EMPTY, 0, AttrId(0)), 0, AttrValue::UInt16(1))),
        ErrorKind::IndexOutOfRange
    );
    assert_eq!(
        kind(backend.set(AttrCoord::new(SchemaId(7), 0, AttrId(0)), 0, AttrValue::UInt16(1))),
        ErrorKind::Schema
    );

    assert_eq!(backend.snapshot_pool(STORAGE).unwrap(), before);
}

/// Assert that reset zeroes every value, empties lists, and is idempotent.
pub fn assert_reset<B: Backend>(mut backend: B) {
    allocate(&mut backend);
    let blank = backend.snapshot_pool(STORAGE).unwrap();
    apply_script(&mut backend);
    assert_ne!(backend.snapshot_pool(STORAGE).unwrap(), blank);

    backend.reset_all().unwrap();
    assert_eq!(backend.snapshot_pool(STORAGE).unwrap(), blank);
    backend.reset_pool(STORAGE).unwrap();
    assert_eq!(backend.snapshot_pool(STORAGE).unwrap(), blank);
    assert_eq!(backend.instance_count(STORAGE), Some(3));
}

/// Assert that restoring a captured image brings back the captured values.
pub fn assert_snapshot_restore<B: Backend>(mut backend: B) {
    allocate(&mut backend);
    apply_script(&mut backend);
    let image = backend.snapshot_pool(STORAGE).unwrap();

    backend.set(at(1, CAPACITY), 0, AttrValue::Int32(50)).unwrap();
    backend.replace_list(at(1, PRODUCTS), &[]).unwrap();
    assert_eq!(backend.get(at(1, CAPACITY), 0), Ok(AttrValue::Int32(50)));

    backend.restore_pool(STORAGE, &image).unwrap();
    assert_eq!(backend.get(at(1, CAPACITY), 0), Ok(AttrValue::Int32(100)));
    assert_eq!(
        read_list(&backend, at(1, PRODUCTS)),
        vec![AttrValue::Int32(5), AttrValue::Int32(7)]
    );
    assert_eq!(backend.snapshot_pool(STORAGE).unwrap(), image);

    let wrong = backend.snapshot_pool(EMPTY).unwrap();
    let err = backend.restore_pool(STORAGE, &wrong).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
}

/// Assert that the same script produces the same image and accounting as
/// the dense reference backend.
pub fn assert_image_parity<B: Backend>(mut backend: B) {
    let mut reference = DenseBackend::new();
    allocate(&mut backend);
    allocate(&mut reference);
    apply_script(&mut backend);
    apply_script(&mut reference);
    for schema in [STORAGE, EMPTY] {
        assert_eq!(
            backend.snapshot_pool(schema).unwrap(),
            reference.snapshot_pool(schema).unwrap()
        );
    }
    assert_eq!(backend.memory_bytes(), reference.memory_bytes());
}

/// Run every compliance check against fresh backends from `make`.
pub fn run_full_compliance<B: Backend>(make: impl Fn() -> B) {
    assert_zero_initialized(make());
    assert_fixed_round_trip(make());
    assert_list_ops(make());
    assert_errors_are_local(make());
    assert_reset(make());
    assert_snapshot_restore(make());
    assert_image_parity(make());
}
