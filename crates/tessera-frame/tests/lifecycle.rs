//! Integration test: an episode driven through `EpisodeRunner`.
//!
//! A warehouse entity initializes const facility ids, then ships stock every
//! tick. Every tick is captured; the captured capacity series is read back
//! with one query and must repeat exactly after a reset.

use tessera_core::{ErrorKind, FrameError, TickId};
use tessera_frame::{BackendKind, EpisodeRunner, Frame, FrameEntity, SnapshotQuery};
use tessera_test_utils::fixtures::{storage_frame, Storage, STORAGE_INSTANCES};

struct Warehouse {
    index: usize,
    shipped: Vec<i32>,
}

impl Warehouse {
    fn new(index: usize) -> Self {
        Self {
            index,
            shipped: Vec::new(),
        }
    }
}

impl FrameEntity for Warehouse {
    fn initialize(&mut self, frame: &mut Frame) -> Result<(), FrameError> {
        let mut node = frame.node_mut(Storage::NAME, self.index)?;
        node.write(Storage::FACILITY, 500 + self.index as i64)?;
        node.write(Storage::CAPACITY, 100)
    }

    fn step(&mut self, frame: &mut Frame, tick: TickId) -> Result<(), FrameError> {
        let amount = (self.index as i32 + 1) * (tick.0 as i32 + 1);
        let mut node = frame.node_mut(Storage::NAME, self.index)?;
        let capacity = node.read(Storage::CAPACITY)?;
        node.write(Storage::CAPACITY, capacity - amount)?;
        self.shipped.push(amount);
        Ok(())
    }

    fn flush_states(&mut self, frame: &mut Frame) -> Result<(), FrameError> {
        let mut node = frame.node_mut(Storage::NAME, self.index)?;
        node.push(Storage::PRODUCTS, self.shipped.len() as i32)
    }

    fn post_step(&mut self, frame: &mut Frame, _tick: TickId) -> Result<(), FrameError> {
        // Const attributes stay locked for the whole episode.
        let err = frame
            .node_mut(Storage::NAME, self.index)?
            .write(Storage::FACILITY, 0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstAttributeWrite);
        Ok(())
    }

    fn reset(&mut self, _frame: &mut Frame) -> Result<(), FrameError> {
        self.shipped.clear();
        Ok(())
    }
}

fn capacity_series(frame: &Frame) -> Vec<f64> {
    frame
        .query(&SnapshotQuery::new(Storage::NAME).attr("capacity"))
        .unwrap()
        .to_f64_vec()
}

fn run(kind: BackendKind) {
    let mut frame = storage_frame(kind, Some(8));
    let entities = (0..STORAGE_INSTANCES).map(Warehouse::new).collect();
    let mut runner = EpisodeRunner::new(entities).capture_snapshots(true);

    runner.run_episode(&mut frame, 0..3).unwrap();
    let first = capacity_series(&frame);
    assert_eq!(
        first,
        vec![
            99.0, 98.0, 97.0, // tick 0
            97.0, 94.0, 91.0, // tick 1
            94.0, 88.0, 82.0, // tick 2
        ]
    );
    assert_eq!(
        frame
            .node(Storage::NAME, 2)
            .unwrap()
            .read_list(Storage::PRODUCTS)
            .unwrap(),
        vec![1, 2, 3]
    );
    assert_eq!(frame.node(Storage::NAME, 1).unwrap().read(Storage::FACILITY), Ok(501));

    runner.reset(&mut frame).unwrap();
    assert!(frame.snapshots().unwrap().is_empty());
    assert!(runner.entities().iter().all(|w| w.shipped.is_empty()));

    runner.run_episode(&mut frame, 0..3).unwrap();
    assert_eq!(capacity_series(&frame), first);
}

#[test]
fn episode_repeats_after_reset_dense() {
    run(BackendKind::Dense);
}

#[test]
fn episode_repeats_after_reset_lite() {
    run(BackendKind::Lite);
}
