//! End-to-end supply-chain episode.
//!
//! Demonstrates: build frame → entities initialize and seal → run ticks with
//! capture → query a feature series → restore an earlier tick → reset →
//! repeat. Set `RUST_LOG=tessera_frame=trace` to see captures and
//! evictions.

use tessera_bench::{build_profile, drive_tick, initialize_profile, Consumer, Facility, Profile};
use tessera_core::{FrameError, TickId};
use tessera_frame::{BackendKind, EpisodeRunner, Frame, FrameEntity, SnapshotQuery};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Writes facility ids, then applies the profile's writes every tick.
struct Market;

impl FrameEntity for Market {
    fn initialize(&mut self, frame: &mut Frame) -> Result<(), FrameError> {
        initialize_profile(frame)
    }

    fn step(&mut self, frame: &mut Frame, tick: TickId) -> Result<(), FrameError> {
        drive_tick(frame, tick.0)
    }
}

/// Keeps a running total of consumer demand.
#[derive(Default)]
struct DemandMeter {
    total: u64,
}

impl FrameEntity for DemandMeter {
    fn initialize(&mut self, _frame: &mut Frame) -> Result<(), FrameError> {
        self.total = 0;
        Ok(())
    }

    fn step(&mut self, _frame: &mut Frame, _tick: TickId) -> Result<(), FrameError> {
        Ok(())
    }

    fn post_step(&mut self, frame: &mut Frame, _tick: TickId) -> Result<(), FrameError> {
        let demand = frame.attr_handle(Consumer::NAME, "demand")?;
        for index in 0..frame.instance_count(Consumer::NAME)? {
            self.total += frame.get_by(demand, index, 0)?.to_f64() as u64;
        }
        Ok(())
    }

    fn reset(&mut self, _frame: &mut Frame) -> Result<(), FrameError> {
        self.total = 0;
        Ok(())
    }
}

fn main() -> Result<(), FrameError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tessera_frame=debug"));
    fmt().with_env_filter(filter).with_target(false).init();

    let profile = Profile {
        facilities: 4,
        consumers: 12,
        vehicles: 3,
        snapshot_capacity: 8,
    };

    for kind in BackendKind::ALL {
        println!("=== {kind} backend ===");
        let mut frame = build_profile(kind, profile)?;
        print!("{}", frame.info());

        let entities: Vec<Box<dyn FrameEntity>> =
            vec![Box::new(Market), Box::new(DemandMeter::default())];
        let mut runner = EpisodeRunner::new(entities).capture_snapshots(true);

        for episode in 0..2 {
            runner.run_episode(&mut frame, 0..12)?;
            let ring = frame.snapshots()?;
            info!(episode, held = ring.len(), "episode finished");

            // Facility 0 capacity and stock over every held tick.
            let series = frame.query(
                &SnapshotQuery::new(Facility::NAME)
                    .index(0)
                    .attrs(["capacity", "stock"]),
            )?;
            println!(
                "  episode {episode}: ticks {:?}",
                series.ticks().iter().map(|t| t.0).collect::<Vec<_>>()
            );
            println!("  facility 0 features: {:?}", series.to_f32_vec());

            // Time travel back to the oldest held tick.
            let oldest = frame.snapshots()?.ticks()[0];
            frame.restore_snapshot(oldest)?;
            println!(
                "  restored tick {oldest}: facility 0 capacity = {}",
                frame.get(Facility::NAME, 0, "capacity")?
            );
            println!("  memory: {} bytes", frame.memory_bytes());

            runner.reset(&mut frame)?;
        }
    }
    Ok(())
}
