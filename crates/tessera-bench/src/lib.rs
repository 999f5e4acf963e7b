//! Benchmark profiles for the Tessera node attribute store.
//!
//! A supply-chain shaped frame used by the benches and the demo:
//!
//! - `facility`: capacity, per-SKU stock, pending order list, const id,
//!   2-D position
//! - `consumer`: demand, price, order list
//! - `vehicle`: location, payload, route list
//!
//! [`drive_tick`] applies one tick of deterministic writes to every
//! instance.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tessera_core::{AttrValue, FrameError};
use tessera_frame::{node_schema, BackendKind, Frame, FrameBuilder};

node_schema! {
    /// A warehouse or factory.
    pub struct Facility = "facility" {
        CAPACITY: i32 => "capacity";
        STOCK: u32 => "stock".slots(4);
        PENDING: i32 => "pending_orders".list();
        ID: i64 => "facility_id".constant();
        POSITION: f32 => "position".slots(2);
    }
}

node_schema! {
    /// A demand point.
    pub struct Consumer = "consumer" {
        DEMAND: u16 => "demand";
        PRICE: f64 => "price";
        ORDERS: u32 => "orders".list();
    }
}

node_schema! {
    /// A transport unit.
    pub struct Vehicle = "vehicle" {
        LOCATION: i32 => "location";
        PAYLOAD: f32 => "payload";
        ROUTE: i32 => "route".list();
    }
}

/// Instance counts and ring size of one benchmark frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Profile {
    /// Facility instances.
    pub facilities: usize,
    /// Consumer instances.
    pub consumers: usize,
    /// Vehicle instances.
    pub vehicles: usize,
    /// Snapshot ring capacity.
    pub snapshot_capacity: usize,
}

/// 100 facilities, 1000 consumers, 200 vehicles, 16 snapshots.
pub fn reference_profile() -> Profile {
    Profile {
        facilities: 100,
        consumers: 1000,
        vehicles: 200,
        snapshot_capacity: 16,
    }
}

/// 10x [`reference_profile`] instance counts.
pub fn stress_profile() -> Profile {
    Profile {
        facilities: 1000,
        consumers: 10_000,
        vehicles: 2000,
        snapshot_capacity: 16,
    }
}

/// Build an all-zero frame for `profile` on `kind`.
pub fn build_profile(kind: BackendKind, profile: Profile) -> Result<Frame, FrameError> {
    FrameBuilder::new()
        .backend(kind)
        .snapshots(profile.snapshot_capacity)
        .node::<Facility>(profile.facilities)?
        .node::<Consumer>(profile.consumers)?
        .node::<Vehicle>(profile.vehicles)?
        .build()
}

/// Write the const facility ids. Must run before the facilities are
/// sealed.
pub fn initialize_profile(frame: &mut Frame) -> Result<(), FrameError> {
    for index in 0..frame.instance_count(Facility::NAME)? {
        frame.set(Facility::NAME, index, "facility_id", 10_000 + index as i64)?;
    }
    Ok(())
}

/// One tick of writes: every facility restocks and queues an order, every
/// consumer updates demand and price, every vehicle moves.
///
/// Lists are trimmed every 8 ticks so long runs stay bounded.
pub fn drive_tick(frame: &mut Frame, tick: u64) -> Result<(), FrameError> {
    let t = tick as i64;
    let facilities = frame.instance_count(Facility::NAME)?;
    for index in 0..facilities {
        let i = index as i64;
        frame.set(Facility::NAME, index, "capacity", ((1000 - t * 3 + i) % 1000) as i32)?;
        let sku = (tick as usize + index) % 4;
        frame.set_slot(Facility::NAME, index, "stock", sku, ((t + i) % 500) as u32)?;
        if tick % 8 == 0 {
            frame.clear_list(Facility::NAME, index, "pending_orders")?;
        }
        frame.append(Facility::NAME, index, "pending_orders", ((t * 7 + i) % 97) as i32)?;
    }

    let consumers = frame.instance_count(Consumer::NAME)?;
    for index in 0..consumers {
        let demand = ((tick as usize * 13 + index) % 200) as u16;
        frame.set(Consumer::NAME, index, "demand", demand)?;
        frame.set(Consumer::NAME, index, "price", 1.0 + demand as f64 * 0.25)?;
        if index % 5 == tick as usize % 5 {
            frame.append(Consumer::NAME, index, "orders", demand as u32)?;
        }
        if tick % 8 == 0 {
            frame.clear_list(Consumer::NAME, index, "orders")?;
        }
    }

    let vehicles = frame.instance_count(Vehicle::NAME)?;
    for index in 0..vehicles {
        let location = ((t + index as i64) % facilities.max(1) as i64) as i32;
        frame.set(Vehicle::NAME, index, "location", location)?;
        frame.set(Vehicle::NAME, index, "payload", AttrValue::Float32((tick % 10) as f32 * 1.5))?;
        if tick % 8 == 0 {
            frame.set_list(Vehicle::NAME, index, "route", &[AttrValue::Int32(location)])?;
        } else {
            frame.append(Vehicle::NAME, index, "route", location)?;
        }
    }
    Ok(())
}
