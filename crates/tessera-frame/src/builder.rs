//! Frame construction.

use tessera_core::{
    AttributeSpec, Backend, FrameError, NodeSchema, SchemaId, SchemaRegistry,
};
use tessera_store::BackendKind;
use tracing::info;

use crate::config::FrameConfig;
use crate::frame::Frame;
use crate::macros::NodeType;
use crate::ring::SnapshotRing;

/// Collects schemas, instance counts and configuration, then builds a
/// [`Frame`].
///
/// Schemas get IDs in declaration order. A schema declared without a count
/// gets a zero-instance pool.
///
/// ```
/// use tessera_core::AttributeSpec;
/// use tessera_frame::FrameBuilder;
///
/// let frame = FrameBuilder::new()
///     .snapshots(4)
///     .declare_schema_with(
///         "storage",
///         [
///             AttributeSpec::of::<i32>("capacity"),
///             AttributeSpec::of::<i32>("product_number").list(),
///         ],
///         3,
///     )?
///     .build()?;
/// assert_eq!(frame.instance_count("storage")?, 3);
/// # Ok::<(), tessera_core::FrameError>(())
/// ```
#[derive(Default)]
pub struct FrameBuilder {
    registry: SchemaRegistry,
    counts: Vec<usize>,
    config: FrameConfig,
    backend: Option<Box<dyn Backend>>,
}

impl std::fmt::Debug for FrameBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuilder")
            .field("schemas", &self.registry.len())
            .field("config", &self.config)
            .field("custom_backend", &self.backend.as_ref().map(|b| b.name()))
            .finish()
    }
}

impl FrameBuilder {
    /// An empty builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: FrameConfig) -> Self {
        self.config = config;
        self
    }

    /// Store the pools in a built-in backend.
    pub fn backend(mut self, kind: BackendKind) -> Self {
        self.config.backend = kind;
        self
    }

    /// Store the pools in a caller-supplied backend. Overrides
    /// [`backend`](Self::backend).
    ///
    /// The backend must not hold any pools yet.
    pub fn with_backend(mut self, backend: Box<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Enable snapshots with a ring of `capacity` slots.
    pub fn snapshots(mut self, capacity: usize) -> Self {
        self.config.snapshot_capacity = Some(capacity);
        self
    }

    /// The schema registry, for declaring schemas step by step.
    pub fn registry_mut(&mut self) -> &mut SchemaRegistry {
        &mut self.registry
    }

    /// Set the instance count of a declared schema.
    pub fn set_instances(&mut self, schema: SchemaId, count: usize) -> Result<(), FrameError> {
        if self.registry.get(schema).is_none() {
            return Err(tessera_core::traits::unknown_pool(schema));
        }
        self.sync_counts();
        self.counts[schema.index()] = count;
        Ok(())
    }

    fn sync_counts(&mut self) {
        self.counts.resize(self.registry.len(), 0);
    }

    /// Declare an empty schema with `count` instances.
    pub fn declare_schema(&mut self, name: &str, count: usize) -> Result<SchemaId, FrameError> {
        let id = self.registry.declare_schema(name)?;
        self.set_instances(id, count)?;
        Ok(id)
    }

    /// Add an attribute to a declared schema.
    pub fn declare_attribute(
        &mut self,
        schema: SchemaId,
        spec: AttributeSpec,
    ) -> Result<(), FrameError> {
        self.registry.declare_attribute(schema, spec).map(|_| ())
    }

    /// Declare a schema with its attributes and `count` instances.
    pub fn declare_schema_with(
        mut self,
        name: &str,
        attributes: impl IntoIterator<Item = AttributeSpec>,
        count: usize,
    ) -> Result<Self, FrameError> {
        let id = self.registry.declare_schema_with(name, attributes)?;
        self.set_instances(id, count)?;
        Ok(self)
    }

    /// Add a schema built elsewhere with `count` instances.
    pub fn add_schema(mut self, schema: NodeSchema, count: usize) -> Result<Self, FrameError> {
        let id = self.registry.register(schema)?;
        self.set_instances(id, count)?;
        Ok(self)
    }

    /// Declare the schema of node type `N` with `count` instances.
    pub fn node<N: NodeType>(mut self, count: usize) -> Result<Self, FrameError> {
        let id = N::declare(&mut self.registry)?;
        self.set_instances(id, count)?;
        Ok(self)
    }

    /// Validate the configuration, allocate every pool and create the
    /// snapshot ring.
    pub fn build(mut self) -> Result<Frame, FrameError> {
        self.config.validate()?;
        self.sync_counts();

        let backend = match self.backend {
            Some(backend) => backend,
            None => self.config.backend.create(),
        };
        let ring = self
            .config
            .snapshot_capacity
            .map(SnapshotRing::new)
            .transpose()?;

        let total_instances: usize = self.counts.iter().sum();
        let schemas: Vec<(NodeSchema, usize)> = self
            .registry
            .into_schemas()
            .into_iter()
            .zip(self.counts)
            .collect();
        let schema_count = schemas.len();

        let frame = Frame::assemble(schemas, backend, ring)?;
        info!(
            backend = frame.backend_name(),
            schemas = schema_count,
            instances = total_instances,
            snapshot_capacity = ?self.config.snapshot_capacity,
            "frame built"
        );
        Ok(frame)
    }
}

/// Build a frame from `(schema, instance count)` pairs on the dense backend.
///
/// `snapshot_capacity` is only read when `enable_snapshot` is set.
pub fn build_frame(
    schemas: Vec<(NodeSchema, usize)>,
    enable_snapshot: bool,
    snapshot_capacity: usize,
) -> Result<Frame, FrameError> {
    let mut builder = FrameBuilder::new();
    if enable_snapshot {
        builder = builder.snapshots(snapshot_capacity);
    }
    schemas
        .into_iter()
        .try_fold(builder, |b, (schema, count)| b.add_schema(schema, count))?
        .build()
}
