//! Zero-cost phase timing for the builder and boolean pipelines.
//!
//! When the `timing` feature is enabled, each top-level call collects coarse
//! phase durations and reports them as a `tracing` event on completion.
//!
//! When disabled, all types become zero-sized and all methods compile away.

/// Pipeline phase that a duration is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Region crossing query and containment setup.
    Crossings,
    /// Boundary clipping of both regions.
    Clipping,
    /// Site selection, including crossing splitting.
    ChooseSites,
    /// Extra-site insertion and edge snapping.
    ExtraSites,
    /// Snapped edge emission and per-layer graph processing.
    LayerEdges,
    /// Edge chain simplification.
    Simplify,
    /// Output layer assembly.
    Layers,
}

impl Phase {
    pub(crate) const COUNT: usize = 7;

    pub(crate) const ALL: [Phase; Self::COUNT] = [
        Phase::Crossings,
        Phase::Clipping,
        Phase::ChooseSites,
        Phase::ExtraSites,
        Phase::LayerEdges,
        Phase::Simplify,
        Phase::Layers,
    ];

    pub(crate) fn name(self) -> &'static str {
        match self {
            Phase::Crossings => "crossings",
            Phase::Clipping => "clipping",
            Phase::ChooseSites => "choose_sites",
            Phase::ExtraSites => "extra_sites",
            Phase::LayerEdges => "layer_edges",
            Phase::Simplify => "simplify",
            Phase::Layers => "layers",
        }
    }
}

#[cfg(feature = "timing")]
mod real;
#[cfg(not(feature = "timing"))]
mod stub;

#[cfg(feature = "timing")]
pub use real::*;
#[cfg(not(feature = "timing"))]
pub use stub::*;
