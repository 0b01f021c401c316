//! Error types for snap rounding and boolean operations.

/// Errors that can occur while building snapped output.
///
/// All errors abort the current call; any partially written output sinks
/// should be treated as garbage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// A snap function moved a point farther than its declared radius.
    #[error("snap function moved vertex by {moved:.3e} rad, more than its snap radius {allowed:.3e} rad")]
    SnapFunctionFailed { moved: f64, allowed: f64 },

    /// The requested snap radius exceeds the supported maximum.
    #[error("snap radius {radius:.3e} rad exceeds the maximum {max:.3e} rad")]
    SnapRadiusTooLarge { radius: f64, max: f64 },

    /// The snap radius is below what the snap function can guarantee.
    #[error("snap radius {radius:.3e} rad is below the minimum {min:.3e} rad")]
    SnapRadiusTooSmall { radius: f64, min: f64 },

    /// Lat/lng rounding exponent outside `0..=10`.
    #[error("lat/lng snap exponent {0} is outside 0..=10")]
    InvalidSnapExponent(i32),

    /// A tracked buffer would exceed the configured memory budget.
    #[error("memory budget exceeded: {requested} bytes requested, limit {limit} bytes")]
    ResourceExhausted { requested: usize, limit: usize },

    /// An undirected layer requires sibling pairs and an edge had none.
    #[error("expected all input edges to have siblings, but some were missing")]
    MissingExpectedSiblingEdges,

    /// A polygon layer received edges that cannot be assembled into loops.
    #[error("edges do not form loops: {0}")]
    EdgesDoNotFormLoops(String),

    /// A polyline layer received edges that cannot be assembled into polylines.
    #[error("edges do not form polylines: {0}")]
    EdgesDoNotFormPolylines(String),

    /// A point layer received a non-degenerate edge.
    #[error("found non-degenerate edges in a point layer")]
    NotDegenerate,

    /// An internal invariant failed (indicates a robustness bug).
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

/// Report an invariant failure: an error in debug builds, a warning (and
/// continue) in release builds.
pub(crate) fn invariant(ok: bool, what: impl FnOnce() -> String) -> Result<(), BuildError> {
    if ok {
        return Ok(());
    }
    let message = what();
    if cfg!(debug_assertions) {
        Err(BuildError::InvariantViolation(message))
    } else {
        tracing::warn!(%message, "internal invariant violated, continuing");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = BuildError::ResourceExhausted {
            requested: 100,
            limit: 10,
        };
        assert_eq!(
            e.to_string(),
            "memory budget exceeded: 100 bytes requested, limit 10 bytes"
        );
        assert!(BuildError::NotDegenerate.to_string().contains("point layer"));
    }

    #[test]
    fn test_invariant_passes_when_ok() {
        assert!(invariant(true, || unreachable!()).is_ok());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_invariant_fails_in_debug() {
        let r = invariant(false, || "multiplicity 2".to_string());
        assert_eq!(
            r,
            Err(BuildError::InvariantViolation("multiplicity 2".to_string()))
        );
    }
}
