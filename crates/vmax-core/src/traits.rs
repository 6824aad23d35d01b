//! Core abstraction traits for reading simulator state.

use crate::state::{CandidatePaths, ObjectTrajectories, RoadgraphPoints, TrafficLights};

/// Read-only access to a simulator state.
///
/// This trait decouples feature extraction from the simulator
/// implementation: the pipeline reads through `&dyn SimulatorState` and
/// never mutates what it is given. Object and traffic-light views span
/// the whole episode log; [`current_timestep`](Self::current_timestep)
/// says which step is "now".
pub trait SimulatorState {
    /// Dynamic objects over the full log.
    fn objects(&self) -> &ObjectTrajectories;

    /// All roadgraph points of the scenario.
    fn roadgraph_points(&self) -> &RoadgraphPoints;

    /// Traffic lights over the full log.
    fn traffic_lights(&self) -> &TrafficLights;

    /// Candidate route geometries for the SDC, in world coordinates.
    fn candidate_paths(&self) -> &CandidatePaths;

    /// Index of the current timestep within the log.
    fn current_timestep(&self) -> usize;
}
