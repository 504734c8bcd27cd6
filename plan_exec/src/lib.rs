//! # Planner library.
//!
//! This library allows other crates in the workspace (and the benches) to
//! access items defined inside the planner crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Road geometry - converts Frenet coordinates into Cartesian coordinates
pub mod map;

/// Path types shared between the planner and its consumer
pub mod path;

/// Trajectory generation - turns a target lane and speed into a time sampled path
pub mod traj_gen;
