//! Trajectory generation module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;

// Internal
use super::{new_generator, Params, PlanRequest, TrajGenError, TrajectoryGenerator};
use crate::{map::Map, path::OutputPath};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Trajectory generation module state
pub struct TrajGen {
    params: Params,

    /// Road geometry used for the Frenet conversions
    map: Box<dyn Map>,

    /// The strategy selected in the parameters
    generator: Box<dyn TrajectoryGenerator>,

    /// Number of successful calls to `proc`
    cycle: u64,

    report: StatusReport,
    arch_report: Archiver,

    /// The last output path, kept for archiving
    output: Option<OutputPath>,
    arch_output: Archiver,
}

/// Data needed to initialise [`TrajGen`].
pub struct TrajGenInitData {
    pub params: Params,
    pub map: Box<dyn Map>,
}

/// Status report for TrajGen processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// The cycle this report was produced on
    pub cycle: u64,

    /// Number of points carried over from the previous path
    pub num_carried: usize,

    /// Number of newly generated points
    pub num_generated: usize,

    /// Length of the output path
    ///
    /// Units: meters
    pub path_length_m: f64,
}

/// One archived point of an output path.
#[derive(Serialize)]
struct PathRecord {
    cycle: u64,
    index: usize,
    x_m: f64,
    y_m: f64,
    carried: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for TrajGen {
    type InitData = TrajGenInitData;
    type InitError = TrajGenError;

    type InputData = PlanRequest;
    type OutputData = OutputPath;
    type StatusReport = StatusReport;
    type ProcError = TrajGenError;

    /// Initialise the TrajGen module.
    ///
    /// Archives are only written if a session is given.
    fn init(init_data: Self::InitData, session: Option<&Session>) -> Result<Self, Self::InitError> {
        let TrajGenInitData { params, map } = init_data;

        params.validate()?;

        let generator = new_generator(params.strategy, &params);

        // Initialise the archivers
        let (arch_report, arch_output) = match session {
            Some(s) => (
                Archiver::from_path(s, "traj_gen/status_report.csv")
                    .map_err(TrajGenError::ArchiveError)?,
                Archiver::from_path(s, "traj_gen/output.csv")
                    .map_err(TrajGenError::ArchiveError)?,
            ),
            None => (Archiver::default(), Archiver::default()),
        };

        info!(
            "TrajGen initialised: {} strategy, {} points at {} s",
            generator.name(),
            params.num_points,
            params.dt_s
        );

        Ok(Self {
            params,
            map,
            generator,
            cycle: 0,
            report: StatusReport::default(),
            arch_report,
            output: None,
            arch_output,
        })
    }

    /// Generate the next output path.
    ///
    /// Errors are logged and returned without any partial output. Recovering,
    /// for example by calling [`TrajGen::reset`], is left to the caller.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let path = match self.generator.generate(input_data, self.map.as_ref()) {
            Ok(p) => p,
            Err(e) => {
                warn!("{} trajectory generation failed: {}", self.generator.name(), e);
                return Err(e);
            }
        };

        self.cycle += 1;

        let num_carried = input_data.previous_path.get_num_points();
        self.report = StatusReport {
            cycle: self.cycle,
            num_carried,
            num_generated: path.get_num_points() - num_carried,
            path_length_m: path.get_length().unwrap_or(0.0),
        };

        debug!(
            "TrajGen cycle {}: {} carried, {} generated, {:.3} m",
            self.report.cycle,
            self.report.num_carried,
            self.report.num_generated,
            self.report.path_length_m
        );

        self.output = Some(path.clone());

        if let Err(e) = self.write() {
            warn!("Could not archive TrajGen data: {}", e);
        }

        Ok((path, self.report))
    }
}

impl TrajGen {
    /// Forget the state carried between cycles, so that the next cycle starts
    /// again from the reported pose.
    pub fn reset(&mut self) {
        info!("Resetting {} trajectory generator", self.generator.name());
        self.generator.reset();
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Name of the active strategy.
    pub fn strategy_name(&self) -> &str {
        self.generator.name()
    }
}

impl Archived for TrajGen {
    fn write(&mut self) -> Result<(), ArchiveError> {
        if self.arch_report.is_active() {
            self.arch_report.serialise(self.report)?;
        }

        if let Some(ref path) = self.output {
            if self.arch_output.is_active() {
                for (index, p) in path.points_m.iter().enumerate() {
                    self.arch_output.serialise(PathRecord {
                        cycle: self.cycle,
                        index,
                        x_m: p.x,
                        y_m: p.y,
                        carried: index < self.report.num_carried,
                    })?;
                }
            }
        }

        Ok(())
    }
}
