//! External simulation runners.

use std::path::Path;
use std::process::Command;

use crate::error::{Result, WidgetsError};

/// Outcome of a finished simulation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub runner: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Anything that can execute a LEMS file with a named simulator
pub trait SimulationRunner {
    fn run(&self, runner: &str, lems_file: &Path) -> Result<RunReport>;
}

/// Runs simulations by spawning a command line tool (`pynml` by default)
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    extra_args: Vec<String>,
}

impl CommandRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: vec!["-nogui".to_string()],
        }
    }

    /// Replace the arguments passed after the LEMS file
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Full argument list for a run
    pub fn args_for(&self, runner: &str, lems_file: &Path) -> Vec<String> {
        let mut args = vec![lems_file.display().to_string()];
        if let Some(flag) = engine_flag(runner) {
            args.push(flag.to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new("pynml")
    }
}

/// Command line flag selecting a simulator; jNeuroML needs none
pub fn engine_flag(runner: &str) -> Option<&'static str> {
    match runner.to_ascii_lowercase().as_str() {
        "neuron" | "jneuroml_neuron" => Some("-neuron"),
        "netpyne" | "jneuroml_netpyne" => Some("-netpyne"),
        "brian2" | "jneuroml_brian2" => Some("-brian2"),
        "eden" | "jneuroml_eden" => Some("-eden"),
        _ => None,
    }
}

impl SimulationRunner for CommandRunner {
    fn run(&self, runner: &str, lems_file: &Path) -> Result<RunReport> {
        let args = self.args_for(runner, lems_file);
        tracing::info!(program = %self.program, ?args, "Starting simulation");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| WidgetsError::Runner {
                runner: runner.to_string(),
                file: lems_file.display().to_string(),
                message: format!("failed to spawn {}: {}", self.program, e),
            })?;

        let report = RunReport {
            runner: runner.to_string(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.status.success() {
            return Err(WidgetsError::Runner {
                runner: runner.to_string(),
                file: lems_file.display().to_string(),
                message: format!(
                    "exit status {:?}: {}",
                    report.exit_code,
                    report.stderr.trim()
                ),
            });
        }

        tracing::info!(runner, "Simulation finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn jneuroml_uses_no_engine_flag() {
        let runner = CommandRunner::default();
        let args = runner.args_for("jneuroml", &PathBuf::from("LEMS_sim.xml"));
        assert_eq!(args, vec!["LEMS_sim.xml", "-nogui"]);
    }

    #[test]
    fn engine_flags() {
        assert_eq!(engine_flag("NEURON"), Some("-neuron"));
        assert_eq!(engine_flag("jneuroml_netpyne"), Some("-netpyne"));
        assert_eq!(engine_flag("jneuroml"), None);
    }

    #[test]
    fn missing_program_is_a_runner_error() {
        let runner = CommandRunner::new("definitely-not-a-real-simulator-binary");
        let err = runner
            .run("jneuroml", &PathBuf::from("LEMS_sim.xml"))
            .unwrap_err();
        assert!(matches!(err, WidgetsError::Runner { .. }));
    }
}
