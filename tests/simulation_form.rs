use std::cell::RefCell;
use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};
use neuroml_widgets::lems::{LemsDocument, SIMULATION_TYPE};
use neuroml_widgets::runner::{RunReport, SimulationRunner};
use neuroml_widgets::simulation::{DEFAULT_PARAMETERS, ParameterForm};
use neuroml_widgets::{Result, WidgetsError};

const LEMS_SIM: &str = r#"<Lems>
    <Target component="sim1"/>
    <Include file="Cells.xml"/>
    <Include file="net.nml"/>
    <Simulation id="sim1" length="1000ms" step="0.01ms" target="net1" seed="123">
        <Display id="d1" title="V" timeScale="1ms" xmin="-100" xmax="1100" ymin="-90" ymax="50">
            <Line id="v" quantity="pop0[0]/v" scale="1mV" color="red" timeScale="1ms"/>
        </Display>
    </Simulation>
</Lems>
"#;

/// Records what it was asked to run instead of spawning anything
#[derive(Default)]
struct RecordingRunner {
    calls: RefCell<Vec<(String, PathBuf, String)>>,
}

impl SimulationRunner for RecordingRunner {
    fn run(&self, runner: &str, lems_file: &Path) -> Result<RunReport> {
        let contents =
            std::fs::read_to_string(lems_file).map_err(|e| WidgetsError::io(lems_file, e))?;
        self.calls
            .borrow_mut()
            .push((runner.to_string(), lems_file.to_path_buf(), contents));
        Ok(RunReport {
            runner: runner.to_string(),
            exit_code: Some(0),
            stdout: "done".to_string(),
            stderr: String::new(),
        })
    }
}

struct FailingRunner;

impl SimulationRunner for FailingRunner {
    fn run(&self, runner: &str, lems_file: &Path) -> Result<RunReport> {
        Err(WidgetsError::Runner {
            runner: runner.to_string(),
            file: lems_file.display().to_string(),
            message: "exit status Some(1)".to_string(),
        })
    }
}

fn write_sim(dir: &Path) -> PathBuf {
    let path = dir.join("LEMS_sim.xml");
    std::fs::write(&path, LEMS_SIM).unwrap();
    path
}

#[test]
fn submit_writes_timestamped_copy_and_runs_it() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_sim(dir.path());

    let mut form = ParameterForm::new(LemsDocument::read(&source).unwrap(), &DEFAULT_PARAMETERS)
        .unwrap()
        .with_runner("jneuroml_neuron");
    form.edit("step", 0.025).unwrap();
    form.edit_text("length", "500").unwrap();

    let runner = RecordingRunner::default();
    let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
    let submission = form.submit_at(&runner, now).unwrap();

    assert_eq!(submission.path, dir.path().join("LEMS_sim_20240305-140709.xml"));
    assert_eq!(submission.report.stdout, "done");

    let calls = runner.calls.borrow();
    assert_eq!(calls.len(), 1);
    let (runner_id, path, contents) = &calls[0];
    assert_eq!(runner_id, "jneuroml_neuron");
    assert_eq!(path, &submission.path);
    assert!(contents.contains(r#"step="0.025 ms""#), "{contents}");
    assert!(contents.contains(r#"length="500 ms""#), "{contents}");
    assert!(contents.contains(r#"seed="123""#), "{contents}");
    // untouched elements come through as written
    assert!(contents.contains(r#"<Include file="Cells.xml"/>"#));
    assert!(contents.contains(
        r#"<Line id="v" quantity="pop0[0]/v" scale="1mV" color="red" timeScale="1ms"/>"#
    ));

    // the source file is not modified
    assert_eq!(std::fs::read_to_string(&source).unwrap(), LEMS_SIM);
}

#[test]
fn submitted_copy_reloads_with_edited_values() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("runs");
    std::fs::create_dir(&out).unwrap();
    let source = write_sim(dir.path());

    let mut form = ParameterForm::new(LemsDocument::read(&source).unwrap(), &DEFAULT_PARAMETERS)
        .unwrap()
        .with_output_dir(&out);
    form.edit("seed", 42.0).unwrap();

    let now = Local.with_ymd_and_hms(2024, 11, 20, 9, 0, 0).unwrap();
    let submission = form.submit_at(&RecordingRunner::default(), now).unwrap();
    assert!(submission.path.starts_with(&out));

    let reloaded = LemsDocument::read(&submission.path).unwrap();
    let simulation = reloaded.component_by_type(SIMULATION_TYPE).unwrap();
    assert_eq!(simulation.parameter("seed"), Some("42"));
    assert_eq!(simulation.parameter("step"), Some("0.01ms"));
    assert_eq!(simulation.parameter("target"), Some("net1"));
}

#[test]
fn runner_failure_is_reported_after_the_file_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_sim(dir.path());
    let form =
        ParameterForm::new(LemsDocument::read(&source).unwrap(), &DEFAULT_PARAMETERS).unwrap();

    let now = Local.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
    let err = form.submit_at(&FailingRunner, now).unwrap_err();
    assert!(matches!(err, WidgetsError::Runner { .. }));
    assert!(form.submission_path(now).exists());
}

#[test]
fn change_tracking_follows_initial_values() {
    let doc = LemsDocument::parse(LEMS_SIM).unwrap();
    let mut form = ParameterForm::new(doc, &DEFAULT_PARAMETERS).unwrap();
    assert_eq!(form.changed_fields().count(), 0);

    form.edit("length", 2000.0).unwrap();
    form.edit("step", 0.02).unwrap();
    let changed: Vec<&str> = form.changed_fields().map(|f| f.name.as_str()).collect();
    assert_eq!(changed, vec!["step", "length"]);

    form.edit("length", 1000.0).unwrap();
    assert!(!form.is_changed("length"));
    assert!(form.is_changed("step"));
}
