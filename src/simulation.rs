//! Simulation parameter form.
//!
//! Exposes the `step`, `length` and `seed` of a LEMS `Simulation` as numeric
//! fields with their units, writes edits straight back into the document,
//! and on submission saves a timestamped copy and hands it to a runner.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::config::SimulationConfig;
use crate::error::{Result, WidgetsError};
use crate::lems::{LemsDocument, SIMULATION_TYPE};
use crate::runner::{RunReport, SimulationRunner};
use crate::units::{self, Quantity};

/// Parameters shown when none are configured
pub const DEFAULT_PARAMETERS: [&str; 3] = ["step", "length", "seed"];

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// One editable numeric field
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterField {
    pub name: String,
    pub quantity: Quantity,
}

impl ParameterField {
    /// Unit label shown next to the input
    pub fn unit(&self) -> &str {
        &self.quantity.unit
    }

    pub fn magnitude(&self) -> f64 {
        self.quantity.magnitude
    }
}

/// Initial value of every field, recorded once per parameter name
#[derive(Debug, Clone, Default)]
pub struct FormState {
    initial: HashMap<String, Quantity>,
}

impl FormState {
    fn record_initial(&mut self, name: &str, quantity: &Quantity) {
        self.initial
            .entry(name.to_string())
            .or_insert_with(|| quantity.clone());
    }

    pub fn initial(&self, name: &str) -> Option<&Quantity> {
        self.initial.get(name)
    }

    /// Whether `field` differs from the value it had when the form was built
    pub fn is_changed(&self, field: &ParameterField) -> bool {
        self.initial(&field.name).is_some_and(|initial| {
            initial.magnitude != field.quantity.magnitude || initial.unit != field.quantity.unit
        })
    }
}

/// Result of editing a field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEdit {
    pub name: String,
    /// Text written into the descriptor
    pub text: String,
    pub changed: bool,
}

/// A submitted simulation
#[derive(Debug, Clone)]
pub struct Submission {
    pub path: PathBuf,
    pub report: RunReport,
}

/// Editable view over a LEMS simulation's parameters
#[derive(Debug, Clone)]
pub struct ParameterForm {
    document: LemsDocument,
    fields: Vec<ParameterField>,
    state: FormState,
    runner: String,
    output_dir: Option<PathBuf>,
}

impl ParameterForm {
    /// Build a form for `parameters` of the document's `Simulation` component.
    ///
    /// With several `Simulation` components the last one is used.
    pub fn new<S: AsRef<str>>(document: LemsDocument, parameters: &[S]) -> Result<Self> {
        let simulation = document
            .component_by_type(SIMULATION_TYPE)
            .ok_or_else(|| WidgetsError::Validation {
                message: format!("no {SIMULATION_TYPE} component in LEMS document"),
            })?;
        tracing::debug!(parameters = ?simulation.parameters(), "Simulation parameters");

        let mut fields = Vec::new();
        let mut state = FormState::default();
        for name in parameters {
            let name = name.as_ref();
            let Some(text) = simulation.parameter(name) else {
                tracing::warn!("{SIMULATION_TYPE} has no '{name}' parameter, skipping field");
                continue;
            };
            let quantity = units::split_quantity(text)?;
            state.record_initial(name, &quantity);
            fields.push(ParameterField {
                name: name.to_string(),
                quantity,
            });
        }

        Ok(Self {
            document,
            fields,
            state,
            runner: "jneuroml".to_string(),
            output_dir: None,
        })
    }

    pub fn from_config(document: LemsDocument, config: &SimulationConfig) -> Result<Self> {
        let mut form = Self::new(document, &config.parameters)?.with_runner(&config.runner);
        if let Some(dir) = &config.output_dir {
            form = form.with_output_dir(dir);
        }
        Ok(form)
    }

    pub fn with_runner(mut self, runner: impl Into<String>) -> Self {
        self.runner = runner.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn fields(&self) -> &[ParameterField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&ParameterField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn document(&self) -> &LemsDocument {
        &self.document
    }

    pub fn runner(&self) -> &str {
        &self.runner
    }

    pub fn is_changed(&self, name: &str) -> bool {
        self.field(name).is_some_and(|f| self.state.is_changed(f))
    }

    pub fn changed_fields(&self) -> impl Iterator<Item = &ParameterField> {
        self.fields.iter().filter(|f| self.state.is_changed(f))
    }

    /// Set a field's magnitude, keeping its unit, and write it into the document
    pub fn edit(&mut self, name: &str, magnitude: f64) -> Result<FieldEdit> {
        if !magnitude.is_finite() {
            return Err(WidgetsError::Validation {
                message: format!("'{name}' must be a finite number"),
            });
        }
        let idx = self.field_index(name)?;
        let quantity = self.fields[idx].quantity.with_magnitude(magnitude);
        let text = quantity.to_string();

        self.state.record_initial(name, &self.fields[idx].quantity);
        self.fields[idx].quantity = quantity;

        let simulation = self
            .document
            .component_by_type_mut(SIMULATION_TYPE)
            .ok_or_else(|| WidgetsError::Internal {
                message: format!("{SIMULATION_TYPE} component disappeared"),
            })?;
        simulation.set_parameter(name, text.clone());

        let changed = self.state.is_changed(&self.fields[idx]);
        tracing::debug!(name, %text, changed, "Parameter edited");
        Ok(FieldEdit {
            name: name.to_string(),
            text,
            changed,
        })
    }

    /// Edit from user text: a bare number, or a number with the field's own unit
    pub fn edit_text(&mut self, name: &str, text: &str) -> Result<FieldEdit> {
        let idx = self.field_index(name)?;
        let entered = units::split_quantity(text)?;
        let unit = &self.fields[idx].quantity.unit;
        if !entered.unit.is_empty() && entered.unit != *unit {
            return Err(WidgetsError::Validation {
                message: format!(
                    "'{name}' is in '{unit}', got '{}'; unit changes are not supported",
                    entered.unit
                ),
            });
        }
        self.edit(name, entered.magnitude)
    }

    /// Where a submission at `now` is written
    pub fn submission_path(&self, now: DateTime<Local>) -> PathBuf {
        let source = self.document.path();
        let stem = source
            .and_then(Path::file_stem)
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "LEMS_simulation".to_string());
        let file_name = format!("{stem}_{}.xml", now.format(TIMESTAMP_FORMAT));

        let dir = self
            .output_dir
            .clone()
            .or_else(|| source.and_then(Path::parent).map(Path::to_path_buf))
            .unwrap_or_default();
        dir.join(file_name)
    }

    /// Save the edited document under a timestamped name and run it
    pub fn submit(&self, runner: &dyn SimulationRunner) -> Result<Submission> {
        self.submit_at(runner, Local::now())
    }

    pub fn submit_at(
        &self,
        runner: &dyn SimulationRunner,
        now: DateTime<Local>,
    ) -> Result<Submission> {
        let path = self.submission_path(now);
        self.document.write(&path)?;
        tracing::info!(runner = %self.runner, path = %path.display(), "Submitting simulation");
        let report = runner.run(&self.runner, &path)?;
        Ok(Submission { path, report })
    }

    fn field_index(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| {
                let mut message = format!("Unknown parameter: '{name}'");
                let known = self.fields.iter().map(|f| f.name.as_str());
                if let Some(closest) = closest_name(name, known) {
                    message.push_str(&format!(". Did you mean '{closest}'?"));
                }
                WidgetsError::Validation { message }
            })
    }
}

fn closest_name<'a>(input: &str, candidates: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let input = input.to_lowercase();
    candidates
        .map(|c| (c, strsim::levenshtein(&input, &c.to_lowercase())))
        .filter(|(_, distance)| *distance <= 3)
        .min_by_key(|(_, distance)| *distance)
        .map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIM: &str = r#"<Lems>
    <Simulation id="sim1" length="1000ms" step="0.01ms" target="net1" seed="123"/>
</Lems>"#;

    fn form() -> ParameterForm {
        ParameterForm::new(LemsDocument::parse(SIM).unwrap(), &DEFAULT_PARAMETERS).unwrap()
    }

    #[test]
    fn fields_carry_units() {
        let form = form();
        let summary: Vec<(&str, f64, &str)> = form
            .fields()
            .iter()
            .map(|f| (f.name.as_str(), f.magnitude(), f.unit()))
            .collect();
        assert_eq!(
            summary,
            vec![("step", 0.01, "ms"), ("length", 1000.0, "ms"), ("seed", 123.0, "")]
        );
    }

    #[test]
    fn edit_writes_back_and_tracks_change() {
        let mut form = form();
        let edit = form.edit("step", 0.025).unwrap();
        assert_eq!(edit.text, "0.025 ms");
        assert!(edit.changed);
        assert_eq!(
            form.document()
                .component_by_type(SIMULATION_TYPE)
                .unwrap()
                .parameter("step"),
            Some("0.025 ms")
        );

        // back to the initial value
        let edit = form.edit("step", 0.01).unwrap();
        assert!(!edit.changed);
        assert_eq!(form.state().initial("step").unwrap().magnitude, 0.01);
    }

    #[test]
    fn seed_stays_integral() {
        let mut form = form();
        assert_eq!(form.edit("seed", 7.0).unwrap().text, "7");
        assert_eq!(form.changed_fields().count(), 1);
    }

    #[test]
    fn unknown_parameter_suggests_closest() {
        let mut form = form();
        let err = form.edit("stpe", 1.0).unwrap_err().to_string();
        assert!(err.contains("Did you mean 'step'?"), "{err}");
    }

    #[test]
    fn edit_text_rejects_other_units() {
        let mut form = form();
        assert!(form.edit_text("length", "2s").is_err());
        assert_eq!(form.edit_text("length", "500ms").unwrap().text, "500 ms");
        assert_eq!(form.edit_text("length", "250").unwrap().text, "250 ms");
    }

    #[test]
    fn binds_the_last_simulation() {
        let doc = LemsDocument::parse(
            r#"<Lems>
    <Simulation id="a" length="10ms" step="1ms"/>
    <Simulation id="b" length="20ms" step="2ms"/>
</Lems>"#,
        )
        .unwrap();
        let mut form = ParameterForm::new(doc, &DEFAULT_PARAMETERS).unwrap();
        assert_eq!(form.field("step").unwrap().quantity.to_string(), "2 ms");

        form.edit("length", 40.0).unwrap();
        let simulations: Vec<(Option<&str>, Option<&str>)> = form
            .document()
            .components()
            .iter()
            .map(|c| (c.id.as_deref(), c.parameter("length")))
            .collect();
        assert_eq!(
            simulations,
            vec![(Some("a"), Some("10ms")), (Some("b"), Some("40 ms"))]
        );
    }

    #[test]
    fn missing_simulation_is_an_error() {
        let doc = LemsDocument::parse("<Lems><Include file=\"x.xml\"/></Lems>").unwrap();
        assert!(ParameterForm::new(doc, &DEFAULT_PARAMETERS).is_err());
    }

    #[test]
    fn missing_parameters_are_skipped() {
        let doc =
            LemsDocument::parse("<Lems><Simulation id=\"s\" length=\"1s\" step=\"1ms\"/></Lems>")
                .unwrap();
        let form = ParameterForm::new(doc, &DEFAULT_PARAMETERS).unwrap();
        assert_eq!(form.fields().len(), 2);
        assert!(form.field("seed").is_none());
    }
}
