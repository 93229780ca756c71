//! Scenario state for the cucumber runner.
//!
//! Steps that set up or inspect the recording client are handled here; every
//! other step is forwarded to [`RestSteps`].

use cucumber::{gherkin::Step, World};
use gherkin_rest::{CapturedResponse, Phrasing, RestModule, RestSteps, RestStepsConfiguration};
use lazy_static::lazy_static;
use regex::Regex;
use std::{
    fmt,
    io::{self, Write},
    sync::{Arc, Mutex},
};
use tests::RecordingClient;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/_data");

lazy_static! {
    static ref PHRASING_REGEX: Regex = Regex::new(r#"^the "(legacy|current)" phrasing is used$"#).unwrap();
    static ref BOUNDARY_REGEX: Regex = Regex::new(r#"^the multipart boundary is "([^"]*)"$"#).unwrap();
    static ref STUB_REGEX: Regex =
        Regex::new(r#"^the server answers "(\d+)"(?: with a "([^"]*)" header set to "([^"]*)")?:?$"#).unwrap();
    static ref CALL_REGEX: Regex =
        Regex::new(r#"^the server received a "([^"]*)" request to "([^"]*)"$"#).unwrap();
    static ref CALL_HEADER_REGEX: Regex =
        Regex::new(r#"^the server received the "([^"]*)" header set to "([^"]*)"$"#).unwrap();
    static ref CALL_BODY_REGEX: Regex = Regex::new(r"^the server received the body:$").unwrap();
    static ref CALL_FILE_REGEX: Regex =
        Regex::new(r#"^the server received the "([^"]*)" file from the data directory$"#).unwrap();
    static ref UNSET_REGEX: Regex = Regex::new(r#"^no "([^"]*)" header is kept for later requests$"#).unwrap();
    static ref OUTPUT_REGEX: Regex = Regex::new(r"^the printed output is:$").unwrap();
}

#[derive(Clone, Default)]
struct PrintedOutput(Arc<Mutex<Vec<u8>>>);

impl PrintedOutput {
    fn text(&self) -> String {
        self.0
            .lock()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}

impl Write for PrintedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "poisoned output"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(World)]
#[world(init = Self::new)]
pub struct RestWorld {
    steps: Option<RestSteps<RecordingClient>>,
    output: PrintedOutput,
}

impl RestWorld {
    fn new() -> Self {
        let mut configuration = RestStepsConfiguration::new();
        configuration.set_data_dir(DATA_DIR);
        let output = PrintedOutput::default();
        let steps = RestSteps::new(RecordingClient::new(), configuration)
            .expect("the default configuration is valid")
            .with_output(output.clone());

        Self {
            steps: Some(steps),
            output,
        }
    }

    fn steps(&mut self) -> TestResult<&mut RestSteps<RecordingClient>> {
        self.steps.as_mut().ok_or_else(|| "no dispatcher".into())
    }

    fn client(&mut self) -> TestResult<&RecordingClient> {
        Ok(self.steps()?.client())
    }

    /// Rebuilds the dispatcher with a changed configuration, keeping the client and its stubs.
    fn reconfigure<F: FnOnce(&mut RestStepsConfiguration)>(&mut self, change: F) -> TestResult {
        let current = self.steps.take().ok_or("no dispatcher")?;
        let mut configuration = current.configuration().clone();
        change(&mut configuration);

        let steps = RestSteps::new(current.into_client(), configuration)?.with_output(self.output.clone());
        self.steps = Some(steps);
        Ok(())
    }

    pub fn run_step(&mut self, step: &Step) -> TestResult {
        let text = step.value.as_str();
        let block = step.docstring.as_deref();

        if self.run_control_step(text, block)? {
            return Ok(());
        }

        let steps = self.steps()?;
        if steps.is_halted() {
            // The scenario ended at a print step. Cucumber still marks this
            // step as passed, but it was not run.
            return Ok(());
        }

        steps.run_step(text, block)?;
        Ok(())
    }

    fn run_control_step(&mut self, text: &str, block: Option<&str>) -> TestResult<bool> {
        if let Some(captures) = PHRASING_REGEX.captures(text) {
            let phrasing = match &captures[1] {
                "legacy" => Phrasing::Legacy,
                _ => Phrasing::Current,
            };
            self.reconfigure(|configuration| configuration.set_phrasing(phrasing))?;
        } else if let Some(captures) = BOUNDARY_REGEX.captures(text) {
            let boundary = captures[1].to_string();
            self.reconfigure(|configuration| configuration.set_multipart_boundary(boundary))?;
        } else if let Some(captures) = STUB_REGEX.captures(text) {
            let mut response = CapturedResponse::new(captures[1].parse()?, block.unwrap_or_default().trim());
            if let (Some(name), Some(value)) = (captures.get(2), captures.get(3)) {
                response = response.with_header(name.as_str(), value.as_str());
            }
            self.steps()?.client_mut().respond_with(response);
        } else if let Some(captures) = CALL_REGEX.captures(text) {
            let call = self.client()?.last_call().ok_or("no request was sent")?;
            assert_eq!(call.method, &captures[1]);
            assert_eq!(call.url, &captures[2]);
        } else if let Some(captures) = CALL_HEADER_REGEX.captures(text) {
            let call = self.client()?.last_call().ok_or("no request was sent")?;
            assert_eq!(call.headers.get(&captures[1]), Some(&captures[2]));
        } else if CALL_BODY_REGEX.is_match(text) {
            let expected: serde_json::Value = serde_json::from_str(block.ok_or("missing body")?)?;
            let call = self.client()?.last_call().ok_or("no request was sent")?;
            let actual = match &call.params {
                gherkin_rest::Params::Json(text) => serde_json::from_str(text)?,
                gherkin_rest::Params::Form(fields) => serde_json::Value::Object(fields.clone()),
                other => return Err(format!("no body was sent: {:?}", other).into()),
            };
            assert_eq!(actual, expected);
        } else if let Some(captures) = CALL_FILE_REGEX.captures(text) {
            let call = self.client()?.last_call().ok_or("no request was sent")?;
            let path = call.files.get(&captures[1]).ok_or("the file part is missing")?;
            assert!(path.starts_with(DATA_DIR), "{}", path.display());
            assert!(path.is_file(), "{}", path.display());
        } else if let Some(captures) = UNSET_REGEX.captures(text) {
            assert!(!self.client()?.session_headers().contains(&captures[1]));
        } else if OUTPUT_REGEX.is_match(text) {
            assert_eq!(self.output.text().trim(), block.unwrap_or_default().trim());
        } else {
            return Ok(false);
        }

        Ok(true)
    }
}

impl fmt::Debug for RestWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestWorld")
            .field("steps", &self.steps)
            .finish()
    }
}
