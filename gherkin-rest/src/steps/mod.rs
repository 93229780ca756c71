//! The step dispatcher: step text in, HTTP calls and assertions out.

mod table;

pub use table::{patterns, resolve, strip_keyword, Phrasing, StepKind, StepPart, StepPattern};

use crate::{
    assertions,
    configuration::RestStepsConfiguration,
    error::{Error, JsonOrigin, Result},
    matcher::{JsonPatternMatcher, PatternMatcher},
    request::{normalize, PendingRequest, RequestDescriptor},
    rest_module::RestModule,
    session_headers::ScopedHeaders,
};
use serde_json::Value;
use std::{
    fmt,
    io::{self, Write},
};
use tracing::{debug, warn};

/// A recognized step with its typed parameters.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Step {
    SetHeader { name: String, value: String },
    Send { method: String, url: String },
    SendWithBody { method: String, url: String, payload: String },
    SendAsForm { method: String, url: String, payload: String },
    AssertStatus(u16),
    AssertSuccessful,
    AssertHeaderExists(String),
    AssertHeaderEquals { name: String, value: String },
    AssertBodyEmpty,
    AssertBodyContainsJson(String),
    AssertBodyMatchesJson(String),
    PrintResponse,
    PrintResponseAsJson,
}

impl Step {
    pub fn part(&self) -> StepPart {
        match self {
            Step::SendAsForm { .. } => StepPart::Multipart,
            _ => StepPart::Send,
        }
    }
}

/// What the scenario runner should do after a step.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StepOutcome {
    Continue,
    /// A diagnostic step ran; the remaining steps of the scenario must be skipped.
    StopScenario,
}

/// Runs steps for one scenario against a [`RestModule`].
pub struct RestSteps<C: RestModule> {
    client: C,
    configuration: RestStepsConfiguration,
    matcher: Box<dyn PatternMatcher + Send + Sync>,
    output: Box<dyn Write + Send>,
    halted: bool,
}

impl<C: RestModule> RestSteps<C> {
    /// Fails when the configuration declares a dependency other than `REST`.
    pub fn new(client: C, configuration: RestStepsConfiguration) -> Result<Self> {
        configuration.validate()?;

        Ok(Self {
            client,
            configuration,
            matcher: Box::new(JsonPatternMatcher),
            output: Box::new(io::stdout()),
            halted: false,
        })
    }

    pub fn with_matcher<M: PatternMatcher + Send + Sync + 'static>(mut self, matcher: M) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    /// Where the print steps write their dumps. Standard output by default.
    pub fn with_output<W: Write + Send + 'static>(mut self, output: W) -> Self {
        self.output = Box::new(output);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn into_client(self) -> C {
        self.client
    }

    pub fn configuration(&self) -> &RestStepsConfiguration {
        &self.configuration
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Resolves `text` against the configured phrasing; steps of disabled parts are undefined.
    pub fn resolve(&self, text: &str, block: Option<&str>) -> Result<Step> {
        let step = resolve(self.configuration.phrasing(), text, block)?;

        if !self.configuration.is_part_enabled(step.part()) {
            return Err(Error::UndefinedStep(strip_keyword(text).to_string()));
        }

        Ok(step)
    }

    /// Resolves and executes one step of the scenario.
    pub fn run_step(&mut self, text: &str, block: Option<&str>) -> Result<StepOutcome> {
        if self.halted {
            return Err(Error::ScenarioHalted);
        }

        let step = self.resolve(text, block).map_err(|e| {
            if let Error::UndefinedStep(sentence) = &e {
                warn!(step = %sentence, "no step definition matches");
            }
            e
        })?;

        self.execute(step)
    }

    pub fn execute(&mut self, step: Step) -> Result<StepOutcome> {
        debug!(?step, "running step");

        match step {
            Step::SetHeader { name, value } => self.have_http_header(&name, &value),
            Step::Send { method, url } => self.send_http_request(&method, &url)?,
            Step::SendWithBody {
                method,
                url,
                payload,
            } => self.send_http_request_with_body(&method, &url, &payload)?,
            Step::SendAsForm {
                method,
                url,
                payload,
            } => self.send_http_request_as_form(&method, &url, &payload)?,
            Step::AssertStatus(code) => self.client.see_response_code_is(code)?,
            Step::AssertSuccessful => self.client.see_response_code_is_successful()?,
            Step::AssertHeaderExists(name) => self.client.see_http_header(&name, None)?,
            Step::AssertHeaderEquals { name, value } => {
                self.client.see_http_header(&name, Some(value.as_str()))?
            }
            Step::AssertBodyEmpty => self.client.see_response_equals("")?,
            Step::AssertBodyContainsJson(expected) => self.see_response_contains_json(&expected)?,
            Step::AssertBodyMatchesJson(pattern) => self.see_response_matches_json(&pattern)?,
            Step::PrintResponse => return self.print_last_response(),
            Step::PrintResponseAsJson => return self.print_last_response_as_json(),
        }

        Ok(StepOutcome::Continue)
    }

    /// Sets a header for all subsequent requests.
    pub fn have_http_header(&mut self, name: &str, value: &str) {
        self.client.have_http_header(name, value);
    }

    pub fn send_http_request(&mut self, method: &str, url: &str) -> Result<()> {
        self.client.send(method, url, Default::default(), Default::default())
    }

    /// Sends the request described by the JSON block text of a step.
    pub fn send_http_request_with_body(&mut self, method: &str, url: &str, payload: &str) -> Result<()> {
        let descriptor = RequestDescriptor::parse(payload)?;
        self.send_descriptor(method, url, &descriptor)
    }

    /// Sends a request described by an already decoded JSON object.
    ///
    /// Its `headers` are only applied for this call.
    pub fn send_with_body_and_headers(&mut self, method: &str, url: &str, raw: &Value) -> Result<()> {
        let descriptor = normalize(raw)?;
        self.send_descriptor(method, url, &descriptor)
    }

    pub fn send_http_request_as_form(&mut self, method: &str, url: &str, payload: &str) -> Result<()> {
        self.configuration.multipart_boundary()?;

        let descriptor = RequestDescriptor::parse(payload)?;
        self.send_form(method, url, &descriptor)
    }

    /// Sends `raw` as `multipart/form-data` with its files resolved against the data directory.
    pub fn send_as_form_with_files(&mut self, method: &str, url: &str, raw: &Value) -> Result<()> {
        self.configuration.multipart_boundary()?;

        let descriptor = normalize(raw)?;
        self.send_form(method, url, &descriptor)
    }

    fn send_descriptor(&mut self, method: &str, url: &str, descriptor: &RequestDescriptor) -> Result<()> {
        let PendingRequest { params, files } = PendingRequest::new(method, descriptor)?;

        let mut client = ScopedHeaders::apply(&mut self.client, &descriptor.headers);
        client.send(method, url, params, files)
    }

    fn send_form(&mut self, method: &str, url: &str, descriptor: &RequestDescriptor) -> Result<()> {
        let boundary = self.configuration.multipart_boundary()?;
        let content_type = format!("multipart/form-data; boundary={}", boundary);
        let PendingRequest { params, files } =
            PendingRequest::with_files(method, descriptor, self.configuration.data_dir())?;

        let mut client = ScopedHeaders::new(&mut self.client);
        client.push("Content-Type", &content_type);
        for (name, value) in &descriptor.headers {
            client.push(name, value);
        }
        client.send(method, url, params, files)
    }

    pub fn see_response_contains_json(&self, expected: &str) -> Result<()> {
        let expected = decode_step_json(expected)?;
        self.client.see_response_contains_json(&expected)
    }

    pub fn see_response_matches_json(&self, pattern: &str) -> Result<()> {
        let pattern = decode_step_json(pattern)?;
        assertions::body_matches_pattern(self.client.response()?, &pattern, self.matcher.as_ref())
    }

    /// Writes the raw body of the last response and ends the scenario.
    pub fn print_last_response(&mut self) -> Result<StepOutcome> {
        let dump = assertions::dump(self.client.response()?);
        self.print(&dump)
    }

    /// Writes the last response as indented JSON and ends the scenario.
    pub fn print_last_response_as_json(&mut self) -> Result<StepOutcome> {
        let dump = assertions::dump_json(self.client.response()?)?;
        self.print(&dump)
    }

    fn print(&mut self, dump: &str) -> Result<StepOutcome> {
        write!(self.output, "\n{}\n", dump)?;
        self.output.flush()?;
        self.halted = true;

        Ok(StepOutcome::StopScenario)
    }
}

impl<C: RestModule + fmt::Debug> fmt::Debug for RestSteps<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestSteps")
            .field("client", &self.client)
            .field("configuration", &self.configuration)
            .field("matcher", &self.matcher)
            .field("halted", &self.halted)
            .finish()
    }
}

fn decode_step_json(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| Error::invalid_json(JsonOrigin::StepArgument, e))
}
