//! Test doubles shared by the scenario tests and the cucumber runner.

use gherkin_rest::{CapturedResponse, Files, Params, RestModule, Result, SessionHeaders};
use std::collections::VecDeque;

/// One call seen by a [`RecordingClient`], with the headers in effect during it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub url: String,
    pub params: Params,
    pub files: Files,
    pub headers: SessionHeaders,
}

/// A [`RestModule`] that never touches the network.
///
/// Queued responses are handed out in order; once the queue is empty every
/// call answers `200` with an empty body.
#[derive(Debug, Default)]
pub struct RecordingClient {
    headers: SessionHeaders,
    calls: Vec<RecordedCall>,
    responses: VecDeque<CapturedResponse>,
    last_response: Option<CapturedResponse>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(&mut self, response: CapturedResponse) {
        self.responses.push_back(response);
    }

    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    pub fn last_call(&self) -> Option<&RecordedCall> {
        self.calls.last()
    }
}

impl RestModule for RecordingClient {
    fn session_headers(&self) -> &SessionHeaders {
        &self.headers
    }

    fn session_headers_mut(&mut self) -> &mut SessionHeaders {
        &mut self.headers
    }

    fn send(&mut self, method: &str, url: &str, params: Params, files: Files) -> Result<()> {
        self.calls.push(RecordedCall {
            method: method.to_string(),
            url: url.to_string(),
            params,
            files,
            headers: self.headers.clone(),
        });
        self.last_response = Some(
            self.responses
                .pop_front()
                .unwrap_or_else(|| CapturedResponse::new(200, "")),
        );

        Ok(())
    }

    fn last_response(&self) -> Option<&CapturedResponse> {
        self.last_response.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gherkin_rest::{
        with_scoped_headers, Error, Fields, Phrasing, RestSteps, RestStepsConfiguration, StepOutcome,
    };
    use rstest::rstest;
    use serde_json::json;
    use std::{
        io::{self, Write},
        path::Path,
        sync::{Arc, Mutex},
    };

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn steps(phrasing: Phrasing, boundary: Option<&str>) -> RestSteps<RecordingClient> {
        let mut configuration = RestStepsConfiguration::new();
        configuration.set_phrasing(phrasing);
        configuration.set_data_dir("/srv/fixtures");
        if let Some(boundary) = boundary {
            configuration.set_multipart_boundary(boundary);
        }

        RestSteps::new(RecordingClient::new(), configuration).unwrap()
    }

    /// Runs `scenario` until a step stops it; returns how many steps ran.
    fn run(steps: &mut RestSteps<RecordingClient>, scenario: &[(&str, Option<&str>)]) -> Result<usize> {
        for (index, (text, block)) in scenario.iter().enumerate() {
            if steps.run_step(text, *block)? == StepOutcome::StopScenario {
                return Ok(index + 1);
            }
        }
        Ok(scenario.len())
    }

    #[test]
    fn post_scenario_scopes_headers_to_the_call() {
        let mut steps = steps(Phrasing::Current, None);

        run(
            &mut steps,
            &[(
                r#"When I send a "POST" request to "/users" with:"#,
                Some(r#"{"headers":{"X-Test":"1"},"body":{"a":"b"}}"#),
            )],
        )
        .unwrap();

        let call = steps.client().last_call().unwrap();
        assert_eq!(call.headers.get("X-Test"), Some("1"));
        assert_eq!(call.params, Params::Json(r#"{"a":"b"}"#.to_string()));
        assert!(!steps.client().session_headers().contains("X-Test"));
    }

    #[test]
    fn form_scenario_sends_fields_and_resolved_files() {
        let mut steps = steps(Phrasing::Current, Some("foo"));

        run(
            &mut steps,
            &[(
                r#"When I send a "POST" request to "/users" as FORM with:"#,
                Some(r#"{"headers":{"X-Test":"1"},"body":{"a":"b"},"files":{"f":"img.jpg"}}"#),
            )],
        )
        .unwrap();

        let call = steps.client().last_call().unwrap();
        assert_eq!(
            call.headers.get("content-type"),
            Some("multipart/form-data; boundary=foo")
        );
        assert_eq!(call.params, Params::Form(json!({"a": "b"}).as_object().cloned().unwrap()));
        assert_eq!(call.files["f"], Path::new("/srv/fixtures/img.jpg"));
        assert!(steps.client().session_headers().is_empty());
    }

    #[rstest]
    #[case(r#"{"status":"ok"}"#, true)]
    #[case(r#"{"status":"fail"}"#, false)]
    fn containment_scenario(#[case] expected: &str, #[case] passes: bool) {
        let mut steps = steps(Phrasing::Current, None);
        steps
            .client_mut()
            .respond_with(CapturedResponse::new(200, r#"{"status":"ok","extra":1}"#));

        let result = run(
            &mut steps,
            &[
                (r#"When I send a "GET" request to "/health""#, None),
                ("Then the response body contains JSON:", Some(expected)),
            ],
        );

        assert_eq!(result.is_ok(), passes, "{:?}", result);
    }

    #[test]
    fn form_without_boundary_is_a_configuration_error() {
        let mut steps = steps(Phrasing::Current, None);
        steps.have_http_header("Accept", "application/json");

        let err = run(
            &mut steps,
            &[(
                r#"When I send a "POST" request to "/users" as FORM with:"#,
                Some(r#"{"headers":{"Accept":"text/csv"},"body":{"a":"b"}}"#),
            )],
        )
        .unwrap_err();

        assert!(matches!(err, Error::Configuration(_)));
        assert!(steps.client().calls().is_empty());
        assert_eq!(steps.client().session_headers().len(), 1);
        assert_eq!(
            steps.client().session_headers().get("Accept"),
            Some("application/json")
        );
    }

    #[test]
    fn legacy_scenario_with_print_stops_early() {
        let output = Captured::default();
        let mut steps = steps(Phrasing::Legacy, None).with_output(output.clone());
        steps.client_mut().respond_with(
            CapturedResponse::new(201, r#"{"id":1}"#).with_header("Location", "/users/1"),
        );

        let ran = run(
            &mut steps,
            &[
                (r#"Given I have a "Accept" header set to "application/json""#, None),
                (r#"When I send a "POST" request to "/users" with:"#, Some(r#"{"body":{"name":"Jane"}}"#)),
                (r#"Then I should receive a "201" response code"#, None),
                ("And I should receive a successful response code", None),
                (r#"And the "Location" response header is "/users/1""#, None),
                ("And the response body matches JSON:", Some(r#"{"id":"@integer@"}"#)),
                ("And I print last response as JSON", None),
                ("And I should receive an empty response", None),
            ],
        )
        .unwrap();

        assert_eq!(ran, 7);
        assert!(steps.is_halted());
        assert_eq!(
            String::from_utf8(output.0.lock().unwrap().clone()).unwrap(),
            "\n{\n  \"id\": 1\n}\n"
        );
        assert_eq!(steps.client().calls()[0].headers.get("Accept"), Some("application/json"));
    }

    #[test]
    fn scoped_headers_survive_failing_calls() {
        let mut client = RecordingClient::new();
        let headers: Fields = [("X".to_string(), "1".to_string())].into_iter().collect();

        let result: Result<()> = with_scoped_headers(&mut client, &headers, |client| {
            client.send("GET", "/", Params::Empty, Files::new())?;
            Err(Error::AssertionFailed("boom".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(client.calls()[0].headers.get("X"), Some("1"));
        assert!(!client.session_headers().contains("X"));
    }
}
