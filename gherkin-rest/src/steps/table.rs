use super::Step;
use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

/// Which wording the step sentences use.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phrasing {
    /// "I have a "X" header set to ...", "I should receive a "200" response code", ...
    Legacy,
    /// "the "X" request header is ...", "the response code is "200"", ...
    Current,
}

/// Capability group a step belongs to; groups can be switched off in the configuration.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepPart {
    Send,
    Multipart,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StepKind {
    SetHeader,
    Send,
    SendWithBody,
    SendAsForm,
    AssertStatus,
    AssertSuccessful,
    AssertHeaderExists,
    AssertHeaderEquals,
    AssertBodyEmpty,
    AssertBodyContainsJson,
    AssertBodyMatchesJson,
    PrintResponse,
    PrintResponseAsJson,
}

impl StepKind {
    pub fn part(self) -> StepPart {
        match self {
            StepKind::SendAsForm => StepPart::Multipart,
            _ => StepPart::Send,
        }
    }

    pub fn needs_block(self) -> bool {
        matches!(
            self,
            StepKind::SendWithBody
                | StepKind::SendAsForm
                | StepKind::AssertBodyContainsJson
                | StepKind::AssertBodyMatchesJson
        )
    }
}

#[derive(Debug)]
pub struct StepPattern {
    pub regex: Regex,
    pub kind: StepKind,
}

impl StepPattern {
    fn new(pattern: &str, kind: StepKind) -> Self {
        Self {
            regex: Regex::new(pattern).unwrap(),
            kind,
        }
    }
}

lazy_static! {
    static ref KEYWORD_REGEX: Regex = Regex::new(r"^(?:Given|When|Then|And|But|\*)\s+").unwrap();
    static ref LEGACY_STEPS: Vec<StepPattern> = with_shared_steps(vec![
        StepPattern::new(r#"^I have an? "([^"]*)" header set to "([^"]*)"$"#, StepKind::SetHeader),
        StepPattern::new(r#"^I should receive a "([^"]*)" response code$"#, StepKind::AssertStatus),
        StepPattern::new(r"^I should receive a successful response code$", StepKind::AssertSuccessful),
        StepPattern::new(r"^I should receive an empty response$", StepKind::AssertBodyEmpty),
        StepPattern::new(
            r"^I should receive a JSON response that contains:\s*$",
            StepKind::AssertBodyContainsJson,
        ),
        StepPattern::new(r"^I print last response$", StepKind::PrintResponse),
        StepPattern::new(r"^I print last response as JSON$", StepKind::PrintResponseAsJson),
    ]);
    static ref CURRENT_STEPS: Vec<StepPattern> = with_shared_steps(vec![
        StepPattern::new(r#"^the "([^"]*)" request header is "([^"]*)"$"#, StepKind::SetHeader),
        StepPattern::new(r#"^the response code is "([^"]*)"$"#, StepKind::AssertStatus),
        StepPattern::new(r"^the response is successful$", StepKind::AssertSuccessful),
        StepPattern::new(r"^the response body is empty$", StepKind::AssertBodyEmpty),
        StepPattern::new(r"^the response body contains JSON:\s*$", StepKind::AssertBodyContainsJson),
        StepPattern::new(r"^print last response$", StepKind::PrintResponse),
        StepPattern::new(r"^print last response as JSON$", StepKind::PrintResponseAsJson),
    ]);
}

fn with_shared_steps(mut steps: Vec<StepPattern>) -> Vec<StepPattern> {
    steps.extend(vec![
        StepPattern::new(r#"^I send a "([^"]*)" request to "([^"]*)"$"#, StepKind::Send),
        StepPattern::new(
            r#"^I send a "([^"]*)" request to "([^"]*)" with:\s*$"#,
            StepKind::SendWithBody,
        ),
        StepPattern::new(
            r#"^I send a "([^"]*)" request to "([^"]*)" as FORM with:\s*$"#,
            StepKind::SendAsForm,
        ),
        StepPattern::new(r#"^the "([^"]*)" response header exists$"#, StepKind::AssertHeaderExists),
        StepPattern::new(r#"^the "([^"]*)" response header is "([^"]*)"$"#, StepKind::AssertHeaderEquals),
        StepPattern::new(r"^the response body matches JSON:\s*$", StepKind::AssertBodyMatchesJson),
    ]);
    steps
}

pub fn patterns(phrasing: Phrasing) -> &'static [StepPattern] {
    match phrasing {
        Phrasing::Legacy => LEGACY_STEPS.as_slice(),
        Phrasing::Current => CURRENT_STEPS.as_slice(),
    }
}

/// Drops a leading Gherkin keyword, so "When I send ..." and "I send ..." resolve alike.
pub fn strip_keyword(text: &str) -> &str {
    let text = text.trim();
    match KEYWORD_REGEX.find(text) {
        Some(keyword) => &text[keyword.end()..],
        None => text,
    }
}

/// Looks `text` up in the `phrasing` table and builds the typed step.
pub fn resolve(phrasing: Phrasing, text: &str, block: Option<&str>) -> Result<Step> {
    let sentence = strip_keyword(text);

    let (kind, captures) = patterns(phrasing)
        .iter()
        .find_map(|pattern| {
            pattern.regex.captures(sentence).map(|captures| {
                let groups = captures
                    .iter()
                    .skip(1)
                    .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
                    .collect::<Vec<_>>();
                (pattern.kind, groups)
            })
        })
        .ok_or_else(|| Error::UndefinedStep(sentence.to_string()))?;

    let block = match (kind.needs_block(), block) {
        (true, Some(block)) => block.to_string(),
        (true, None) => return Err(Error::MissingBlockText(sentence.to_string())),
        (false, _) => String::new(),
    };

    let mut captures = captures.into_iter();
    let mut next = move || captures.next().unwrap_or_default();

    Ok(match kind {
        StepKind::SetHeader => Step::SetHeader {
            name: next(),
            value: next(),
        },
        StepKind::Send => Step::Send {
            method: next(),
            url: next(),
        },
        StepKind::SendWithBody => Step::SendWithBody {
            method: next(),
            url: next(),
            payload: block,
        },
        StepKind::SendAsForm => Step::SendAsForm {
            method: next(),
            url: next(),
            payload: block,
        },
        StepKind::AssertStatus => {
            let code = next();
            let parsed = code
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::InvalidStatusCode(code.clone()))?;
            Step::AssertStatus(parsed)
        }
        StepKind::AssertSuccessful => Step::AssertSuccessful,
        StepKind::AssertHeaderExists => Step::AssertHeaderExists(next()),
        StepKind::AssertHeaderEquals => Step::AssertHeaderEquals {
            name: next(),
            value: next(),
        },
        StepKind::AssertBodyEmpty => Step::AssertBodyEmpty,
        StepKind::AssertBodyContainsJson => Step::AssertBodyContainsJson(block),
        StepKind::AssertBodyMatchesJson => Step::AssertBodyMatchesJson(block),
        StepKind::PrintResponse => Step::PrintResponse,
        StepKind::PrintResponseAsJson => Step::PrintResponseAsJson,
    })
}
