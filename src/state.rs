use std::str::FromStr;

use crate::error::{GenerateError, ParamError};
use crate::object_url::{ObjectUrl, ObjectUrls};
use crate::params::{Field, GeneratePayload, ParameterRecord};

#[derive(Debug)]
pub enum DisplaySource {
    Placeholder(String),
    Local(ObjectUrl),
}

impl DisplaySource {
    pub fn url(&self) -> &str {
        match self {
            DisplaySource::Placeholder(url) => url,
            DisplaySource::Local(obj) => obj.as_str(),
        }
    }

    pub fn local_bytes(&self) -> Option<&[u8]> {
        match self {
            DisplaySource::Placeholder(_) => None,
            DisplaySource::Local(obj) => Some(obj.bytes()),
        }
    }
}

/// Which of several overlapping generate results ends up on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionPolicy {
    /// Every successful result is shown as it arrives.
    #[default]
    LastResolved,
    /// Results older than the newest one already shown are dropped.
    LastInitiated,
}

impl std::fmt::Display for ResolutionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionPolicy::LastResolved => write!(f, "last-resolved"),
            ResolutionPolicy::LastInitiated => write!(f, "last-initiated"),
        }
    }
}

impl FromStr for ResolutionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last-resolved" => Ok(ResolutionPolicy::LastResolved),
            "last-initiated" => Ok(ResolutionPolicy::LastInitiated),
            other => Err(format!("unknown policy {other:?} (expected last-resolved or last-initiated)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Stale,
    Failed(GenerateError),
}

pub struct FormState {
    params: ParameterRecord,
    display: DisplaySource,
    policy: ResolutionPolicy,
    urls: ObjectUrls,
    next_seq: u64,
    applied_seq: u64,
    in_flight: usize,
}

impl FormState {
    pub fn new(placeholder: impl Into<String>, policy: ResolutionPolicy) -> Self {
        FormState {
            params: ParameterRecord::default(),
            display: DisplaySource::Placeholder(placeholder.into()),
            policy,
            urls: ObjectUrls::new(),
            next_seq: 0,
            applied_seq: 0,
            in_flight: 0,
        }
    }

    pub fn params(&self) -> &ParameterRecord {
        &self.params
    }

    pub fn display(&self) -> &DisplaySource {
        &self.display
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn object_urls(&self) -> &ObjectUrls {
        &self.urls
    }

    pub fn apply_edit(&mut self, field: Field, raw: impl Into<String>) {
        self.params = self.params.with_field(field, raw);
    }

    /// Serializes the current record and hands out the ticket the result
    /// must be returned with. Nothing is recorded if serialization fails.
    pub fn begin_generate(&mut self) -> Result<(Ticket, GeneratePayload), ParamError> {
        let payload = self.params.to_payload()?;
        self.next_seq += 1;
        self.in_flight += 1;
        Ok((Ticket { seq: self.next_seq }, payload))
    }

    pub fn apply_generate_result(&mut self, ticket: Ticket, result: Result<Vec<u8>, GenerateError>) -> Outcome {
        self.in_flight = self.in_flight.saturating_sub(1);
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => return Outcome::Failed(e),
        };
        if self.policy == ResolutionPolicy::LastInitiated && ticket.seq <= self.applied_seq {
            log::debug!("dropping stale result #{} (showing #{})", ticket.seq, self.applied_seq);
            return Outcome::Stale;
        }
        self.applied_seq = self.applied_seq.max(ticket.seq);
        let next = DisplaySource::Local(self.urls.create(bytes));
        // The replaced reference is released here, after the new one is in place.
        drop(std::mem::replace(&mut self.display, next));
        Outcome::Applied
    }
}
