//! Subject grammar for the SMS work queues.
//!
//! Subjects are dotted tokens (`sms.send.request`, `sms.ex.send.request`, …)
//! carried on two JetStream streams, one per priority class. The fixed subject
//! set is modelled as [`SmsSubject`] so dispatch never splits strings on the
//! hot path; [`Subject::filter`] keeps the positional wildcard match used for
//! ad-hoc pattern checks.

use std::fmt;

/// Stream holding normal-priority traffic.
pub const NORMAL_STREAM: &str = "Sms";

/// Stream holding express-priority traffic.
pub const EXPRESS_STREAM: &str = "SmsExpress";

/// Wildcard token accepted in [`Subject::filter`] patterns. Matches exactly
/// one position.
pub const ANY: &str = "*";

/// The closed set of subjects the gateway publishes and consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmsSubject {
    NormalRequest,
    NormalStatus,
    NormalError,
    ExpressRequest,
    ExpressStatus,
    ExpressError,
}

/// Role of a message within its stream, derived from the trailing token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Status,
    Error,
}

impl SmsSubject {
    pub const fn as_str(self) -> &'static str {
        match self {
            SmsSubject::NormalRequest => "sms.send.request",
            SmsSubject::NormalStatus => "sms.send.status",
            SmsSubject::NormalError => "sms.send.error",
            SmsSubject::ExpressRequest => "sms.ex.send.request",
            SmsSubject::ExpressStatus => "sms.ex.send.status",
            SmsSubject::ExpressError => "sms.ex.send.error",
        }
    }

    /// Parses a wire subject. Returns `None` for anything outside the grammar.
    pub fn parse(subject: &str) -> Option<Self> {
        match subject {
            "sms.send.request" => Some(SmsSubject::NormalRequest),
            "sms.send.status" => Some(SmsSubject::NormalStatus),
            "sms.send.error" => Some(SmsSubject::NormalError),
            "sms.ex.send.request" => Some(SmsSubject::ExpressRequest),
            "sms.ex.send.status" => Some(SmsSubject::ExpressStatus),
            "sms.ex.send.error" => Some(SmsSubject::ExpressError),
            _ => None,
        }
    }

    /// The request subject for the given priority class.
    pub const fn request(express: bool) -> Self {
        if express {
            SmsSubject::ExpressRequest
        } else {
            SmsSubject::NormalRequest
        }
    }

    pub const fn is_express(self) -> bool {
        matches!(
            self,
            SmsSubject::ExpressRequest | SmsSubject::ExpressStatus | SmsSubject::ExpressError
        )
    }

    pub const fn kind(self) -> MessageKind {
        match self {
            SmsSubject::NormalRequest | SmsSubject::ExpressRequest => MessageKind::Request,
            SmsSubject::NormalStatus | SmsSubject::ExpressStatus => MessageKind::Status,
            SmsSubject::NormalError | SmsSubject::ExpressError => MessageKind::Error,
        }
    }

    /// Name of the stream this subject is bound to.
    pub const fn stream(self) -> &'static str {
        if self.is_express() {
            EXPRESS_STREAM
        } else {
            NORMAL_STREAM
        }
    }
}

impl fmt::Display for SmsSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subjects carried on the normal-priority stream.
pub fn normal_subjects() -> Vec<String> {
    vec![
        SmsSubject::NormalRequest.to_string(),
        SmsSubject::NormalStatus.to_string(),
        SmsSubject::NormalError.to_string(),
    ]
}

/// Subjects carried on the express-priority stream.
pub fn express_subjects() -> Vec<String> {
    vec![
        SmsSubject::ExpressRequest.to_string(),
        SmsSubject::ExpressStatus.to_string(),
        SmsSubject::ExpressError.to_string(),
    ]
}

/// A dotted wire subject with positional pattern matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject<'a>(pub &'a str);

impl Subject<'_> {
    /// Positional match against `pattern`: the token counts must be equal, and
    /// every position must match literally or be [`ANY`] in the pattern.
    /// Multi-token wildcards are not supported.
    pub fn filter(&self, pattern: &[&str]) -> bool {
        let mut tokens = self.0.split('.');
        for expected in pattern {
            match tokens.next() {
                Some(token) if *expected == ANY || token == *expected => {}
                _ => return false,
            }
        }
        tokens.next().is_none()
    }
}

impl fmt::Display for Subject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
