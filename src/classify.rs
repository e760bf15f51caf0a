use crate::models::Outcome;

/// Non-2xx response from the video platform. Providers return it wrapped in
/// `anyhow::Error` so that `classify` can recover the status and payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("HTTP {status}: {body}")]
pub struct HttpError {
    pub status: u16,
    pub body: String,
}

impl HttpError {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    /// Machine-readable reasons from a Google API error payload, taken from
    /// `error.errors[].reason` and then `error.details[].reason`.
    pub fn reasons(&self) -> Vec<String> {
        let j: serde_json::Value = match serde_json::from_str(&self.body) {
            Ok(v) => v,
            Err(_) => return Vec::new(),
        };
        let mut out = Vec::new();
        if let Some(errs) = j["error"]["errors"].as_array() {
            for e in errs {
                if let Some(r) = e["reason"].as_str() {
                    out.push(r.to_string());
                }
            }
        }
        if let Some(details) = j["error"]["details"].as_array() {
            for d in details {
                if let Some(r) = d["reason"].as_str() {
                    out.push(r.to_string());
                }
            }
        }
        out
    }

    pub fn is_quota_exceeded(&self) -> bool {
        let reasons = self.reasons();
        if reasons.is_empty() {
            // unparseable payload: fall back to a plain token search
            return self.body.contains("quotaExceeded");
        }
        reasons.iter().any(|r| r == "quotaExceeded")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Conflict,
    QuotaExceeded,
    ForbiddenOther,
    Http(u16),
    Unexpected(String),
}

impl ErrorKind {
    /// Only quota exhaustion stops the remaining songs.
    pub fn aborts_run(&self) -> bool {
        matches!(self, ErrorKind::QuotaExceeded)
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            ErrorKind::Conflict => Outcome::Conflict,
            ErrorKind::QuotaExceeded => Outcome::QuotaExceeded,
            ErrorKind::ForbiddenOther => Outcome::ForbiddenUnknown,
            ErrorKind::Http(_) => Outcome::HttpError,
            ErrorKind::Unexpected(_) => Outcome::UnexpectedError,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ErrorKind::Conflict => "409".into(),
            ErrorKind::QuotaExceeded => "403 quotaExceeded".into(),
            ErrorKind::ForbiddenOther => "403".into(),
            ErrorKind::Http(status) => status.to_string(),
            ErrorKind::Unexpected(msg) => msg.clone(),
        }
    }
}

/// Map a failed search/insert call onto the closed error taxonomy.
/// Checked in priority order: 409, 403 quota, 403 other, other HTTP, non-HTTP.
pub fn classify(err: &anyhow::Error) -> ErrorKind {
    match err.downcast_ref::<HttpError>() {
        Some(h) if h.status == 409 => ErrorKind::Conflict,
        Some(h) if h.status == 403 && h.is_quota_exceeded() => ErrorKind::QuotaExceeded,
        Some(h) if h.status == 403 => ErrorKind::ForbiddenOther,
        Some(h) => ErrorKind::Http(h.status),
        None => ErrorKind::Unexpected(format!("{:#}", err)),
    }
}
