//! Canonical label vocabularies for service state, start mode and status
//!
//! Each enumeration has a fixed, ordered table of labels and one mapping per
//! raw vocabulary: WMI reports strings (`"Start Pending"`, `"Auto"`), the
//! Service Control Manager reports numeric codes.

use serde::{Deserialize, Serialize};

/// A fixed, ordered set of label values for one metric dimension.
pub trait Enumeration: Copy + Eq + 'static {
    /// Every member, in label order.
    const ALL: &'static [Self];

    /// The canonical label used as the metric label value.
    fn label(self) -> &'static str;

    /// Match a raw string against the canonical labels, ignoring ASCII case
    /// and surrounding whitespace.
    fn from_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|value| value.label().eq_ignore_ascii_case(raw))
    }
}

/// Current state of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Stopped,
    StartPending,
    StopPending,
    Running,
    ContinuePending,
    PausePending,
    Paused,
    Unknown,
}

impl State {
    /// Map a `SERVICE_STATUS.dwCurrentState` code. The SCM never reports
    /// `unknown`, so unrecognized codes map to `None`.
    pub fn from_scm(code: u32) -> Option<Self> {
        match code {
            1 => Some(State::Stopped),
            2 => Some(State::StartPending),
            3 => Some(State::StopPending),
            4 => Some(State::Running),
            5 => Some(State::ContinuePending),
            6 => Some(State::PausePending),
            7 => Some(State::Paused),
            _ => None,
        }
    }

    /// Map a `Win32_Service.State` string. Only a literal `"Unknown"` maps
    /// to [`State::Unknown`].
    pub fn from_wmi(raw: &str) -> Option<Self> {
        Self::from_label(raw)
    }
}

impl Enumeration for State {
    const ALL: &'static [Self] = &[
        State::Stopped,
        State::StartPending,
        State::StopPending,
        State::Running,
        State::ContinuePending,
        State::PausePending,
        State::Paused,
        State::Unknown,
    ];

    fn label(self) -> &'static str {
        match self {
            State::Stopped => "stopped",
            State::StartPending => "start pending",
            State::StopPending => "stop pending",
            State::Running => "running",
            State::ContinuePending => "continue pending",
            State::PausePending => "pause pending",
            State::Paused => "paused",
            State::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How a service is started
///
/// There is no `unknown` member: a start mode that does not match any label
/// is carried as `None` on the record and encodes as all-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartMode {
    Boot,
    System,
    Auto,
    Manual,
    Disabled,
}

impl StartMode {
    /// Map a `QUERY_SERVICE_CONFIG.dwStartType` code.
    pub fn from_scm(code: u32) -> Option<Self> {
        match code {
            0 => Some(StartMode::Boot),
            1 => Some(StartMode::System),
            2 => Some(StartMode::Auto),
            3 => Some(StartMode::Manual),
            4 => Some(StartMode::Disabled),
            _ => None,
        }
    }

    /// Map a `Win32_Service.StartMode` string.
    pub fn from_wmi(raw: &str) -> Option<Self> {
        Self::from_label(raw)
    }
}

impl Enumeration for StartMode {
    const ALL: &'static [Self] = &[
        StartMode::Boot,
        StartMode::System,
        StartMode::Auto,
        StartMode::Manual,
        StartMode::Disabled,
    ];

    fn label(self) -> &'static str {
        match self {
            StartMode::Boot => "boot",
            StartMode::System => "system",
            StartMode::Auto => "auto",
            StartMode::Manual => "manual",
            StartMode::Disabled => "disabled",
        }
    }
}

impl std::fmt::Display for StartMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Operational status as reported by `Win32_Service.Status`
///
/// The SCM has no equivalent, so records from the live backend carry no status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Error,
    Degraded,
    Unknown,
    PredFail,
    Starting,
    Stopping,
    Service,
    Stressed,
    NonRecover,
    NoContact,
    LostComm,
}

impl Status {
    /// Map a `Win32_Service.Status` string.
    pub fn from_wmi(raw: &str) -> Option<Self> {
        Self::from_label(raw)
    }
}

impl Enumeration for Status {
    const ALL: &'static [Self] = &[
        Status::Ok,
        Status::Error,
        Status::Degraded,
        Status::Unknown,
        Status::PredFail,
        Status::Starting,
        Status::Stopping,
        Status::Service,
        Status::Stressed,
        Status::NonRecover,
        Status::NoContact,
        Status::LostComm,
    ];

    fn label(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Error => "error",
            Status::Degraded => "degraded",
            Status::Unknown => "unknown",
            Status::PredFail => "pred fail",
            Status::Starting => "starting",
            Status::Stopping => "stopping",
            Status::Service => "service",
            Status::Stressed => "stressed",
            Status::NonRecover => "nonrecover",
            Status::NoContact => "no contact",
            Status::LostComm => "lost comm",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
