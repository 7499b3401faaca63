//! Workflow run reporting types.

use serde::Serialize;

/// Status of one step of the latest workflow job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Step name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,
}

/// Latest workflow run of a managed repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub link: Option<String>,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub steps: Vec<StepStatus>,
}

/// A managed cluster and its latest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    /// `owner/name`
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub conclusion: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub link: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub run_status: Vec<StepStatus>,
}

impl ClusterStatus {
    /// A cluster whose repository has no workflow runs yet.
    pub fn pending(name: String) -> Self {
        Self {
            name,
            status: String::new(),
            conclusion: String::new(),
            link: String::new(),
            run_status: Vec::new(),
        }
    }

    pub fn with_report(name: String, report: RunReport) -> Self {
        Self {
            name,
            status: report.status.unwrap_or_default(),
            conclusion: report.conclusion.unwrap_or_default(),
            link: report.link.unwrap_or_default(),
            run_status: report.steps,
        }
    }
}
