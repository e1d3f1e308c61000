use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentStatus {
    #[default]
    Active,
    Inactive,
    Archived,
}

impl EquipmentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EquipmentStatus::Active => "active",
            EquipmentStatus::Inactive => "inactive",
            EquipmentStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<EquipmentStatus> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Some(EquipmentStatus::Active),
            "inactive" => Some(EquipmentStatus::Inactive),
            "archived" => Some(EquipmentStatus::Archived),
            _ => None,
        }
    }
}

impl fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown equipment status: {s}"))
    }
}

/// Lifecycle of an import job record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<JobStatus> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "running" => Some(JobStatus::Running),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equipment_status_parse() {
        assert_eq!(EquipmentStatus::parse("active"), Some(EquipmentStatus::Active));
        assert_eq!(EquipmentStatus::parse(" Archived "), Some(EquipmentStatus::Archived));
        assert_eq!(EquipmentStatus::parse("scrapped"), None);
        assert!("nope".parse::<EquipmentStatus>().is_err());
    }

    #[test]
    fn test_equipment_status_default_is_active() {
        assert_eq!(EquipmentStatus::default(), EquipmentStatus::Active);
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        for status in [
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
    }
}
