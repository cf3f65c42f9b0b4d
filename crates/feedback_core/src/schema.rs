use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// Department sentinel granting visibility over every category.
pub const ALL_CATEGORIES: &str = "All Categories";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriorityLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl PriorityLevel {
    /// Case-insensitive parse of a classifier label. Unknown labels yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Location {
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub constituency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Reporter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile_masked: Option<String>, // e.g. "98******21"
    #[serde(default)]
    pub mobile_hash: Option<String>, // sha256 hex of the raw number
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FeedbackBody {
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub kind: Option<String>, // "General feedback", "Complaint", ...
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub wants_updates: bool,
}

/// Classifier output. Each field is optional so malformed output degrades
/// to the documented fallbacks instead of failing the whole record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AiAnalysis {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_priority")]
    #[schemars(with = "Option<PriorityLevel>")]
    pub priority: Option<PriorityLevel>,
    #[serde(default)]
    pub main_issue: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

fn lenient_priority<'de, D>(deserializer: D) -> Result<Option<PriorityLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|label| {
        let parsed = PriorityLevel::parse(&label);
        if parsed.is_none() {
            warn!(label = %label, "unrecognised priority label, ranking as LOW");
        }
        parsed
    }))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    pub id: String,         // assigned by the store
    pub created_at: String, // ISO-8601 timestamp (UTC)
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub reporter: Reporter,
    #[serde(default)]
    pub feedback: FeedbackBody,
    #[serde(default)]
    pub ai: Option<AiAnalysis>,
}

impl Report {
    pub fn is_analyzed(&self) -> bool {
        self.ai.is_some()
    }

    pub fn district(&self) -> Option<&str> {
        self.location.district.as_deref()
    }

    pub fn constituency(&self) -> Option<&str> {
        self.location.constituency.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.ai.as_ref().and_then(|ai| ai.category.as_deref())
    }

    pub fn reporter_name(&self) -> Option<&str> {
        self.reporter.name.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "super_admin" => Some(Role::SuperAdmin),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Department assignment of an administrator, always held as a set.
///
/// Older identity records stored a single department string instead of a
/// list; both shapes deserialize into the same set so nothing downstream has
/// to care which one it was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct Departments(BTreeSet<String>);

impl Departments {
    pub fn all() -> Self {
        Self::from_legacy(ALL_CATEGORIES)
    }

    pub fn from_legacy(value: impl Into<String>) -> Self {
        Self(BTreeSet::from([value.into()]))
    }

    pub fn is_unrestricted(&self) -> bool {
        self.0.contains(ALL_CATEGORIES)
    }

    pub fn contains(&self, department: &str) -> bool {
        self.0.contains(department)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn as_set(&self) -> &BTreeSet<String> {
        &self.0
    }
}

impl Default for Departments {
    fn default() -> Self {
        Self::all()
    }
}

impl<S: Into<String>> FromIterator<S> for Departments {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'de> Deserialize<'de> for Departments {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Stored {
            Single(String),
            Many(Vec<String>),
        }

        Ok(match Stored::deserialize(deserializer)? {
            Stored::Single(value) => {
                warn!(department = %value, "legacy single-department record, normalising to a set");
                Departments::from_legacy(value)
            }
            Stored::Many(values) => values.into_iter().collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AdminIdentity {
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub access: BTreeSet<String>, // district names; ignored for super_admin
    #[serde(default)]
    pub departments: Departments,
}

impl AdminIdentity {
    pub fn super_admin(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: Role::SuperAdmin,
            email: None,
            access: BTreeSet::new(),
            departments: Departments::all(),
        }
    }

    pub fn admin<D, P>(username: impl Into<String>, districts: D, departments: P) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            username: username.into(),
            role: Role::Admin,
            email: None,
            access: districts.into_iter().map(Into::into).collect(),
            departments: departments.into_iter().collect(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
