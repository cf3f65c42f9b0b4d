use crate::schema::{FeedbackBody, Location, Reporter};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IntakeError {
    #[error("District is required")]
    MissingDistrict,
    #[error("Assembly constituency is required")]
    MissingConstituency,
    #[error("Mobile number is required")]
    MissingMobile,
    #[error("Feedback text is required")]
    MissingText,
    #[error("Rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),
}

/// A citizen submission as captured by the feedback form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Submission {
    pub district: String,
    pub constituency: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<u8>,
    pub mobile_no: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub rating: Option<u8>,
    pub text: String,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub wants_updates: bool,
}

/// Validated submission, ready to be stored. The raw mobile number does not
/// survive this step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedSubmission {
    pub location: Location,
    pub reporter: Reporter,
    pub feedback: FeedbackBody,
}

impl Submission {
    pub fn accept(self) -> Result<AcceptedSubmission, IntakeError> {
        let district = self.district.trim();
        let constituency = self.constituency.trim();
        let mobile = self.mobile_no.trim();

        if district.is_empty() {
            return Err(IntakeError::MissingDistrict);
        }
        if constituency.is_empty() {
            return Err(IntakeError::MissingConstituency);
        }
        if mobile.is_empty() {
            return Err(IntakeError::MissingMobile);
        }
        if self.text.trim().is_empty() {
            return Err(IntakeError::MissingText);
        }
        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                return Err(IntakeError::RatingOutOfRange(rating));
            }
        }

        Ok(AcceptedSubmission {
            location: Location {
                district: Some(district.to_string()),
                constituency: Some(constituency.to_string()),
            },
            reporter: Reporter {
                name: non_blank(self.name),
                age: self.age,
                email: non_blank(self.email),
                mobile_masked: Some(mask_mobile(mobile)),
                mobile_hash: Some(hash_mobile(mobile)),
            },
            feedback: FeedbackBody {
                original_text: self.text,
                kind: non_blank(self.kind),
                rating: self.rating,
                solution: non_blank(self.solution),
                wants_updates: self.wants_updates,
            },
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn hash_mobile(mobile_no: &str) -> String {
    hex::encode(Sha256::digest(mobile_no.as_bytes()))
}

/// Keeps the first and last two characters: "9876543210" -> "98******10".
pub fn mask_mobile(mobile_no: &str) -> String {
    let chars: Vec<char> = mobile_no.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}******{tail}")
}
