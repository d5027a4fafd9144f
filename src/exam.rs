use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const MAX_NAME_CHARS: usize = 100;
pub const MIN_GRADE: u32 = 18;
pub const MAX_GRADE: u32 = 30;
pub const MIN_CREDITS: u32 = 1;
pub const MAX_CREDITS: u32 = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExamError {
    #[error("exam name must not be empty")]
    EmptyName,
    #[error("grade {0} is outside 18..=30")]
    GradeOutOfRange(u32),
    #[error("credits {0} are outside 1..=50")]
    CreditsOutOfRange(u32),
    #[error("honors are only awarded with a grade of 30, got {0}")]
    HonorsWithoutMaxGrade(u32),
    #[error("a recognized exam carries no grade")]
    RecognitionWithGrade,
    #[error("a recognized exam can not carry honors")]
    RecognitionWithHonors,
    #[error("a graded exam needs a grade")]
    MissingGrade,
    #[error("'{value}' is not a valid {field}")]
    NotANumber { field: &'static str, value: String },
}

/// A single exam on the student's record.
///
/// Fields are private: every record is built through [`ExamRecord::graded`],
/// [`ExamRecord::recognition`] or [`ExamRecord::from_input`], and records read
/// back from the store go through the same checks, so a record with honors
/// always has a grade of 30.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredExam")]
pub struct ExamRecord {
    id: Uuid,
    name: String,
    grade: Option<u32>,
    with_honors: bool,
    credits: u32,
    is_recognition: bool,
}

#[derive(Deserialize)]
struct StoredExam {
    id: Uuid,
    name: String,
    grade: Option<u32>,
    #[serde(default)]
    with_honors: bool,
    credits: u32,
    #[serde(default)]
    is_recognition: bool,
}

impl TryFrom<StoredExam> for ExamRecord {
    type Error = ExamError;

    fn try_from(stored: StoredExam) -> Result<Self, Self::Error> {
        ExamRecord::validated(
            stored.id,
            &stored.name,
            stored.grade,
            stored.with_honors,
            stored.credits,
            stored.is_recognition,
        )
    }
}

impl ExamRecord {
    pub fn graded(
        name: &str,
        grade: u32,
        credits: u32,
        with_honors: bool,
    ) -> Result<Self, ExamError> {
        Self::validated(Uuid::new_v4(), name, Some(grade), with_honors, credits, false)
    }

    pub fn recognition(name: &str, credits: u32) -> Result<Self, ExamError> {
        Self::validated(Uuid::new_v4(), name, None, false, credits, true)
    }

    /// Builds a record from raw form input. A blank grade counts as absent.
    pub fn from_input(
        name: &str,
        grade: Option<&str>,
        credits: &str,
        with_honors: bool,
        is_recognition: bool,
    ) -> Result<Self, ExamError> {
        let credits = parse_number("credits", credits)?;

        if is_recognition {
            if grade.is_some_and(|value| !value.trim().is_empty()) {
                return Err(ExamError::RecognitionWithGrade);
            }
            if with_honors {
                return Err(ExamError::RecognitionWithHonors);
            }
            return Self::recognition(name, credits);
        }

        let grade = match grade.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => parse_number("grade", value)?,
            None => return Err(ExamError::MissingGrade),
        };
        Self::graded(name, grade, credits, with_honors)
    }

    fn validated(
        id: Uuid,
        name: &str,
        grade: Option<u32>,
        with_honors: bool,
        credits: u32,
        is_recognition: bool,
    ) -> Result<Self, ExamError> {
        let name = sanitize_name(name)?;

        if !(MIN_CREDITS..=MAX_CREDITS).contains(&credits) {
            return Err(ExamError::CreditsOutOfRange(credits));
        }

        let grade = if is_recognition {
            if grade.is_some() {
                return Err(ExamError::RecognitionWithGrade);
            }
            if with_honors {
                return Err(ExamError::RecognitionWithHonors);
            }
            None
        } else {
            let grade = grade.ok_or(ExamError::MissingGrade)?;
            if !(MIN_GRADE..=MAX_GRADE).contains(&grade) {
                return Err(ExamError::GradeOutOfRange(grade));
            }
            if with_honors && grade != MAX_GRADE {
                return Err(ExamError::HonorsWithoutMaxGrade(grade));
            }
            Some(grade)
        };

        Ok(Self {
            id,
            name,
            grade,
            with_honors,
            credits,
            is_recognition,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` for recognitions.
    pub fn grade(&self) -> Option<u32> {
        self.grade
    }

    pub fn with_honors(&self) -> bool {
        self.with_honors
    }

    pub fn credits(&self) -> u32 {
        self.credits
    }

    pub fn is_recognition(&self) -> bool {
        self.is_recognition
    }

    /// Short badge used in listings: `C` for recognitions, `30L` for honors.
    pub fn badge(&self) -> String {
        match self.grade {
            None => "C".to_string(),
            Some(grade) if self.with_honors => format!("{grade}L"),
            Some(grade) => grade.to_string(),
        }
    }
}

pub fn sanitize_name(raw: &str) -> Result<String, ExamError> {
    let truncated: String = raw.trim().chars().take(MAX_NAME_CHARS).collect();
    let name = truncated.trim_end();
    if name.is_empty() {
        return Err(ExamError::EmptyName);
    }
    Ok(name.to_string())
}

pub fn parse_number(field: &'static str, raw: &str) -> Result<u32, ExamError> {
    raw.trim().parse().map_err(|_| ExamError::NotANumber {
        field,
        value: raw.to_string(),
    })
}
