//! Learner profiles, persisted as one JSON file.
//!
//! The file holds the whole collection plus the id of the selected profile:
//!
//! ```json
//! { "profiles": [ ... ], "current": "3f1c..." }
//! ```
//!
//! Every mutation rewrites the file. A missing or unreadable file loads as an
//! empty store.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use aula_core::AgentType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const MIN_AGE: u8 = 3;
pub const MAX_AGE: u8 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningStyle {
    #[default]
    Visual,
    Auditory,
    Kinesthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    #[default]
    Fun,
    Serious,
    Adventurous,
}

macro_rules! lowercase_from_str {
    ($ty:ty, $($name:literal => $variant:expr),+ $(,)?) => {
        impl FromStr for $ty {
            type Err = ProfileError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($variant),)+
                    other => Err(ProfileError::Invalid(format!(
                        "unknown {}: '{other}'",
                        stringify!($ty)
                    ))),
                }
            }
        }
    };
}

lowercase_from_str!(LearningStyle,
    "visual" => LearningStyle::Visual,
    "auditory" => LearningStyle::Auditory,
    "kinesthetic" => LearningStyle::Kinesthetic,
);
lowercase_from_str!(DifficultyLevel,
    "beginner" => DifficultyLevel::Beginner,
    "intermediate" => DifficultyLevel::Intermediate,
    "advanced" => DifficultyLevel::Advanced,
);
lowercase_from_str!(Personality,
    "fun" => Personality::Fun,
    "serious" => Personality::Serious,
    "adventurous" => Personality::Adventurous,
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildProfile {
    pub id: String,
    pub name: String,
    pub age: u8,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub learning_style: LearningStyle,
    #[serde(default)]
    pub difficulty_level: DifficultyLevel,
    #[serde(default)]
    pub assistant_personality: Personality,
    #[serde(default)]
    pub avatar: String,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

impl ChildProfile {
    /// The primary agent suited to this learner's age.
    pub fn agent_type(&self) -> AgentType {
        match self.age {
            0..=8 => AgentType::Junior,
            9..=15 => AgentType::Middle,
            _ => AgentType::Senior,
        }
    }
}

/// Everything a caller supplies when creating a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProfile {
    pub name: String,
    pub age: u8,
    pub grade: String,
    pub interests: Vec<String>,
    pub learning_style: LearningStyle,
    pub difficulty_level: DifficultyLevel,
    pub assistant_personality: Personality,
    pub avatar: String,
}

impl NewProfile {
    pub fn new(name: impl Into<String>, age: u8) -> Self {
        Self {
            name: name.into(),
            age,
            grade: String::new(),
            interests: Vec::new(),
            learning_style: LearningStyle::default(),
            difficulty_level: DifficultyLevel::default(),
            assistant_personality: Personality::default(),
            avatar: "🧒".into(),
        }
    }

    pub fn with_interests(mut self, interests: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.interests = interests.into_iter().map(Into::into).collect();
        self
    }

    fn validate(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::Invalid("name must not be empty".into()));
        }
        validate_age(self.age)?;
        if self.interests.iter().all(|i| i.trim().is_empty()) {
            return Err(ProfileError::Invalid("at least one interest is required".into()));
        }
        Ok(())
    }
}

fn validate_age(age: u8) -> Result<(), ProfileError> {
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(ProfileError::Invalid(format!(
            "age must be between {MIN_AGE} and {MAX_AGE}, got {age}"
        )));
    }
    Ok(())
}

/// Partial update; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<u8>,
    pub grade: Option<String>,
    pub interests: Option<Vec<String>>,
    pub learning_style: Option<LearningStyle>,
    pub difficulty_level: Option<DifficultyLevel>,
    pub assistant_personality: Option<Personality>,
    pub avatar: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Invalid profile: {0}")]
    Invalid(String),

    #[error("Profile storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profiles: Vec<ChildProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current: Option<String>,
}

pub struct ProfileStore {
    path: PathBuf,
    data: ProfileFile,
}

impl ProfileStore {
    /// Open the store at `path`, loading whatever is there.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = data.profiles.len(), "Profile store loaded");
        Self { path, data }
    }

    fn load_from_disk(path: &Path) -> ProfileFile {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return ProfileFile::default(),
        };
        match serde_json::from_str::<ProfileFile>(&content) {
            Ok(mut data) => {
                // A dangling selection is dropped rather than trusted.
                if let Some(current) = &data.current {
                    if !data.profiles.iter().any(|p| &p.id == current) {
                        data.current = None;
                    }
                }
                data
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupted profile file");
                ProfileFile::default()
            }
        }
    }

    fn save(&self) -> Result<(), ProfileError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ProfileError::Storage(format!("Failed to create profile directory: {e}"))
            })?;
        }
        let content = serde_json::to_string_pretty(&self.data)
            .map_err(|e| ProfileError::Storage(format!("Failed to serialize profiles: {e}")))?;
        std::fs::write(&self.path, content)
            .map_err(|e| ProfileError::Storage(format!("Failed to write profile file: {e}")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> &[ChildProfile] {
        &self.data.profiles
    }

    pub fn get(&self, id: &str) -> Option<&ChildProfile> {
        self.data.profiles.iter().find(|p| p.id == id)
    }

    pub fn current(&self) -> Option<&ChildProfile> {
        self.data.current.as_deref().and_then(|id| self.get(id))
    }

    fn position(&self, id: &str) -> Result<usize, ProfileError> {
        self.data
            .profiles
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))
    }

    /// Create a profile and make it the current one.
    pub fn create(&mut self, new: NewProfile) -> Result<ChildProfile, ProfileError> {
        new.validate()?;
        let now = Utc::now();
        let profile = ChildProfile {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            age: new.age,
            grade: new.grade,
            interests: new
                .interests
                .into_iter()
                .filter(|i| !i.trim().is_empty())
                .collect(),
            learning_style: new.learning_style,
            difficulty_level: new.difficulty_level,
            assistant_personality: new.assistant_personality,
            avatar: new.avatar,
            created_at: now,
            last_used: now,
        };

        self.data.profiles.push(profile.clone());
        self.data.current = Some(profile.id.clone());
        self.save()?;
        info!(id = %profile.id, name = %profile.name, "Profile created");
        Ok(profile)
    }

    /// Make `id` the current profile and stamp its last use.
    pub fn select(&mut self, id: &str) -> Result<&ChildProfile, ProfileError> {
        let idx = self.position(id)?;
        self.data.profiles[idx].last_used = Utc::now();
        self.data.current = Some(id.to_string());
        self.save()?;
        Ok(&self.data.profiles[idx])
    }

    pub fn update(&mut self, id: &str, update: ProfileUpdate) -> Result<ChildProfile, ProfileError> {
        let idx = self.position(id)?;
        if let Some(age) = update.age {
            validate_age(age)?;
        }
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ProfileError::Invalid("name must not be empty".into()));
        }

        let profile = &mut self.data.profiles[idx];
        if let Some(name) = update.name {
            profile.name = name.trim().to_string();
        }
        if let Some(age) = update.age {
            profile.age = age;
        }
        if let Some(grade) = update.grade {
            profile.grade = grade;
        }
        if let Some(interests) = update.interests {
            profile.interests = interests;
        }
        if let Some(style) = update.learning_style {
            profile.learning_style = style;
        }
        if let Some(level) = update.difficulty_level {
            profile.difficulty_level = level;
        }
        if let Some(personality) = update.assistant_personality {
            profile.assistant_personality = personality;
        }
        if let Some(avatar) = update.avatar {
            profile.avatar = avatar;
        }

        let updated = profile.clone();
        self.save()?;
        Ok(updated)
    }

    /// Remove a profile. Deleting the current profile clears the selection.
    pub fn delete(&mut self, id: &str) -> Result<ChildProfile, ProfileError> {
        let idx = self.position(id)?;
        let removed = self.data.profiles.remove(idx);
        if self.data.current.as_deref() == Some(id) {
            self.data.current = None;
        }
        self.save()?;
        info!(id = %removed.id, "Profile deleted");
        Ok(removed)
    }
}
