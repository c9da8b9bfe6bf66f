//! `aula profiles` — Manage learner profiles.

use aula_profiles::{
    ChildProfile, DifficultyLevel, LearningStyle, NewProfile, Personality, ProfileStore,
    ProfileUpdate,
};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ProfilesCommand {
    /// List all profiles
    List,

    /// Show the current profile
    Current,

    /// Create a profile and select it
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        age: u8,

        /// Comma-separated interests
        #[arg(long, value_delimiter = ',', required = true)]
        interests: Vec<String>,

        #[arg(long, default_value = "")]
        grade: String,

        /// visual, auditory or kinesthetic
        #[arg(long, default_value = "visual")]
        style: LearningStyle,

        /// beginner, intermediate or advanced
        #[arg(long, default_value = "beginner")]
        level: DifficultyLevel,

        /// fun, serious or adventurous
        #[arg(long, default_value = "fun")]
        personality: Personality,

        #[arg(long, default_value = "🧒")]
        avatar: String,
    },

    /// Change fields of a profile
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        age: Option<u8>,

        #[arg(long, value_delimiter = ',')]
        interests: Option<Vec<String>>,

        #[arg(long)]
        grade: Option<String>,

        #[arg(long)]
        style: Option<LearningStyle>,

        #[arg(long)]
        level: Option<DifficultyLevel>,

        #[arg(long)]
        personality: Option<Personality>,

        #[arg(long)]
        avatar: Option<String>,
    },

    /// Make a profile the current one
    Select { id: String },

    /// Delete a profile
    Delete { id: String },
}

pub fn run(command: ProfilesCommand) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let mut store = ProfileStore::open(config.profiles_path());

    match command {
        ProfilesCommand::List => {
            if store.list().is_empty() {
                println!("  No profiles yet. Create one with `aula profiles create`.");
            }
            let current = store.current().map(|p| p.id.clone());
            for profile in store.list() {
                let marker = if current.as_deref() == Some(profile.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {}", summary(profile));
            }
        }
        ProfilesCommand::Current => match store.current() {
            Some(profile) => println!("  {}", summary(profile)),
            None => println!("  No profile selected."),
        },
        ProfilesCommand::Create {
            name,
            age,
            interests,
            grade,
            style,
            level,
            personality,
            avatar,
        } => {
            let profile = store.create(NewProfile {
                name,
                age,
                grade,
                interests,
                learning_style: style,
                difficulty_level: level,
                assistant_personality: personality,
                avatar,
            })?;
            println!("✅ Created and selected: {}", summary(&profile));
        }
        ProfilesCommand::Update {
            id,
            name,
            age,
            interests,
            grade,
            style,
            level,
            personality,
            avatar,
        } => {
            let profile = store.update(
                &id,
                ProfileUpdate {
                    name,
                    age,
                    grade,
                    interests,
                    learning_style: style,
                    difficulty_level: level,
                    assistant_personality: personality,
                    avatar,
                },
            )?;
            println!("✅ Updated: {}", summary(&profile));
        }
        ProfilesCommand::Select { id } => {
            let profile = store.select(&id)?;
            println!("✅ Selected: {}", summary(profile));
        }
        ProfilesCommand::Delete { id } => {
            let profile = store.delete(&id)?;
            println!("🗑️  Deleted: {}", profile.name);
        }
    }

    Ok(())
}

fn summary(profile: &ChildProfile) -> String {
    format!(
        "{} {} ({} years, agent: {}) [{}]",
        profile.avatar,
        profile.name,
        profile.age,
        profile.agent_type(),
        profile.id
    )
}
