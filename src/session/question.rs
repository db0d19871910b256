use std::path::Path;

use anyhow::{Context, Result};
use rust_embed::Embed;
use serde::{Deserialize, Serialize};

#[derive(Embed)]
#[folder = "assets/papers/"]
struct PaperAssets;

pub type QuestionId = i64;

/// Answer choice key. Serialized as the backend's lowercase `chosen_key`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceKey {
    A,
    B,
    C,
    D,
}

impl ChoiceKey {
    pub const ALL: [ChoiceKey; 4] = [ChoiceKey::A, ChoiceKey::B, ChoiceKey::C, ChoiceKey::D];

    pub fn as_str(self) -> &'static str {
        match self {
            ChoiceKey::A => "a",
            ChoiceKey::B => "b",
            ChoiceKey::C => "c",
            ChoiceKey::D => "d",
        }
    }

    pub fn label(self) -> char {
        match self {
            ChoiceKey::A => 'A',
            ChoiceKey::B => 'B',
            ChoiceKey::C => 'C',
            ChoiceKey::D => 'D',
        }
    }

    pub fn from_char(ch: char) -> Option<Self> {
        match ch.to_ascii_lowercase() {
            'a' => Some(ChoiceKey::A),
            'b' => Some(ChoiceKey::B),
            'c' => Some(ChoiceKey::C),
            'd' => Some(ChoiceKey::D),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            ChoiceKey::A => 0,
            ChoiceKey::B => 1,
            ChoiceKey::C => 2,
            ChoiceKey::D => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl std::fmt::Display for ChoiceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One question as served by the attempt backend. Immutable for the life of a
/// session. Option text may be absent when an option is an image-only entry;
/// image fields carry server-side paths the terminal can only reference.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub question: String,
    #[serde(default)]
    pub option_a: Option<String>,
    #[serde(default)]
    pub option_b: Option<String>,
    #[serde(default)]
    pub option_c: Option<String>,
    #[serde(default)]
    pub option_d: Option<String>,
    #[serde(default)]
    pub option_a_image: Option<String>,
    #[serde(default)]
    pub option_b_image: Option<String>,
    #[serde(default)]
    pub option_c_image: Option<String>,
    #[serde(default)]
    pub option_d_image: Option<String>,
    #[serde(default)]
    pub has_diagram: u8,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub question_image: Option<String>,
}

impl Question {
    pub fn option_text(&self, key: ChoiceKey) -> Option<&str> {
        let slot = match key {
            ChoiceKey::A => &self.option_a,
            ChoiceKey::B => &self.option_b,
            ChoiceKey::C => &self.option_c,
            ChoiceKey::D => &self.option_d,
        };
        slot.as_deref().filter(|s| !s.is_empty())
    }

    pub fn option_image(&self, key: ChoiceKey) -> Option<&str> {
        let slot = match key {
            ChoiceKey::A => &self.option_a_image,
            ChoiceKey::B => &self.option_b_image,
            ChoiceKey::C => &self.option_c_image,
            ChoiceKey::D => &self.option_d_image,
        };
        slot.as_deref().filter(|s| !s.is_empty())
    }

    pub fn shows_diagram(&self) -> bool {
        self.has_diagram != 0
    }

    /// Keys with any content (text or image), in display order.
    pub fn present_options(&self) -> Vec<ChoiceKey> {
        ChoiceKey::ALL
            .into_iter()
            .filter(|&key| self.option_text(key).is_some() || self.option_image(key).is_some())
            .collect()
    }

    pub fn option_count(&self) -> usize {
        self.present_options().len()
    }
}

/// The paper bundled for `--offline` runs.
pub fn bundled_sample() -> Result<Vec<Question>> {
    let file = PaperAssets::get("sample.json").context("bundled sample paper missing")?;
    let content = std::str::from_utf8(file.data.as_ref())?;
    let questions = serde_json::from_str(content).context("bundled sample paper is malformed")?;
    Ok(questions)
}

pub fn load_from_file(path: &Path) -> Result<Vec<Question>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read question file {}", path.display()))?;
    let questions = serde_json::from_str(&content)
        .with_context(|| format!("question file {} is malformed", path.display()))?;
    Ok(questions)
}
