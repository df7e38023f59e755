use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fewest recognised technologies accepted as a tech stack.
pub const MIN_TECHNOLOGIES: usize = 2;

const DEFAULT_CATALOG: &[(&str, &[&str])] = &[
    (
        "languages",
        &[
            "python", "java", "javascript", "typescript", "c++", "c#", "go", "rust", "php", "ruby",
            "swift", "kotlin",
        ],
    ),
    (
        "frameworks",
        &[
            "react", "angular", "vue", "nodejs", "express", "django", "flask", "spring", "laravel",
            "rails", "fastapi",
        ],
    ),
    (
        "databases",
        &[
            "mysql", "postgresql", "mongodb", "redis", "sqlite", "oracle", "cassandra",
            "elasticsearch",
        ],
    ),
    (
        "cloud",
        &[
            "aws", "azure", "gcp", "google cloud", "docker", "kubernetes", "jenkins", "git", "linux",
        ],
    ),
    (
        "web",
        &["html", "css", "bootstrap", "tailwind", "sass", "jquery", "webpack"],
    ),
    (
        "ml",
        &["tensorflow", "pytorch", "scikit-learn", "pandas", "numpy", "keras", "opencv"],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechCategory {
    pub category: String,
    pub technologies: Vec<String>,
}

/// How a catalog token has to appear in the text to count as a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Token must not be flanked by letters; digits and punctuation are
    /// boundaries, so "python3" and "c++17" still match.
    #[default]
    WordBoundary,
    /// Plain case-insensitive substring test. Short tokens also fire inside
    /// longer words ("go" in "django", "java" in "javascript").
    Substring,
}

/// Ordered category table used to recognise technologies in free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechCatalog {
    categories: Vec<TechCategory>,
    #[serde(default)]
    mode: MatchMode,
}

impl Default for TechCatalog {
    fn default() -> Self {
        let categories = DEFAULT_CATALOG
            .iter()
            .map(|(category, techs)| TechCategory {
                category: category.to_string(),
                technologies: techs.iter().map(|t| t.to_string()).collect(),
            })
            .collect();
        Self { categories, mode: MatchMode::default() }
    }
}

impl TechCatalog {
    pub fn new(categories: Vec<TechCategory>) -> Self {
        let categories = categories
            .into_iter()
            .map(|c| TechCategory {
                category: c.category,
                technologies: c
                    .technologies
                    .into_iter()
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect(),
            })
            .collect();
        Self { categories, mode: MatchMode::default() }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Loads a catalog from a JSON list of `{"category", "technologies"}` objects.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tech catalog: {}", path.display()))?;
        let categories: Vec<TechCategory> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse tech catalog: {}", path.display()))?;
        let catalog = Self::new(categories);
        if catalog.is_empty() {
            return Err(anyhow!("Tech catalog {} contains no technologies", path.display()));
        }
        Ok(catalog)
    }

    pub fn categories(&self) -> &[TechCategory] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.technologies.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the canonical names found in `text`, in catalog order, without duplicates.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let mut found: Vec<String> = Vec::new();

        for category in &self.categories {
            for tech in &category.technologies {
                let hit = match self.mode {
                    MatchMode::Substring => lower.contains(tech.as_str()),
                    MatchMode::WordBoundary => contains_word(&lower, tech),
                };
                if hit {
                    let canonical = title_case(tech);
                    if !found.contains(&canonical) {
                        found.push(canonical);
                    }
                }
            }
        }

        found
    }
}

pub fn extract_tech_stack(text: &str) -> Vec<String> {
    TechCatalog::default().extract(text)
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphabetic) && !after.is_some_and(char::is_alphabetic)
    })
}

/// Uppercases the first letter of every alphabetic run and lowercases the rest:
/// "google cloud" -> "Google Cloud", "scikit-learn" -> "Scikit-Learn".
pub fn title_case(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut prev_alpha = false;
    for ch in token.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}
