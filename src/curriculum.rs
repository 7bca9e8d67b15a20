// src/curriculum.rs

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Built-in data structures & algorithms sequence.
const DEFAULT_TOPICS: &[&str] = &[
    "Fundamentals of algorithm analysis: Space and time complexity of an algorithm",
    "Types of asymptotic notations and orders of growth",
    "Algorithm efficiency, best case, worst case, average case",
    "Analysis of non-recursive and recursive algorithms",
    "Asymptotic analysis for recurrence relation: Iteration Method",
    "Substitution Method, Master Method",
    "Recursive Tree Method",
    "Arrays: 1D and 2D array",
    "Stack",
    "Applications of stack: Expression Evaluation, Conversion of Infix to postfix and prefix expression",
    "Tower of Hanoi",
    "Queue, Types of Queue: Circular Queue, Double Ended Queue (deQueue), Applications",
    "List: Singly linked lists, Doubly linked lists, Circular linked lists",
    "Applications: Polynomial Manipulation",
];

#[derive(Debug, Error)]
pub enum CurriculumError {
    #[error("failed to read curriculum file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse curriculum file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("curriculum has no topics")]
    Empty,

    #[error("curriculum lists topic '{0}' more than once")]
    Duplicate(String),
}

/// Fixed, totally ordered list of topics. Index 0 is the entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curriculum {
    topics: Vec<String>,
}

#[derive(Deserialize)]
struct CurriculumFile {
    topics: Vec<String>,
}

impl Curriculum {
    pub fn new(topics: Vec<String>) -> Result<Self, CurriculumError> {
        if topics.is_empty() {
            return Err(CurriculumError::Empty);
        }

        let mut seen = HashSet::new();
        for topic in &topics {
            if !seen.insert(topic.as_str()) {
                return Err(CurriculumError::Duplicate(topic.clone()));
            }
        }

        Ok(Self { topics })
    }

    /// Parses `topics = ["...", ...]` from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, CurriculumError> {
        let file: CurriculumFile = toml::from_str(raw)?;
        Self::new(file.topics)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, CurriculumError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Uses `path` when given, otherwise the built-in sequence.
    pub fn load(path: Option<&str>) -> Result<Self, CurriculumError> {
        match path {
            Some(p) => Self::from_toml_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn position_of(&self, topic: &str) -> Option<usize> {
        self.topics.iter().position(|t| t == topic)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.topics.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(String::as_str)
    }
}

impl Default for Curriculum {
    fn default() -> Self {
        Self {
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
        }
    }
}
