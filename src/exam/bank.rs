// src/exam/bank.rs

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::question::{AnswerValue, Question, QuestionType};

/// Category-C bank bundled into the binary; the fallback of last resort.
const BUNDLED_DEFAULT: &str = include_str!("../../data/questions_C.json");

/// Closed set of question-bank categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    A,
    B,
    C,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::A => "A",
            Category::B => "B",
            Category::C => "C",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(Category::A),
            "B" => Some(Category::B),
            "C" => Some(Category::C),
            _ => None,
        }
    }

    fn file_name(&self) -> String {
        format!("questions_{}.json", self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a loaded pool actually came from. The fallback chain is an
/// observable outcome, not a silent console message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSource {
    Disk,
    BundledDefault,
}

/// The three type groups of one category, validated and type-stamped.
#[derive(Debug, Clone)]
pub struct CategoryPool {
    pub single: Vec<Question>,
    pub multiple: Vec<Question>,
    pub judge: Vec<Question>,
}

impl CategoryPool {
    pub fn group(&self, question_type: QuestionType) -> &[Question] {
        match question_type {
            QuestionType::Single => &self.single,
            QuestionType::Multiple => &self.multiple,
            QuestionType::Judge => &self.judge,
        }
    }

    /// Looks a question up by id across all three groups.
    pub fn find(&self, id: i64) -> Option<&Question> {
        self.single
            .iter()
            .chain(&self.multiple)
            .chain(&self.judge)
            .find(|q| q.id == id)
    }
}

#[derive(Debug, Clone)]
pub struct LoadedPool {
    pub source: PoolSource,
    pub pool: CategoryPool,
}

#[derive(Debug)]
pub enum BankError {
    /// Not even the bundled default pool could be parsed. Fatal: no exam
    /// can start.
    DefaultUnavailable(String),
}

impl fmt::Display for BankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankError::DefaultUnavailable(msg) => {
                write!(f, "default question bank unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for BankError {}

impl From<BankError> for AppError {
    fn from(err: BankError) -> Self {
        tracing::error!("question bank configuration error: {}", err);
        AppError::InternalServerError(err.to_string())
    }
}

/// Read-only provider of category pools. Lazily populated per category and
/// never invalidated within a process lifetime; safe for concurrent reads.
pub struct QuestionBank {
    dir: PathBuf,
    cache: RwLock<HashMap<Category, Arc<LoadedPool>>>,
}

impl QuestionBank {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the pool for a category, loading it on first access.
    /// A missing or malformed category file falls back to the bundled
    /// default pool; only a broken bundled default is an error.
    pub fn load(&self, category: Category) -> Result<Arc<LoadedPool>, BankError> {
        if let Some(loaded) = self.read_cache().get(&category) {
            return Ok(Arc::clone(loaded));
        }

        let loaded = Arc::new(self.load_uncached(category)?);
        self.write_cache().insert(category, Arc::clone(&loaded));
        Ok(loaded)
    }

    fn load_uncached(&self, category: Category) -> Result<LoadedPool, BankError> {
        let path = self.dir.join(category.file_name());
        match std::fs::read_to_string(&path) {
            Ok(content) => match parse_bank(&content) {
                Ok(pool) => {
                    tracing::info!(
                        "loaded question bank for category {} from {}",
                        category,
                        path.display()
                    );
                    return Ok(LoadedPool {
                        source: PoolSource::Disk,
                        pool,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "malformed question bank {} ({}), falling back to bundled default",
                        path.display(),
                        e
                    );
                }
            },
            Err(e) => {
                tracing::warn!(
                    "cannot read question bank {} ({}), falling back to bundled default",
                    path.display(),
                    e
                );
            }
        }

        let pool = parse_bank(BUNDLED_DEFAULT)
            .map_err(|e| BankError::DefaultUnavailable(e.to_string()))?;
        Ok(LoadedPool {
            source: PoolSource::BundledDefault,
            pool,
        })
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Category, Arc<LoadedPool>>> {
        self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_cache(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Category, Arc<LoadedPool>>> {
        self.cache.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// On-disk bank entry. Carries no `type` field; the loader stamps the type
/// per group, mirroring the converter's output layout.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BankEntry {
    id: i64,
    question: String,
    #[serde(default)]
    options: Option<BTreeMap<String, String>>,
    correct_answer: AnswerValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BankGroups {
    #[serde(default)]
    single_choice: Vec<BankEntry>,
    #[serde(default)]
    multiple_choice: Vec<BankEntry>,
    #[serde(default)]
    judge: Vec<BankEntry>,
}

#[derive(Debug, Deserialize)]
struct BankFile {
    questions: BankGroups,
}

fn parse_bank(content: &str) -> Result<CategoryPool, serde_json::Error> {
    let file: BankFile = serde_json::from_str(content)?;
    Ok(CategoryPool {
        single: stamp_group(file.questions.single_choice, QuestionType::Single),
        multiple: stamp_group(file.questions.multiple_choice, QuestionType::Multiple),
        judge: stamp_group(file.questions.judge, QuestionType::Judge),
    })
}

/// Stamps the group's type onto each entry and drops entries that violate
/// the structural invariants, with a diagnostic per dropped entry.
fn stamp_group(entries: Vec<BankEntry>, question_type: QuestionType) -> Vec<Question> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let question = Question {
                id: entry.id,
                question: entry.question,
                question_type,
                options: entry.options,
                correct_answer: entry.correct_answer,
            };
            match question.validity() {
                Ok(()) => Some(question),
                Err(reason) => {
                    tracing::warn!(
                        "dropping invalid {} question {}: {}",
                        question_type.as_str(),
                        question.id,
                        reason
                    );
                    None
                }
            }
        })
        .collect()
}
