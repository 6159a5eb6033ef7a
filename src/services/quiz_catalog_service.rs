use std::sync::Arc;

use crate::{
    api::QuizApi,
    errors::{AppError, AppResult},
    models::domain::Quiz,
};

pub struct QuizCatalogService {
    api: Arc<dyn QuizApi>,
}

impl QuizCatalogService {
    pub fn new(api: Arc<dyn QuizApi>) -> Self {
        Self { api }
    }

    pub async fn list_quizzes(&self) -> AppResult<Vec<Quiz>> {
        let quizzes = self.api.list_quizzes().await?;
        log::debug!("Loaded {} quizzes", quizzes.len());
        Ok(quizzes)
    }

    pub async fn filtered_quizzes(&self, filter: &QuizFilter) -> AppResult<Vec<Quiz>> {
        let quizzes = self.list_quizzes().await?;
        Ok(filter.apply(&quizzes))
    }

    pub async fn get_quiz(&self, id: &str) -> AppResult<Quiz> {
        self.list_quizzes()
            .await?
            .into_iter()
            .find(|q| q.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", id)))
    }
}

/// Catalog filters. Empty fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuizFilter {
    pub search: String,
    pub difficulty: String,
    pub category: String,
    pub professor: String,
}

impl QuizFilter {
    pub fn with_search(mut self, search: &str) -> Self {
        self.search = search.to_string();
        self
    }

    /// Selects `difficulty`, or clears it when it is already selected.
    pub fn toggle_difficulty(&mut self, difficulty: &str) {
        toggle(&mut self.difficulty, difficulty);
    }

    pub fn toggle_category(&mut self, category: &str) {
        toggle(&mut self.category, category);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self, quiz: &Quiz) -> bool {
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            if !quiz.title.to_lowercase().contains(&needle)
                && !quiz.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        if !self.difficulty.is_empty() && quiz.difficulty.as_deref() != Some(self.difficulty.as_str())
        {
            return false;
        }

        if !self.category.is_empty() && quiz.category.as_deref() != Some(self.category.as_str()) {
            return false;
        }

        if !self.professor.is_empty() {
            match &quiz.professor {
                Some(p) if p.full_name() == self.professor => {}
                _ => return false,
            }
        }

        true
    }

    pub fn apply(&self, quizzes: &[Quiz]) -> Vec<Quiz> {
        quizzes.iter().filter(|q| self.matches(q)).cloned().collect()
    }
}

fn toggle(slot: &mut String, value: &str) {
    if slot == value {
        slot.clear();
    } else {
        *slot = value.to_string();
    }
}

/// Distinct non-empty categories in the order they first appear.
pub fn categories(quizzes: &[Quiz]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for category in quizzes.iter().filter_map(|q| q.category.as_deref()) {
        if !category.is_empty() && !seen.iter().any(|c| c == category) {
            seen.push(category.to_string());
        }
    }
    seen
}
