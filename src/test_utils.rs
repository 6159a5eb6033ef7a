#[cfg(test)]
pub mod fixtures {
    use crate::auth::{AuthContext, UserRole};
    use crate::models::domain::{Question, QuestionOption, Quiz};

    /// Quiz "quiz-1" with questions `q-1..=q-n`, each offering `q-i-opt-1` and
    /// `q-i-opt-2`. Correctness is withheld.
    pub fn sample_quiz(question_count: usize, time_limit: u32) -> Quiz {
        let questions = (1..=question_count)
            .map(|i| Question {
                id: format!("q-{}", i),
                text: format!("Question {}", i),
                options: (1..=2)
                    .map(|j| QuestionOption {
                        id: format!("q-{}-opt-{}", i, j),
                        text: format!("Option {}", j),
                        is_correct: None,
                    })
                    .collect(),
            })
            .collect();

        Quiz {
            id: "quiz-1".to_string(),
            title: "Sample quiz".to_string(),
            description: "Fixture quiz".to_string(),
            category: None,
            difficulty: None,
            color: None,
            professor: None,
            time_limit,
            questions,
        }
    }

    /// A signed-in student, `user_1`.
    pub fn student() -> AuthContext {
        AuthContext::signed_in("user_1", UserRole::Student, None)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixtures_sample_quiz() {
        let quiz = sample_quiz(3, 45);
        assert_eq!(quiz.questions.len(), 3);
        assert_eq!(quiz.questions[2].id, "q-3");
        assert_eq!(quiz.questions[2].options[1].id, "q-3-opt-2");
        assert_eq!(quiz.time_limit, 45);
        assert!(quiz.questions.iter().all(|q| q.correct_option().is_none()));
    }

    #[test]
    fn test_fixtures_student() {
        let ctx = student();
        assert_eq!(ctx.user_id().as_deref(), Some("user_1"));
    }
}
