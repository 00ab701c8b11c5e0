use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::AnswerMap;

pub fn get_questions_route() -> &'static str {
    "/get-questions"
}

pub fn submit_answers_route() -> &'static str {
    "/submit-answers"
}

pub fn generate_json_route() -> &'static str {
    "/generate-json"
}

pub fn generate_docx_route() -> &'static str {
    "/generate-docx"
}

pub fn download_docx_route() -> &'static str {
    "/download-docx"
}

pub fn restart_route() -> &'static str {
    "/restart"
}

/// One step of the form: prompts paired positionally with the variable keys
/// their answers are stored under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBatch {
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub variables: Vec<String>,
    /// Whether the service has another batch after this one. Services send
    /// either a boolean or the name of the next step (`null` when there is none).
    #[serde(default, deserialize_with = "deserialize_next_flag")]
    pub next: bool,
}

impl QuestionBatch {
    pub fn new(questions: Vec<String>, variables: Vec<String>, next: bool) -> Self {
        Self {
            questions,
            variables,
            next,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty() && self.variables.is_empty()
    }

    pub fn is_well_formed(&self) -> bool {
        self.questions.len() == self.variables.len()
    }

    /// `(prompt, variable)` pairs in service order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.questions
            .iter()
            .zip(self.variables.iter())
            .map(|(question, variable)| (question.as_str(), variable.as_str()))
    }
}

fn deserialize_next_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => flag,
        Some(Value::String(step)) => !step.is_empty(),
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: AnswerMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Loose view over acknowledgement bodies whose content is not part of the
/// contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
}
