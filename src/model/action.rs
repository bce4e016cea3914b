use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{EngineError, EngineResult};

/// An atomic browser operation proposed by the LLM.
///
/// Internally tagged on `action_type` so that an unrecognized tag fails to
/// deserialize rather than silently falling back to a default variant.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "action_type")]
pub enum Action {
    #[serde(rename = "CLICK")]
    Click {
        element_id: String,
        #[serde(default)]
        reasoning: Option<String>,
    },
    #[serde(rename = "INPUT_TEXT")]
    InputText {
        element_id: String,
        text: String,
        #[serde(default)]
        reasoning: Option<String>,
    },
    #[serde(rename = "UPLOAD_FILE")]
    UploadFile {
        element_id: String,
        file_url: String,
        #[serde(default)]
        reasoning: Option<String>,
    },
    #[serde(rename = "SELECT_OPTION")]
    SelectOption {
        element_id: String,
        option: String,
        #[serde(default)]
        reasoning: Option<String>,
    },
    #[serde(rename = "CHECKBOX")]
    Checkbox {
        element_id: String,
        is_checked: bool,
        #[serde(default)]
        reasoning: Option<String>,
    },
    #[serde(rename = "WAIT")]
    Wait {
        #[serde(default)]
        reasoning: Option<String>,
    },
    #[serde(rename = "NULL_ACTION")]
    NullAction {
        #[serde(default)]
        reasoning: Option<String>,
    },
    #[serde(rename = "SOLVE_CAPTCHA")]
    SolveCaptcha {
        #[serde(default)]
        reasoning: Option<String>,
    },
    #[serde(rename = "TERMINATE")]
    Terminate {
        #[serde(default)]
        reasoning: Option<String>,
    },
    #[serde(rename = "COMPLETE")]
    Complete {
        #[serde(default)]
        reasoning: Option<String>,
        #[serde(default)]
        data: Option<Value>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Click,
    InputText,
    UploadFile,
    SelectOption,
    Checkbox,
    Wait,
    NullAction,
    SolveCaptcha,
    Terminate,
    Complete,
}

impl Action {
    pub fn action_type(&self) -> ActionType {
        match self {
            Action::Click { .. } => ActionType::Click,
            Action::InputText { .. } => ActionType::InputText,
            Action::UploadFile { .. } => ActionType::UploadFile,
            Action::SelectOption { .. } => ActionType::SelectOption,
            Action::Checkbox { .. } => ActionType::Checkbox,
            Action::Wait { .. } => ActionType::Wait,
            Action::NullAction { .. } => ActionType::NullAction,
            Action::SolveCaptcha { .. } => ActionType::SolveCaptcha,
            Action::Terminate { .. } => ActionType::Terminate,
            Action::Complete { .. } => ActionType::Complete,
        }
    }

    /// `element_id` for web-targeted variants; `None` for the others.
    pub fn element_id(&self) -> Option<&str> {
        match self {
            Action::Click { element_id, .. }
            | Action::InputText { element_id, .. }
            | Action::UploadFile { element_id, .. }
            | Action::SelectOption { element_id, .. }
            | Action::Checkbox { element_id, .. } => Some(element_id.as_str()),
            _ => None,
        }
    }

    pub fn reasoning(&self) -> Option<&str> {
        match self {
            Action::Click { reasoning, .. }
            | Action::InputText { reasoning, .. }
            | Action::UploadFile { reasoning, .. }
            | Action::SelectOption { reasoning, .. }
            | Action::Checkbox { reasoning, .. }
            | Action::Wait { reasoning }
            | Action::NullAction { reasoning }
            | Action::SolveCaptcha { reasoning }
            | Action::Terminate { reasoning }
            | Action::Complete { reasoning, .. } => reasoning.as_deref(),
        }
    }
}

/// The result of dispatching one `Action`. An action may yield several of
/// these (an ordered sequence); the last one is the privileged verdict.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default)]
    pub javascript_triggered: bool,
    #[serde(default)]
    pub step_retry_number: u32,
    #[serde(default)]
    pub step_order: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_type: Option<String>,
}

impl ActionResult {
    pub fn success(data: Option<Value>) -> Self {
        Self {
            success: true,
            data,
            javascript_triggered: false,
            step_retry_number: 0,
            step_order: 0,
            exception_type: None,
        }
    }

    pub fn failure(exception_type: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            javascript_triggered: false,
            step_retry_number: 0,
            step_order: 0,
            exception_type: Some(exception_type.into()),
        }
    }
}

/// Parse `{"actions": [...]}` (the raw LLM response object) into a typed
/// action sequence. An unrecognized `action_type` tag is a hard error.
pub fn parse_actions(response: &Value) -> EngineResult<Vec<Action>> {
    let raw_actions = response
        .get("actions")
        .ok_or_else(|| EngineError::validation("LLM response is missing an \"actions\" field"))?;
    serde_json::from_value(raw_actions.clone())
        .map_err(|err| EngineError::validation(format!("could not parse actions: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_action_type() {
        let response = serde_json::json!({
            "actions": [{"action_type": "FLY_TO_THE_MOON"}]
        });
        assert!(parse_actions(&response).is_err());
    }

    #[test]
    fn parses_click_and_complete() {
        let response = serde_json::json!({
            "actions": [
                {"action_type": "CLICK", "element_id": "e1"},
                {"action_type": "COMPLETE", "data": {"name": "Alice"}},
            ]
        });
        let actions = parse_actions(&response).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].action_type(), ActionType::Click);
        assert_eq!(actions[0].element_id(), Some("e1"));
        assert_eq!(actions[1].action_type(), ActionType::Complete);
    }
}
