//! Typed view of a voice command.

use serde::Deserialize;
use serde_json::Value;

use crate::dispatcher::DispatchOptions;
use crate::lifetime::Form;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NlpView {
    app_id: String,
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    skill_id: Option<String>,
}

#[derive(Deserialize, Default)]
struct ActionView {
    #[serde(default)]
    form: Option<String>,
}

/// A recognized command: which app should handle it, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceCommand {
    pub app_id: String,
    pub intent: Option<String>,
    pub skill_id: Option<String>,
    /// `false` for `service` commands, which run without taking the foreground.
    pub preemptive: bool,
    pub form: Form,
}

impl VoiceCommand {
    /// Extracts the command from the NLP result and its action.
    ///
    /// # Example
    /// ```
    /// use serde_json::json;
    /// use skillvisor::{Form, VoiceCommand};
    ///
    /// let cmd = VoiceCommand::parse(
    ///     &json!({ "appId": "weather", "intent": "forecast" }),
    ///     &json!({ "form": "scene" }),
    /// )
    /// .unwrap();
    /// assert_eq!(cmd.app_id, "weather");
    /// assert_eq!(cmd.form, Form::Scene);
    /// assert!(cmd.preemptive);
    /// ```
    pub fn parse(nlp: &Value, action: &Value) -> Result<Self, serde_json::Error> {
        let nlp = NlpView::deserialize(nlp)?;
        let action = if action.is_null() {
            ActionView::default()
        } else {
            ActionView::deserialize(action)?
        };

        let (preemptive, form) = match action.form.as_deref() {
            Some("service") => (false, Form::Cut),
            Some(other) => (true, other.parse().unwrap_or_default()),
            None => (true, Form::Cut),
        };
        Ok(Self {
            skill_id: nlp.skill_id.or_else(|| Some(nlp.app_id.clone())),
            app_id: nlp.app_id,
            intent: nlp.intent,
            preemptive,
            form,
        })
    }

    /// Dispatch options for routing this command.
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            preemptive: self.preemptive,
            form: self.form,
            skill_id: self.skill_id.clone(),
            ..DispatchOptions::default()
        }
        .from_voice()
    }
}
