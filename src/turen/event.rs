//! Speech-service topics.

use serde::Deserialize;
use serde_json::Value;

/// Signal received from the wake-word and speech services.
#[derive(Debug, Clone, PartialEq)]
pub enum TurenEvent {
    VoiceComing,
    AsrPending,
    AsrAccept,
    AsrExtra,
    AsrEnd,
    AsrReject,
    AsrFake,
    Nlp { nlp: Value, action: Value },
    MaliciousNlp,
    SpeechError { code: i32 },
    Pickup { is_pickup: bool },
    Muted { muted: bool },
}

#[derive(Deserialize)]
struct NlpPayload {
    #[serde(default)]
    nlp: Value,
    #[serde(default)]
    action: Value,
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(alias = "errCode")]
    code: i32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bare(bool),
    Pickup {
        #[serde(rename = "isPickup")]
        is_pickup: bool,
    },
    Muted {
        muted: bool,
    },
}

impl Flag {
    fn value(self) -> bool {
        match self {
            Flag::Bare(b) => b,
            Flag::Pickup { is_pickup } => is_pickup,
            Flag::Muted { muted } => muted,
        }
    }
}

impl TurenEvent {
    /// Decodes a speech-service topic and payload.
    ///
    /// Returns `None` for unknown topics or payloads that do not fit the topic.
    ///
    /// # Example
    /// ```
    /// use serde_json::json;
    /// use skillvisor::TurenEvent;
    ///
    /// let ev = TurenEvent::from_topic("rokid.turen.pickup", &json!({ "isPickup": false }));
    /// assert_eq!(ev, Some(TurenEvent::Pickup { is_pickup: false }));
    /// assert_eq!(TurenEvent::from_topic("rokid.unknown", &json!(null)), None);
    /// ```
    pub fn from_topic(topic: &str, payload: &Value) -> Option<Self> {
        let event = match topic {
            "rokid.turen.voice_coming" => TurenEvent::VoiceComing,
            "rokid.speech.inter_asr" => TurenEvent::AsrPending,
            "rokid.speech.asr_accept" => TurenEvent::AsrAccept,
            "rokid.speech.extra" => TurenEvent::AsrExtra,
            "rokid.speech.final_asr" => TurenEvent::AsrEnd,
            "rokid.speech.rejected" => TurenEvent::AsrReject,
            "rokid.speech.fake" => TurenEvent::AsrFake,
            "rokid.speech.malicious_nlp" => TurenEvent::MaliciousNlp,
            "rokid.speech.nlp" => {
                let p = NlpPayload::deserialize(payload).ok()?;
                TurenEvent::Nlp {
                    nlp: p.nlp,
                    action: p.action,
                }
            }
            "rokid.speech.error" => {
                let p = ErrorPayload::deserialize(payload).ok()?;
                TurenEvent::SpeechError { code: p.code }
            }
            "rokid.turen.pickup" => TurenEvent::Pickup {
                is_pickup: Flag::deserialize(payload).ok()?.value(),
            },
            "rokid.turen.mute" => TurenEvent::Muted {
                muted: Flag::deserialize(payload).ok()?.value(),
            },
            _ => return None,
        };
        Some(event)
    }

    pub fn topic(&self) -> &'static str {
        match self {
            TurenEvent::VoiceComing => "rokid.turen.voice_coming",
            TurenEvent::AsrPending => "rokid.speech.inter_asr",
            TurenEvent::AsrAccept => "rokid.speech.asr_accept",
            TurenEvent::AsrExtra => "rokid.speech.extra",
            TurenEvent::AsrEnd => "rokid.speech.final_asr",
            TurenEvent::AsrReject => "rokid.speech.rejected",
            TurenEvent::AsrFake => "rokid.speech.fake",
            TurenEvent::Nlp { .. } => "rokid.speech.nlp",
            TurenEvent::MaliciousNlp => "rokid.speech.malicious_nlp",
            TurenEvent::SpeechError { .. } => "rokid.speech.error",
            TurenEvent::Pickup { .. } => "rokid.turen.pickup",
            TurenEvent::Muted { .. } => "rokid.turen.mute",
        }
    }
}
