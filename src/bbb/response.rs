use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use super::BbbError;

const SUCCESS: &str = "SUCCESS";

/// A meeting record as returned by `create` and `getMeetingInfo`, and as the
/// repeated element of `getMeetings`. Fields the server omits decode to their
/// zero values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Meeting {
    #[serde(rename = "meetingID")]
    pub meeting_id: String,
    #[serde(rename = "meetingName")]
    pub meeting_name: String,
    #[serde(rename = "createTime")]
    pub create_time: u64,
    #[serde(rename = "voiceBridge")]
    pub voice_bridge: String,
    #[serde(rename = "attendeePW")]
    pub attendee_pw: String,
    #[serde(rename = "moderatorPW")]
    pub moderator_pw: String,
    pub running: bool,
    #[serde(rename = "participantCount")]
    pub participant_count: u32,
    #[serde(rename = "moderatorCount")]
    pub moderator_count: u32,
    #[serde(rename = "hasBeenForciblyEnded")]
    pub has_been_forcibly_ended: bool,
}

/// A recording record from `getRecordings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Recording {
    #[serde(rename = "recordID")]
    pub record_id: String,
    #[serde(rename = "meetingID")]
    pub meeting_id: String,
    pub name: String,
    pub published: bool,
    #[serde(rename = "startTime")]
    pub start_time: u64,
    #[serde(rename = "endTime")]
    pub end_time: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Status {
    returncode: String,
    #[serde(rename = "messageKey")]
    message_key: String,
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MeetingsResponse {
    meetings: MeetingList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MeetingList {
    meeting: Vec<Meeting>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecordingsResponse {
    recordings: RecordingList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecordingList {
    recording: Vec<Recording>,
}

fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, BbbError> {
    quick_xml::de::from_str(body).map_err(|e| BbbError::Xml(e.to_string()))
}

/// Check the `<returncode>` of a response envelope, turning anything other
/// than SUCCESS into a gateway failure.
fn check(body: &str) -> Result<(), BbbError> {
    let status: Status = decode(body)?;
    if status.returncode != SUCCESS {
        return Err(BbbError::Failed {
            message_key: status.message_key,
            message: status.message,
        });
    }
    Ok(())
}

/// Decode a response whose meeting fields live at the top level of the
/// envelope (`create`, `getMeetingInfo`).
pub fn meeting(body: &str) -> Result<Meeting, BbbError> {
    check(body)?;
    decode(body)
}

/// Decode the repeated `<meeting>` elements of a `getMeetings` response.
/// An absent or empty `<meetings>` element yields an empty list.
pub fn meetings(body: &str) -> Result<Vec<Meeting>, BbbError> {
    check(body)?;
    let response: MeetingsResponse = decode(body)?;
    Ok(response.meetings.meeting)
}

/// Decode the repeated `<recording>` elements of a `getRecordings` response.
pub fn recordings(body: &str) -> Result<Vec<Recording>, BbbError> {
    check(body)?;
    let response: RecordingsResponse = decode(body)?;
    Ok(response.recordings.recording)
}

/// Extract the text of the first element named `name`. An absent element is
/// an empty string, never an error; the remote API may legitimately omit
/// optional fields.
pub fn text_field(body: &str, name: &str) -> Result<String, BbbError> {
    let mut reader = Reader::from_str(body);
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) if start.local_name().as_ref() == name.as_bytes() => {
                let text = reader
                    .read_text(start.name())
                    .map_err(|e| BbbError::Xml(e.to_string()))?;
                return Ok(text.trim().to_string());
            }
            Ok(Event::Eof) => return Ok(String::new()),
            Ok(_) => {}
            Err(e) => return Err(BbbError::Xml(e.to_string())),
        }
    }
}

/// Extract a boolean field; anything other than a literal `true` (including
/// an absent element) is `false`.
pub fn bool_field(body: &str, name: &str) -> Result<bool, BbbError> {
    Ok(text_field(body, name)?.eq_ignore_ascii_case("true"))
}
