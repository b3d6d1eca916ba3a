use quick_xml::escape::escape;
use serde::Deserialize;

/// Optional parameters for the `create` action. Unset fields are left off the
/// request entirely so the server applies its own defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateOptions {
    pub name: Option<String>,
    #[serde(rename = "attendeePW")]
    pub attendee_pw: Option<String>,
    #[serde(rename = "moderatorPW")]
    pub moderator_pw: Option<String>,
    pub welcome: Option<String>,
    #[serde(rename = "maxParticipants")]
    pub max_participants: Option<u32>,
    pub record: Option<bool>,
    pub duration: Option<u32>,
    #[serde(rename = "logoutURL")]
    pub logout_url: Option<String>,
    /// Presentation documents to pre-upload. When non-empty, `create` is sent
    /// as a POST carrying the generated `<modules>` body.
    pub documents: Vec<Document>,
}

/// A presentation document, either fetched by the server from a URL or
/// embedded inline as base64 text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Document {
    Url {
        url: String,
        #[serde(default)]
        filename: Option<String>,
    },
    Embedded {
        name: String,
        content: String,
    },
}

impl CreateOptions {
    pub(crate) fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        let mut push = |key: &str, value: String| params.push((key.to_string(), value));

        if let Some(v) = &self.name {
            push("name", v.clone());
        }
        if let Some(v) = &self.attendee_pw {
            push("attendeePW", v.clone());
        }
        if let Some(v) = &self.moderator_pw {
            push("moderatorPW", v.clone());
        }
        if let Some(v) = &self.welcome {
            push("welcome", v.clone());
        }
        if let Some(v) = self.max_participants {
            push("maxParticipants", v.to_string());
        }
        if let Some(v) = self.record {
            push("record", v.to_string());
        }
        if let Some(v) = self.duration {
            push("duration", v.to_string());
        }
        if let Some(v) = &self.logout_url {
            push("logoutURL", v.clone());
        }
        params
    }
}

/// Render the `<modules>` document POSTed by `create` when presentation
/// documents are attached.
pub(crate) fn modules_xml(documents: &[Document]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><modules><module name=\"presentation\">",
    );
    for document in documents {
        match document {
            Document::Url { url, filename } => {
                xml.push_str("<document url=\"");
                xml.push_str(&escape(url.as_str()));
                xml.push('"');
                if let Some(filename) = filename {
                    xml.push_str(" filename=\"");
                    xml.push_str(&escape(filename.as_str()));
                    xml.push('"');
                }
                xml.push_str("/>");
            }
            Document::Embedded { name, content } => {
                xml.push_str("<document name=\"");
                xml.push_str(&escape(name.as_str()));
                xml.push_str("\">");
                xml.push_str(&escape(content.as_str()));
                xml.push_str("</document>");
            }
        }
    }
    xml.push_str("</module></modules>");
    xml
}
