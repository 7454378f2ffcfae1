#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;

use sent_mail_labeler::{Labeler, LabeledRecord, NormalizedRecord};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-token";
pub const MESSAGES_PATH: &str = "/me/mailFolders/SentItems/messages";

/// Answers from a fixed list and remembers what it was shown.
#[derive(Debug, Default)]
pub struct ScriptedLabeler {
    pub answers: VecDeque<bool>,
    pub shown: Vec<String>,
}

impl ScriptedLabeler {
    pub fn always(answer: bool, count: usize) -> Self {
        Self {
            answers: std::iter::repeat(answer).take(count).collect(),
            shown: Vec::new(),
        }
    }
}

impl Labeler for ScriptedLabeler {
    fn label(&mut self, record: NormalizedRecord) -> io::Result<LabeledRecord> {
        let label = self
            .answers
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no answers left"))?;
        self.shown.push(record.content.clone());
        Ok(LabeledRecord { record, label })
    }
}

pub fn message(id: &str, content: &str) -> Value {
    json!({
        "@odata.type": "#microsoft.graph.message",
        "@odata.etag": format!("W/\"{id}\""),
        "id": id,
        "subject": format!("subject {id}"),
        "sentDateTime": format!("2018-02-01T10:00:{:0>2}Z", id.len()),
        "uniqueBody": { "contentType": "text", "content": content }
    })
}

pub fn event_message(id: &str) -> Value {
    let mut value = message(id, "Accepted: Quarterly review");
    value["@odata.type"] = json!("#microsoft.graph.eventMessage");
    value
}

pub fn page(records: Vec<Value>, next: Option<String>) -> Value {
    let mut body = json!({
        "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#users('me')/mailFolders('SentItems')/messages",
        "value": records,
    });
    if let Some(next) = next {
        body["@odata.nextLink"] = json!(next);
    }
    body
}

/// Serve `pages` as a chain: the first at [`MESSAGES_PATH`], the rest at
/// `/page/<n>`, each linking to the next. Returns the start URL.
pub async fn mount_pages(server: &MockServer, pages: Vec<Vec<Value>>) -> String {
    let count = pages.len();
    for (index, records) in pages.into_iter().enumerate() {
        let next = (index + 1 < count).then(|| page_url(server, index + 1));
        Mock::given(method("GET"))
            .and(path(page_path(index)))
            .and(header("Authorization", format!("Bearer {TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(records, next)))
            .mount(server)
            .await;
    }
    format!("{}{}?$top=2", server.uri(), MESSAGES_PATH)
}

pub fn page_path(index: usize) -> String {
    if index == 0 {
        MESSAGES_PATH.to_string()
    } else {
        format!("/page/{index}")
    }
}

pub fn page_url(server: &MockServer, index: usize) -> String {
    format!("{}{}?$skiptoken=tok{index}", server.uri(), page_path(index))
}

/// Minimal RFC 4180 reader for checking what the sink wrote.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut chars = text.chars().peekable();
    let mut quoted = false;

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => quoted = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => quoted = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}
