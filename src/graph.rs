//! Paged message fetching from the Graph mail API.
//!
//! A query URL becomes a [`RecordCursor`]: records are handed out one at a time
//! and the next page is only requested once the buffered one is used up. The
//! `@odata.nextLink` of each page is followed verbatim until a page has none.

use futures::Stream;
use hyper::ext::ReasonPhrase;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{AccessToken, RawRecord};

/// Asks the service to render message bodies as text instead of HTML.
pub const PREFER_TEXT_BODY: &str = "outlook.body-content-type=\"text\"";

#[derive(Debug, Deserialize)]
struct Page {
    value: Option<Vec<WireMessage>>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

// Every field is optional here so absence is reported per record as a parse
// error naming the field, instead of failing the whole page.
#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(rename = "@odata.type")]
    odata_type: Option<String>,
    id: Option<String>,
    #[serde(rename = "sentDateTime")]
    sent_date_time: Option<String>,
    #[serde(rename = "uniqueBody")]
    unique_body: Option<WireBody>,
}

#[derive(Debug, Deserialize)]
struct WireBody {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GraphErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

impl WireMessage {
    fn into_record(self) -> Result<RawRecord> {
        let kind = self
            .odata_type
            .ok_or_else(|| Error::missing_field("@odata.type"))?;
        let id = self.id.ok_or_else(|| Error::missing_field("id"))?;
        let sent = self
            .sent_date_time
            .ok_or_else(|| Error::missing_field("sentDateTime"))?;
        let content = self
            .unique_body
            .and_then(|body| body.content)
            .ok_or_else(|| Error::missing_field("uniqueBody.content"))?;
        Ok(RawRecord {
            kind,
            id,
            sent,
            content,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MessageFetcher {
    client: reqwest::Client,
}

impl MessageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a lazy walk over every record reachable from `url`.
    ///
    /// Nothing is requested until the first call to
    /// [`RecordCursor::next_record`].
    pub fn fetch(&self, url: impl Into<String>, token: AccessToken) -> RecordCursor {
        RecordCursor {
            client: self.client.clone(),
            token,
            next_url: Some(url.into()),
            buffered: Vec::new().into_iter(),
            pages_fetched: 0,
        }
    }
}

/// Pull-based cursor over a paged result set.
#[derive(Debug)]
pub struct RecordCursor {
    client: reqwest::Client,
    token: AccessToken,
    next_url: Option<String>,
    buffered: std::vec::IntoIter<WireMessage>,
    pages_fetched: usize,
}

impl RecordCursor {
    /// Next record in server order, fetching the following page when needed.
    /// Returns `Ok(None)` once a page without a continuation link is drained.
    pub async fn next_record(&mut self) -> Result<Option<RawRecord>> {
        loop {
            if let Some(wire) = self.buffered.next() {
                return wire.into_record().map(Some);
            }
            let Some(url) = self.next_url.take() else {
                return Ok(None);
            };
            let page = get_page(&self.client, &url, &self.token).await?;
            self.pages_fetched += 1;

            let records = page
                .value
                .ok_or_else(|| Error::Parse("response is missing the `value` array".into()))?;
            debug!(
                page = self.pages_fetched,
                records = records.len(),
                has_next = page.next_link.is_some(),
                "Fetched message page"
            );
            self.next_url = page.next_link;
            self.buffered = records.into_iter();
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<RawRecord>> {
        futures::stream::try_unfold(self, |mut cursor| async move {
            let next = cursor.next_record().await?;
            Ok::<_, Error>(next.map(|record| (record, cursor)))
        })
    }
}

async fn get_page(client: &reqwest::Client, url: &str, token: &AccessToken) -> Result<Page> {
    let resp = client
        .get(url)
        .bearer_auth(token.secret())
        .header(ACCEPT, "application/json")
        .header("Prefer", PREFER_TEXT_BODY)
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let reason = server_reason(&resp);
        let body = resp.text().await.unwrap_or_default();
        return Err(http_error(status, reason, &body));
    }

    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::Parse(format!("invalid page JSON: {e}")))
}

/// Reason phrase from the status line. hyper only keeps it when it differs
/// from the canonical phrase for the status.
fn server_reason(resp: &reqwest::Response) -> Option<String> {
    resp.extensions()
        .get::<ReasonPhrase>()
        .and_then(|phrase| std::str::from_utf8(phrase.as_bytes()).ok())
        .map(str::to_string)
}

fn http_error(status: StatusCode, server_reason: Option<String>, body: &str) -> Error {
    let mut reason = server_reason
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());
    if let Ok(graph) = serde_json::from_str::<GraphErrorBody>(body) {
        warn!(
            status = status.as_u16(),
            code = graph.error.code.as_deref().unwrap_or(""),
            message = graph.error.message.as_deref().unwrap_or(""),
            "Mail API rejected page request"
        );
        if let Some(code) = graph.error.code {
            reason = format!("{reason} ({code})");
        }
    }
    Error::Http {
        status: status.as_u16(),
        reason,
    }
}
