//! Body clean-up and filtering.
//!
//! Steps run in a fixed order: type filter, prefix filters on the untouched
//! body, link stripping, mobile footer removal, then the empty check.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{NormalizedRecord, RawRecord};

pub const EVENT_MESSAGE_TYPE: &str = "#microsoft.graph.eventMessage";
pub const FORWARDED_MEETING_PREFIX: &str = "Your meeting was forwarded";
pub const ATTACHMENT_NOTICE_PREFIX: &str =
    "Your message is ready to be sent with the following file or link attachments";
pub const ANDROID_FOOTER: &str = "Get Outlook for Android\r\n";
pub const IOS_FOOTER: &str = "Get Outlook for iOS\r\n";

// `<https://...>` references left behind by the server's HTML to text conversion.
static EMBEDDED_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?:http|https)[^\s]+>").expect("embedded link pattern is valid")
});

/// Why a record never reaches the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    CalendarEvent,
    ForwardedMeeting,
    AttachmentNotice,
    Empty,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::CalendarEvent => "calendar_event",
            SkipReason::ForwardedMeeting => "forwarded_meeting",
            SkipReason::AttachmentNotice => "attachment_notice",
            SkipReason::Empty => "empty",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clean a record, or report which filter dropped it.
pub fn classify(raw: RawRecord) -> Result<NormalizedRecord, SkipReason> {
    if raw.kind == EVENT_MESSAGE_TYPE {
        return Err(SkipReason::CalendarEvent);
    }
    if raw.content.starts_with(FORWARDED_MEETING_PREFIX) {
        return Err(SkipReason::ForwardedMeeting);
    }
    if raw.content.starts_with(ATTACHMENT_NOTICE_PREFIX) {
        return Err(SkipReason::AttachmentNotice);
    }

    let mut content = EMBEDDED_LINK.replace_all(&raw.content, "").into_owned();
    strip_mobile_footer(&mut content);

    if content.is_empty() {
        return Err(SkipReason::Empty);
    }

    Ok(NormalizedRecord {
        id: raw.id,
        sent: raw.sent,
        content,
    })
}

pub fn normalize(raw: RawRecord) -> Option<NormalizedRecord> {
    classify(raw).ok()
}

/// Removes at most one known client footer from the end of `content`.
fn strip_mobile_footer(content: &mut String) {
    for footer in [ANDROID_FOOTER, IOS_FOOTER] {
        if content.ends_with(footer) {
            content.truncate(content.len() - footer.len());
            return;
        }
    }
}
