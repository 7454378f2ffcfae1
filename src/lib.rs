//! Fetch sent mail for a time window, clean up each body, ask an operator for
//! a yes/no label, and write the answers to CSV.
//!
//! ```rust,ignore
//! use sent_mail_labeler::{pipeline, DeviceCodeFlow, InteractiveLabeler, MessageFetcher, TerminalConsole, TimeWindow};
//!
//! let window = TimeWindow::parse("2018-01-01", "2018-03-31")?;
//! let url = window.sent_items_query(sent_mail_labeler::config::DEFAULT_GRAPH_BASE_URL);
//! let auth = DeviceCodeFlow::new(sent_mail_labeler::config::DEFAULT_AUTHORITY, "common", client_id);
//! let mut labeler = InteractiveLabeler::new(TerminalConsole::stdout(), "Is this about travel?");
//! let stats = pipeline::run(&auth, &MessageFetcher::new(), &url, &mut labeler, "labels.csv".as_ref()).await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod graph;
pub mod labeler;
pub mod manifest;
pub mod normalize;
pub mod pipeline;
pub mod sink;
pub mod types;

pub use auth::{DeviceCodeFlow, StaticToken, TokenProvider};
pub use config::TimeWindow;
pub use error::{Error, Result};
pub use graph::{MessageFetcher, RecordCursor};
pub use labeler::{Console, InteractiveLabeler, Labeler, TerminalConsole};
pub use normalize::{classify, normalize, SkipReason};
pub use pipeline::RunStats;
pub use sink::CsvSink;
pub use types::{AccessToken, LabeledRecord, NormalizedRecord, RawRecord};
