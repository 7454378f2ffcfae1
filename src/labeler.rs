//! Operator prompt: show one message, wait for one key.

use std::io;

use console::{Key, Term};

use crate::types::{LabeledRecord, NormalizedRecord};

/// Text output plus single-keypress input.
pub trait Console {
    fn write_str(&mut self, text: &str) -> io::Result<()>;

    /// Blocks until one key is pressed. `None` for keys that are not characters.
    fn read_key(&mut self) -> io::Result<Option<char>>;
}

/// The process terminal.
#[derive(Debug)]
pub struct TerminalConsole {
    term: Term,
}

impl TerminalConsole {
    pub fn stdout() -> Self {
        Self::new(Term::stdout())
    }

    pub fn new(term: Term) -> Self {
        Self { term }
    }

    /// Fails unless the terminal can deliver single keypresses. `Term::read_key`
    /// returns `Key::Unknown` at once on a pipe or file, which would otherwise
    /// read as a "no" answer.
    pub fn ensure_interactive(&self) -> io::Result<()> {
        if self.term.is_term() {
            return Ok(());
        }
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "labelling needs an interactive terminal on stdout",
        ))
    }
}

impl Console for TerminalConsole {
    fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.term.write_str(text)?;
        self.term.flush()
    }

    fn read_key(&mut self) -> io::Result<Option<char>> {
        self.ensure_interactive()?;
        Ok(match self.term.read_key()? {
            Key::Char(c) => Some(c),
            _ => None,
        })
    }
}

pub trait Labeler {
    /// Called once before the first record is presented.
    fn begin(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn label(&mut self, record: NormalizedRecord) -> io::Result<LabeledRecord>;
}

pub struct InteractiveLabeler<C> {
    console: C,
    question: String,
}

impl<C: Console> InteractiveLabeler<C> {
    pub fn new(console: C, question: impl Into<String>) -> Self {
        Self {
            console,
            question: question.into(),
        }
    }

    pub fn into_console(self) -> C {
        self.console
    }
}

impl<C: Console> Labeler for InteractiveLabeler<C> {
    fn begin(&mut self) -> io::Result<()> {
        self.console.write_str(&format!(
            "For each email message, please answer the question as Y/N:  {}\n\n",
            self.question
        ))
    }

    fn label(&mut self, record: NormalizedRecord) -> io::Result<LabeledRecord> {
        self.console.write_str("\n===>>> Start message.\n")?;
        self.console.write_str(&record.content)?;
        self.console.write_str(&format!(
            "\n\n===>>> End message. {} (Y/N)",
            self.question
        ))?;
        let key = self.console.read_key()?;
        self.console.write_str("\n")?;

        Ok(LabeledRecord {
            record,
            label: is_affirmative(key),
        })
    }
}

fn is_affirmative(key: Option<char>) -> bool {
    matches!(key, Some('y' | 'Y'))
}
