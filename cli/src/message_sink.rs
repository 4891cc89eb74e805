//! Where sent messages go: one JSON object per line.

use std::fs::File;
use std::fs::OpenOptions;
use std::io::LineWriter;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use composer_protocol::MessageContent;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct SentMessage {
    conversation_id: Option<String>,
    content: MessageContent,
}

enum SinkTarget {
    /// Appended to as messages are sent.
    File(LineWriter<File>),
    /// Held until the terminal is restored, then written to stdout.
    Deferred(Vec<String>),
}

pub struct MessageSink {
    target: SinkTarget,
    recorded: usize,
}

impl MessageSink {
    pub fn open(output: Option<&Path>) -> anyhow::Result<Self> {
        let target = match output {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("open {}", path.display()))?;
                SinkTarget::File(LineWriter::new(file))
            }
            None => SinkTarget::Deferred(Vec::new()),
        };
        Ok(Self {
            target,
            recorded: 0,
        })
    }

    pub fn record(
        &mut self,
        content: MessageContent,
        conversation_id: Option<String>,
    ) -> anyhow::Result<()> {
        let line = serde_json::to_string(&SentMessage {
            conversation_id,
            content,
        })
        .context("serialize sent message")?;
        match &mut self.target {
            SinkTarget::File(writer) => {
                writeln!(writer, "{line}").context("write sent message")?;
            }
            SinkTarget::Deferred(lines) => lines.push(line),
        }
        self.recorded += 1;
        Ok(())
    }

    pub fn recorded(&self) -> usize {
        self.recorded
    }

    /// Flush the file, or write the deferred lines to `out`.
    pub fn finish(self, out: &mut impl Write) -> anyhow::Result<()> {
        match self.target {
            SinkTarget::File(mut writer) => writer.flush().context("flush sent messages")?,
            SinkTarget::Deferred(lines) => {
                for line in lines {
                    writeln!(out, "{line}").context("write sent message")?;
                }
                out.flush().context("flush stdout")?;
            }
        }
        Ok(())
    }

    /// Finish the sink, then hand back `session`.
    ///
    /// Messages recorded before a failed session are still written out; a session error
    /// takes precedence over a write error.
    pub fn finish_after<T>(
        self,
        session: anyhow::Result<T>,
        out: &mut impl Write,
    ) -> anyhow::Result<T> {
        let finished = self.finish(out);
        let value = session?;
        finished?;
        Ok(value)
    }
}
