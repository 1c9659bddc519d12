//! # Command sources.
//!
//! A [`CommandSource`] yields raw command lines to the agent. The crate ships
//! two implementations:
//! - [`LineSource`]: newline-delimited lines from any async reader (stdin by default);
//! - [`ScriptSource`]: a fixed, in-memory list of commands.
//!
//! Blank lines are skipped by the agent, not by the source.

use std::collections::VecDeque;
use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

/// Supplier of raw command lines.
///
/// `next_command` must be cancel-safe: the agent races it against the
/// shutdown hook and may drop the future before it resolves.
#[async_trait]
pub trait CommandSource: Send {
    /// Next command line, or `Ok(None)` once the source is exhausted.
    async fn next_command(&mut self) -> io::Result<Option<String>>;
}

/// Newline-delimited commands from an async reader.
pub struct LineSource<R> {
    lines: Lines<R>,
}

impl<R> LineSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    /// Reads commands from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl LineSource<BufReader<Stdin>> {
    /// Reads commands from the process's standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R> CommandSource for LineSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_command(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }
}

/// A fixed list of commands, yielded in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptSource {
    commands: VecDeque<String>,
}

impl ScriptSource {
    /// Creates a source from anything yielding command strings.
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl CommandSource for ScriptSource {
    async fn next_command(&mut self) -> io::Result<Option<String>> {
        Ok(self.commands.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn line_source_yields_each_line_then_none() {
        let input: &[u8] = b"add:a\nlist\n";
        let mut src = LineSource::new(input);
        assert_eq!(src.next_command().await.unwrap().as_deref(), Some("add:a"));
        assert_eq!(src.next_command().await.unwrap().as_deref(), Some("list"));
        assert_eq!(src.next_command().await.unwrap(), None);
    }

    #[tokio::test]
    async fn script_source_preserves_order() {
        let mut src = ScriptSource::new(["list", "stopall"]);
        assert_eq!(src.next_command().await.unwrap().as_deref(), Some("list"));
        assert_eq!(src.next_command().await.unwrap().as_deref(), Some("stopall"));
        assert_eq!(src.next_command().await.unwrap(), None);
    }
}
