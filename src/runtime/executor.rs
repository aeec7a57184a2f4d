//! Turn orchestrator

use super::traits::FragmentSink;
use crate::error::TurnError;
use crate::intervention::{InterventionDetector, InterventionNotifier, InterventionSignal};
use crate::llm::{ChatRequest, ChatTransport, LlmError};
use crate::session::{Applied, ConversationSession};
use crate::stream::{framed_lines, EventDecoder};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// A committed turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub turn_index: usize,
    pub assistant_content: String,
    pub intervention: InterventionSignal,
}

/// Drives request/response turns against one session
pub struct TurnOrchestrator<T, K>
where
    T: ChatTransport,
    K: FragmentSink,
{
    session: ConversationSession,
    transport: T,
    sink: K,
    decoder: EventDecoder,
    detector: InterventionDetector,
    notifier: Option<Arc<dyn InterventionNotifier>>,
    /// Cancels the turn in flight; replaced once it has fired
    cancel_token: CancellationToken,
}

impl<T, K> TurnOrchestrator<T, K>
where
    T: ChatTransport,
    K: FragmentSink,
{
    pub fn new(
        session: ConversationSession,
        transport: T,
        sink: K,
        detector: InterventionDetector,
    ) -> Self {
        Self {
            session,
            transport,
            sink,
            decoder: EventDecoder::default(),
            detector,
            notifier: None,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn InterventionNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// Handle that aborts the next turn, or the one currently in flight
    pub fn cancel_token(&mut self) -> CancellationToken {
        self.rearm_cancel();
        self.cancel_token.clone()
    }

    /// Handle one line of user input.
    ///
    /// Blank input means "no new turn" and returns `Ok(None)` without
    /// touching history. A triggered signal is handed to the notifier; a
    /// notifier failure is logged and does not fail the turn.
    pub async fn submit(&mut self, input: &str) -> Result<Option<TurnOutcome>, TurnError> {
        if input.trim().is_empty() {
            return Ok(None);
        }

        let outcome = self.converse(input).await?;
        if outcome.intervention.triggered {
            if let Some(notifier) = &self.notifier {
                if let Err(e) = notifier.notify(&outcome.intervention).await {
                    tracing::error!(
                        turn_index = outcome.turn_index,
                        error = %e,
                        "Intervention notification failed"
                    );
                }
            }
        }
        Ok(Some(outcome))
    }

    /// Start a turn, replay the history to the transport and pump the reply
    pub async fn converse(&mut self, user_content: &str) -> Result<TurnOutcome, TurnError> {
        self.rearm_cancel();
        let turn_index = self.session.start_turn(user_content)?;
        let span = tracing::info_span!("turn", turn_index);

        async {
            let request = ChatRequest::streaming(self.transport.model_id(), self.session.history());
            let cancel = self.cancel_token.clone();

            let opened = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(cancelled()),
                result = self.transport.open_stream(&request) => result.map_err(TurnError::from),
            };

            match opened {
                Ok(stream) => self.pump(stream).await,
                Err(e) => Err(self.fail(e)),
            }
        }
        .instrument(span)
        .await
    }

    /// Run one turn over an already-open byte source
    #[allow(dead_code)] // API completeness
    pub async fn run_turn<S, B>(
        &mut self,
        user_content: &str,
        byte_source: S,
    ) -> Result<TurnOutcome, TurnError>
    where
        S: Stream<Item = Result<B, LlmError>> + Unpin,
        B: AsRef<[u8]>,
    {
        self.rearm_cancel();
        let turn_index = self.session.start_turn(user_content)?;
        let span = tracing::info_span!("turn", turn_index);
        self.pump(byte_source).instrument(span).await
    }

    async fn pump<S, B>(&mut self, byte_source: S) -> Result<TurnOutcome, TurnError>
    where
        S: Stream<Item = Result<B, LlmError>> + Unpin,
        B: AsRef<[u8]>,
    {
        if let Err(e) = self.read_until_terminator(byte_source).await {
            return Err(self.fail(e));
        }

        let (turn_index, assistant_content) = self.session.commit()?;
        let intervention = self.detector.inspect(turn_index, &assistant_content);
        tracing::info!(
            chars = assistant_content.len(),
            triggered = intervention.triggered,
            "Turn committed"
        );

        Ok(TurnOutcome {
            turn_index,
            assistant_content,
            intervention,
        })
    }

    async fn read_until_terminator<S, B>(&mut self, byte_source: S) -> Result<(), TurnError>
    where
        S: Stream<Item = Result<B, LlmError>> + Unpin,
        B: AsRef<[u8]>,
    {
        let cancel = self.cancel_token.clone();
        let lines = framed_lines(byte_source);
        tokio::pin!(lines);

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled()),
                next = lines.next() => next,
            };

            let line = match next {
                Some(line) => line?,
                None => return Err(TurnError::StreamClosed),
            };
            let Some(event) = self.decoder.decode(&line) else {
                continue;
            };

            match self.session.apply_event(event)? {
                Applied::Fragment(text) => self.sink.display(&text),
                Applied::ReadyToCommit => return Ok(()),
                Applied::Ignored => {}
            }
        }
    }

    fn fail(&mut self, error: TurnError) -> TurnError {
        self.session.abort(error.kind(), error.to_string());
        error
    }

    /// A cancel that landed between turns must not abort the next one
    fn rearm_cancel(&mut self) {
        if self.cancel_token.is_cancelled() {
            self.cancel_token = CancellationToken::new();
        }
    }
}

fn cancelled() -> TurnError {
    TurnError::Transport(LlmError::network("cancelled"))
}
