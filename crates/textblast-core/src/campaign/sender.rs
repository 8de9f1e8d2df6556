//! Bulk sender - drives the batched/sequential send loop

use crate::resolver::MessageIntent;
use crate::transport::MessageTransport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use textblast_common::config::SendingConfig;
use textblast_common::types::{CampaignId, ContactId, MessageId};
use textblast_storage::models::CreateMessage;
use textblast_storage::{MessageRepository, StoreError};
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{debug, error};

/// Progress callback: (processed so far, total)
pub type ProgressFn = dyn Fn(usize, usize) + Send + Sync;

/// Cooperative stop signal for an in-flight send
///
/// An abort takes effect after the current batch or attempt; numbers already
/// counted are preserved in the partial report.
#[derive(Clone, Default)]
pub struct AbortHandle {
    inner: Arc<AbortInner>,
}

#[derive(Default)]
struct AbortInner {
    flag: AtomicBool,
    notify: Notify,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop
    pub fn abort(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolves once an abort has been requested
    pub async fn cancelled(&self) {
        let mut notified = std::pin::pin!(self.inner.notify.notified());
        // register before checking the flag so an abort between the check
        // and the await cannot be missed
        notified.as_mut().enable();
        if self.is_aborted() {
            return;
        }
        notified.await;
    }
}

/// How a send run dispatches its recipients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// One recipient at a time with a pause between attempts, for
    /// transports that need exclusive foreground interaction
    Sequential,
    /// Fixed-size batches; attempts within a batch run concurrently
    Batched,
}

/// Batching and pacing policy for a send run
#[derive(Debug, Clone)]
pub struct BatchPolicy {
    pub mode: DispatchMode,
    /// Recipients per batch in batched mode
    pub batch_size: usize,
    /// Pause between batches
    pub batch_delay: Duration,
    /// Pause between attempts in sequential mode
    pub message_delay: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            mode: DispatchMode::Batched,
            batch_size: 10,
            batch_delay: Duration::from_secs(2),
            message_delay: Duration::from_secs(1),
        }
    }
}

impl BatchPolicy {
    /// Build a policy from configuration
    pub fn from_config(config: &SendingConfig) -> Self {
        let mode = if config.mode == "sequential" {
            DispatchMode::Sequential
        } else {
            DispatchMode::Batched
        };
        Self {
            mode,
            batch_size: config.batch_size.max(1),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            message_delay: Duration::from_millis(config.message_delay_ms),
        }
    }
}

/// One failed recipient in a send report
#[derive(Debug, Clone)]
pub struct SendFailure {
    pub contact_id: ContactId,
    pub phone: String,
    pub reason: String,
}

/// Final result of a send run
#[derive(Debug, Default)]
pub struct SendReport {
    pub total_sent: usize,
    pub total_failed: usize,
    /// Attempts actually made; equals the recipient count unless aborted
    pub total_messages: usize,
    /// Whether the run stopped early on an abort request
    pub aborted: bool,
    /// One entry per failed recipient, so the caller can retry that subset
    pub failures: Vec<SendFailure>,
}

impl SendReport {
    fn tally(&mut self, outcome: AttemptOutcome) {
        self.total_messages += 1;
        match outcome {
            AttemptOutcome::Sent => self.total_sent += 1,
            AttemptOutcome::Failed { intent, reason } => {
                self.total_failed += 1;
                self.failures.push(SendFailure {
                    contact_id: intent.contact_id,
                    phone: intent.phone,
                    reason,
                });
            }
        }
    }

    fn processed(&self) -> usize {
        self.total_sent + self.total_failed
    }
}

/// Send errors
///
/// Individual transport failures are counted in the report, never raised
/// here; these are the fail-fast conditions checked before any attempt.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("no recipients to send to")]
    NoRecipients,

    #[error("transport unavailable")]
    TransportUnavailable,

    #[error(transparent)]
    Store(#[from] StoreError),
}

enum AttemptOutcome {
    Sent,
    Failed { intent: MessageIntent, reason: String },
}

/// Drives the batch/sequential send loop over resolved recipients
pub struct BulkSender {
    transport: Arc<dyn MessageTransport>,
    messages: MessageRepository,
}

impl BulkSender {
    pub fn new(transport: Arc<dyn MessageTransport>, messages: MessageRepository) -> Self {
        Self {
            transport,
            messages,
        }
    }

    /// Check the fail-fast conditions without side effects
    pub fn preflight(&self, intents: &[MessageIntent]) -> Result<(), SendError> {
        if intents.is_empty() {
            return Err(SendError::NoRecipients);
        }
        if !self.transport.is_available() {
            return Err(SendError::TransportUnavailable);
        }
        Ok(())
    }

    /// Send every intent, reporting progress and aggregating failures
    ///
    /// Recipients are processed in the order given, one attempt each; no
    /// retry happens within a single run. Completion is reported exactly
    /// once, after the last batch or attempt.
    pub async fn send(
        &self,
        campaign_id: Option<CampaignId>,
        intents: Vec<MessageIntent>,
        policy: &BatchPolicy,
        progress: &ProgressFn,
        abort: &AbortHandle,
    ) -> Result<SendReport, SendError> {
        self.preflight(&intents)?;

        match policy.mode {
            DispatchMode::Sequential => {
                self.send_sequential(campaign_id, intents, policy, progress, abort)
                    .await
            }
            DispatchMode::Batched => {
                self.send_batched(campaign_id, intents, policy, progress, abort)
                    .await
            }
        }
    }

    /// Batched dispatch: attempts within a batch run concurrently, the batch
    /// is scored once every attempt resolved, then one progress callback
    /// fires and the inter-batch delay passes before the next batch
    async fn send_batched(
        &self,
        campaign_id: Option<CampaignId>,
        intents: Vec<MessageIntent>,
        policy: &BatchPolicy,
        progress: &ProgressFn,
        abort: &AbortHandle,
    ) -> Result<SendReport, SendError> {
        let total = intents.len();
        let batch_size = policy.batch_size.max(1);
        let mut report = SendReport::default();
        let mut iter = intents.into_iter();

        loop {
            let batch: Vec<MessageIntent> = iter.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }

            debug!("dispatching batch of {} recipients", batch.len());

            let mut handles = Vec::with_capacity(batch.len());
            for intent in batch {
                let message = self
                    .messages
                    .create(CreateMessage::outgoing(
                        intent.contact_id,
                        campaign_id,
                        intent.body.clone(),
                    ))
                    .await?;

                let transport = Arc::clone(&self.transport);
                let messages = self.messages.clone();
                handles.push(tokio::spawn(async move {
                    attempt(transport, messages, message.id, intent).await
                }));
            }

            for handle in handles {
                match handle.await {
                    Ok(outcome) => report.tally(outcome),
                    Err(e) => {
                        // a panicked attempt still counts against the batch
                        error!("send task failed: {}", e);
                        report.total_messages += 1;
                        report.total_failed += 1;
                    }
                }
            }

            progress(report.processed(), total);

            if abort.is_aborted() {
                report.aborted = true;
                break;
            }

            if iter.len() > 0 {
                tokio::select! {
                    _ = tokio::time::sleep(policy.batch_delay) => {}
                    _ = abort.cancelled() => {}
                }
                if abort.is_aborted() {
                    report.aborted = true;
                    break;
                }
            }
        }

        Ok(report)
    }

    /// Sequential dispatch: one attempt at a time with a fixed pause between
    /// attempts, one progress callback per recipient
    async fn send_sequential(
        &self,
        campaign_id: Option<CampaignId>,
        intents: Vec<MessageIntent>,
        policy: &BatchPolicy,
        progress: &ProgressFn,
        abort: &AbortHandle,
    ) -> Result<SendReport, SendError> {
        let total = intents.len();
        let mut report = SendReport::default();

        for (index, intent) in intents.into_iter().enumerate() {
            let message = self
                .messages
                .create(CreateMessage::outgoing(
                    intent.contact_id,
                    campaign_id,
                    intent.body.clone(),
                ))
                .await?;

            let outcome = attempt(
                Arc::clone(&self.transport),
                self.messages.clone(),
                message.id,
                intent,
            )
            .await;
            report.tally(outcome);
            progress(report.processed(), total);

            if abort.is_aborted() {
                report.aborted = true;
                break;
            }

            if index + 1 < total {
                tokio::select! {
                    _ = tokio::time::sleep(policy.message_delay) => {}
                    _ = abort.cancelled() => {}
                }
                if abort.is_aborted() {
                    report.aborted = true;
                    break;
                }
            }
        }

        Ok(report)
    }
}

/// One delivery attempt: invoke the transport and record the outcome on the
/// message row
async fn attempt(
    transport: Arc<dyn MessageTransport>,
    messages: MessageRepository,
    message_id: MessageId,
    intent: MessageIntent,
) -> AttemptOutcome {
    match transport.send(&intent.phone, &intent.body).await {
        Ok(()) => {
            if let Err(e) = messages.mark_sent(message_id).await {
                error!("failed to mark message {} as sent: {}", message_id, e);
            }
            AttemptOutcome::Sent
        }
        Err(e) => {
            let reason = e.to_string();
            if let Err(err) = messages.mark_failed(message_id, &reason).await {
                error!("failed to mark message {} as failed: {}", message_id, err);
            }
            AttemptOutcome::Failed { intent, reason }
        }
    }
}
