//! TextBlast Core - Campaign dispatch and follow-up orchestration
//!
//! This crate provides the outreach engine: the bulk sender, campaign
//! lifecycle management, follow-up scheduling and execution, and
//! response-driven cancellation. Message transmission and persistence are
//! injected collaborators.

pub mod campaign;
pub mod followup;
pub mod resolver;
pub mod template;
pub mod transport;

#[cfg(test)]
pub(crate) mod testutil;

pub use campaign::{
    AbortHandle, BatchPolicy, BulkSender, CampaignError, CampaignManager, DispatchMode, SendError,
    SendFailure, SendReport,
};
pub use followup::{
    FireOutcome, FollowUpError, FollowUpExecutor, FollowUpScheduler, FollowUpWorker,
    ResponseMonitor, SweepReport,
};
pub use resolver::{MessageIntent, RecipientResolver, ResolveError, StoreRecipientResolver};
pub use template::TemplateRenderer;
pub use transport::{HttpGatewayTransport, MessageTransport, SimulatedTransport, TransportError};
