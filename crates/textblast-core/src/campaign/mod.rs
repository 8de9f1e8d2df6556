//! Campaign lifecycle and bulk dispatch

mod manager;
mod sender;

pub use manager::{CampaignError, CampaignManager};
pub use sender::{
    AbortHandle, BatchPolicy, BulkSender, DispatchMode, ProgressFn, SendError, SendFailure,
    SendReport,
};
