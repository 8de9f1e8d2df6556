//! Repository layer for data access

pub mod campaigns;
pub mod contacts;
pub mod groups;
pub mod messages;
pub mod scheduled;
pub mod sequences;
pub mod templates;

// Re-export concrete repository implementations with simple names
pub use campaigns::MemCampaignRepository as CampaignRepository;
pub use contacts::MemContactRepository as ContactRepository;
pub use groups::MemGroupRepository as GroupRepository;
pub use messages::MemMessageRepository as MessageRepository;
pub use scheduled::MemScheduledFollowUpRepository as ScheduledFollowUpRepository;
pub use sequences::MemSequenceRepository as SequenceRepository;
pub use templates::MemTemplateRepository as TemplateRepository;
