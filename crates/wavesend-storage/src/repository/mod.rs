//! Postgres repositories implementing the store traits

mod campaigns;
mod contact_lists;
mod contacts;
mod jobs;
mod messages;
mod settings;

pub use campaigns::CampaignRepository;
pub use contact_lists::ContactListRepository;
pub use contacts::ContactRepository;
pub use jobs::JobRepository;
pub use messages::MessageRepository;
pub use settings::SettingsRepository;
