mod newsletters;
mod subscriptions;
mod users;

pub use newsletters::NewsletterRepo;
pub use subscriptions::SubscriptionRepo;
pub use users::{UserCredentials, UsersRepo};
