pub mod identity;
mod newsletter;
mod subscription;
mod user;

pub use identity::Subscriber;
pub use newsletter::{NewNewsletter, Newsletter, NewsletterView};
pub use subscription::{Identity, NewSubscription, Subscription, SubscriptionStatus};
pub use user::{NewUser, User};
