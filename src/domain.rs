mod email_address;
mod person_name;
mod slug;
mod verification_token;

pub use email_address::EmailAddress;
pub use person_name::PersonName;
pub use slug::Slug;
pub use verification_token::VerificationToken;
