mod caller;
mod credentials;

pub use caller::Caller;
pub use credentials::Credentials;
