pub mod credentials;

pub use credentials::credentials_post as admin_credentials;
