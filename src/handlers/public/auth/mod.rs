pub mod login;

pub use login::login_post as session_login;
