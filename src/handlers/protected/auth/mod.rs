pub mod whoami;

pub use whoami::whoami_get as session_whoami;
