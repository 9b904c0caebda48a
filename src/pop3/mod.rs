//! POP3 retrieval server

pub mod commands;
pub mod mailbox;
pub mod response;
pub mod server;
pub mod session;

pub use commands::Pop3CommandHandler;
pub use mailbox::Mailbox;
pub use response::Pop3Response;
pub use server::Pop3Server;
pub use session::{Pop3Session, Pop3State};
