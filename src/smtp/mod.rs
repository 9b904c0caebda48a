//! SMTP submission server

pub mod commands;
pub mod response;
pub mod server;
pub mod session;

pub use commands::SmtpCommandHandler;
pub use response::SmtpResponse;
pub use server::SmtpServer;
pub use session::{SmtpSession, SmtpState};
