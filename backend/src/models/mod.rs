//! Domain models.

pub mod role;
pub mod session;
pub mod ticket;
pub mod user;

pub use role::Role;
pub use session::Session;
pub use ticket::{Note, NoteAuthor, Ticket, TicketStatus};
pub use user::{User, UserResponse};
