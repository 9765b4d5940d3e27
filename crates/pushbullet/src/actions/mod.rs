//! Actions: listing, pushing, deleting and SMS

mod handler;

pub use handler::{ActionHandler, PushContent, UploadTicket, parse_count};
