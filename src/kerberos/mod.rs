pub mod acquire;
pub mod ccache;
pub mod etype;
pub mod ticket;

#[cfg(test)]
pub(crate) mod testdata;

pub use acquire::{AcquireError, CachedTicketAcquirer, KvnoAcquirer, TicketAcquirer};
pub use etype::EncryptionType;
pub use ticket::{decode, decode_ticket_message, DecodeError, DecodedTicket};
