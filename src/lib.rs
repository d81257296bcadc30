pub mod args;
pub mod debug;
pub mod error;
pub mod format;
pub mod kerberos;
pub mod ldap;
pub mod pipeline;
pub mod record;
pub mod resolver;
pub mod sink;

pub use error::{Error, Result};
pub use format::{encode, CrackFormat, EncodedOutput, JohnOrder};
pub use kerberos::{decode, EncryptionType, TicketAcquirer};
pub use pipeline::{roast, Report, RoastOptions};
pub use record::{CipherPayload, CrackRecord, Principal};
pub use resolver::{DirectoryResolver, NoResolver, PrincipalResolver};
pub use sink::Sink;
