//! Gateway wire protocol
//!
//! The envelope format, operation codes and close codes spoken over the
//! WebSocket connection.

mod close_codes;
mod opcodes;
mod payload;

pub use close_codes::CloseCode;
pub use opcodes::OpCode;
pub use payload::{decompress, Payload, PayloadError};
