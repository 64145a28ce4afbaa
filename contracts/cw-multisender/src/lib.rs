/*!
Batch distribution of a native coin.

A single `execute` carries a bit-encoded body: an opcode, a query id and the
operation payload. Opcode 1 forwards exact amounts to up to 254 recipients,
keeping a fixed reserve per recipient and optionally refunding whatever the
sender attached on top. Opcodes 2-4 are owner-only and change the owner, the
refund policy, or reset the batch counter.
*/

pub mod batch;
pub mod cell;
pub mod contract;
mod error;
pub mod helpers;
pub mod msg;
#[cfg(test)]
mod multitest;
pub mod state;

pub use crate::error::ContractError;
