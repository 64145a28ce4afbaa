use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Api, Binary, StdResult, Uint128, Uint256};

use crate::cell::{CellBuilder, CellError, CellSlice};
use crate::error::ContractError;

/// Operation codes carried in the first 32 bits of a message body.
pub mod opcodes {
    pub const SEND: u32 = 1;
    pub const CHANGE_OWNER: u32 = 2;
    pub const CHANGE_SEND_EXCESSES_TO_SENDER: u32 = 3;
    pub const RESET_COUNTER: u32 = 4;

    /// Admin operations, open to the owner only.
    pub fn requires_owner(op: u32) -> bool {
        matches!(
            op,
            CHANGE_OWNER | CHANGE_SEND_EXCESSES_TO_SENDER | RESET_COUNTER
        )
    }
}

/// Upper bound on recipients per batch, one outbound slot stays free for the refund.
pub const MAX_BATCH_SIZE: usize = 254;

const OPCODE_BITS: u32 = 32;
const QUERY_ID_BITS: u32 = 64;
const DICT_KEY_BITS: u32 = 64;

#[cw_serde]
pub struct InstantiateMsg {
    /// Initial state record, `id:256 ∥ counter:256 ∥ owner:address ∥ send_excesses_to_sender:8`
    pub data: Binary,
    pub denom: String,
    /// Defaults to `DEFAULT_FORWARD_RESERVE` when unset
    pub forward_reserve: Option<Uint128>,
}

/// Every execution carries a raw body starting with a 32 bit opcode.
/// An empty body is accepted as a no-op.
#[cw_serde]
pub struct ExecuteMsg {
    pub body: Binary,
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Number of completed batch sends
    #[returns(CounterResponse)]
    Counter {},
    #[returns(IdResponse)]
    Id {},
    #[returns(OwnerResponse)]
    Owner {},
    #[returns(SendExcessesToSenderResponse)]
    SendExcessesToSender {},
    /// Denom and per-recipient reserve fixed at instantiation
    #[returns(ConfigResponse)]
    Config {},
}

#[cw_serde]
pub struct CounterResponse {
    pub counter: Uint256,
}

#[cw_serde]
pub struct IdResponse {
    pub id: Uint256,
}

#[cw_serde]
pub struct OwnerResponse {
    pub owner: Addr,
}

#[cw_serde]
pub struct SendExcessesToSenderResponse {
    pub value: u8,
}

#[cw_serde]
pub struct ConfigResponse {
    pub denom: String,
    pub forward_reserve: Uint128,
}

/// One dictionary value of a batch: `amount:coins ∥ destination:address`.
#[cw_serde]
pub struct Transfer {
    pub amount: Uint128,
    pub destination: Addr,
}

/// Transfers of a single batch, in key order. Keys are implicit: entry `i`
/// is encoded under key `i + 1`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransferRequest(pub Vec<Transfer>);

impl TransferRequest {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transfer> {
        self.0.iter()
    }

    /// Each entry is introduced by a `1` bit and the dictionary ends with `0`.
    pub fn store(&self, builder: &mut CellBuilder, api: &dyn Api) -> StdResult<()> {
        for (index, transfer) in self.0.iter().enumerate() {
            let destination = api.addr_canonicalize(transfer.destination.as_str())?;
            builder
                .store_bit(true)
                .store_uint(index as u64 + 1, DICT_KEY_BITS)?
                .store_coins(transfer.amount)?
                .store_address(&destination)?;
        }
        builder.store_bit(false);
        Ok(())
    }

    pub fn load(slice: &mut CellSlice, api: &dyn Api) -> Result<Self, ContractError> {
        let malformed = |reason: String| ContractError::MalformedBatch { reason };

        let mut transfers = vec![];
        while slice.load_bit().map_err(|e| malformed(e.to_string()))? {
            if transfers.len() == MAX_BATCH_SIZE {
                return Err(malformed(format!("more than {} transfers", MAX_BATCH_SIZE)));
            }
            let key = slice
                .load_uint(DICT_KEY_BITS)
                .map_err(|e| malformed(e.to_string()))?;
            let expected = transfers.len() as u64 + 1;
            if key != expected {
                return Err(malformed(format!("expected key {}, found {}", expected, key)));
            }
            let amount = slice
                .load_coins()
                .map_err(|e| malformed(format!("transfer {}: amount: {}", key, e)))?;
            let destination = slice.load_address().map_err(|e| {
                malformed(format!("transfer {}: destination: {}", key, e))
            })?;
            let destination = api.addr_humanize(&destination).map_err(|e| {
                malformed(format!("transfer {}: destination: {}", key, e))
            })?;
            transfers.push(Transfer {
                amount,
                destination,
            });
        }

        if transfers.is_empty() {
            return Err(malformed("no transfers".to_string()));
        }
        Ok(TransferRequest(transfers))
    }
}

/// Decoded message body. The set of operations is closed; any other opcode
/// is rejected by `decode`.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    Send {
        query_id: u64,
        /// value the sender intends to distribute, must not exceed the attached funds
        declared_value: Uint128,
        transfers: TransferRequest,
    },
    ChangeOwner {
        query_id: u64,
        new_owner: Addr,
    },
    ChangeSendExcessesToSender {
        query_id: u64,
        new_value: u8,
    },
    ResetCounter {
        query_id: u64,
        /// informational, the counter is always reset to zero
        new_value: u8,
    },
}

impl Operation {
    pub fn opcode(&self) -> u32 {
        match self {
            Operation::Send { .. } => opcodes::SEND,
            Operation::ChangeOwner { .. } => opcodes::CHANGE_OWNER,
            Operation::ChangeSendExcessesToSender { .. } => {
                opcodes::CHANGE_SEND_EXCESSES_TO_SENDER
            }
            Operation::ResetCounter { .. } => opcodes::RESET_COUNTER,
        }
    }

    pub fn query_id(&self) -> u64 {
        match self {
            Operation::Send { query_id, .. }
            | Operation::ChangeOwner { query_id, .. }
            | Operation::ChangeSendExcessesToSender { query_id, .. }
            | Operation::ResetCounter { query_id, .. } => *query_id,
        }
    }

    /// Reads only the 32 bit opcode. `None` for an empty body.
    pub fn peek_opcode(body: &[u8]) -> Result<Option<u32>, ContractError> {
        if body.is_empty() {
            return Ok(None);
        }
        let op = CellSlice::new(body)
            .load_uint(OPCODE_BITS)
            .map_err(malformed_message)?;
        Ok(Some(op as u32))
    }

    pub fn encode(&self, api: &dyn Api) -> StdResult<Binary> {
        let mut builder = CellBuilder::new();
        builder
            .store_uint(self.opcode() as u64, OPCODE_BITS)?
            .store_uint(self.query_id(), QUERY_ID_BITS)?;

        match self {
            Operation::Send {
                declared_value,
                transfers,
                ..
            } => {
                builder.store_coins(*declared_value)?;
                transfers.store(&mut builder, api)?;
            }
            Operation::ChangeOwner { new_owner, .. } => {
                let new_owner = api.addr_canonicalize(new_owner.as_str())?;
                builder.store_address(&new_owner)?;
            }
            Operation::ChangeSendExcessesToSender { new_value, .. }
            | Operation::ResetCounter { new_value, .. } => {
                builder.store_uint(*new_value as u64, 8)?;
            }
        }

        Ok(builder.build())
    }

    /// Returns `None` for an empty body.
    pub fn decode(body: &[u8], api: &dyn Api) -> Result<Option<Self>, ContractError> {
        if body.is_empty() {
            return Ok(None);
        }

        let mut slice = CellSlice::new(body);
        let op = slice.load_uint(OPCODE_BITS).map_err(malformed_message)? as u32;
        let operation = match op {
            opcodes::SEND => {
                let malformed = |e: CellError| ContractError::MalformedBatch {
                    reason: e.to_string(),
                };
                let query_id = slice.load_uint(QUERY_ID_BITS).map_err(malformed)?;
                let declared_value = slice.load_coins().map_err(malformed)?;
                let transfers = TransferRequest::load(&mut slice, api)?;
                slice.end_parse().map_err(malformed)?;
                Operation::Send {
                    query_id,
                    declared_value,
                    transfers,
                }
            }
            opcodes::CHANGE_OWNER => {
                let query_id = slice.load_uint(QUERY_ID_BITS).map_err(malformed_message)?;
                let new_owner = slice.load_address().map_err(malformed_message)?;
                slice.end_parse().map_err(malformed_message)?;
                let new_owner = api.addr_humanize(&new_owner).map_err(|e| {
                    ContractError::MalformedMessage {
                        reason: format!("new owner: {}", e),
                    }
                })?;
                Operation::ChangeOwner {
                    query_id,
                    new_owner,
                }
            }
            opcodes::CHANGE_SEND_EXCESSES_TO_SENDER | opcodes::RESET_COUNTER => {
                let query_id = slice.load_uint(QUERY_ID_BITS).map_err(malformed_message)?;
                let new_value = slice.load_uint(8).map_err(malformed_message)? as u8;
                slice.end_parse().map_err(malformed_message)?;
                if op == opcodes::RESET_COUNTER {
                    Operation::ResetCounter {
                        query_id,
                        new_value,
                    }
                } else {
                    Operation::ChangeSendExcessesToSender {
                        query_id,
                        new_value,
                    }
                }
            }
            op => return Err(ContractError::UnknownOperation { op }),
        };

        Ok(Some(operation))
    }
}

fn malformed_message(err: CellError) -> ContractError {
    ContractError::MalformedMessage {
        reason: err.to_string(),
    }
}
