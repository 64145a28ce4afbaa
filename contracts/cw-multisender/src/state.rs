use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use cosmwasm_std::{Addr, Api, Binary, StdResult, Storage, Uint128, Uint256};
use cw_storage_plus::Item;

use crate::cell::{CellBuilder, CellSlice};
use crate::error::ContractError;

/// Raw key of the bit-encoded state record.
pub const DATA_KEY: &[u8] = b"data";

/// 0.05 of a coin with 9 decimals, kept by the contract for every recipient.
pub const DEFAULT_FORWARD_RESERVE: Uint128 = Uint128::new(50_000_000);

/// The durable record, stored as
/// `id:256 ∥ counter:256 ∥ owner:address ∥ send_excesses_to_sender:8`.
#[derive(Serialize, Deserialize, Clone, PartialEq, JsonSchema, Debug)]
pub struct ContractState {
    /// deployment salt, never changes once instantiated
    pub id: Uint256,
    /// number of completed batch sends
    pub counter: Uint256,
    pub owner: Addr,
    /// 1 if leftover value of a batch goes back to its sender, 0 to keep it
    pub send_excesses_to_sender: u8,
}

impl ContractState {
    pub fn refunds_excess(&self) -> bool {
        self.send_excesses_to_sender == 1
    }

    /// Encodes the record in its fixed layout. Deployment tooling uses this to
    /// produce the `data` of `InstantiateMsg`.
    pub fn to_cell(&self, api: &dyn Api) -> StdResult<Binary> {
        let owner = api.addr_canonicalize(self.owner.as_str())?;
        let mut builder = CellBuilder::new();
        builder
            .store_uint256(self.id)
            .store_uint256(self.counter)
            .store_address(&owner)?
            .store_uint(self.send_excesses_to_sender as u64, 8)?;
        Ok(builder.build())
    }

    pub fn from_cell(data: &[u8], api: &dyn Api) -> Result<Self, ContractError> {
        let corrupt = |reason: String| ContractError::CorruptState { reason };

        let mut slice = CellSlice::new(data);
        let id = slice.load_uint256().map_err(|e| corrupt(e.to_string()))?;
        let counter = slice.load_uint256().map_err(|e| corrupt(e.to_string()))?;
        let owner = slice.load_address().map_err(|e| corrupt(e.to_string()))?;
        let flag = slice.load_uint(8).map_err(|e| corrupt(e.to_string()))? as u8;
        slice.end_parse().map_err(|e| corrupt(e.to_string()))?;

        if flag > 1 {
            return Err(corrupt(format!("excess policy flag {}", flag)));
        }
        let owner = api
            .addr_humanize(&owner)
            .map_err(|e| corrupt(format!("owner: {}", e)))?;

        Ok(ContractState {
            id,
            counter,
            owner,
            send_excesses_to_sender: flag,
        })
    }

    pub fn load(storage: &dyn Storage, api: &dyn Api) -> Result<Self, ContractError> {
        let data = storage
            .get(DATA_KEY)
            .ok_or_else(|| ContractError::CorruptState {
                reason: "state record not found".to_string(),
            })?;
        Self::from_cell(&data, api)
    }

    /// Replaces the whole persisted record.
    pub fn save(&self, storage: &mut dyn Storage, api: &dyn Api) -> StdResult<()> {
        let data = self.to_cell(api)?;
        storage.set(DATA_KEY, data.as_slice());
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, JsonSchema, Debug)]
pub struct Config {
    /// native denom accepted as the value of a batch
    pub denom: String,
    /// retained by the contract for every forwarded transfer
    pub forward_reserve: Uint128,
}

pub const CONFIG: Item<Config> = Item::new("config");
