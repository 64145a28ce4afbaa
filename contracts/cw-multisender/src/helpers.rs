use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use cosmwasm_std::{
    to_json_binary, Addr, Api, Binary, Coin, CosmosMsg, QuerierWrapper, StdResult, Uint128,
    Uint256, WasmMsg,
};

use crate::msg::{
    CounterResponse, ExecuteMsg, IdResponse, Operation, OwnerResponse, QueryMsg,
    SendExcessesToSenderResponse, Transfer, TransferRequest,
};

/// MultiSenderContract is a wrapper around Addr that provides a lot of helpers
/// for building message bodies and querying a deployed multisender.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub struct MultiSenderContract(pub Addr);

impl MultiSenderContract {
    pub fn addr(&self) -> Addr {
        self.0.clone()
    }

    fn call(&self, body: Binary, funds: Vec<Coin>) -> StdResult<CosmosMsg> {
        let msg = to_json_binary(&ExecuteMsg { body })?;
        Ok(WasmMsg::Execute {
            contract_addr: self.addr().into(),
            msg,
            funds,
        }
        .into())
    }

    /// Empty body, acknowledged without touching state.
    pub fn deploy(&self, funds: Vec<Coin>) -> StdResult<CosmosMsg> {
        self.call(Binary::default(), funds)
    }

    /// Distributes `value` over `transfers`. `funds` must cover the amounts
    /// plus one forward reserve per recipient; anything above that is excess.
    pub fn send(
        &self,
        api: &dyn Api,
        query_id: u64,
        value: Uint128,
        transfers: Vec<Transfer>,
        funds: Vec<Coin>,
    ) -> StdResult<CosmosMsg> {
        let body = Operation::Send {
            query_id,
            declared_value: value,
            transfers: TransferRequest(transfers),
        }
        .encode(api)?;
        self.call(body, funds)
    }

    pub fn change_owner(
        &self,
        api: &dyn Api,
        query_id: u64,
        new_owner: Addr,
    ) -> StdResult<CosmosMsg> {
        let body = Operation::ChangeOwner {
            query_id,
            new_owner,
        }
        .encode(api)?;
        self.call(body, vec![])
    }

    pub fn change_send_excesses_to_sender(
        &self,
        api: &dyn Api,
        query_id: u64,
        new_value: u8,
    ) -> StdResult<CosmosMsg> {
        let body = Operation::ChangeSendExcessesToSender {
            query_id,
            new_value,
        }
        .encode(api)?;
        self.call(body, vec![])
    }

    pub fn reset_counter(
        &self,
        api: &dyn Api,
        query_id: u64,
        new_value: u8,
    ) -> StdResult<CosmosMsg> {
        let body = Operation::ResetCounter {
            query_id,
            new_value,
        }
        .encode(api)?;
        self.call(body, vec![])
    }

    pub fn counter(&self, querier: &QuerierWrapper) -> StdResult<Uint256> {
        let res: CounterResponse = querier.query_wasm_smart(self.addr(), &QueryMsg::Counter {})?;
        Ok(res.counter)
    }

    pub fn id(&self, querier: &QuerierWrapper) -> StdResult<Uint256> {
        let res: IdResponse = querier.query_wasm_smart(self.addr(), &QueryMsg::Id {})?;
        Ok(res.id)
    }

    pub fn owner(&self, querier: &QuerierWrapper) -> StdResult<Addr> {
        let res: OwnerResponse = querier.query_wasm_smart(self.addr(), &QueryMsg::Owner {})?;
        Ok(res.owner)
    }

    pub fn send_excesses_to_sender(&self, querier: &QuerierWrapper) -> StdResult<u8> {
        let res: SendExcessesToSenderResponse =
            querier.query_wasm_smart(self.addr(), &QueryMsg::SendExcessesToSender {})?;
        Ok(res.value)
    }
}
