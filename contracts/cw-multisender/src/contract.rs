#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    coins, to_json_binary, Addr, BankMsg, Binary, Deps, DepsMut, Empty, Env, MessageInfo,
    Response, StdError, StdResult, Uint128, Uint256,
};
use cw2::{get_contract_version, set_contract_version};
use cw_utils::must_pay;
use semver::Version;

use crate::batch::settle;
use crate::error::ContractError;
use crate::msg::{
    opcodes, ConfigResponse, CounterResponse, ExecuteMsg, IdResponse, InstantiateMsg, Operation,
    OwnerResponse, QueryMsg, SendExcessesToSenderResponse, TransferRequest,
};
use crate::state::{Config, ContractState, CONFIG, DEFAULT_FORWARD_RESERVE};

// version info for migration info
const CONTRACT_NAME: &str = "crates.io:cw-multisender";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    if msg.denom.is_empty() {
        return Err(StdError::generic_err("denom must not be empty").into());
    }

    // the record is produced by deployment tooling, so it goes through the
    // same decoder as every later load
    let state = ContractState::from_cell(msg.data.as_slice(), deps.api)?;
    let config = Config {
        denom: msg.denom,
        forward_reserve: msg.forward_reserve.unwrap_or(DEFAULT_FORWARD_RESERVE),
    };

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    CONFIG.save(deps.storage, &config)?;
    state.save(deps.storage, deps.api)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("id", state.id)
        .add_attribute("owner", state.owner)
        .add_attribute("denom", config.denom)
        .add_attribute("forward_reserve", config.forward_reserve))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    let body = msg.body.as_slice();
    let op = match Operation::peek_opcode(body)? {
        Some(op) => op,
        // deploy acknowledgement
        None => return Ok(Response::new().add_attribute("action", "deploy")),
    };

    // owner gate runs on the opcode alone, before the payload is decoded
    let state = ContractState::load(deps.storage, deps.api)?;
    if opcodes::requires_owner(op) && info.sender != state.owner {
        return Err(ContractError::Unauthorized {});
    }

    let operation =
        Operation::decode(body, deps.api)?.ok_or_else(|| ContractError::MalformedMessage {
            reason: "empty body".to_string(),
        })?;

    match operation {
        Operation::Send {
            query_id,
            declared_value,
            transfers,
        } => execute_send(deps, info, state, query_id, declared_value, transfers),
        Operation::ChangeOwner {
            query_id,
            new_owner,
        } => execute_change_owner(deps, state, query_id, new_owner),
        Operation::ChangeSendExcessesToSender {
            query_id,
            new_value,
        } => execute_change_send_excesses_to_sender(deps, state, query_id, new_value),
        Operation::ResetCounter {
            query_id,
            new_value,
        } => execute_reset_counter(deps, state, query_id, new_value),
    }
}

pub fn execute_send(
    deps: DepsMut,
    info: MessageInfo,
    mut state: ContractState,
    query_id: u64,
    declared_value: Uint128,
    transfers: TransferRequest,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let value = must_pay(&info, &config.denom)?;

    // nothing is sent unless the whole batch is covered
    let settlement = settle(&transfers, value, declared_value, config.forward_reserve)?;

    // a zero amount still costs its reserve, but the bank refuses empty sends
    let forwards = transfers
        .iter()
        .filter(|transfer| !transfer.amount.is_zero())
        .map(|transfer| BankMsg::Send {
            to_address: transfer.destination.to_string(),
            amount: coins(transfer.amount.u128(), &config.denom),
        });
    let mut res = Response::new().add_messages(forwards);

    let refunded = !settlement.excess.is_zero() && state.refunds_excess();
    if refunded {
        res = res.add_message(BankMsg::Send {
            to_address: info.sender.to_string(),
            amount: coins(settlement.excess.u128(), &config.denom),
        });
    }

    state.counter = state.counter.checked_add(Uint256::one())?;
    state.save(deps.storage, deps.api)?;

    Ok(res
        .add_attribute("action", "send")
        .add_attribute("sender", info.sender)
        .add_attribute("query_id", query_id.to_string())
        .add_attribute("recipients", transfers.len().to_string())
        .add_attribute("total_amount", settlement.total_amount)
        .add_attribute("total_reserve", settlement.total_reserve)
        .add_attribute("excess", settlement.excess)
        .add_attribute("refunded", refunded.to_string())
        .add_attribute("counter", state.counter))
}

pub fn execute_change_owner(
    deps: DepsMut,
    mut state: ContractState,
    query_id: u64,
    new_owner: Addr,
) -> Result<Response, ContractError> {
    state.owner = new_owner;
    state.save(deps.storage, deps.api)?;

    Ok(Response::new()
        .add_attribute("action", "change_owner")
        .add_attribute("query_id", query_id.to_string())
        .add_attribute("owner", state.owner))
}

pub fn execute_change_send_excesses_to_sender(
    deps: DepsMut,
    mut state: ContractState,
    query_id: u64,
    new_value: u8,
) -> Result<Response, ContractError> {
    if new_value > 1 {
        return Err(ContractError::InvalidFlag { value: new_value });
    }
    state.send_excesses_to_sender = new_value;
    state.save(deps.storage, deps.api)?;

    Ok(Response::new()
        .add_attribute("action", "change_send_excesses_to_sender")
        .add_attribute("query_id", query_id.to_string())
        .add_attribute("value", new_value.to_string()))
}

/// Always resets to zero, `requested` is only echoed back.
pub fn execute_reset_counter(
    deps: DepsMut,
    mut state: ContractState,
    query_id: u64,
    requested: u8,
) -> Result<Response, ContractError> {
    state.counter = Uint256::zero();
    state.save(deps.storage, deps.api)?;

    Ok(Response::new()
        .add_attribute("action", "reset_counter")
        .add_attribute("query_id", query_id.to_string())
        .add_attribute("requested_value", requested.to_string())
        .add_attribute("counter", state.counter))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> Result<Binary, ContractError> {
    let res = match msg {
        QueryMsg::Counter {} => to_json_binary(&query_counter(deps)?),
        QueryMsg::Id {} => to_json_binary(&query_id(deps)?),
        QueryMsg::Owner {} => to_json_binary(&query_owner(deps)?),
        QueryMsg::SendExcessesToSender {} => {
            to_json_binary(&query_send_excesses_to_sender(deps)?)
        }
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
    };
    Ok(res?)
}

pub fn query_counter(deps: Deps) -> Result<CounterResponse, ContractError> {
    let state = ContractState::load(deps.storage, deps.api)?;
    Ok(CounterResponse {
        counter: state.counter,
    })
}

pub fn query_id(deps: Deps) -> Result<IdResponse, ContractError> {
    let state = ContractState::load(deps.storage, deps.api)?;
    Ok(IdResponse { id: state.id })
}

pub fn query_owner(deps: Deps) -> Result<OwnerResponse, ContractError> {
    let state = ContractState::load(deps.storage, deps.api)?;
    Ok(OwnerResponse { owner: state.owner })
}

pub fn query_send_excesses_to_sender(
    deps: Deps,
) -> Result<SendExcessesToSenderResponse, ContractError> {
    let state = ContractState::load(deps.storage, deps.api)?;
    Ok(SendExcessesToSenderResponse {
        value: state.send_excesses_to_sender,
    })
}

pub fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        denom: config.denom,
        forward_reserve: config.forward_reserve,
    })
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: Empty) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::CannotMigrate {
            previous_contract: stored.contract,
            previous_version: stored.version,
        });
    }

    let version: Version = CONTRACT_VERSION.parse()?;
    let storage_version: Version = stored.version.parse()?;
    if storage_version > version {
        return Err(ContractError::CannotMigrate {
            previous_contract: stored.contract,
            previous_version: stored.version,
        });
    }
    if storage_version < version {
        set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    }

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("version", CONTRACT_VERSION))
}
