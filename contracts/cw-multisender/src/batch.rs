use cosmwasm_std::Uint128;

use crate::error::ContractError;
use crate::msg::TransferRequest;

/// Value accounting of one batch, computed before any funds move.
#[derive(Clone, Debug, PartialEq)]
pub struct Settlement {
    /// sum of all requested amounts
    pub total_amount: Uint128,
    /// reserve retained by the contract, one per recipient
    pub total_reserve: Uint128,
    /// attached value left after amounts and reserves
    pub excess: Uint128,
}

/// Validates that `value` covers every transfer and its reserve.
///
/// Overflow of the sums is checked first, then the declared value against the
/// attached one, and finally every transfer in key order against what is left
/// of `value`. The first transfer that cannot be covered fails the whole batch.
pub fn settle(
    transfers: &TransferRequest,
    value: Uint128,
    declared_value: Uint128,
    reserve: Uint128,
) -> Result<Settlement, ContractError> {
    let total_amount = transfers
        .iter()
        .try_fold(Uint128::zero(), |acc, t| acc.checked_add(t.amount))
        .map_err(|_| ContractError::AmountOverflow {})?;
    let total_reserve = reserve
        .checked_mul(Uint128::new(transfers.len() as u128))
        .map_err(|_| ContractError::AmountOverflow {})?;
    total_amount
        .checked_add(total_reserve)
        .map_err(|_| ContractError::AmountOverflow {})?;

    if declared_value > value {
        return Err(ContractError::InsufficientFunds {
            needed: declared_value,
            available: value,
        });
    }

    let mut available = value;
    for transfer in transfers.iter() {
        let needed = transfer
            .amount
            .checked_add(reserve)
            .map_err(|_| ContractError::AmountOverflow {})?;
        available = match available.checked_sub(needed) {
            Ok(rest) => rest,
            Err(_) => return Err(ContractError::InsufficientFunds { needed, available }),
        };
    }

    Ok(Settlement {
        total_amount,
        total_reserve,
        excess: available,
    })
}
