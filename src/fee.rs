//! Gas-fee arithmetic
//!
//! Everything here is integer arithmetic. Gas prices are never rounded down
//! (an under-priced transaction can sit in the mempool indefinitely) and the
//! fiat fee display rounds up, so the shown fee never understates the cost.

use crate::fiat::Fiat;
use alloy::primitives::U256;

/// Default multiplier applied to the network-suggested gas price.
pub const DEFAULT_GAS_PRICE_FACTOR: u32 = 3;

const WEI_PER_COIN: u128 = 1_000_000_000_000_000_000;

/// Fee parameters presented to the user before confirmation.
#[derive(Debug, Clone)]
pub struct FeeQuote {
    /// What the network suggested, wei per gas.
    pub suggested_gas_price: u128,
    /// The inflated price the transaction will actually carry.
    pub gas_price: u128,
    pub gas_limit: u64,
    /// Total fee at `gas_price * gas_limit`, converted to fiat.
    pub fee_fiat: Fiat,
}

/// Multiply the suggested gas price by the configured factor.
pub fn inflate(suggested_gas_price: u128, factor: u32) -> u128 {
    suggested_gas_price.saturating_mul(factor as u128)
}

/// Maximum gas fee in wei for the given price and limit.
pub fn fee_wei(gas_price: u128, gas_limit: u64) -> U256 {
    U256::from(gas_price) * U256::from(gas_limit)
}

/// Convert a gas fee to fiat, rounding up to the displayed micro-unit.
pub fn fee_in_fiat(gas_price: u128, gas_limit: u64, price_per_coin: Fiat) -> Fiat {
    let fee = fee_wei(gas_price, gas_limit) * U256::from(price_per_coin.micros());
    let wei_per_coin = U256::from(WEI_PER_COIN);
    let micros = (fee + wei_per_coin - U256::from(1)) / wei_per_coin;
    // a fee that overflows u128 micro-dollars is not a realistic transaction
    Fiat::from_micros(micros.saturating_to::<u128>())
}

/// Whether the sender can afford the gas fee. Checks the fee only, not the
/// transferred value; the orchestrator layers the value check on top for
/// native transfers.
pub fn sufficient_balance(balance: U256, gas_price: u128, gas_limit: u64) -> bool {
    balance >= fee_wei(gas_price, gas_limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inflate() {
        assert_eq!(inflate(10, 3), 30);
        assert_eq!(inflate(0, 3), 0);
        assert_eq!(inflate(25_000_000_000, DEFAULT_GAS_PRICE_FACTOR), 75_000_000_000);
    }

    #[test]
    fn test_fee_wei() {
        assert_eq!(fee_wei(30, 21_000), U256::from(630_000u64));
    }

    #[test]
    fn test_fee_in_fiat_realistic() {
        // 30 gwei * 21000 gas = 6.3e14 wei; at 2000 USD/ETH that is $1.26
        let price = "2000".parse::<Fiat>().unwrap();
        let fee = fee_in_fiat(30_000_000_000, 21_000, price);
        assert_eq!(fee, "1.26".parse::<Fiat>().unwrap());
    }

    #[test]
    fn test_fee_in_fiat_rounds_up() {
        // 30 wei * 21000 gas at 2000 USD/ETH is far below one micro-dollar,
        // but the display must never show less than the true cost
        let price = "2000".parse::<Fiat>().unwrap();
        let fee = fee_in_fiat(30, 21_000, price);
        assert_eq!(fee, Fiat::from_micros(1));
    }

    #[test]
    fn test_sufficient_balance_boundary() {
        let exact = fee_wei(30, 21_000);
        assert!(sufficient_balance(exact, 30, 21_000));
        assert!(sufficient_balance(exact + U256::from(1), 30, 21_000));
        assert!(!sufficient_balance(exact - U256::from(1), 30, 21_000));
    }
}
