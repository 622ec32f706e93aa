//! Fixed-point fiat amounts
//!
//! Fiat values (transfer amounts, spot prices, fee displays) are carried as
//! integer micro-units (10^-6 of the fiat currency). Parsing never goes
//! through floating point, so conversions to wei or token base units stay
//! exact at any magnitude.

use crate::{Error, Result};
use alloy::primitives::U256;
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits carried by [`Fiat`].
pub const FIAT_SCALE: u32 = 6;

const MICROS_PER_UNIT: u128 = 1_000_000;

/// A non-negative fiat amount in micro-units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fiat {
    micros: u128,
}

impl Fiat {
    pub const ZERO: Fiat = Fiat { micros: 0 };

    /// Build from raw micro-units (10^-6 of the currency).
    pub const fn from_micros(micros: u128) -> Self {
        Self { micros }
    }

    /// Build from a whole number of fiat units.
    pub const fn from_units(units: u64) -> Self {
        Self {
            micros: units as u128 * MICROS_PER_UNIT,
        }
    }

    pub const fn micros(&self) -> u128 {
        self.micros
    }

    pub const fn is_zero(&self) -> bool {
        self.micros == 0
    }

    /// Convert a fiat amount to wei at the given fiat-per-coin spot price:
    /// `round(amount * 10^18 / price)`, computed in 256-bit integers.
    pub fn to_wei(&self, price_per_coin: Fiat) -> Result<U256> {
        if price_per_coin.is_zero() {
            return Err(Error::InvalidInput("spot price must be positive".into()));
        }
        let amount = U256::from(self.micros) * U256::from(10).pow(U256::from(18));
        let price = U256::from(price_per_coin.micros);
        // round half up: (2a + p) / 2p
        Ok((amount * U256::from(2) + price) / (price * U256::from(2)))
    }

    /// Convert a fiat amount to token base units for a token pegged 1:1 to
    /// the fiat currency: `round(amount * 10^decimals)`.
    pub fn to_token_units(&self, decimals: u8) -> U256 {
        let scaled = U256::from(self.micros) * U256::from(10).pow(U256::from(decimals));
        let divisor = U256::from(MICROS_PER_UNIT);
        (scaled * U256::from(2) + divisor) / (divisor * U256::from(2))
    }
}

impl FromStr for Fiat {
    type Err = Error;

    /// Parse a decimal string such as `"100"` or `"42.50"`. At most six
    /// fractional digits are accepted; anything finer would be silently
    /// rounded, so it is rejected instead.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(Error::InvalidInput(format!("invalid amount: {s:?}")));
        }
        if frac.len() > FIAT_SCALE as usize {
            return Err(Error::InvalidInput(format!(
                "amount {s:?} has more than {FIAT_SCALE} fractional digits"
            )));
        }
        // u128::parse tolerates a leading '+', so check the digits ourselves
        let parse_digits = |part: &str| -> Result<u128> {
            if part.is_empty() {
                return Ok(0);
            }
            if !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::InvalidInput(format!("invalid amount: {s:?}")));
            }
            part.parse::<u128>()
                .map_err(|_| Error::InvalidInput(format!("invalid amount: {s:?}")))
        };
        let whole = parse_digits(whole)?;
        let frac_micros =
            parse_digits(frac)? * 10u128.pow(FIAT_SCALE - frac.len() as u32);
        let micros = whole
            .checked_mul(MICROS_PER_UNIT)
            .and_then(|w| w.checked_add(frac_micros))
            .ok_or_else(|| Error::InvalidInput(format!("amount {s:?} out of range")))?;
        Ok(Fiat { micros })
    }
}

impl fmt::Display for Fiat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06}",
            self.micros / MICROS_PER_UNIT,
            self.micros % MICROS_PER_UNIT
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_and_fractional() {
        assert_eq!("100".parse::<Fiat>().unwrap().micros(), 100_000_000);
        assert_eq!("42.50".parse::<Fiat>().unwrap().micros(), 42_500_000);
        assert_eq!("0.000001".parse::<Fiat>().unwrap().micros(), 1);
        assert_eq!(".5".parse::<Fiat>().unwrap().micros(), 500_000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Fiat>().is_err());
        assert!(".".parse::<Fiat>().is_err());
        assert!("abc".parse::<Fiat>().is_err());
        assert!("1.2.3".parse::<Fiat>().is_err());
        assert!("-5".parse::<Fiat>().is_err());
        assert!("+5".parse::<Fiat>().is_err());
        assert!("1.+5".parse::<Fiat>().is_err());
        // seven fractional digits would be rounded silently
        assert!("1.0000001".parse::<Fiat>().is_err());
    }

    #[test]
    fn test_to_wei_exact() {
        // 100 USD at 2000 USD/ETH is exactly 0.05 ETH
        let amount = "100".parse::<Fiat>().unwrap();
        let price = "2000".parse::<Fiat>().unwrap();
        let wei = amount.to_wei(price).unwrap();
        assert_eq!(wei, U256::from(50_000_000_000_000_000u64));
    }

    #[test]
    fn test_to_wei_rounds_half_up() {
        // 1 micro-dollar at 3 USD/ETH: 10^18 / 3_000_000 = 333333333333.33..
        let amount = Fiat::from_micros(1);
        let price = "3".parse::<Fiat>().unwrap();
        assert_eq!(amount.to_wei(price).unwrap(), U256::from(333_333_333_333u64));
    }

    #[test]
    fn test_to_wei_zero_price_rejected() {
        let amount = "100".parse::<Fiat>().unwrap();
        assert!(matches!(
            amount.to_wei(Fiat::ZERO),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_to_token_units() {
        // 100 USD into a 6-decimal stablecoin
        let amount = "100".parse::<Fiat>().unwrap();
        assert_eq!(amount.to_token_units(6), U256::from(100_000_000u64));
        // fractional amounts stay exact
        let amount = "0.25".parse::<Fiat>().unwrap();
        assert_eq!(amount.to_token_units(6), U256::from(250_000u64));
    }

    #[test]
    fn test_display_six_decimals() {
        assert_eq!("12.5".parse::<Fiat>().unwrap().to_string(), "12.500000");
        assert_eq!(Fiat::from_micros(1).to_string(), "0.000001");
    }
}
