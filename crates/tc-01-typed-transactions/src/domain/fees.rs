//! # Bot and Bridge Fees
//!
//! All fees are multiples of the network's one-coin unit.

use shared_types::Currency;

/// Flat fee of a bot registration.
pub const BOT_REGISTRATION_FEE_MULTIPLIER: u64 = 90;
/// Fee per prepaid month.
pub const BOT_MONTHLY_FEE_MULTIPLIER: u64 = 10;
/// Fee for every name beyond the first at registration, and every name added later.
pub const BOT_FEE_PER_ADDITIONAL_NAME_MULTIPLIER: u64 = 50;
/// Flat fee when a record update adds or removes network addresses.
pub const BOT_FEE_FOR_NETWORK_ADDRESS_INFO_CHANGE_MULTIPLIER: u64 = 20;

/// Fee of an ERC20 address registration.
pub const ERC20_ADDRESS_REGISTRATION_FEE_MULTIPLIER: u64 = 10;
/// Smallest amount an ERC20 conversion may burn.
pub const ERC20_CONVERSION_MINIMUM_MULTIPLIER: u64 = 1000;

/// Monthly fee for `months` prepaid months.
///
/// Under 12 months there is no discount, from 12 to 23 months 30% is taken
/// off and from 24 months on 50%. The discount is applied to the full
/// amount and truncated.
pub fn compute_monthly_bot_fees(months: u8, one_coin: Currency) -> Currency {
    let fee = one_coin * (u64::from(months) * BOT_MONTHLY_FEE_MULTIPLIER);
    match months {
        0..=11 => fee,
        12..=23 => fee.mul_div(7, 10),
        _ => fee.mul_div(1, 2),
    }
}

/// Fee of a bot registration with `months` prepaid and `names` names.
pub fn compute_registration_fee(months: u8, names: usize, one_coin: Currency) -> Currency {
    let additional_names = names.saturating_sub(1) as u64;
    one_coin * BOT_REGISTRATION_FEE_MULTIPLIER
        + compute_monthly_bot_fees(months, one_coin)
        + one_coin * (additional_names * BOT_FEE_PER_ADDITIONAL_NAME_MULTIPLIER)
}

/// Fee of a bot record update.
pub fn compute_update_fee(
    months: u8,
    addresses_changed: bool,
    names_added: usize,
    one_coin: Currency,
) -> Currency {
    let mut fee = Currency::zero();
    if months > 0 {
        fee = fee + compute_monthly_bot_fees(months, one_coin);
    }
    if addresses_changed {
        fee = fee + one_coin * BOT_FEE_FOR_NETWORK_ADDRESS_INFO_CHANGE_MULTIPLIER;
    }
    fee + one_coin * (names_added as u64 * BOT_FEE_PER_ADDITIONAL_NAME_MULTIPLIER)
}

/// Fee of a name transfer.
pub fn compute_transfer_fee(names: usize, one_coin: Currency) -> Currency {
    one_coin * (names as u64 * BOT_FEE_PER_ADDITIONAL_NAME_MULTIPLIER)
}
