//! # Network Configuration
//!
//! Coin unit, fee minimums and the fixed addresses each network pays its
//! bot and bridge fees to.

use shared_types::{
    BlockHeight, Currency, MultiSignatureCondition, TransactionValidationConstants, UnlockCondition,
    UnlockHash, UnlockType,
};

/// 10^9 smallest units make one coin.
pub const ONE_COIN: u64 = 1_000_000_000;

/// Default block size limit in bytes.
pub const BLOCK_SIZE_LIMIT: usize = 2_000_000;

/// Default arbitrary data limit in bytes.
pub const ARBITRARY_DATA_SIZE_LIMIT: usize = 83;

/// Height from which multi-signature conditions are standard on the standard network.
pub const STANDARD_MULTISIG_MINIMUM_HEIGHT: BlockHeight = 42_000;

const fn hex_nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        _ => panic!("invalid hex character in address constant"),
    }
}

/// Public key unlock hash from the 64 hex characters of its hash.
const fn pubkey_unlock_hash(hex: &str) -> UnlockHash {
    let bytes = hex.as_bytes();
    assert!(bytes.len() == 64, "address constant must be 64 hex characters");
    let mut hash = [0u8; 32];
    let mut i = 0;
    while i < 32 {
        hash[i] = hex_nibble(bytes[2 * i]) << 4 | hex_nibble(bytes[2 * i + 1]);
        i += 1;
    }
    UnlockHash {
        unlock_type: UnlockType::PubKey,
        hash,
    }
}

const STANDARD_POOL: UnlockHash =
    pubkey_unlock_hash("7267221ef1947bb18506e390f1f9446b995acfb6d08d8e39508bb974d9830b8c");
const TESTNET_POOL: UnlockHash =
    pubkey_unlock_hash("6148ac9b17828e0933796eaca94418a376f2aa3fefa15685cea5fa462093f015");
const DEVNET_POOL: UnlockHash =
    pubkey_unlock_hash("5a080a9259b9d4aaa550e2156f49b1a79a64c7ea463d810d4493e8242e679158");

const STANDARD_MINTERS: [UnlockHash; 3] = [
    pubkey_unlock_hash("746677df456546d93729066dd88514e2009930f3eebac3c93d43c88a108f8f9a"),
    pubkey_unlock_hash("ad4f73417476f8b8350298681dd0fa8640baa53a91915417b1dd8103d118b543"),
    pubkey_unlock_hash("cc55df18eb3b86670deb6cfbb9b62b8463b62738426f0c14a7ae8926d6b556fb"),
];
const TESTNET_MINTER: UnlockHash =
    pubkey_unlock_hash("fc8714235d549f890f35e52d745b9eeeee34926f96c4b9ef1689832f338d9349");

/// Constants of one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: &'static str,
    pub one_coin: Currency,
    pub minimum_miner_fee: Currency,
    pub block_size_limit: usize,
    pub arbitrary_data_size_limit: usize,
    /// Receives all bot fees.
    pub bot_registry_pool: UnlockHash,
    /// Receives the ERC20 address registration fees.
    pub erc20_fee_pool: UnlockHash,
    /// Mint condition at height 0.
    pub genesis_mint_condition: UnlockCondition,
    pub multisig_minimum_height: BlockHeight,
}

impl NetworkConfig {
    pub fn standard() -> Self {
        let one_coin = Currency::new(ONE_COIN);
        Self {
            name: "standard",
            one_coin,
            minimum_miner_fee: one_coin.mul_div(1, 10),
            block_size_limit: BLOCK_SIZE_LIMIT,
            arbitrary_data_size_limit: ARBITRARY_DATA_SIZE_LIMIT,
            bot_registry_pool: STANDARD_POOL,
            erc20_fee_pool: STANDARD_POOL,
            genesis_mint_condition: UnlockCondition::MultiSignature(MultiSignatureCondition {
                unlock_hashes: STANDARD_MINTERS.to_vec(),
                min_signatures: 2,
            }),
            multisig_minimum_height: STANDARD_MULTISIG_MINIMUM_HEIGHT,
        }
    }

    pub fn testnet() -> Self {
        let one_coin = Currency::new(ONE_COIN);
        Self {
            name: "testnet",
            one_coin,
            minimum_miner_fee: one_coin.mul_div(1, 10),
            block_size_limit: BLOCK_SIZE_LIMIT,
            arbitrary_data_size_limit: ARBITRARY_DATA_SIZE_LIMIT,
            bot_registry_pool: TESTNET_POOL,
            erc20_fee_pool: TESTNET_POOL,
            genesis_mint_condition: UnlockCondition::UnlockHash(TESTNET_MINTER),
            multisig_minimum_height: 0,
        }
    }

    /// Local development network; the minimum fee is one full coin.
    pub fn devnet() -> Self {
        let one_coin = Currency::new(ONE_COIN);
        Self {
            name: "devnet",
            one_coin,
            minimum_miner_fee: one_coin,
            block_size_limit: BLOCK_SIZE_LIMIT,
            arbitrary_data_size_limit: ARBITRARY_DATA_SIZE_LIMIT,
            bot_registry_pool: DEVNET_POOL,
            erc20_fee_pool: DEVNET_POOL,
            genesis_mint_condition: UnlockCondition::UnlockHash(DEVNET_POOL),
            multisig_minimum_height: 0,
        }
    }

    pub fn with_genesis_mint_condition(mut self, condition: UnlockCondition) -> Self {
        self.genesis_mint_condition = condition;
        self
    }

    pub fn with_minimum_miner_fee(mut self, fee: Currency) -> Self {
        self.minimum_miner_fee = fee;
        self
    }

    pub fn validation_constants(&self) -> TransactionValidationConstants {
        TransactionValidationConstants {
            block_size_limit: self.block_size_limit,
            arbitrary_data_size_limit: self.arbitrary_data_size_limit,
            minimum_miner_fee: self.minimum_miner_fee,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::standard()
    }
}
