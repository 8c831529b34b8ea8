//! In-memory chain: the typed transaction protocol validates every block
//! against a transaction index, which then indexes it.

use std::collections::HashMap;
use std::sync::Arc;

use shared_crypto::Ed25519KeyPair;
use shared_types::{
    Block, CoinInput, CoinOutputId, ConsensusChange, ConsensusChangeId, Currency,
    InMemoryKeyStore, PublicKey, PublicKeySignaturePair, Transaction, UnlockFulfillment,
    UnlockHash,
};
use tc_01_typed_transactions::transactions::erc20::erc20_registration_fee;
use tc_01_typed_transactions::transactions::{BotIdentifierSignaturePair, UpdateSet};
use tc_01_typed_transactions::{
    BotId, BotName, BotNameTransferTransaction, BotRecordUpdateTransaction,
    BotRegistrationTransaction, Erc20Address, Erc20AddressRegistrationTransaction,
    Erc20CoinCreationTransaction, Erc20Hash, MockErc20WithdrawValidator, MockWithdrawal,
    NetworkAddress, NetworkConfig, TransactionProtocolApi, TransactionProtocolService,
    TypedTransaction, ValidationError,
};
use tc_02_transaction_index::{IndexConfig, InMemoryKVStore, TransactionIndex, TransactionIndexApi};

pub const T0: u64 = 1_600_000_000;
pub const DAY: u64 = 24 * 60 * 60;

pub type Index = TransactionIndex<InMemoryKVStore>;

pub struct Chain {
    pub index: Arc<Index>,
    pub protocol: TransactionProtocolService<Index, MockErc20WithdrawValidator>,
    pub keys: InMemoryKeyStore,
    blocks: Vec<Block>,
    changes: u32,
    inputs: u32,
}

impl Chain {
    pub fn new() -> Self {
        Self::with_withdrawals(MockErc20WithdrawValidator::default())
    }

    pub fn with_withdrawals(withdrawals: MockErc20WithdrawValidator) -> Self {
        let network = NetworkConfig::devnet();
        let index = Arc::new(
            TransactionIndex::open_in_memory(&IndexConfig::new(
                network.genesis_mint_condition.clone(),
            ))
            .unwrap(),
        );
        let protocol = TransactionProtocolService::new(network, index.clone(), Arc::new(withdrawals));
        Self {
            index,
            protocol,
            keys: InMemoryKeyStore::new(),
            blocks: Vec::new(),
            changes: 0,
            inputs: 0,
        }
    }

    pub fn one_coin(&self) -> Currency {
        self.protocol.network().one_coin
    }

    /// Validate a block on top of the tip and index it.
    pub async fn mine(
        &mut self,
        timestamp: u64,
        txs: Vec<TypedTransaction>,
    ) -> Result<Block, ValidationError> {
        let block = Block {
            parent_id: self.blocks.last().map(Block::id).unwrap_or_default(),
            timestamp,
            transactions: txs.iter().map(TypedTransaction::to_transaction).collect(),
        };
        let height = self.index.stats().height + 1;
        self.protocol.validate_block(&block, height).await?;

        let change = ConsensusChange {
            id: self.next_change_id(),
            reverted_blocks: vec![],
            applied_blocks: vec![block.clone()],
            synced: true,
        };
        self.index.process_consensus_change(&change).unwrap();
        self.blocks.push(block.clone());
        Ok(block)
    }

    /// Revert the `depth` newest blocks in one consensus change.
    pub fn revert(&mut self, depth: usize) -> Vec<Block> {
        let keep = self.blocks.len() - depth;
        let reverted: Vec<Block> = self.blocks.drain(keep..).rev().collect();
        let change = ConsensusChange {
            id: self.next_change_id(),
            reverted_blocks: reverted.clone(),
            applied_blocks: vec![],
            synced: true,
        };
        self.index.process_consensus_change(&change).unwrap();
        reverted
    }

    /// Signed registration of the bot keyed by `seed`.
    pub fn registration(&mut self, seed: u8, bot_names: &[&str], months: u8) -> TypedTransaction {
        self.registration_with_addresses(seed, bot_names, &[], months)
    }

    pub fn registration_with_addresses(
        &mut self,
        seed: u8,
        bot_names: &[&str],
        addresses: &[&str],
        months: u8,
    ) -> TypedTransaction {
        let public_key = self.keys.insert(key_pair(seed));
        let mut tx = BotRegistrationTransaction {
            addresses: addresses.iter().map(|a| NetworkAddress::new(a).unwrap()).collect(),
            names: names(bot_names),
            months,
            transaction_fee: self.one_coin(),
            coin_inputs: self.fresh_input(),
            refund: None,
            identification: PublicKeySignaturePair {
                public_key,
                signature: vec![],
            },
        };
        tx.sign_extension(&self.keys).unwrap();
        tx.into()
    }

    /// Record update signed with the key the index holds for `id`.
    pub fn update(&mut self, id: u32, add: &[&str], remove: &[&str], months: u8) -> TypedTransaction {
        let mut tx = BotRecordUpdateTransaction {
            id: BotId(id),
            addresses: UpdateSet::default(),
            names: UpdateSet {
                add: names(add),
                remove: names(remove),
            },
            months,
            transaction_fee: self.one_coin(),
            coin_inputs: self.fresh_input(),
            refund: None,
            signature: vec![],
        };
        tx.sign_extension(&self.keys, &*self.index).unwrap();
        tx.into()
    }

    pub fn transfer(&mut self, from: u32, to: u32, moved: &[&str]) -> TypedTransaction {
        let mut tx = BotNameTransferTransaction {
            sender: BotIdentifierSignaturePair::unsigned(BotId(from)),
            receiver: BotIdentifierSignaturePair::unsigned(BotId(to)),
            names: names(moved),
            transaction_fee: self.one_coin(),
            coin_inputs: self.fresh_input(),
            refund: None,
        };
        tx.sign_extension(&self.keys, &*self.index).unwrap();
        tx.into()
    }

    pub fn erc20_registration(&mut self, seed: u8) -> Erc20AddressRegistrationTransaction {
        let public_key = self.keys.insert(key_pair(seed));
        let mut tx = unsigned_erc20_registration(public_key, self.one_coin());
        tx.coin_inputs = self.fresh_input();
        tx.sign_extension(&self.keys).unwrap();
        tx
    }

    pub fn coin_creation(&self, address: UnlockHash, value: Currency, erc20_txid: u8) -> TypedTransaction {
        Erc20CoinCreationTransaction {
            address,
            value,
            transaction_fee: self.one_coin(),
            block_id: ERC20_BLOCK,
            transaction_id: Erc20Hash([erc20_txid; 32]),
        }
        .into()
    }

    pub fn decode(&self, tx: &Transaction) -> TypedTransaction {
        self.protocol.decode_transaction(tx).unwrap()
    }

    /// One input no other transaction of this chain spends.
    pub fn fresh_input(&mut self) -> Vec<CoinInput> {
        self.inputs += 1;
        let mut parent = [0u8; 32];
        parent[..4].copy_from_slice(&self.inputs.to_le_bytes());
        vec![CoinInput {
            parent_id: CoinOutputId(parent),
            fulfillment: UnlockFulfillment::Nil,
        }]
    }

    fn next_change_id(&mut self) -> ConsensusChangeId {
        self.changes += 1;
        let mut id = [0u8; 32];
        id[..4].copy_from_slice(&self.changes.to_le_bytes());
        ConsensusChangeId(id)
    }
}

pub const ERC20_BLOCK: Erc20Hash = Erc20Hash([0xe2; 32]);

pub fn key_pair(seed: u8) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed([seed; 32])
}

pub fn public_key(seed: u8) -> PublicKey {
    PublicKey::ed25519(key_pair(seed).public_key())
}

pub fn name(s: &str) -> BotName {
    BotName::new(s).unwrap()
}

pub fn names(list: &[&str]) -> Vec<BotName> {
    list.iter().map(|s| name(s)).collect()
}

fn unsigned_erc20_registration(
    public_key: PublicKey,
    one_coin: Currency,
) -> Erc20AddressRegistrationTransaction {
    Erc20AddressRegistrationTransaction {
        public_key,
        signature: vec![],
        registration_fee: erc20_registration_fee(one_coin),
        transaction_fee: one_coin,
        coin_inputs: vec![],
        refund: None,
    }
}

/// Address the ERC20 registration of `seed` binds.
pub fn tft_address(seed: u8) -> UnlockHash {
    unsigned_erc20_registration(public_key(seed), Currency::new(1)).tft_address()
}

/// Bridge that has seen one confirmed withdrawal per entry.
pub fn withdrawals(entries: &[(u8, UnlockHash, Currency)]) -> MockErc20WithdrawValidator {
    let withdrawals: HashMap<_, _> = entries
        .iter()
        .map(|(txid, address, amount)| {
            (
                Erc20Hash([*txid; 32]),
                MockWithdrawal {
                    block_id: ERC20_BLOCK,
                    address: Erc20Address::from_unlock_hash(address),
                    amount: *amount,
                    confirmations: 6,
                },
            )
        })
        .collect();
    MockErc20WithdrawValidator {
        withdrawals,
        required_confirmations: 6,
    }
}
