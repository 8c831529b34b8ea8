//! # Transaction Index Benchmarks
//!
//! | Operation | Target |
//! |-----------|--------|
//! | Apply a block of bot registrations | < 1ms per tx |
//! | Revert and reapply the same block | < 2ms per tx |
//! | Name lookup | < 50µs |

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use shared_crypto::Ed25519KeyPair;
use shared_types::{
    Block, CoinInput, CoinOutputId, ConsensusChange, ConsensusChangeId, Currency, PublicKey,
    PublicKeySignaturePair, Transaction, UnlockCondition, UnlockFulfillment, UnlockHash, UnlockType,
};
use tc_01_typed_transactions::{
    BotName, BotRecordReadRegistry, BotRegistrationTransaction, TypedTransaction,
};
use tc_02_transaction_index::{IndexConfig, InMemoryKVStore, TransactionIndex, TransactionIndexApi};

const T0: u64 = 1_600_000_000;

fn config() -> IndexConfig {
    IndexConfig::new(UnlockCondition::UnlockHash(UnlockHash::new(UnlockType::PubKey, [1; 32])))
}

fn bot_name(i: u32) -> BotName {
    BotName::new(&format!("bench{:05}.example", i)).unwrap()
}

/// Unsigned: the index trusts consensus to have validated what it applies.
fn registration(i: u32) -> Transaction {
    let mut seed = [0u8; 32];
    seed[..4].copy_from_slice(&i.to_le_bytes());
    TypedTransaction::from(BotRegistrationTransaction {
        addresses: vec![],
        names: vec![bot_name(i)],
        months: 1,
        transaction_fee: Currency::new(100),
        coin_inputs: vec![CoinInput {
            parent_id: CoinOutputId(seed),
            fulfillment: UnlockFulfillment::Nil,
        }],
        refund: None,
        identification: PublicKeySignaturePair {
            public_key: PublicKey::ed25519(Ed25519KeyPair::from_seed(seed).public_key()),
            signature: vec![],
        },
    })
    .to_transaction()
}

fn block_of(size: u32) -> Block {
    Block {
        parent_id: Default::default(),
        timestamp: T0,
        transactions: (0..size).map(registration).collect(),
    }
}

fn change(n: u8, reverted: Vec<Block>, applied: Vec<Block>) -> ConsensusChange {
    ConsensusChange {
        id: ConsensusChangeId([n; 32]),
        reverted_blocks: reverted,
        applied_blocks: applied,
        synced: true,
    }
}

fn bench_apply_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("tc-02-apply-block");

    for size in [10u32, 100, 500] {
        let apply = change(1, vec![], vec![block_of(size)]);
        group.throughput(Throughput::Elements(u64::from(size)));
        group.bench_with_input(BenchmarkId::new("registrations", size), &apply, |b, apply| {
            b.iter_batched(
                || TransactionIndex::open_in_memory(&config()).unwrap(),
                |index| {
                    index.process_consensus_change(apply).unwrap();
                    black_box(index.stats().height)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_revert_reapply(c: &mut Criterion) {
    let mut group = c.benchmark_group("tc-02-reorg");

    for size in [10u32, 100] {
        let block = block_of(size);
        let index = TransactionIndex::open_in_memory(&config()).unwrap();
        index
            .process_consensus_change(&change(1, vec![], vec![block.clone()]))
            .unwrap();
        let reorg = change(2, vec![block.clone()], vec![block]);

        group.throughput(Throughput::Elements(u64::from(size)));
        group.bench_with_input(BenchmarkId::new("revert_reapply", size), &reorg, |b, reorg| {
            b.iter(|| index.process_consensus_change(black_box(reorg)).unwrap())
        });
    }

    group.finish();
}

fn bench_name_lookup(c: &mut Criterion) {
    let index: TransactionIndex<InMemoryKVStore> = TransactionIndex::open_in_memory(&config()).unwrap();
    index
        .process_consensus_change(&change(1, vec![], vec![block_of(1000)]))
        .unwrap();
    let name = bot_name(500);

    c.bench_function("tc-02-record-for-name", |b| {
        b.iter(|| black_box(index.record_for_name(&name).unwrap()))
    });
}

criterion_group!(benches, bench_apply_block, bench_revert_reapply, bench_name_lookup);
criterion_main!(benches);
