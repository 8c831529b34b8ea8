//! Opening, creating and upgrading the on-disk index.

use shared_types::{Decode, Encode, UnlockCondition};
use tracing::info;

use crate::domain::keys::internal;
use crate::domain::{IndexError, IndexStats, KeyPrefix, SchemaVersion, DATABASE_HEADER};
use crate::ports::outbound::{BatchOperation, KeyValueStore};

/// Open the index in `store`, creating it if the store is empty and
/// upgrading older schemas in place. Returns the committed stats.
pub(crate) fn open_or_create<KV: KeyValueStore + ?Sized>(
    store: &mut KV,
    genesis_mint_condition: &UnlockCondition,
) -> Result<IndexStats, IndexError> {
    let header = match store.get(&KeyPrefix::internal_key(internal::HEADER))? {
        None => return create(store, genesis_mint_condition),
        Some(header) => header,
    };
    if header != DATABASE_HEADER.as_bytes() {
        return Err(IndexError::corruption("unknown database header"));
    }

    let version = read_version(store)?;
    if version < SchemaVersion::CURRENT {
        migrate(store, version)?;
    }

    let stats = store
        .get(&KeyPrefix::internal_key(internal::STATS))?
        .ok_or_else(|| IndexError::corruption("stats are missing"))?;
    let stats = IndexStats::from_bytes(&stats)?;

    let genesis = store
        .get(&KeyPrefix::mint_condition_key(0))?
        .ok_or_else(|| IndexError::corruption("genesis mint condition is missing"))?;
    if UnlockCondition::from_bytes(&genesis)? != *genesis_mint_condition {
        return Err(IndexError::GenesisMismatch);
    }

    info!(
        "[tc-02] opened transaction index at height {} (synced: {})",
        stats.height, stats.synced
    );
    Ok(stats)
}

fn create<KV: KeyValueStore + ?Sized>(
    store: &mut KV,
    genesis_mint_condition: &UnlockCondition,
) -> Result<IndexStats, IndexError> {
    let stats = IndexStats::default();
    store.atomic_batch_write(vec![
        BatchOperation::put(
            KeyPrefix::internal_key(internal::HEADER),
            DATABASE_HEADER.as_bytes().to_vec(),
        ),
        BatchOperation::put(
            KeyPrefix::internal_key(internal::VERSION),
            SchemaVersion::CURRENT.as_str().as_bytes().to_vec(),
        ),
        BatchOperation::put(KeyPrefix::internal_key(internal::STATS), stats.to_bytes()),
        BatchOperation::put(
            KeyPrefix::mint_condition_key(0),
            genesis_mint_condition.to_bytes(),
        ),
    ])?;
    info!(
        "[tc-02] created transaction index, schema version {}",
        SchemaVersion::CURRENT
    );
    Ok(stats)
}

fn read_version<KV: KeyValueStore + ?Sized>(store: &KV) -> Result<SchemaVersion, IndexError> {
    let raw = store
        .get(&KeyPrefix::internal_key(internal::VERSION))?
        .ok_or_else(|| IndexError::corruption("schema version is missing"))?;
    let version = String::from_utf8_lossy(&raw).into_owned();
    SchemaVersion::parse(&version).ok_or(IndexError::UnsupportedVersion { version })
}

/// All steps from `from` to the current version commit as one batch.
fn migrate<KV: KeyValueStore + ?Sized>(
    store: &mut KV,
    from: SchemaVersion,
) -> Result<(), IndexError> {
    let mut ops = Vec::new();

    if from < SchemaVersion::V1_1 {
        let stats_key = KeyPrefix::internal_key(internal::STATS);
        let legacy = store
            .get(&stats_key)?
            .ok_or_else(|| IndexError::corruption("stats are missing"))?;
        let stats = IndexStats::decode_without_chain_time(&legacy)?;
        ops.push(BatchOperation::put(stats_key, stats.to_bytes()));
    }
    // 1.1 to 1.2 only adds buckets, which need no initial entries

    ops.push(BatchOperation::put(
        KeyPrefix::internal_key(internal::VERSION),
        SchemaVersion::CURRENT.as_str().as_bytes().to_vec(),
    ));
    store.atomic_batch_write(ops)?;

    info!(
        "[tc-02] migrated transaction index from version {} to {}",
        from,
        SchemaVersion::CURRENT
    );
    Ok(())
}
