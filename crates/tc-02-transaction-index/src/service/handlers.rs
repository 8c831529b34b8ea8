//! # Transaction Handlers
//!
//! Index effects of the transaction kinds the index tracks. Every `apply_*`
//! has a `revert_*` that restores the exact prior state, so a block can be
//! reverted and re-applied any number of times.
//!
//! Revert runs against the state its own apply produced: transactions of a
//! block are reverted in reverse order, and blocks newest first.

use shared_types::{BlockHeight, Timestamp, Transaction, TransactionId};
use tc_01_typed_transactions::{
    BotId, BotName, BotNameTransferTransaction, BotRecord, BotRecordUpdateTransaction,
    BotRegistrationTransaction, Erc20AddressRegistrationTransaction, Erc20CoinCreationTransaction,
    MinterDefinitionTransaction, TypedTransaction,
};
use tc_01_typed_transactions::transactions::is_known_version;
use tracing::{debug, trace};

use super::overlay::StagedWrites;
use crate::domain::keys::internal;
use crate::domain::{DisplacedNames, ImplicitUpdate, IndexError, KeyPrefix};
use crate::ports::outbound::KeyValueStore;

/// Position of a transaction in the chain.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TxContext {
    pub height: BlockHeight,
    pub block_time: Timestamp,
    /// Index of the transaction within its block.
    pub sequence: u16,
    pub txid: TransactionId,
}

// ============================================================================
// Dispatch
// ============================================================================

/// Typed form of `tx`, or `None` for versions this index does not track.
fn tracked(
    ctx: &TxContext,
    tx: &Transaction,
) -> Result<Option<TypedTransaction>, IndexError> {
    if !is_known_version(tx.version) {
        trace!("[tc-02] skipping transaction {} of unknown version {}", ctx.txid, tx.version);
        return Ok(None);
    }
    Ok(Some(TypedTransaction::from_transaction(tx)?))
}

pub(crate) fn apply_transaction<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    ctx: &TxContext,
    tx: &Transaction,
) -> Result<(), IndexError> {
    let Some(typed) = tracked(ctx, tx)? else {
        return Ok(());
    };
    match typed {
        TypedTransaction::MinterDefinition(t) => apply_minter_definition(w, ctx, &t),
        TypedTransaction::BotRegistration(t) => apply_bot_registration(w, ctx, &t),
        TypedTransaction::BotRecordUpdate(t) => apply_bot_record_update(w, ctx, &t),
        TypedTransaction::BotNameTransfer(t) => apply_bot_name_transfer(w, ctx, &t),
        TypedTransaction::Erc20AddressRegistration(t) => apply_erc20_address_registration(w, &t),
        TypedTransaction::Erc20CoinCreation(t) => apply_erc20_coin_creation(w, ctx, &t),
        other => {
            trace!("[tc-02] nothing to index for {} transaction {}", other.kind(), ctx.txid);
            Ok(())
        }
    }
}

pub(crate) fn revert_transaction<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    ctx: &TxContext,
    tx: &Transaction,
) -> Result<(), IndexError> {
    let Some(typed) = tracked(ctx, tx)? else {
        return Ok(());
    };
    match typed {
        TypedTransaction::MinterDefinition(_) => revert_minter_definition(w, ctx),
        TypedTransaction::BotRegistration(t) => revert_bot_registration(w, ctx, &t),
        TypedTransaction::BotRecordUpdate(t) => revert_bot_record_update(w, ctx, &t),
        TypedTransaction::BotNameTransfer(t) => revert_bot_name_transfer(w, ctx, &t),
        TypedTransaction::Erc20AddressRegistration(t) => revert_erc20_address_registration(w, &t),
        TypedTransaction::Erc20CoinCreation(t) => revert_erc20_coin_creation(w, &t),
        _ => Ok(()),
    }
}

// ============================================================================
// Minting
// ============================================================================

/// The new condition applies from the block after the definition.
fn apply_minter_definition<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    ctx: &TxContext,
    tx: &MinterDefinitionTransaction,
) -> Result<(), IndexError> {
    w.put_encoded(KeyPrefix::mint_condition_key(ctx.height), &tx.mint_condition);
    debug!("[tc-02] mint condition redefined at height {}", ctx.height);
    Ok(())
}

fn revert_minter_definition<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    ctx: &TxContext,
) -> Result<(), IndexError> {
    if ctx.height == 0 {
        return Err(IndexError::corruption("cannot revert the genesis mint condition"));
    }
    w.delete(KeyPrefix::mint_condition_key(ctx.height));
    Ok(())
}

// ============================================================================
// Bot Registration
// ============================================================================

fn apply_bot_registration<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    ctx: &TxContext,
    tx: &BotRegistrationTransaction,
) -> Result<(), IndexError> {
    let counter = bot_id_counter(w)?;
    let id = counter.checked_add(1).ok_or(IndexError::IdOverflow)?;
    let id = BotId(id);

    let mut record = BotRecord::new(id, tx.identification.public_key.clone());
    record.extend_expiration(ctx.block_time, tx.months)?;
    record.add_network_addresses(&tx.addresses)?;
    record.add_names(&tx.names)?;

    save_record(w, &record);
    w.put_encoded(KeyPrefix::bot_key_key(&record.public_key), &id);
    map_names(w, ctx, &tx.names, id)?;
    put_history(w, ctx, id);
    set_bot_id_counter(w, id.0);

    debug!(
        "[tc-02] registered bot {} with {} names at height {}",
        id,
        tx.names.len(),
        ctx.height
    );
    Ok(())
}

fn revert_bot_registration<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    ctx: &TxContext,
    tx: &BotRegistrationTransaction,
) -> Result<(), IndexError> {
    let id = BotId(bot_id_counter(w)?);
    let record = load_record(w, id)?;
    if record.public_key != tx.identification.public_key {
        return Err(IndexError::corruption(format!(
            "bot {} is not the bot registered by transaction {}",
            id, ctx.txid
        )));
    }

    w.delete(KeyPrefix::record_key(id));
    unmap_names(w, ctx, &tx.names)?;
    w.delete(KeyPrefix::bot_key_key(&record.public_key));
    delete_history(w, ctx, id);
    set_bot_id_counter(w, id.0 - 1);

    debug!("[tc-02] reverted registration of bot {}", id);
    Ok(())
}

// ============================================================================
// Bot Record Update
// ============================================================================

fn apply_bot_record_update<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    ctx: &TxContext,
    tx: &BotRecordUpdateTransaction,
) -> Result<(), IndexError> {
    let mut record = load_record(w, tx.id)?;

    let implicit = if record.is_expired(ctx.block_time) {
        let update = ImplicitUpdate {
            previous_expiration: record.expiration,
            removed_names: record.names.clone(),
        };
        w.put_encoded(KeyPrefix::implicit_update_key(&ctx.txid), &update);
        Some(update)
    } else {
        None
    };

    tx.update_record(ctx.block_time, &mut record)?;
    save_record(w, &record);

    match implicit.as_ref().filter(|u| !u.removed_names.is_empty()) {
        // removed names are a subset of the implicitly cleared ones
        Some(update) => {
            for name in &update.removed_names {
                unmap_name_if_owned(w, name, tx.id)?;
            }
        }
        None => {
            for name in &tx.names.remove {
                w.delete(KeyPrefix::bot_name_key(name));
            }
        }
    }
    map_names(w, ctx, &tx.names.add, tx.id)?;
    put_history(w, ctx, tx.id);

    debug!(
        "[tc-02] updated bot {} (reactivated: {}) at height {}",
        tx.id,
        implicit.is_some(),
        ctx.height
    );
    Ok(())
}

fn revert_bot_record_update<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    ctx: &TxContext,
    tx: &BotRecordUpdateTransaction,
) -> Result<(), IndexError> {
    let mut record = load_record(w, tx.id)?;
    tx.revert_record_update(&mut record)?;

    let journal_key = KeyPrefix::implicit_update_key(&ctx.txid);
    let implicit: Option<ImplicitUpdate> = w.get_decoded(&journal_key)?;
    if let Some(update) = &implicit {
        record.expiration = update.previous_expiration;
        record.add_names(&update.removed_names)?;
        w.delete(journal_key);
    }
    save_record(w, &record);

    unmap_names(w, ctx, &tx.names.add)?;
    for name in &tx.names.remove {
        w.put_encoded(KeyPrefix::bot_name_key(name), &tx.id);
    }
    if let Some(update) = &implicit {
        for name in &update.removed_names {
            map_name_if_available(w, name, tx.id)?;
        }
    }
    delete_history(w, ctx, tx.id);

    debug!("[tc-02] reverted update of bot {}", tx.id);
    Ok(())
}

// ============================================================================
// Bot Name Transfer
// ============================================================================

fn apply_bot_name_transfer<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    ctx: &TxContext,
    tx: &BotNameTransferTransaction,
) -> Result<(), IndexError> {
    let mut sender = load_record(w, tx.sender.id)?;
    tx.update_sender(ctx.block_time, &mut sender)?;
    save_record(w, &sender);
    put_history(w, ctx, sender.id);

    let mut receiver = load_record(w, tx.receiver.id)?;
    tx.update_receiver(ctx.block_time, &mut receiver)?;
    save_record(w, &receiver);
    for name in &tx.names {
        w.put_encoded(KeyPrefix::bot_name_key(name), &receiver.id);
    }
    put_history(w, ctx, receiver.id);

    debug!(
        "[tc-02] moved {} names from bot {} to bot {}",
        tx.names.len(),
        sender.id,
        receiver.id
    );
    Ok(())
}

fn revert_bot_name_transfer<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    ctx: &TxContext,
    tx: &BotNameTransferTransaction,
) -> Result<(), IndexError> {
    let mut receiver = load_record(w, tx.receiver.id)?;
    tx.revert_receiver(&mut receiver)?;
    save_record(w, &receiver);
    delete_history(w, ctx, receiver.id);

    let mut sender = load_record(w, tx.sender.id)?;
    tx.revert_sender(&mut sender)?;
    save_record(w, &sender);
    for name in &tx.names {
        w.put_encoded(KeyPrefix::bot_name_key(name), &sender.id);
    }
    delete_history(w, ctx, sender.id);
    Ok(())
}

// ============================================================================
// ERC20
// ============================================================================

fn apply_erc20_address_registration<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    tx: &Erc20AddressRegistrationTransaction,
) -> Result<(), IndexError> {
    let tft = tx.tft_address();
    let erc20 = tx.erc20_address();
    w.put_encoded(KeyPrefix::erc20_address_key(&tft), &erc20);
    w.put_encoded(KeyPrefix::tft_address_key(&erc20), &tft);
    debug!("[tc-02] registered ERC20 address {} for {}", erc20, tft);
    Ok(())
}

fn revert_erc20_address_registration<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    tx: &Erc20AddressRegistrationTransaction,
) -> Result<(), IndexError> {
    w.delete(KeyPrefix::erc20_address_key(&tx.tft_address()));
    w.delete(KeyPrefix::tft_address_key(&tx.erc20_address()));
    Ok(())
}

fn apply_erc20_coin_creation<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    ctx: &TxContext,
    tx: &Erc20CoinCreationTransaction,
) -> Result<(), IndexError> {
    w.put_encoded(KeyPrefix::erc20_transaction_key(&tx.transaction_id), &ctx.txid);
    debug!(
        "[tc-02] ERC20 transaction {} minted by {}",
        tx.transaction_id, ctx.txid
    );
    Ok(())
}

fn revert_erc20_coin_creation<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    tx: &Erc20CoinCreationTransaction,
) -> Result<(), IndexError> {
    w.delete(KeyPrefix::erc20_transaction_key(&tx.transaction_id));
    Ok(())
}

// ============================================================================
// Record and Mapping Helpers
// ============================================================================

/// Missing records of bots referenced by applied transactions mean the
/// index diverged from the chain.
fn load_record<KV: KeyValueStore + ?Sized>(
    w: &StagedWrites<'_, KV>,
    id: BotId,
) -> Result<BotRecord, IndexError> {
    w.get_decoded(&KeyPrefix::record_key(id))?
        .ok_or_else(|| IndexError::corruption(format!("record of bot {} is missing", id)))
}

fn save_record<KV: KeyValueStore + ?Sized>(w: &mut StagedWrites<'_, KV>, record: &BotRecord) {
    w.put_encoded(KeyPrefix::record_key(record.id), record);
}

fn bot_id_counter<KV: KeyValueStore + ?Sized>(w: &StagedWrites<'_, KV>) -> Result<u32, IndexError> {
    let counter = w.get(&KeyPrefix::internal_key(internal::BOT_ID_COUNTER))?;
    match counter {
        None => Ok(0),
        Some(bytes) => {
            let bytes: [u8; 4] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| IndexError::corruption("bot id counter is not 4 bytes"))?;
            Ok(u32::from_le_bytes(bytes))
        }
    }
}

fn set_bot_id_counter<KV: KeyValueStore + ?Sized>(w: &mut StagedWrites<'_, KV>, counter: u32) {
    w.put(
        KeyPrefix::internal_key(internal::BOT_ID_COUNTER),
        counter.to_le_bytes().to_vec(),
    );
}

fn put_history<KV: KeyValueStore + ?Sized>(w: &mut StagedWrites<'_, KV>, ctx: &TxContext, id: BotId) {
    w.put_encoded(
        KeyPrefix::bot_transaction_key(id, ctx.height, ctx.sequence),
        &ctx.txid,
    );
}

fn delete_history<KV: KeyValueStore + ?Sized>(w: &mut StagedWrites<'_, KV>, ctx: &TxContext, id: BotId) {
    w.delete(KeyPrefix::bot_transaction_key(id, ctx.height, ctx.sequence));
}

fn name_owner<KV: KeyValueStore + ?Sized>(
    w: &StagedWrites<'_, KV>,
    name: &BotName,
) -> Result<Option<BotId>, IndexError> {
    w.get_decoded(&KeyPrefix::bot_name_key(name))
}

/// Map `names` to `id`. Names still mapped to another (expired) bot are
/// journaled under the transaction, so revert can hand them back.
fn map_names<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    ctx: &TxContext,
    names: &[BotName],
    id: BotId,
) -> Result<(), IndexError> {
    let mut displaced = DisplacedNames::default();
    for name in names {
        match name_owner(w, name)? {
            Some(owner) if owner != id => displaced.owners.push((name.clone(), owner)),
            _ => {}
        }
        w.put_encoded(KeyPrefix::bot_name_key(name), &id);
    }
    if !displaced.owners.is_empty() {
        trace!(
            "[tc-02] transaction {} took {} names from expired bots",
            ctx.txid,
            displaced.owners.len()
        );
        w.put_encoded(KeyPrefix::displaced_names_key(&ctx.txid), &displaced);
    }
    Ok(())
}

/// Inverse of [`map_names`]: names go back to their previous owner, or are
/// unmapped if they had none.
fn unmap_names<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    ctx: &TxContext,
    names: &[BotName],
) -> Result<(), IndexError> {
    let journal_key = KeyPrefix::displaced_names_key(&ctx.txid);
    let displaced: DisplacedNames = w.get_decoded(&journal_key)?.unwrap_or_default();
    for name in names {
        match displaced.previous_owner(name) {
            Some(owner) => w.put_encoded(KeyPrefix::bot_name_key(name), &owner),
            None => w.delete(KeyPrefix::bot_name_key(name)),
        }
    }
    if !displaced.owners.is_empty() {
        w.delete(journal_key);
    }
    Ok(())
}

/// Names a bot lost on expiry may since have been taken by another bot.
fn unmap_name_if_owned<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    name: &BotName,
    id: BotId,
) -> Result<(), IndexError> {
    if name_owner(w, name)? == Some(id) {
        w.delete(KeyPrefix::bot_name_key(name));
    }
    Ok(())
}

fn map_name_if_available<KV: KeyValueStore + ?Sized>(
    w: &mut StagedWrites<'_, KV>,
    name: &BotName,
    id: BotId,
) -> Result<(), IndexError> {
    if !w.exists(&KeyPrefix::bot_name_key(name))? {
        w.put_encoded(KeyPrefix::bot_name_key(name), &id);
    }
    Ok(())
}
