//! The chain-oriented query/confirmation engine (spec §4.I).
//!
//! Presents block/transaction/chain semantics over the raw [`Catalog`]
//! tables: strong/weak tx-to-block association, spentness, coinbase
//! maturity, candidate/confirmed chain maintenance, navigational
//! lookups, and the inferred block/tx state machine of §4.I's state
//! table. Every write path takes a [`Transactor`]; reads operate
//! directly against a shared [`Store`] reference.

use crate::chain::{digest, Block, Context, Hash, Header, Output, Transaction};
use crate::error::Result;
use crate::link::{self, LinkValue};
use crate::primitives::SlabManager;
use crate::store::{Store, Transactor};
use crate::tables::schema::{ARCHIVE_LINK_WIDTH as AW, INDEX_LINK_WIDTH as IW};
use crate::tables::Catalog;

/// Chain-oriented operations over an open [`Store`].
pub struct Query<'s> {
    store: &'s Store,
}

impl<'s> Query<'s> {
    /// Builds a query engine over `store`.
    #[must_use]
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    // -- Insertion --------------------------------------------------------

    /// Inserts `header` (if new) with its chain `ctx`, returning its
    /// link. Idempotent: an existing header hash returns the existing
    /// link rather than inserting a duplicate.
    pub fn set_header(&self, header: &Header, ctx: Context) -> Result<LinkValue> {
        let mut transactor = self.store.get_transactor()?;
        Self::set_header_locked(&mut transactor, header, ctx)
    }

    fn set_header_locked(tx: &mut Transactor<'_>, header: &Header, ctx: Context) -> Result<LinkValue> {
        let hash = header.hash();
        if let Some(existing) = tx.header.first(&hash)? {
            return Ok(existing);
        }
        let mut payload = [0u8; 88];
        payload[0..4].copy_from_slice(&header.version.to_le_bytes());
        payload[4..36].copy_from_slice(&header.previous_hash);
        payload[36..68].copy_from_slice(&header.merkle_root);
        payload[68..72].copy_from_slice(&header.time.to_le_bytes());
        payload[72..76].copy_from_slice(&header.bits.to_le_bytes());
        payload[76..80].copy_from_slice(&header.nonce.to_le_bytes());
        payload[80..84].copy_from_slice(&ctx.height.to_le_bytes());
        payload[84..88].copy_from_slice(&ctx.median_time_past.to_le_bytes());
        tx.header.put(&hash, &payload)
    }

    /// Inserts `block`'s header, every transaction, and the block's
    /// tx-link vector into `txs`. Idempotent on header and tx hash
    /// collision.
    pub fn set_block(&self, block: &Block, ctx: Context) -> Result<LinkValue> {
        let mut transactor = self.store.get_transactor()?;
        let header_link = Self::set_header_locked(&mut transactor, &block.header, ctx)?;
        let mut tx_links = Vec::with_capacity(block.transactions.len());
        for transaction in &block.transactions {
            tx_links.push(Self::set_tx_locked(&mut transactor, transaction)?);
        }
        Self::set_txs_locked(&mut transactor, header_link, &tx_links)?;
        Ok(header_link)
    }

    fn set_txs_locked(tx: &mut Transactor<'_>, header_link: LinkValue, links: &[LinkValue]) -> Result<()> {
        let mut key = vec![0u8; AW];
        link::write_le(header_link, AW, &mut key);
        if tx.txs.exists(&key)? {
            return Ok(());
        }
        let slabs = SlabManager;
        let mut bytes = Vec::with_capacity(links.len() * AW);
        for &link_value in links {
            let mut buf = vec![0u8; AW];
            link::write_le(link_value, AW, &mut buf);
            bytes.extend_from_slice(&buf);
        }
        let slab_link = slabs.allocate(tx.txs.body(), bytes.len() as u64, AW)?;
        if !bytes.is_empty() {
            slabs
                .get_mut(tx.txs.body(), slab_link, bytes.len())?
                .as_mut_slice()
                .copy_from_slice(&bytes);
        }
        let mut payload = vec![0u8; AW + 4];
        link::write_le(slab_link, AW, &mut payload[..AW]);
        payload[AW..AW + 4].copy_from_slice(&(links.len() as u32).to_le_bytes());
        tx.txs.put(&key, &payload)?;
        Ok(())
    }

    /// Inserts `transaction`'s record, outputs, and inputs. Idempotent
    /// on tx hash collision (the existing tx link is reused).
    pub fn set_tx(&self, transaction: &Transaction) -> Result<LinkValue> {
        let mut transactor = self.store.get_transactor()?;
        Self::set_tx_locked(&mut transactor, transaction)
    }

    fn set_tx_locked(tx: &mut Transactor<'_>, transaction: &Transaction) -> Result<LinkValue> {
        let hash = transaction.hash();
        if let Some(existing) = tx.tx.first(&hash)? {
            return Ok(existing);
        }

        // The tx's own link is allocated but not published yet, so that
        // outputs and inputs below can embed it as their owning-tx
        // field before the tx record itself becomes visible to readers.
        let tx_link = tx.tx.allocate()?;

        let slabs = SlabManager;
        let mut first_output = link::terminal(AW);
        for (index, output) in transaction.outputs.iter().enumerate() {
            let script_link = slabs.allocate(tx.output.body(), output.script.len() as u64, AW)?;
            if !output.script.is_empty() {
                slabs
                    .get_mut(tx.output.body(), script_link, output.script.len())?
                    .as_mut_slice()
                    .copy_from_slice(&output.script);
            }
            let mut record = vec![0u8; 8 + AW + 4 + AW];
            record[0..8].copy_from_slice(&output.value.to_le_bytes());
            link::write_le(script_link, AW, &mut record[8..8 + AW]);
            record[8 + AW..12 + AW].copy_from_slice(&(output.script.len() as u32).to_le_bytes());
            link::write_le(tx_link, AW, &mut record[12 + AW..12 + 2 * AW]);
            let output_link = tx.output.push(&record)?;
            if index == 0 {
                first_output = output_link;
            }
        }

        let mut first_input = link::terminal(AW);
        for (index, input) in transaction.inputs.iter().enumerate() {
            let point_fk = if input.is_coinbase() {
                link::terminal(AW)
            } else {
                Self::ensure_point_locked(tx, &input.previous_output.hash)?
            };
            let mut key = vec![0u8; AW + 4];
            link::write_le(point_fk, AW, &mut key[..AW]);
            key[AW..AW + 4].copy_from_slice(&input.previous_output.index.to_le_bytes());

            let script_link = slabs.allocate(tx.input.body(), input.script.len() as u64, AW)?;
            if !input.script.is_empty() {
                slabs
                    .get_mut(tx.input.body(), script_link, input.script.len())?
                    .as_mut_slice()
                    .copy_from_slice(&input.script);
            }
            let witness_bytes: Vec<u8> = input.witness.iter().flat_map(|item| item.iter().copied()).collect();
            let witness_link = slabs.allocate(tx.input.body(), witness_bytes.len() as u64, AW)?;
            if !witness_bytes.is_empty() {
                slabs
                    .get_mut(tx.input.body(), witness_link, witness_bytes.len())?
                    .as_mut_slice()
                    .copy_from_slice(&witness_bytes);
            }

            // Layout: [owner_tx][sequence][script_link][script_len][witness_link][witness_len]
            let mut payload = vec![0u8; AW + 4 + AW + 4 + AW + 4];
            link::write_le(tx_link, AW, &mut payload[0..AW]);
            payload[AW..AW + 4].copy_from_slice(&input.sequence.to_le_bytes());
            link::write_le(script_link, AW, &mut payload[AW + 4..2 * AW + 4]);
            payload[2 * AW + 4..2 * AW + 8].copy_from_slice(&(input.script.len() as u32).to_le_bytes());
            link::write_le(witness_link, AW, &mut payload[2 * AW + 8..3 * AW + 8]);
            payload[3 * AW + 8..3 * AW + 12].copy_from_slice(&(witness_bytes.len() as u32).to_le_bytes());

            let input_link = tx.input.put(&key, &payload)?;
            if index == 0 {
                first_input = input_link;
            }
        }

        let mut puts_record = vec![0u8; AW + 4 + AW + 4];
        link::write_le(first_input, AW, &mut puts_record[..AW]);
        puts_record[AW..AW + 4].copy_from_slice(&(transaction.inputs.len() as u32).to_le_bytes());
        link::write_le(first_output, AW, &mut puts_record[AW + 4..2 * AW + 4]);
        puts_record[2 * AW + 4..2 * AW + 8].copy_from_slice(&(transaction.outputs.len() as u32).to_le_bytes());
        let puts_link = tx.puts.push(&puts_record)?;

        let mut tx_payload = vec![0u8; 4 + 4 + 4 + 4 + AW];
        tx_payload[0..4].copy_from_slice(&transaction.version.to_le_bytes());
        tx_payload[4..8].copy_from_slice(&transaction.locktime.to_le_bytes());
        tx_payload[8..12].copy_from_slice(&(transaction.inputs.len() as u32).to_le_bytes());
        tx_payload[12..16].copy_from_slice(&(transaction.outputs.len() as u32).to_le_bytes());
        link::write_le(puts_link, AW, &mut tx_payload[16..16 + AW]);

        tx.tx.commit(tx_link, &hash, &tx_payload)?;
        Ok(tx_link)
    }

    fn ensure_point_locked(tx: &mut Transactor<'_>, hash: &[u8; 32]) -> Result<LinkValue> {
        if let Some(existing) = tx.point.first(hash)? {
            return Ok(existing);
        }
        tx.point.put(hash, &[0u8])
    }

    /// Inserts the genesis block at height zero and marks it strong,
    /// candidate, and confirmed in one call.
    pub fn initialize(&self, genesis: &Block) -> Result<LinkValue> {
        let header_link = self.set_block(genesis, Context { height: 0, median_time_past: genesis.header.time })?;
        self.set_strong(header_link)?;
        self.push_candidate(header_link)?;
        self.push_confirmed(header_link)?;
        Ok(header_link)
    }

    /// True iff a genesis entry has been pushed onto `candidate`.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.top_candidate() > 0
    }

    // -- Strong/weak association --------------------------------------------

    /// Marks every transaction in `header_link`'s block as strong to
    /// it. Returns `false` if the header has no associated `txs` entry.
    pub fn set_strong(&self, header_link: LinkValue) -> Result<bool> {
        let mut transactor = self.store.get_transactor()?;
        let Some(tx_links) = Self::read_txs(&transactor, header_link)? else {
            return Ok(false);
        };
        for tx_link in tx_links {
            let mut key = vec![0u8; AW];
            link::write_le(tx_link, AW, &mut key);
            let mut payload = vec![0u8; AW];
            link::write_le(header_link, AW, &mut payload);
            transactor.strong_tx.put(&key, &payload)?;
        }
        Ok(true)
    }

    /// Masks every transaction in `header_link`'s block as unstrong
    /// (terminal). Returns `false` if the header has no associated
    /// `txs` entry.
    pub fn set_unstrong(&self, header_link: LinkValue) -> Result<bool> {
        let mut transactor = self.store.get_transactor()?;
        let Some(tx_links) = Self::read_txs(&transactor, header_link)? else {
            return Ok(false);
        };
        for tx_link in tx_links {
            let mut key = vec![0u8; AW];
            link::write_le(tx_link, AW, &mut key);
            let mut payload = vec![0u8; AW];
            link::write_le(link::terminal(AW), AW, &mut payload);
            transactor.strong_tx.put(&key, &payload)?;
        }
        Ok(true)
    }

    fn read_txs(catalog: &Catalog, header_link: LinkValue) -> Result<Option<Vec<LinkValue>>> {
        let mut key = vec![0u8; AW];
        link::write_le(header_link, AW, &mut key);
        let Some(record_link) = catalog.txs.first(&key)? else {
            return Ok(None);
        };
        let payload = catalog.txs.payload(record_link)?;
        let slab_link = link::read_le(&payload[..AW], AW);
        let count = u32::from_le_bytes(payload[AW..AW + 4].try_into().unwrap()) as usize;
        if count == 0 {
            return Ok(Some(Vec::new()));
        }
        let slabs = SlabManager;
        let bytes = slabs.get(catalog.txs.body(), slab_link)?.as_slice(count * AW).to_vec();
        let links = bytes.chunks_exact(AW).map(|chunk| link::read_le(chunk, AW)).collect();
        Ok(Some(links))
    }

    /// The non-terminal header link `strong_tx` most recently recorded
    /// for `tx_link`, if any.
    pub fn to_strong_by(&self, tx_link: LinkValue) -> Result<Option<LinkValue>> {
        let catalog = self.store.catalog();
        let mut key = vec![0u8; AW];
        link::write_le(tx_link, AW, &mut key);
        let Some(record_link) = catalog.strong_tx.first(&key)? else {
            return Ok(None);
        };
        let payload = catalog.strong_tx.payload(record_link)?;
        let header_link = link::read_le(&payload, AW);
        if link::is_terminal(header_link, AW) {
            Ok(None)
        } else {
            Ok(Some(header_link))
        }
    }

    /// True iff `tx_link` currently has a non-terminal strong
    /// association to some header.
    pub fn is_strong(&self, tx_link: LinkValue) -> Result<bool> {
        Ok(self.to_strong_by(tx_link)?.is_some())
    }

    // -- Navigation ---------------------------------------------------------

    /// The owning transaction's link for the input at `input_link`.
    pub fn to_input_tx(&self, input_link: LinkValue) -> Result<LinkValue> {
        let catalog = self.store.catalog();
        let payload = catalog.input.payload(input_link)?;
        Ok(link::read_le(&payload[0..AW], AW))
    }

    /// The owning transaction's link for the output at `output_link`.
    pub fn to_output_tx(&self, output_link: LinkValue) -> Result<LinkValue> {
        let catalog = self.store.catalog();
        let read = catalog.output.get(output_link)?;
        let bytes = read.bytes();
        Ok(link::read_le(&bytes[12 + AW..12 + 2 * AW], AW))
    }

    /// The `(point_fk, index)` the input at `input_link` was inserted
    /// keyed under, i.e. the outpoint it spends. `point_fk` is
    /// [`link::terminal`] for a coinbase input.
    pub fn to_prevout(&self, input_link: LinkValue) -> Result<(LinkValue, u32)> {
        let catalog = self.store.catalog();
        let key = catalog.input.key(input_link)?;
        let point_fk = link::read_le(&key[..AW], AW);
        let index = u32::from_le_bytes(key[AW..AW + 4].try_into().unwrap());
        Ok((point_fk, index))
    }

    /// The transaction link of the transaction that owns the previous
    /// output referenced by `input_link`, if that transaction has been
    /// stored.
    pub fn to_prevout_tx(&self, input_link: LinkValue) -> Result<Option<LinkValue>> {
        let (point_fk, _) = self.to_prevout(input_link)?;
        if link::is_terminal(point_fk, AW) {
            return Ok(None);
        }
        let catalog = self.store.catalog();
        let hash: [u8; 32] = catalog.point.key(point_fk)?.try_into().unwrap();
        catalog.tx.first(&hash)
    }

    /// Every input link that references `(point_fk, index)`, newest
    /// first.
    pub fn to_spenders(&self, point_fk: LinkValue, index: u32) -> Result<Vec<LinkValue>> {
        let catalog = self.store.catalog();
        let mut key = vec![0u8; AW + 4];
        link::write_le(point_fk, AW, &mut key[..AW]);
        key[AW..AW + 4].copy_from_slice(&index.to_le_bytes());
        catalog.input.iter(&key).collect()
    }

    /// Every input link belonging to `tx_link`, in insertion order.
    pub fn to_tx_inputs(&self, tx_link: LinkValue) -> Result<Vec<LinkValue>> {
        let catalog = self.store.catalog();
        let payload = catalog.tx.payload(tx_link)?;
        let puts_link = link::read_le(&payload[16..16 + AW], AW);
        let puts = catalog.puts.get(puts_link)?;
        let bytes = puts.bytes();
        let first_input = link::read_le(&bytes[..AW], AW);
        let count = u32::from_le_bytes(bytes[AW..AW + 4].try_into().unwrap());
        Ok((0..count).map(|i| first_input + u64::from(i)).collect())
    }

    /// Every output link belonging to `tx_link`, in insertion order.
    pub fn to_tx_outputs(&self, tx_link: LinkValue) -> Result<Vec<LinkValue>> {
        let catalog = self.store.catalog();
        let payload = catalog.tx.payload(tx_link)?;
        let puts_link = link::read_le(&payload[16..16 + AW], AW);
        let puts = catalog.puts.get(puts_link)?;
        let bytes = puts.bytes();
        let first_output = link::read_le(&bytes[AW + 4..2 * AW + 4], AW);
        let count = u32::from_le_bytes(bytes[2 * AW + 4..].try_into().unwrap());
        Ok((0..count).map(|i| first_output + u64::from(i)).collect())
    }

    /// Every transaction link in `header_link`'s block, in block order.
    pub fn to_transactions(&self, header_link: LinkValue) -> Result<Vec<LinkValue>> {
        Ok(Self::read_txs(&self.store.catalog(), header_link)?.unwrap_or_default())
    }

    /// Every input link across every transaction in `header_link`'s
    /// block.
    pub fn to_block_inputs(&self, header_link: LinkValue) -> Result<Vec<LinkValue>> {
        let mut inputs = Vec::new();
        for tx_link in self.to_transactions(header_link)? {
            inputs.extend(self.to_tx_inputs(tx_link)?);
        }
        Ok(inputs)
    }

    /// Every output link across every transaction in `header_link`'s
    /// block.
    pub fn to_block_outputs(&self, header_link: LinkValue) -> Result<Vec<LinkValue>> {
        let mut outputs = Vec::new();
        for tx_link in self.to_transactions(header_link)? {
            outputs.extend(self.to_tx_outputs(tx_link)?);
        }
        Ok(outputs)
    }

    /// The header link for `hash`, if stored.
    pub fn to_header(&self, hash: &[u8; 32]) -> Result<Option<LinkValue>> {
        self.store.catalog().header.first(hash)
    }

    /// The transaction link for `hash`, if stored.
    pub fn to_tx(&self, hash: &[u8; 32]) -> Result<Option<LinkValue>> {
        self.store.catalog().tx.first(hash)
    }

    /// The point link recorded for `hash`, if any transaction has
    /// referenced it as a previous outpoint.
    pub fn to_point(&self, hash: &[u8; 32]) -> Result<Option<LinkValue>> {
        self.store.catalog().point.first(hash)
    }

    // -- Spentness and maturity ----------------------------------------------

    /// True iff any *other* input spending the same `(point_fk, index)`
    /// composite belongs to a strong transaction. The input identified
    /// by `self_input_link` is excluded so a transaction's own inputs
    /// never make themselves appear spent (mempool-style idempotence).
    pub fn is_spent(&self, point_fk: LinkValue, index: u32, self_input_link: LinkValue) -> Result<bool> {
        let catalog = self.store.catalog();
        let mut key = vec![0u8; AW + 4];
        link::write_le(point_fk, AW, &mut key[..AW]);
        key[AW..AW + 4].copy_from_slice(&index.to_le_bytes());
        for candidate in catalog.input.iter(&key) {
            let candidate_link = candidate?;
            if candidate_link == self_input_link {
                continue;
            }
            let payload = catalog.input.payload(candidate_link)?;
            let owner_tx = link::read_le(&payload[0..AW], AW);
            if self.is_strong(owner_tx)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True iff a coinbase-spending input is old enough to spend:
    /// either the previous output is not itself a coinbase output, or
    /// the spender is at least `coinbase_maturity` blocks past the
    /// coinbase's height.
    #[must_use]
    pub fn is_mature(&self, is_coinbase_prevout: bool, prevout_height: u32, spender_height: u32) -> bool {
        if !is_coinbase_prevout {
            return true;
        }
        let maturity = self.store.settings().coinbase_maturity;
        spender_height >= prevout_height + maturity
    }

    /// The chain height recorded in `header_link`'s own archive entry
    /// (the `ctx.height` passed to [`Self::set_header`]).
    pub fn header_height(&self, header_link: LinkValue) -> Result<u32> {
        let catalog = self.store.catalog();
        let payload = catalog.header.payload(header_link)?;
        Ok(u32::from_le_bytes(payload[80..84].try_into().unwrap()))
    }

    /// True iff the prevout's owning tx is coinbase, per the `tx`
    /// archive's own input count and that single input's point.
    fn is_coinbase_tx(&self, tx_link: LinkValue) -> Result<bool> {
        let payload = self.store.catalog().tx.payload(tx_link)?;
        let input_count = u32::from_le_bytes(payload[8..12].try_into().unwrap());
        if input_count != 1 {
            return Ok(false);
        }
        let first_input_link = self.to_tx_inputs(tx_link)?[0];
        let (point_fk, _) = self.to_prevout(first_input_link)?;
        Ok(link::is_terminal(point_fk, AW))
    }

    /// Spec §4.I `is_mature(input_link, spender_height)`: a null
    /// (coinbase) input is always mature; otherwise resolves the
    /// prevout transaction's strong header and height, requiring
    /// `coinbase_maturity` confirmations if that prevout was itself a
    /// coinbase output.
    pub fn is_input_mature(&self, input_link: LinkValue, spender_height: u32) -> Result<bool> {
        let (point_fk, _) = self.to_prevout(input_link)?;
        if link::is_terminal(point_fk, AW) {
            return Ok(true);
        }
        let Some(prevout_tx_link) = self.to_prevout_tx(input_link)? else {
            return Ok(false);
        };
        let Some(prevout_header) = self.to_strong_by(prevout_tx_link)? else {
            return Ok(false);
        };
        let prevout_height = self.header_height(prevout_header)?;
        let prevout_is_coinbase = self.is_coinbase_tx(prevout_tx_link)?;
        Ok(self.is_mature(prevout_is_coinbase, prevout_height, spender_height))
    }

    /// True iff every non-coinbase input across every transaction in
    /// `header_link`'s block references an existing, mature, unspent
    /// prevout, as if the block were about to be confirmed at `height`.
    /// Assumes validity has already been established upstream (script
    /// evaluation is out of scope, per spec.md §1).
    pub fn is_confirmable_block(&self, header_link: LinkValue, height: u32) -> Result<bool> {
        for input_link in self.to_block_inputs(header_link)? {
            let (point_fk, index) = self.to_prevout(input_link)?;
            if link::is_terminal(point_fk, AW) {
                continue; // coinbase input, always mature and never spent
            }
            if self.to_prevout_tx(input_link)?.is_none() {
                return Ok(false); // referenced prevout tx not stored
            }
            if self.is_spent(point_fk, index, input_link)? {
                return Ok(false);
            }
            if !self.is_input_mature(input_link, height)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // -- Candidate / confirmed chains -----------------------------------------

    /// Appends `header_link` to the tail of `candidate`.
    pub fn push_candidate(&self, header_link: LinkValue) -> Result<()> {
        let transactor = self.store.get_transactor()?;
        let mut record = vec![0u8; AW];
        link::write_le(header_link, AW, &mut record);
        transactor.candidate.push(&record)?;
        Ok(())
    }

    /// Removes the tail entry of `candidate`.
    pub fn pop_candidate(&self) -> Result<()> {
        let transactor = self.store.get_transactor()?;
        transactor.candidate.pop();
        Ok(())
    }

    /// Appends `header_link` to the tail of `confirmed`.
    pub fn push_confirmed(&self, header_link: LinkValue) -> Result<()> {
        let transactor = self.store.get_transactor()?;
        let mut record = vec![0u8; AW];
        link::write_le(header_link, AW, &mut record);
        transactor.confirmed.push(&record)?;
        Ok(())
    }

    /// Removes the tail entry of `confirmed`.
    pub fn pop_confirmed(&self) -> Result<()> {
        let transactor = self.store.get_transactor()?;
        transactor.confirmed.pop();
        Ok(())
    }

    /// The header link at `height` in `candidate`, if populated.
    pub fn to_candidate(&self, height: LinkValue) -> Result<Option<LinkValue>> {
        Self::read_positional_link(&self.store.catalog().candidate, height)
    }

    /// The header link at `height` in `confirmed`, if populated.
    pub fn to_confirmed(&self, height: LinkValue) -> Result<Option<LinkValue>> {
        Self::read_positional_link(&self.store.catalog().confirmed, height)
    }

    fn read_positional_link(table: &crate::tables::ArraymapTable, position: LinkValue) -> Result<Option<LinkValue>> {
        let read = table.get(position)?;
        if read.is_exhausted() {
            Ok(None)
        } else {
            Ok(Some(link::read_le(&read.bytes(), AW)))
        }
    }

    /// True iff `candidate[height] == header_link`.
    pub fn is_candidate_block(&self, header_link: LinkValue, height: LinkValue) -> Result<bool> {
        Ok(self.to_candidate(height)?.map(|link| link == header_link).unwrap_or(false))
    }

    /// True iff `confirmed[height] == header_link` and every tx in the
    /// block is currently strong to it.
    pub fn is_confirmed_block(&self, header_link: LinkValue, height: LinkValue) -> Result<bool> {
        if self.to_confirmed(height)?.map(|link| link != header_link).unwrap_or(true) {
            return Ok(false);
        }
        self.is_strong_association(header_link)
    }

    /// One past the highest populated index in `candidate`.
    #[must_use]
    pub fn top_candidate(&self) -> u64 {
        self.store.catalog().candidate.count()
    }

    /// One past the highest populated index in `confirmed`.
    #[must_use]
    pub fn top_confirmed(&self) -> u64 {
        self.store.catalog().confirmed.count()
    }

    /// Height of the tip of `candidate`, if any.
    #[must_use]
    pub fn get_top_candidate(&self) -> Option<u64> {
        self.top_candidate().checked_sub(1)
    }

    /// Height of the tip of `confirmed`, if any.
    #[must_use]
    pub fn get_top_confirmed(&self) -> Option<u64> {
        self.top_confirmed().checked_sub(1)
    }

    // -- Inferred state machine (spec §4.I) -----------------------------------

    /// True iff `hash` has a `header` entry.
    pub fn is_header(&self, hash: &[u8; 32]) -> Result<bool> {
        self.store.catalog().header.exists(hash)
    }

    /// True iff `header_link` has an associated `txs` entry (the block
    /// body has been stored, not merely the header).
    pub fn is_block(&self, header_link: LinkValue) -> Result<bool> {
        Ok(Self::read_txs(&self.store.catalog(), header_link)?.is_some())
    }

    /// True iff `hash` has a `tx` entry.
    pub fn is_tx(&self, hash: &[u8; 32]) -> Result<bool> {
        self.store.catalog().tx.exists(hash)
    }

    /// True iff `header_link`'s `txs` entry is present (alias of
    /// [`Self::is_block`], named per the §4.I state table's
    /// "associated" state).
    pub fn is_associated(&self, header_link: LinkValue) -> Result<bool> {
        self.is_block(header_link)
    }

    /// True iff every tx of `header_link`'s block is currently strong
    /// to it.
    pub fn is_strong_association(&self, header_link: LinkValue) -> Result<bool> {
        let catalog = self.store.catalog();
        let Some(tx_links) = Self::read_txs(&catalog, header_link)? else {
            return Ok(false);
        };
        drop(catalog);
        for tx_link in tx_links {
            if self.to_strong_by(tx_link)?.map(|link| link != header_link).unwrap_or(true) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // -- Optional tables: address, neutrino, buffer, bootstrap --------------

    /// The `address` table's key for `output`: a hash of its locking
    /// script. Terminal-safe natural key, grounded on
    /// `query.hpp`'s `address_hash(const output&)`.
    #[must_use]
    pub fn address_hash(output: &Output) -> Hash {
        digest(&output.script)
    }

    /// The output link indexed under `key` in the `address` table, if
    /// any (optional table: absent unless address indexing is enabled
    /// by the caller inserting entries via [`Self::set_address`]).
    pub fn get_address(&self, key: &Hash) -> Result<Option<LinkValue>> {
        self.store.catalog().address.first(key)
    }

    /// Indexes `output_link` under `key` in the `address` table.
    pub fn set_address(&self, key: &Hash, output_link: LinkValue) -> Result<()> {
        let mut transactor = self.store.get_transactor()?;
        let mut payload = vec![0u8; AW];
        link::write_le(output_link, AW, &mut payload);
        transactor.address.put(key, &payload)?;
        Ok(())
    }

    /// Convenience over [`Self::set_address`]: indexes `output` (at
    /// `output_link`) under its own script hash.
    pub fn set_address_for_output(&self, output_link: LinkValue, output: &Output) -> Result<()> {
        self.set_address(&Self::address_hash(output), output_link)
    }

    /// The compact filter body stored for `header_link`, if the
    /// `neutrino` cache has an entry for it.
    pub fn get_filter(&self, header_link: LinkValue) -> Result<Option<Vec<u8>>> {
        let catalog = self.store.catalog();
        let read = catalog.neutrino.get(header_link)?;
        if read.is_exhausted() {
            return Ok(None);
        }
        let bytes = read.bytes();
        let len = u32::from_le_bytes(bytes[32 + IW..32 + IW + 4].try_into().unwrap());
        if len == 0 {
            return Ok(Some(Vec::new()));
        }
        let slab_link = link::read_le(&bytes[32..32 + IW], IW);
        let slabs = SlabManager;
        Ok(Some(slabs.get(catalog.neutrino.body(), slab_link)?.as_slice(len as usize).to_vec()))
    }

    /// The filter header hash stored for `header_link`, if any.
    pub fn get_filter_head(&self, header_link: LinkValue) -> Result<Option<Hash>> {
        let catalog = self.store.catalog();
        let read = catalog.neutrino.get(header_link)?;
        if read.is_exhausted() {
            return Ok(None);
        }
        Ok(Some(read.bytes()[..32].try_into().unwrap()))
    }

    /// Caches a compact filter `head` hash and `body` bytes for
    /// `header_link`.
    pub fn set_filter(&self, header_link: LinkValue, head: &Hash, body: &[u8]) -> Result<()> {
        let transactor = self.store.get_transactor()?;
        let slabs = SlabManager;
        let slab_link = slabs.allocate(transactor.neutrino.body(), body.len() as u64, IW)?;
        if !body.is_empty() {
            slabs
                .get_mut(transactor.neutrino.body(), slab_link, body.len())?
                .as_mut_slice()
                .copy_from_slice(body);
        }
        let mut record = vec![0u8; 32 + IW + 4];
        record[..32].copy_from_slice(head);
        link::write_le(slab_link, IW, &mut record[32..32 + IW]);
        record[32 + IW..].copy_from_slice(&(body.len() as u32).to_le_bytes());
        transactor.neutrino.set_at(header_link, &record)
    }

    /// The buffered (unconfirmed, not yet archived through
    /// [`Self::set_tx`]) transaction cached at `tx_link`, if any.
    pub fn get_buffered_tx(&self, tx_link: LinkValue) -> Result<Option<Transaction>> {
        let catalog = self.store.catalog();
        let read = catalog.buffer.get(tx_link)?;
        if read.is_exhausted() {
            return Ok(None);
        }
        let bytes = read.bytes();
        let len = u32::from_le_bytes(bytes[IW..IW + 4].try_into().unwrap());
        if len == 0 {
            return Ok(None);
        }
        let slab_link = link::read_le(&bytes[..IW], IW);
        let slabs = SlabManager;
        let encoded = slabs.get(catalog.buffer.body(), slab_link)?.as_slice(len as usize).to_vec();
        Ok(Transaction::decode(&encoded))
    }

    /// Caches `tx` at position `tx_link` in the `buffer` table.
    pub fn set_buffered_tx(&self, tx_link: LinkValue, tx: &Transaction) -> Result<()> {
        let transactor = self.store.get_transactor()?;
        let encoded = tx.encode();
        let slabs = SlabManager;
        let slab_link = slabs.allocate(transactor.buffer.body(), encoded.len() as u64, IW)?;
        if !encoded.is_empty() {
            slabs
                .get_mut(transactor.buffer.body(), slab_link, encoded.len())?
                .as_mut_slice()
                .copy_from_slice(&encoded);
        }
        let mut record = vec![0u8; IW + 4];
        link::write_le(slab_link, IW, &mut record[..IW]);
        record[IW..].copy_from_slice(&(encoded.len() as u32).to_le_bytes());
        transactor.buffer.set_at(tx_link, &record)
    }

    /// Every confirmed header hash from height 0 up to (excluding) the
    /// current `bootstrap` cache's populated prefix.
    pub fn get_bootstrap(&self) -> Result<Vec<Hash>> {
        let catalog = self.store.catalog();
        let count = catalog.bootstrap.count();
        let mut hashes = Vec::with_capacity(count as usize);
        for position in 0..count {
            let read = catalog.bootstrap.get(position)?;
            hashes.push(read.bytes()[..32].try_into().unwrap());
        }
        Ok(hashes)
    }

    /// Appends the confirmed header hash at `height` to the `bootstrap`
    /// cache. Returns `false` (without writing) if `height` is not yet
    /// confirmed.
    pub fn set_bootstrap(&self, height: u64) -> Result<bool> {
        let Some(header_link) = self.to_confirmed(height)? else {
            return Ok(false);
        };
        let transactor = self.store.get_transactor()?;
        let hash = Self::recompute_header_hash(&transactor, header_link)?;
        transactor.bootstrap.push(&hash)?;
        Ok(true)
    }

    fn recompute_header_hash(catalog: &Catalog, header_link: LinkValue) -> Result<Vec<u8>> {
        let payload = catalog.header.payload(header_link)?;
        let header = Header {
            version: u32::from_le_bytes(payload[0..4].try_into().unwrap()),
            previous_hash: payload[4..36].try_into().unwrap(),
            merkle_root: payload[36..68].try_into().unwrap(),
            time: u32::from_le_bytes(payload[68..72].try_into().unwrap()),
            bits: u32::from_le_bytes(payload[72..76].try_into().unwrap()),
            nonce: u32::from_le_bytes(payload[76..80].try_into().unwrap()),
        };
        Ok(header.hash().to_vec())
    }
}
