//! State commitment — a single digest over the whole exchange state
//!
//! Replicas executing the same operations must hold identical state; the
//! state root lets them compare with one 32-byte value. It covers the
//! ledger (balances and custody totals), the token registry, every book
//! slot including tombstones, and the insertion sequencer.
//!
//! Variable-length fields are length-prefixed and every section is tagged,
//! so distinct states never serialize to the same byte stream.

use matching_engine::{Markets, OrderBook};
use sha2::{Digest, Sha256};
use types::order::Side;

use crate::ledger::{Asset, Ledger};
use crate::registry::TokenRegistry;

const TAG_LEDGER: u8 = 0x01;
const TAG_CUSTODY: u8 = 0x02;
const TAG_REGISTRY: u8 = 0x03;
const TAG_MARKETS: u8 = 0x04;

/// Incremental SHA-256 over tagged, length-prefixed fields
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    pub fn tag(&mut self, tag: u8) -> &mut Self {
        self.hasher.update([tag]);
        self
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.hasher.update((bytes.len() as u64).to_be_bytes());
        self.hasher.update(bytes);
        self
    }

    pub fn str(&mut self, s: &str) -> &mut Self {
        self.bytes(s.as_bytes())
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.hasher.update(value.to_be_bytes());
        self
    }

    pub fn u128(&mut self, value: u128) -> &mut Self {
        self.hasher.update(value.to_be_bytes());
        self
    }

    pub fn asset(&mut self, asset: &Asset) -> &mut Self {
        match asset {
            Asset::Ether => self.tag(0),
            Asset::Token(symbol) => self.tag(1).str(symbol.as_str()),
        }
    }

    pub fn finish(self) -> [u8; 32] {
        self.hasher.finalize().into()
    }
}

impl Default for StateHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Commit to ledger, registry and books.
///
/// Every collection iterated here is ordered, so the root depends only on
/// the state and never on insertion history of hash maps.
pub fn state_root(ledger: &Ledger, registry: &TokenRegistry, markets: &Markets) -> [u8; 32] {
    let mut h = StateHasher::new();

    h.tag(TAG_LEDGER);
    for (account, assets) in ledger.accounts() {
        h.str(account.as_str()).u64(assets.len() as u64);
        for (asset, balance) in assets {
            h.asset(asset).u128(balance.available).u128(balance.reserved);
        }
    }

    h.tag(TAG_CUSTODY);
    for (asset, total) in ledger.custody_totals() {
        h.asset(asset).u128(*total);
    }

    h.tag(TAG_REGISTRY).u64(registry.len() as u64);
    for (symbol, token) in registry.entries() {
        h.str(symbol.as_str()).str(token.as_str());
    }

    h.tag(TAG_MARKETS).u64(markets.next_sequence());
    for (symbol, market) in markets.iter() {
        h.str(symbol.as_str());
        hash_book(&mut h, market.book(Side::Buy));
        hash_book(&mut h, market.book(Side::Sell));
    }

    h.finish()
}

fn hash_book(h: &mut StateHasher, book: &OrderBook) {
    h.tag(book.side().tag()).u64(book.len() as u64);
    for order in book.iter() {
        h.bytes(order.key.as_bytes())
            .str(order.owner.as_str())
            .u128(order.price.get())
            .u128(order.original_volume.get())
            .u128(order.remaining_volume.get())
            .u128(order.filled.get())
            .u64(order.sequence)
            .tag(order.state.tag());
    }
}
