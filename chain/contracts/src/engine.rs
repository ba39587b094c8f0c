//! Matching engine — validate, reserve, match, settle, rest
//!
//! Turns a buy or sell intent into fills against the opposite book and
//! balance movements in the ledger. A submission is all-or-nothing:
//!
//! 1. Validate the intent and reserve the giving asset in a ledger batch.
//! 2. Plan the fills read-only and stage each fill's settlement.
//! 3. Check that a remainder could rest.
//! 4. Only then mutate: apply the plan to the book, rest the remainder,
//!    commit the ledger batch.
//!
//! Any error in steps 1 to 3 drops the batch, leaving no trace.

use matching_engine::{plan_match, Markets};
use tracing::{debug, info};
use types::errors::ExchangeError;
use types::ids::{Address, OrderKey, Symbol};
use types::numeric::{Price, Volume};
use types::order::{OrderResult, Side};
use types::trade::Fill;

use crate::events::ExchangeEvent;
use crate::ledger::{Asset, Ledger, LedgerBatch};

/// Order books plus the submission and cancellation logic over them
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    markets: Markets,
    emit_fill_events: bool,
}

impl MatchingEngine {
    pub fn new(starting_sequence: u64, emit_fill_events: bool) -> Self {
        Self {
            markets: Markets::new(starting_sequence),
            emit_fill_events,
        }
    }

    pub fn markets(&self) -> &Markets {
        &self.markets
    }

    /// Create the empty books for a newly registered token
    pub fn open_market(&mut self, symbol: &Symbol) {
        self.markets.open(symbol);
    }

    /// Submit a limit order for `volume` tokens at `price`.
    ///
    /// Returns the outcome and the events to append, in order.
    pub fn submit(
        &mut self,
        ledger: &mut Ledger,
        caller: &Address,
        symbol: &Symbol,
        side: Side,
        price: Price,
        volume: Volume,
    ) -> Result<(OrderResult, Vec<ExchangeEvent>), ExchangeError> {
        if price.is_zero() {
            return Err(ExchangeError::invalid_order("price must be nonzero"));
        }
        if volume.is_zero() {
            return Err(ExchangeError::invalid_order("volume must be nonzero"));
        }
        let market = self
            .markets
            .get(symbol)
            .ok_or_else(|| ExchangeError::UnknownToken {
                symbol: symbol.to_string(),
            })?;
        let notional = price
            .checked_notional(volume)
            .ok_or_else(|| ExchangeError::arithmetic("order notional"))?;

        let token = Asset::Token(symbol.clone());
        let resting_side = side.opposite();

        let mut batch = ledger.batch();
        match side {
            Side::Buy => batch.reserve(caller, &Asset::Ether, notional)?,
            Side::Sell => batch.reserve(caller, &token, volume.get())?,
        }

        let plan = plan_match(market.book(resting_side), caller, price, volume);
        for fill in &plan.fills {
            settle_fill(&mut batch, &token, price, fill)?;
        }

        let residual_key = if plan.is_fully_filled() {
            None
        } else {
            Some(self.markets.next_order_key(symbol, caller, side)?)
        };
        let writes = batch.finish();

        // Nothing below can fail for a plan computed against the current book.
        self.markets
            .get_mut(symbol)
            .ok_or_else(|| ExchangeError::UnknownToken {
                symbol: symbol.to_string(),
            })?
            .apply_plan(resting_side, &plan)?;

        if residual_key.is_some() {
            self.markets
                .rest(symbol, caller, side, price, plan.remaining)?;
        }
        ledger.commit(writes);

        let mut events = Vec::with_capacity(plan.fills.len() + 1);
        if self.emit_fill_events {
            events.extend(plan.fills.iter().map(|fill| ExchangeEvent::OrderMatched {
                symbol: symbol.clone(),
                maker_key: fill.maker_key,
                maker: fill.maker.clone(),
                taker: fill.taker.clone(),
                taker_side: fill.taker_side,
                price: fill.price,
                volume: fill.volume,
            }));
        }

        let result = match residual_key {
            Some(order_key) => {
                info!(
                    symbol = %symbol,
                    ?side,
                    owner = %caller,
                    price = %price,
                    volume = %plan.remaining,
                    fills = plan.fills.len(),
                    key = %order_key,
                    "Limit order resting"
                );
                events.push(created_event(
                    side,
                    symbol.clone(),
                    order_key,
                    caller.clone(),
                    price,
                    plan.remaining,
                ));
                OrderResult::resting(order_key)
            }
            None => {
                info!(
                    symbol = %symbol,
                    ?side,
                    taker = %caller,
                    price = %price,
                    volume = %volume,
                    fills = plan.fills.len(),
                    "Order fulfilled"
                );
                events.push(fulfilled_event(side, symbol.clone(), caller.clone(), price, volume));
                OrderResult::fulfilled()
            }
        };

        Ok((result, events))
    }

    /// Cancel the caller's resting order and release its reservation
    pub fn cancel(
        &mut self,
        ledger: &mut Ledger,
        caller: &Address,
        symbol: &Symbol,
        side: Side,
        price: Price,
        key: &OrderKey,
    ) -> Result<ExchangeEvent, ExchangeError> {
        let market = self
            .markets
            .get(symbol)
            .ok_or_else(|| ExchangeError::UnknownToken {
                symbol: symbol.to_string(),
            })?;
        let (_, order) = market.check_cancel(key, side, price)?;
        if order.owner != *caller {
            return Err(ExchangeError::Unauthorized {
                caller: caller.to_string(),
            });
        }

        let remaining = order.remaining_volume;
        let mut batch = ledger.batch();
        match side {
            Side::Buy => {
                let locked = price
                    .checked_notional(remaining)
                    .ok_or_else(|| ExchangeError::arithmetic("cancel release"))?;
                batch.release(caller, &Asset::Ether, locked)?;
            }
            Side::Sell => {
                batch.release(caller, &Asset::Token(symbol.clone()), remaining.get())?;
            }
        }
        let writes = batch.finish();

        let freed = self
            .markets
            .get_mut(symbol)
            .ok_or_else(|| ExchangeError::UnknownToken {
                symbol: symbol.to_string(),
            })?
            .cancel(key, side, price)?;
        ledger.commit(writes);

        debug!(symbol = %symbol, ?side, owner = %caller, key = %key, freed = %freed, "Order cancelled");

        let symbol = symbol.clone();
        let owner = caller.clone();
        let order_key = *key;
        Ok(match side {
            Side::Buy => ExchangeEvent::BuyOrderCanceled {
                symbol,
                order_key,
                owner,
                price,
                volume: freed,
            },
            Side::Sell => ExchangeEvent::SellOrderCanceled {
                symbol,
                order_key,
                owner,
                price,
                volume: freed,
            },
        })
    }
}

/// Stage the balance movements of one fill.
///
/// The fill trades at the maker's price. Both parties pay out of their
/// reservations; an incoming buy that fills below its limit gets the
/// difference released back to available.
fn settle_fill(
    batch: &mut LedgerBatch<'_>,
    token: &Asset,
    limit: Price,
    fill: &Fill,
) -> Result<(), ExchangeError> {
    let notional = fill
        .notional()
        .ok_or_else(|| ExchangeError::arithmetic("fill notional"))?;
    let volume = fill.volume.get();

    match fill.taker_side {
        Side::Buy => {
            let reserved_for_fill = limit
                .checked_notional(fill.volume)
                .ok_or_else(|| ExchangeError::arithmetic("fill reservation"))?;
            let improvement = reserved_for_fill
                .checked_sub(notional)
                .ok_or_else(|| ExchangeError::arithmetic("price improvement"))?;

            batch.settle_reserved(&fill.taker, &Asset::Ether, notional)?;
            if improvement > 0 {
                batch.release(&fill.taker, &Asset::Ether, improvement)?;
            }
            batch.credit(&fill.taker, token, volume)?;
            batch.settle_reserved(&fill.maker, token, volume)?;
            batch.credit(&fill.maker, &Asset::Ether, notional)?;
        }
        Side::Sell => {
            batch.settle_reserved(&fill.taker, token, volume)?;
            batch.credit(&fill.taker, &Asset::Ether, notional)?;
            batch.settle_reserved(&fill.maker, &Asset::Ether, notional)?;
            batch.credit(&fill.maker, token, volume)?;
        }
    }

    debug!(
        maker = %fill.maker,
        taker = %fill.taker,
        taker_side = ?fill.taker_side,
        price = %fill.price,
        volume = %fill.volume,
        "Fill settled"
    );
    Ok(())
}

fn created_event(
    side: Side,
    symbol: Symbol,
    order_key: OrderKey,
    owner: Address,
    price: Price,
    volume: Volume,
) -> ExchangeEvent {
    match side {
        Side::Buy => ExchangeEvent::LimitBuyOrderCreated {
            symbol,
            order_key,
            owner,
            price,
            volume,
        },
        Side::Sell => ExchangeEvent::LimitSellOrderCreated {
            symbol,
            order_key,
            owner,
            price,
            volume,
        },
    }
}

fn fulfilled_event(
    side: Side,
    symbol: Symbol,
    taker: Address,
    price: Price,
    volume: Volume,
) -> ExchangeEvent {
    match side {
        Side::Buy => ExchangeEvent::BuyOrderFulfilled {
            symbol,
            taker,
            price,
            volume,
        },
        Side::Sell => ExchangeEvent::SellOrderFulfilled {
            symbol,
            taker,
            price,
            volume,
        },
    }
}
