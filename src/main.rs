//! Leveraged trading and staking core simulation.
//!
//! Walks the full engine lifecycle: admin bootstrap through the dispatchers,
//! oracle upkeep, staking, leveraged trading, reward claims, penalty unstakes,
//! and a liquidation sweep.

use perpstake_core::*;
use rust_decimal_macros::dec;

fn main() {
    println!("Perpstake Core Engine Simulation");
    println!("Single Market plus Insurance Fund, Full Lifecycle\n");

    scenario_1_bootstrap_and_registry();
    scenario_2_staking_flows();
    scenario_3_trading_lifecycle();
    scenario_4_price_movement_and_pnl();
    scenario_5_reward_streams();
    scenario_6_unstake_penalty();
    scenario_7_liquidation_sweep();

    println!("\nAll simulations completed successfully.");
}

struct Sim {
    engine: Engine,
    admin: AccountId,
    keeper: AccountId,
    market: MarketId,
    insurance: MarketId,
    asset_oracle: OracleId,
}

/// Admin bootstrap: oracles and venues registered through the admin dispatcher,
/// prices seeded by keeper upkeep.
fn bootstrap() -> Sim {
    let mut engine = Engine::new(EngineConfig::default(), RiskParams::default());

    // the first account created matches EngineConfig::default().admin
    let admin = engine.create_account();
    let keeper = engine.create_account();

    let lp_oracle = engine.register_lp_oracle(OracleConfig {
        is_active: true,
        keeper_reward: Quote::new(dec!(22)),
    });

    let AdminResponse::OracleAdded { oracle: asset_oracle } = engine
        .dispatch_admin(
            admin,
            AdminAction::AddOracle {
                config: OracleConfig {
                    is_active: true,
                    keeper_reward: Quote::new(dec!(33)),
                },
            },
        )
        .unwrap()
    else {
        unreachable!()
    };

    let AdminResponse::MarketAdded { market } = engine
        .dispatch_admin(
            admin,
            AdminAction::AddMarket {
                asset_oracle,
                params: VenueParams::market_defaults(),
            },
        )
        .unwrap()
    else {
        unreachable!()
    };

    let AdminResponse::InsuranceSet { venue: insurance } = engine
        .dispatch_admin(
            admin,
            AdminAction::SetInsurance {
                params: VenueParams::insurance_defaults(),
            },
        )
        .unwrap()
    else {
        unreachable!()
    };

    let lp_hint = encode_price_hint(Price::new_unchecked(dec!(1)));
    let asset_hint = encode_price_hint(Price::new_unchecked(dec!(1.35)));
    engine.perform_upkeep(keeper, lp_oracle, &lp_hint).unwrap();
    engine.perform_upkeep(keeper, asset_oracle, &asset_hint).unwrap();

    Sim {
        engine,
        admin,
        keeper,
        market,
        insurance,
        asset_oracle,
    }
}

fn funded_trader(sim: &mut Sim, trading: rust_decimal::Decimal, staking: rust_decimal::Decimal) -> AccountId {
    let id = sim.engine.create_account();
    sim.engine.fund_trading(id, Quote::new(trading)).unwrap();
    sim.engine.fund_staking(id, Quote::new(staking)).unwrap();
    id
}

fn scenario_1_bootstrap_and_registry() {
    println!("Scenario 1: Bootstrap and Registry\n");

    let mut sim = bootstrap();

    let oracles = sim.engine.list_oracles();
    println!("  Oracles registered: {}", oracles.len());
    for oracle in &oracles {
        println!("    active: {}, keeper reward: {}", oracle.is_active, oracle.keeper_reward);
    }

    let markets = sim.engine.list_markets();
    println!("  Markets registered: {}", markets.len());
    for market in &markets {
        println!("    created: {}, id: {:?}", market.created, market.market);
    }

    let (mark, oracle) = sim.engine.get_prices(sim.market).unwrap();
    println!("  Market prices: mark {}, oracle {}", mark, oracle);
    println!(
        "  Keeper earned {} in upkeep rewards",
        sim.engine.account(sim.keeper).unwrap().trading_balance
    );

    // only the admin identity may touch the registry
    let denied = sim.engine.dispatch_admin(
        sim.keeper,
        AdminAction::ChangeOracle {
            oracle: sim.asset_oracle,
            config: OracleConfig {
                is_active: false,
                keeper_reward: Quote::zero(),
            },
        },
    );
    println!(
        "  Keeper tries an admin action: {:?}",
        denied.err().map(|e| e.code())
    );

    sim.engine
        .dispatch_admin(
            sim.admin,
            AdminAction::ChangeOracle {
                oracle: sim.asset_oracle,
                config: OracleConfig {
                    is_active: true,
                    keeper_reward: Quote::new(dec!(44)),
                },
            },
        )
        .unwrap();
    println!("  Admin raises the keeper reward to 44\n");
}

fn scenario_2_staking_flows() {
    println!("Scenario 2: Staking to Market and Insurance\n");

    let mut sim = bootstrap();
    let staker = funded_trader(&mut sim, dec!(0), dec!(250000));

    sim.engine.stake(staker, sim.market, Quote::new(dec!(100000))).unwrap();
    sim.engine.stake(staker, sim.insurance, Quote::new(dec!(50000))).unwrap();

    println!("  Staked 100,000 LP to the market, 50,000 to insurance");

    let info = sim.engine.get_staking_info(staker).unwrap();
    for row in &info.asset_data {
        let kind = if row.is_insurance { "insurance" } else { "market" };
        println!(
            "    {} {:?}: tvl {}, max notional {}, apy {}",
            kind, row.asset, row.tvl, row.max_notional, row.apy
        );
    }
    for stake in &info.staking_data {
        println!("    stake in {:?}: {}", stake.asset, stake.total_staked);
    }

    // the anonymous identity sees the dashboard but no per-account rows
    let anon = sim.engine.get_staking_info(AccountId::ZERO).unwrap();
    println!(
        "  Anonymous view: {} asset rows, {} stake rows\n",
        anon.asset_data.len(),
        anon.staking_data.len()
    );
}

fn scenario_3_trading_lifecycle() {
    println!("Scenario 3: Trading Lifecycle\n");

    let mut sim = bootstrap();
    let staker = funded_trader(&mut sim, dec!(0), dec!(100000));
    let trader = funded_trader(&mut sim, dec!(1000000), dec!(0));

    sim.engine.stake(staker, sim.market, Quote::new(dec!(100000))).unwrap();

    // quote first, then execute with identical inputs
    let quote = sim
        .engine
        .quote_fee_and_slippage(sim.market, Quote::new(dec!(5000)), false)
        .unwrap();
    println!(
        "  Quote for 5,000 short: fee {}, slippage {}, what-if price {}",
        quote.fee, quote.slippage, quote.what_if_price
    );

    let open = sim
        .engine
        .open(trader, sim.market, false, Quote::new(dec!(1000)), dec!(5), dec!(0.05))
        .unwrap();
    println!(
        "  Opened 1,000 x5 short at {}, fee {} (matches quote: {})",
        open.execution_price,
        open.fee,
        open.fee == quote.fee
    );

    // a second open in the same direction accumulates onto the record
    sim.engine
        .open(trader, sim.market, false, Quote::new(dec!(1000)), dec!(5), dec!(0.05))
        .unwrap();
    let position = sim.engine.account(trader).unwrap().position(sim.market).unwrap();
    println!(
        "  After second open: notional {}, collateral {}, entry {}",
        position.notional, position.collateral, position.initial_price
    );

    let partial = sim.engine.close(trader, sim.market, dec!(0.5), dec!(1)).unwrap();
    println!(
        "  Partial close 50%: returned {}, realized pnl {}, remaining notional {}",
        partial.returned, partial.realized_pnl, partial.remaining_notional
    );

    let full = sim.engine.close(trader, sim.market, dec!(1), dec!(1)).unwrap();
    println!(
        "  Full close: returned {}, fully closed: {}",
        full.returned, full.fully_closed
    );

    let gone = sim.engine.position_view(trader, sim.market);
    println!("  Position view after close: {:?}\n", gone.err().map(|e| e.code()));
}

fn scenario_4_price_movement_and_pnl() {
    println!("Scenario 4: Price Movement and PnL\n");

    let mut sim = bootstrap();
    let staker = funded_trader(&mut sim, dec!(0), dec!(100000));
    let short_trader = funded_trader(&mut sim, dec!(1000000), dec!(0));
    let long_trader = funded_trader(&mut sim, dec!(1000000), dec!(0));

    sim.engine.stake(staker, sim.market, Quote::new(dec!(100000))).unwrap();

    sim.engine
        .open(short_trader, sim.market, false, Quote::new(dec!(1000)), dec!(1), dec!(0.05))
        .unwrap();
    println!("  Short opens 1,000 notional");

    // the long's size pushes the mark up, which costs the short
    sim.engine
        .open(long_trader, sim.market, true, Quote::new(dec!(10000)), dec!(1), dec!(0.15))
        .unwrap();
    println!("  Long opens 10,000 notional, mark moves up");

    let info = sim.engine.get_trading_info(short_trader).unwrap();
    for row in &info.position_data {
        println!(
            "    short position: pnl {}, margin ratio {}",
            row.pnl, row.margin_ratio
        );
    }

    let close_quote = sim
        .engine
        .calc_close_view(short_trader, sim.market, dec!(1))
        .unwrap();
    println!(
        "  Close quote: pnl {}, fee {}, what-if price {}\n",
        close_quote.pnl, close_quote.fee, close_quote.what_if_price
    );
}

fn scenario_5_reward_streams() {
    println!("Scenario 5: Reward Streams\n");

    let mut sim = bootstrap();
    let staker = funded_trader(&mut sim, dec!(0), dec!(100000));
    let trader = funded_trader(&mut sim, dec!(1000000), dec!(0));

    sim.engine.stake(staker, sim.market, Quote::new(dec!(100000))).unwrap();
    sim.engine
        .open(trader, sim.market, false, Quote::new(dec!(1000)), dec!(1), dec!(0.05))
        .unwrap();

    // inside the wash window nothing is eligible yet
    sim.engine.advance_secs(100);
    let early = sim.engine.calc_rewards(trader);
    println!("  Rewards 100s in (inside wash window): {}", early.rewards_total);

    sim.engine.advance_secs(500);
    let accrued = sim.engine.calc_rewards(trader);
    println!("  Rewards 600s in: {}", accrued.rewards_total);

    let claimed = sim.engine.claim_rewards(trader);
    let again = sim.engine.claim_rewards(trader);
    println!("  Claimed {}, immediate second claim pays {}", claimed, again);
    println!(
        "  Reward balance: {}\n",
        sim.engine.account(trader).unwrap().reward_balance
    );
}

fn scenario_6_unstake_penalty() {
    println!("Scenario 6: Unstake Inside and Outside the Penalty Window\n");

    let mut sim = bootstrap();
    let staker = funded_trader(&mut sim, dec!(0), dec!(100000));

    sim.engine.stake(staker, sim.market, Quote::new(dec!(100000))).unwrap();

    sim.engine.advance_secs(3600);
    let early = sim
        .engine
        .unstake(staker, sim.market, Quote::new(dec!(50000)))
        .unwrap();
    println!(
        "  Unstake 50,000 one hour in: returned {} LP, penalty {}, {}s of window left",
        early.unstake_amount_lp, early.staking_fee, early.penalty_left_secs
    );

    // a week later the window has elapsed
    sim.engine.advance_secs(7 * 24 * 3600);
    let late = sim
        .engine
        .unstake(staker, sim.market, Quote::new(dec!(50000)))
        .unwrap();
    println!(
        "  Unstake 50,000 after the window: returned {} LP, penalty {}",
        late.unstake_amount_lp, late.staking_fee
    );
    println!(
        "  Market TVL now {}\n",
        sim.engine.market(sim.market).unwrap().pool.total_staked
    );
}

fn scenario_7_liquidation_sweep() {
    println!("Scenario 7: Liquidation Sweep\n");

    let mut sim = bootstrap();
    let staker = funded_trader(&mut sim, dec!(0), dec!(100000));
    let leveraged = funded_trader(&mut sim, dec!(1000000), dec!(0));
    let whale = funded_trader(&mut sim, dec!(10000000), dec!(0));

    sim.engine.stake(staker, sim.market, Quote::new(dec!(50000))).unwrap();

    sim.engine
        .open(leveraged, sim.market, true, Quote::new(dec!(100)), dec!(10), dec!(0.05))
        .unwrap();
    let entry = sim.engine.account(leveraged).unwrap().position(sim.market).unwrap().initial_price;
    println!("  Leveraged trader opens 1,000 notional x10 long at {}", entry);

    // a large short crashes the mark price under the long
    sim.engine
        .open(whale, sim.market, false, Quote::new(dec!(5000)), dec!(1), dec!(0.15))
        .unwrap();
    let mark = sim.engine.market(sim.market).unwrap().mark_price;
    println!("  Whale shorts 5,000 notional, mark falls to {}", mark);

    let outcomes = sim.engine.liquidation_tick(sim.keeper);
    for outcome in &outcomes {
        println!(
            "  Liquidated {:?}: margin ratio {}, keeper fee {}, routed {}",
            outcome.account_id, outcome.margin_ratio, outcome.liquidator_fee, outcome.routed
        );
    }

    println!("  Open positions remaining: {}", sim.engine.positions_count());
    println!(
        "  Insurance pool absorbed fees: {}",
        sim.engine.insurance().map(|i| i.pool.accumulated_profit).unwrap_or_else(Quote::zero)
    );
    println!("  Events recorded: {}", sim.engine.events().len());
}
