//! Demo dataset for local runs.
//!
//! Three borrowers cover the reference cases: one healthy, two below the
//! default health factor threshold. A lender and an uncollateralized borrow
//! exercise the skip paths.

use anyhow::{Context, Result};
use tracing::info;

use monitor_store::{InMemoryStore, NewPosition, PositionKind};

pub fn seed(store: &InMemoryStore) -> Result<()> {
    let usdc = store.add_asset("USDC", 1.0).context("seeding USDC")?;
    let eth = store.add_asset("ETH", 2000.0).context("seeding ETH")?;
    let btc = store.add_asset("BTC", 40000.0).context("seeding BTC")?;

    let alice = store.add_user("alice");
    let bob = store.add_user("bob");
    let carol = store.add_user("carol");
    let dave = store.add_user("dave");

    let positions = [
        // HF 1.33
        NewPosition::borrowing(alice.id, usdc.id, 1000.0, eth.id, 1.0),
        // HF 0.71
        NewPosition::borrowing(bob.id, usdc.id, 1500.0, btc.id, 0.04),
        // HF 0.80
        NewPosition::borrowing(carol.id, usdc.id, 2000.0, eth.id, 1.2),
        NewPosition {
            user_id: dave.id,
            kind: PositionKind::Lending,
            debt_asset_id: eth.id,
            debt_amount: 5.0,
            collateral_asset_id: None,
            collateral_amount: None,
        },
        NewPosition {
            user_id: dave.id,
            kind: PositionKind::Borrowing,
            debt_asset_id: usdc.id,
            debt_amount: 250.0,
            collateral_asset_id: None,
            collateral_amount: None,
        },
    ];

    let count = positions.len();
    for position in positions {
        store.open_position(position).context("seeding position")?;
    }

    info!(users = 4, assets = 3, positions = count, "Seeded demo data");
    Ok(())
}
