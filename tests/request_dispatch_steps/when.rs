//! When steps for request dispatch BDD scenarios.

use super::world::{DispatchWorld, run_async};
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest_bdd_macros::when;
use scriptorium::request::Request;
use tokio_util::sync::CancellationToken;

#[when(r#"the caller submits "{instructions}""#)]
fn caller_submits(world: &mut DispatchWorld, instructions: String) -> Result<(), eyre::Report> {
    let caller = world
        .caller
        .clone()
        .ok_or_else(|| eyre::eyre!("missing caller in scenario world"))?;
    let request = Request::new(caller, instructions, &DefaultClock)
        .wrap_err("create request for dispatch scenario")?;
    let outcome = run_async(world.dispatcher.handle(request, CancellationToken::new()));
    world.outcome = Some(outcome);
    Ok(())
}
