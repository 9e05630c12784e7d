//! Given steps for request dispatch BDD scenarios.

use super::world::DispatchWorld;
use rstest_bdd_macros::given;
use scriptorium::request::{CallerIdentity, Role, UserId};

#[given(r#"a caller "{user}" with role "{role}""#)]
fn caller_with_role(
    world: &mut DispatchWorld,
    user: String,
    role: String,
) -> Result<(), eyre::Report> {
    let user_id = UserId::new(user).map_err(|err| eyre::eyre!("invalid user id: {err}"))?;
    let parsed = Role::try_from(role.as_str()).map_err(|err| eyre::eyre!("invalid role: {err}"))?;
    world.caller = Some(CallerIdentity::new(user_id, parsed));
    Ok(())
}

#[given("the audit store is unreachable")]
fn audit_store_unreachable(world: &mut DispatchWorld) {
    world.audit.set_available(false);
}
