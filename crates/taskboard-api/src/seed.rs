use anyhow::Result;
use tracing::info;

use crate::auth::AppStateInner;
use crate::now_iso8601;

struct SeedUser {
    name: &'static str,
    email: &'static str,
    username: &'static str,
    password: &'static str,
}

const SEED_USERS: &[SeedUser] = &[
    SeedUser {
        name: "Homer Simpson",
        email: "homer@springfield.com",
        username: "homer",
        password: "1234",
    },
    SeedUser {
        name: "Bart Simpson",
        email: "bart@springfield.com",
        username: "bart",
        password: "1234",
    },
];

/// Recreate the database and load the demo data: users homer (id 1) and
/// bart (id 2), homer's project "Doughnuts" (id 1) and its task
/// "Search for doughnuts" (id 1). Passwords go through the configured
/// credential verifier.
pub fn reset(state: &AppStateInner) -> Result<()> {
    state.db.recreate()?;

    let mut user_ids = Vec::with_capacity(SEED_USERS.len());
    for user in SEED_USERS {
        let password = state.credentials.hash(user.password)?;
        let id = state
            .db
            .create_user(user.name, user.email, user.username, &password)?;
        user_ids.push(id);
    }

    let now = now_iso8601();
    let project_id = state.db.insert_project(user_ids[0], "Doughnuts", &now)?;
    state
        .db
        .insert_task(project_id, "Search for doughnuts", &now, 0)?;

    info!("Seed data loaded ({} users)", user_ids.len());
    Ok(())
}
