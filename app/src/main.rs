//! Interactive todo session.
//!
//! Wires the store, storage, and presentation layer together: hydrate the
//! list from disk, then loop over stdin lines until `quit`. Every change
//! is written back to storage by the reducer's persistence effect before
//! the prompt returns.

use std::sync::Arc;
use std::time::Duration;
use todoflow::{ui, TodoAction, TodoEnvironment, TodoId, TodoReducer, TodoState};
use todoflow_core::environment::{SequentialIdGenerator, SystemClock};
use todoflow_runtime::Store;
use todoflow_storage::FileStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long to wait for hydration and per-dispatch effects
const EFFECT_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todoflow=info,todoflow_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Composition root: storage, environment, id generator, store
    let data_dir = std::env::var("TODOFLOW_DATA").unwrap_or_else(|_| ".todoflow".to_string());
    let storage = Arc::new(FileStore::new(&data_dir)?);
    let env = TodoEnvironment::new(storage);

    let ids = SequentialIdGenerator::seeded(ui::id_seed(&SystemClock));
    let store = Store::new(TodoState::default(), TodoReducer::new(), env);

    // Hydrate from storage before accepting input
    store
        .send_and_wait_for(
            TodoAction::Load,
            |a| matches!(a, TodoAction::Set(_)),
            EFFECT_TIMEOUT,
        )
        .await?;

    println!("{}", ui::PLACEHOLDER);
    println!("{}", ui::HELP);
    println!();
    print!("{}", store.state(ui::render).await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(command) = ui::Command::parse(&line) else {
            println!("unknown command");
            println!("{}", ui::HELP);
            continue;
        };

        let action = match command {
            ui::Command::Add(text) => {
                // Empty submission: silently ignored, nothing dispatched
                match ui::submit(&text, &ids) {
                    Some(action) => action,
                    None => continue,
                }
            }
            ui::Command::Toggle(id) => TodoAction::toggle(TodoId::new(id)),
            ui::Command::Remove(id) => TodoAction::remove(TodoId::new(id)),
            ui::Command::List => {
                print!("{}", store.state(ui::render).await);
                continue;
            }
            ui::Command::Help => {
                println!("{}", ui::HELP);
                continue;
            }
            ui::Command::Quit => break,
        };

        let mut handle = store.send(action).await?;
        if let Err(error) = handle.wait_with_timeout(EFFECT_TIMEOUT).await {
            tracing::warn!(%error, "Effects still running, rendering anyway");
        }
        print!("{}", store.state(ui::render).await);
    }

    if let Err(error) = store.shutdown(EFFECT_TIMEOUT).await {
        tracing::warn!(%error, "Shutdown incomplete");
    }
    Ok(())
}
