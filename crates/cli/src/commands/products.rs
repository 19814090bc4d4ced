//! One-shot product commands.

#![allow(clippy::print_stdout)]

use mercado_client::{
    Action, ActionOutcome, AppState, ClientConfig, Confirm, DeleteOutcome, HttpProductApi,
    MutationOutcome, PreAnswered, SubmitOutcome, SyncOutcome, view,
};
use mercado_core::{DraftField, ProductId};

use crate::console::Console;
use crate::error::CliError;

async fn mounted(config: &ClientConfig) -> Result<AppState<HttpProductApi>, CliError> {
    let api = HttpProductApi::from_config(config)?;
    let (state, outcome) = AppState::mount(api, config.draft_retention).await;
    match outcome {
        SyncOutcome::Failed(e) => Err(CliError::Sync(e)),
        SyncOutcome::Synced { .. } | SyncOutcome::Superseded { .. } => Ok(state),
    }
}

/// Print every product.
pub async fn list(config: &ClientConfig, json: bool) -> Result<(), CliError> {
    let snapshot = mounted(config).await?.snapshot().await;
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot.products())?);
    } else {
        print!("{}", view::render_listing(&snapshot));
    }
    Ok(())
}

/// Create a product from command-line values.
pub async fn add(
    config: &ClientConfig,
    name: String,
    price: String,
    stock: String,
) -> Result<(), CliError> {
    let api = HttpProductApi::from_config(config)?;
    let mut state = AppState::new(api, config.draft_retention);
    let mut no = PreAnswered(false);

    for (field, value) in [
        (DraftField::Name, name),
        (DraftField::Price, price),
        (DraftField::Stock, stock),
    ] {
        state.dispatch(Action::EditField(field, value), &mut no).await;
    }
    submit(&mut state).await
}

/// Update a product; fields left as `None` keep their current value.
pub async fn edit(
    config: &ClientConfig,
    id: ProductId,
    name: Option<String>,
    price: Option<String>,
    stock: Option<String>,
) -> Result<(), CliError> {
    let mut state = mounted(config).await?;
    let mut no = PreAnswered(false);

    if let ActionOutcome::Rejected(e) = state.dispatch(Action::StartEdit(id), &mut no).await {
        return Err(e.into());
    }
    for (field, value) in [
        (DraftField::Name, name),
        (DraftField::Price, price),
        (DraftField::Stock, stock),
    ] {
        if let Some(value) = value {
            state.dispatch(Action::EditField(field, value), &mut no).await;
        }
    }
    submit(&mut state).await
}

async fn submit(state: &mut AppState<HttpProductApi>) -> Result<(), CliError> {
    match state.dispatch(Action::Submit, &mut PreAnswered(false)).await {
        ActionOutcome::Submitted(SubmitOutcome::Saved { id, resync }) => {
            println!("Saved product #{id}.");
            if let SyncOutcome::Failed(e) = resync {
                tracing::warn!(error = %e, "Saved, but the listing could not be reloaded");
            }
            Ok(())
        }
        ActionOutcome::Submitted(SubmitOutcome::Invalid(e)) => Err(e.into()),
        ActionOutcome::Submitted(SubmitOutcome::Failed { error, .. }) => Err(error.into()),
        other => Err(CliError::Fault(format!("unexpected outcome: {other:?}"))),
    }
}

/// Delete a product, asking first unless `yes` is set.
pub async fn delete(config: &ClientConfig, id: ProductId, yes: bool) -> Result<(), CliError> {
    let mut state = mounted(config).await?;
    if yes {
        delete_with(&mut state, id, &mut PreAnswered(true)).await
    } else {
        delete_with(&mut state, id, &mut Console::stdio()).await
    }
}

async fn delete_with(
    state: &mut AppState<HttpProductApi>,
    id: ProductId,
    confirm: &mut impl Confirm,
) -> Result<(), CliError> {
    match state.dispatch(Action::Delete(id), confirm).await {
        ActionOutcome::Deleted(DeleteOutcome::Declined) => {
            println!("Nothing deleted.");
            Ok(())
        }
        ActionOutcome::Deleted(DeleteOutcome::Attempted(MutationOutcome::Applied { .. })) => {
            println!("Deleted product #{id}.");
            Ok(())
        }
        ActionOutcome::Deleted(DeleteOutcome::Attempted(MutationOutcome::Failed(e))) => {
            Err(e.into())
        }
        other => Err(CliError::Fault(format!("unexpected outcome: {other:?}"))),
    }
}

/// Print the resolved base address and the absolute root requests use.
pub fn resolve(config: &ClientConfig) -> Result<(), CliError> {
    println!("base: {}", config.base_address());
    println!("root: {}", config.api_root()?);
    Ok(())
}
