//! Interactive console.
//!
//! Every action and every render runs under a [`Boundary`]. Once it faults the
//! console only shows the fallback until the operator runs `reload`, which
//! mounts a fresh boundary and a fresh state.

use std::io;
use std::str::FromStr;

use mercado_client::{
    Action, ActionOutcome, AppState, Boundary, ClientConfig, DeleteOutcome, DraftRetention,
    HttpProductApi, MutationOutcome, ProductApi, SubmitOutcome, SyncOutcome, view,
};
use mercado_core::{DraftField, ProductId};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::info;

use crate::console::Console;
use crate::error::CliError;

const HELP: &str = "\
Commands:
  list                         reload and show the listing
  new                          start a new product (discards the draft)
  edit <id>                    load a product into the form
  set <name|price|stock> <v>   change a form field
  submit                       validate and save the form
  cancel                       discard the draft
  delete <id>                  delete a product (asks first)
  reload                       restart the console after an error
  help                         show this message
  quit                         leave
";

const PROMPT: &str = "mercado> ";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    Help,
    Quit,
    Reload,
    Run(Action),
}

fn parse_id(raw: &str) -> Result<ProductId, String> {
    raw.parse()
        .map_err(|_| format!("expected a product id, got '{raw}'"))
}

/// Split `line` into its first word and the trimmed remainder.
fn split_word(line: &str) -> (&str, &str) {
    line.split_once(char::is_whitespace)
        .map_or((line, ""), |(word, rest)| (word, rest.trim()))
}

impl FromStr for ShellCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (word, rest) = split_word(line.trim());
        let command = match word {
            "" => Self::Empty,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            "reload" => Self::Reload,
            "list" | "ls" => Self::Run(Action::Refresh),
            "new" | "cancel" => Self::Run(Action::Cancel),
            "submit" | "save" => Self::Run(Action::Submit),
            "edit" => Self::Run(Action::StartEdit(parse_id(rest)?)),
            "delete" | "rm" => Self::Run(Action::Delete(parse_id(rest)?)),
            "set" => {
                let (field, value) = split_word(rest);
                let field: DraftField = field.parse()?;
                Self::Run(Action::EditField(field, value.to_string()))
            }
            other => return Err(format!("unknown command: {other} (try `help`)")),
        };
        Ok(command)
    }
}

/// Operator-facing summary of an action's result.
fn describe(outcome: &ActionOutcome) -> Option<String> {
    match outcome {
        ActionOutcome::Refreshed(SyncOutcome::Synced { count, .. }) => {
            Some(format!("Loaded {count} products."))
        }
        ActionOutcome::Refreshed(SyncOutcome::Failed(e)) => {
            Some(format!("Could not load products, showing the last listing: {e}"))
        }
        ActionOutcome::Refreshed(SyncOutcome::Superseded { .. })
        | ActionOutcome::FieldUpdated(_)
        | ActionOutcome::Cancelled => None,
        ActionOutcome::EditStarted(id) => Some(format!("Editing product #{id}.")),
        ActionOutcome::Submitted(SubmitOutcome::Saved { id, resync }) => Some(match resync {
            SyncOutcome::Failed(e) => format!("Saved product #{id}, but the listing is stale: {e}"),
            _ => format!("Saved product #{id}."),
        }),
        ActionOutcome::Submitted(SubmitOutcome::Invalid(e)) => Some(e.to_string()),
        ActionOutcome::Submitted(SubmitOutcome::Failed {
            error,
            draft_retained,
        }) => Some(if *draft_retained {
            format!("Save failed: {error}. Draft kept, run `submit` to retry.")
        } else {
            format!("Save failed: {error}")
        }),
        ActionOutcome::Deleted(DeleteOutcome::Declined) => Some("Nothing deleted.".to_string()),
        ActionOutcome::Deleted(DeleteOutcome::Attempted(MutationOutcome::Applied { id, .. })) => {
            Some(format!("Deleted product #{id}."))
        }
        ActionOutcome::Deleted(DeleteOutcome::Attempted(MutationOutcome::Failed(e))) => {
            Some(format!("Delete failed: {e}"))
        }
        ActionOutcome::Rejected(e) => Some(e.to_string()),
    }
}

/// The interactive console for one API client.
pub struct Shell<A, R, W> {
    api: A,
    retention: DraftRetention,
    console: Console<R, W>,
    boundary: Boundary,
    state: AppState<A>,
}

impl<A, R, W> Shell<A, R, W>
where
    A: ProductApi + Clone,
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(api: A, retention: DraftRetention, console: Console<R, W>) -> Self {
        Self {
            state: AppState::new(api.clone(), retention),
            api,
            retention,
            console,
            boundary: Boundary::new(),
        }
    }

    /// Read and apply commands until `quit` or end of input.
    pub async fn run(&mut self) -> io::Result<()> {
        self.remount().await?;

        loop {
            self.console.write(PROMPT).await?;
            let Some(line) = self.console.read_line().await? else {
                break;
            };

            match line.parse::<ShellCommand>() {
                Ok(ShellCommand::Empty) => {}
                Ok(ShellCommand::Help) => self.console.write(HELP).await?,
                Ok(ShellCommand::Quit) => break,
                Ok(ShellCommand::Reload) => self.remount().await?,
                Ok(ShellCommand::Run(action)) => self.apply(action).await?,
                Err(message) => self.console.write_line(&message).await?,
            }
        }
        Ok(())
    }

    /// Fresh boundary, fresh state, initial listing.
    async fn remount(&mut self) -> io::Result<()> {
        info!("Mounting console");
        self.boundary = Boundary::new();
        self.state = AppState::new(self.api.clone(), self.retention);
        self.apply(Action::Refresh).await
    }

    async fn apply(&mut self, action: Action) -> io::Result<()> {
        if let Some(fault) = self.boundary.fault() {
            let fallback = view::render_fault(fault);
            return self.console.write(&fallback).await;
        }

        let dispatched = self
            .boundary
            .run(self.state.dispatch(action, &mut self.console))
            .await;
        match dispatched {
            Ok(outcome) => {
                if let Some(message) = describe(&outcome) {
                    self.console.write_line(&message).await?;
                }
                self.show_page().await
            }
            Err(fault) => self.console.write(&view::render_fault(&fault)).await,
        }
    }

    async fn show_page(&mut self) -> io::Result<()> {
        let snapshot = self.state.snapshot().await;
        let session = self.state.session();
        let page = self
            .boundary
            .render(|| view::render_page(&snapshot, session))
            .unwrap_or_else(|fault| view::render_fault(&fault));
        self.console.write(&page).await
    }

    #[cfg(test)]
    fn into_console(self) -> Console<R, W> {
        self.console
    }
}

/// Run the console on stdin/stdout.
pub async fn run(config: &ClientConfig) -> Result<(), CliError> {
    let api = HttpProductApi::from_config(config)?;
    info!(root = %api.root(), "Starting console");

    let mut shell = Shell::new(api, config.draft_retention, Console::stdio());
    shell.run().await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use mercado_client::ApiError;
    use mercado_core::{Price, Product, ProductInput};

    use super::*;

    /// In-memory catalog; `list` panics while `explode` is set.
    #[derive(Clone, Default)]
    struct MemoryApi {
        products: Arc<Mutex<Vec<Product>>>,
        explode: Arc<AtomicBool>,
    }

    impl MemoryApi {
        fn stored(id: i64, input: &ProductInput) -> Product {
            Product {
                id: ProductId::new(id),
                name: input.name().to_string(),
                price: input.price(),
                stock_quantity: input.stock_quantity(),
                created_at: String::new(),
                updated_at: String::new(),
            }
        }
    }

    impl ProductApi for MemoryApi {
        async fn list(&self) -> Result<Vec<Product>, ApiError> {
            assert!(!self.explode.load(Ordering::SeqCst), "listing exploded");
            Ok(self.products.lock().unwrap().clone())
        }

        async fn create(&self, input: &ProductInput) -> Result<Product, ApiError> {
            let mut products = self.products.lock().unwrap();
            let id = products.iter().map(|p| p.id.as_i64()).max().unwrap_or(0) + 1;
            let product = Self::stored(id, input);
            products.insert(0, product.clone());
            Ok(product)
        }

        async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Product, ApiError> {
            let mut products = self.products.lock().unwrap();
            let slot = products.iter_mut().find(|p| p.id == id).unwrap();
            *slot = Self::stored(id.as_i64(), input);
            Ok(slot.clone())
        }

        async fn delete(&self, id: ProductId) -> Result<(), ApiError> {
            self.products.lock().unwrap().retain(|p| p.id != id);
            Ok(())
        }
    }

    async fn session(api: &MemoryApi, script: &str) -> String {
        let console = Console::new(script.as_bytes(), Vec::new());
        let mut shell = Shell::new(api.clone(), DraftRetention::default(), console);
        shell.run().await.unwrap();
        String::from_utf8(shell.into_console().into_output()).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("".parse::<ShellCommand>(), Ok(ShellCommand::Empty));
        assert_eq!(
            "  edit 7 ".parse::<ShellCommand>(),
            Ok(ShellCommand::Run(Action::StartEdit(ProductId::new(7))))
        );
        assert_eq!(
            "set name Brown rice".parse::<ShellCommand>(),
            Ok(ShellCommand::Run(Action::EditField(
                DraftField::Name,
                "Brown rice".to_string()
            )))
        );
        assert_eq!(
            "set price".parse::<ShellCommand>(),
            Ok(ShellCommand::Run(Action::EditField(DraftField::Price, String::new())))
        );
        assert!("set colour red".parse::<ShellCommand>().is_err());
        assert!("delete x".parse::<ShellCommand>().is_err());
        assert!("dance".parse::<ShellCommand>().is_err());
    }

    #[tokio::test]
    async fn test_create_edit_and_delete() {
        let api = MemoryApi::default();
        let output = session(
            &api,
            "set name Rice\nset price 5.5\nset stock 10\nsubmit\n\
             edit 1\nset stock 7\nsubmit\n\
             delete 1\nn\ndelete 1\ny\nquit\n",
        )
        .await;

        assert!(output.contains(view::EMPTY_LISTING));
        assert!(output.contains("Saved product #1."));
        assert!(output.contains("R$ 5.50"));
        assert!(output.contains("Edit product #1"));
        assert!(output.contains("7 units"));
        assert!(output.contains("Delete product #1 (Rice)? [y/N] "));
        assert!(output.contains("Nothing deleted."));
        assert!(output.contains("Deleted product #1."));
        assert!(api.products.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_submit_keeps_form() {
        let api = MemoryApi::default();
        let output = session(&api, "set name Rice\nset price abc\nsubmit\nquit\n").await;

        assert!(output.contains("Price must be a number"));
        assert!(output.contains("[abc]"));
        assert!(api.products.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fault_halts_until_reload() {
        let api = MemoryApi::default();
        api.products.lock().unwrap().push(Product {
            id: ProductId::new(1),
            name: "Rice".to_string(),
            price: Price::parse("5.50").unwrap(),
            stock_quantity: 10,
            created_at: String::new(),
            updated_at: String::new(),
        });

        let console = Console::new("list\nedit 1\n".as_bytes(), Vec::new());
        let mut shell = Shell::new(api.clone(), DraftRetention::default(), console);
        shell.remount().await.unwrap();
        assert!(!shell.boundary.is_faulted());

        api.explode.store(true, Ordering::SeqCst);
        shell.run_line("list").await;
        assert!(shell.boundary.is_faulted());
        shell.run_line("edit 1").await;
        assert_eq!(shell.state.session().draft().editing_target, None);

        api.explode.store(false, Ordering::SeqCst);
        shell.remount().await.unwrap();
        assert!(!shell.boundary.is_faulted());
        shell.run_line("edit 1").await;
        assert_eq!(
            shell.state.session().draft().editing_target,
            Some(ProductId::new(1))
        );

        let output = String::from_utf8(shell.into_console().into_output()).unwrap();
        assert!(output.contains("listing exploded"));
    }

    impl<A, R, W> Shell<A, R, W>
    where
        A: ProductApi + Clone,
        R: AsyncBufRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        async fn run_line(&mut self, line: &str) {
            if let Ok(ShellCommand::Run(action)) = line.parse() {
                self.apply(action).await.unwrap();
            }
        }
    }
}
