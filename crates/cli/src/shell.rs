//! Line-oriented interactive front end.
//!
//! Background jobs and stdin are multiplexed with `tokio::select!`, so the prompt stays live
//! while solutions load or delete. Row numbers refer to the last rendered table.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use solman_core::{
    confirmation_message, DeleteRequest, SessionEvent, SolutionId, SolutionManager,
    SortDirection, SortKey, NOTHING_SELECTED_MESSAGE,
};

use crate::commands::print_report;
use crate::{prompt, table};

const HELP: &str = "\
commands:
  list                      show the solutions
  toggle <n>...             select or unselect rows by number
  all | none                select every row or clear the selection
  sort <key> [desc]         friendly-name | unique-name | version | installed-on
  filter [text]             match names and description; no text clears it
  delete                    delete the selected solutions
  reload                    load the solutions again
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List,
    Toggle(Vec<usize>),
    All,
    None,
    Sort { key: SortKey, descending: bool },
    Filter(Option<String>),
    Delete,
    Reload,
    Help,
    Quit,
}

pub fn parse_command(input: &str) -> Result<ShellCommand, String> {
    let raw = input.trim();
    let mut parts = raw.split_whitespace();
    let head = parts
        .next()
        .ok_or_else(|| "empty command".to_string())?
        .to_ascii_lowercase();

    match head.as_str() {
        "list" | "ls" | "l" => Ok(ShellCommand::List),
        "toggle" | "t" | "x" => {
            let rows = parts
                .map(|p| {
                    p.parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| format!("invalid row number `{p}`"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if rows.is_empty() {
                return Err("usage: toggle <n>...".to_string());
            }
            Ok(ShellCommand::Toggle(rows))
        }
        "all" => Ok(ShellCommand::All),
        "none" | "clear" => Ok(ShellCommand::None),
        "sort" => {
            let key = parts
                .next()
                .ok_or_else(|| "usage: sort <key> [desc]".to_string())?
                .parse::<SortKey>()?;
            let descending = match parts.next().map(str::to_ascii_lowercase).as_deref() {
                None | Some("asc") => false,
                Some("desc") => true,
                Some(other) => return Err(format!("unknown direction `{other}`")),
            };
            Ok(ShellCommand::Sort { key, descending })
        }
        "filter" | "f" | "/" => {
            let text = parts.collect::<Vec<_>>().join(" ");
            Ok(ShellCommand::Filter((!text.is_empty()).then_some(text)))
        }
        "delete" | "del" | "rm" => Ok(ShellCommand::Delete),
        "reload" | "refresh" | "r" => Ok(ShellCommand::Reload),
        "help" | "h" | "?" => Ok(ShellCommand::Help),
        "quit" | "q" | "exit" => Ok(ShellCommand::Quit),
        _ => Err(format!("unknown command: {head}")),
    }
}

/// What the loop does after a line.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Print(String),
    Quit,
}

enum Input {
    Event(SessionEvent),
    Line(Option<String>),
}

/// View state layered over the session: ordering, filter, and a pending confirmation.
pub struct Shell {
    rows: Vec<SolutionId>,
    sort: SortKey,
    direction: SortDirection,
    filter: Option<String>,
    awaiting_confirm: Option<usize>,
    width: usize,
}

impl Shell {
    pub fn new(mgr: &SolutionManager, width: usize) -> Self {
        let settings = mgr.settings();
        Self {
            rows: Vec::new(),
            sort: settings.default_sort,
            direction: if settings.descending {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            },
            filter: None,
            awaiting_confirm: None,
            width,
        }
    }

    fn render(&mut self, mgr: &SolutionManager) -> String {
        let rows = mgr
            .inventory()
            .view(self.sort, self.direction, self.filter.as_deref());
        self.rows = rows.iter().map(|s| s.solution_id).collect();
        let mut out = table::render(&rows, mgr.selection(), self.width);
        out.push_str(&format!(
            "{} shown, {} selected",
            rows.len(),
            mgr.deletable_count()
        ));
        out
    }

    pub fn on_event(&mut self, mgr: &SolutionManager, event: SessionEvent) -> String {
        match event {
            SessionEvent::Loaded { .. } => self.render(mgr),
            SessionEvent::LoadFailed(e) => format!("error: failed to load solutions: {e}"),
            SessionEvent::Deleted { report, reloading } => {
                print_report(&report);
                let summary = format!(
                    "{} deleted, {} failed",
                    report.deleted_count(),
                    report.failed.len()
                );
                match (reloading, mgr.progress()) {
                    (true, Some(progress)) => format!("{summary}\n{progress}"),
                    _ => format!("{summary}\n{}", self.render(mgr)),
                }
            }
            SessionEvent::JobFailed(e) => format!("error: {e}"),
        }
    }

    pub fn on_line(&mut self, mgr: &mut SolutionManager, line: &str) -> Step {
        if let Some(count) = self.awaiting_confirm.take() {
            if !prompt::is_yes(line) {
                return Step::Print("cancelled".to_string());
            }
            return Step::Print(match mgr.request_delete(|n| n == count) {
                Ok(DeleteRequest::Started { .. }) => mgr.progress().unwrap_or_default().to_string(),
                Ok(DeleteRequest::Cancelled) => "selection changed, delete cancelled".to_string(),
                Ok(DeleteRequest::NothingSelected) => NOTHING_SELECTED_MESSAGE.to_string(),
                Err(e) => format!("error: {e}"),
            });
        }

        if line.trim().is_empty() {
            return Step::Print(String::new());
        }
        let cmd = match parse_command(line) {
            Ok(cmd) => cmd,
            Err(e) => return Step::Print(e),
        };
        Step::Print(match cmd {
            ShellCommand::Quit => return Step::Quit,
            ShellCommand::Help => HELP.to_string(),
            ShellCommand::List => self.render(mgr),
            ShellCommand::Reload => match mgr.request_refresh() {
                Ok(()) => mgr.progress().unwrap_or_default().to_string(),
                Err(e) => format!("error: {e}"),
            },
            ShellCommand::Sort { key, descending } => {
                self.sort = key;
                self.direction = if descending {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                };
                mgr.settings_mut().default_sort = key;
                mgr.settings_mut().descending = descending;
                self.render(mgr)
            }
            ShellCommand::Filter(text) => {
                self.filter = text;
                self.render(mgr)
            }
            _ if mgr.is_busy() => format!(
                "busy: {}",
                mgr.progress().unwrap_or_default()
            ),
            ShellCommand::Toggle(numbers) => {
                let mut errors = Vec::new();
                for n in numbers {
                    match self.rows.get(n - 1) {
                        Some(id) => {
                            mgr.selection_mut().toggle(id);
                        }
                        None => errors.push(format!("no row {n}")),
                    }
                }
                let mut out = self.render(mgr);
                for e in errors {
                    out.push('\n');
                    out.push_str(&e);
                }
                out
            }
            ShellCommand::All => {
                mgr.selection_mut().select_all();
                self.render(mgr)
            }
            ShellCommand::None => {
                mgr.selection_mut().clear();
                self.render(mgr)
            }
            ShellCommand::Delete => match mgr.deletable_count() {
                0 => NOTHING_SELECTED_MESSAGE.to_string(),
                n => {
                    self.awaiting_confirm = Some(n);
                    format!("{} [y/N]", confirmation_message(n))
                }
            },
        })
    }
}

fn show(text: &str) {
    if !text.is_empty() {
        println!("{text}");
    }
}

fn prompt_marker() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Runs until `quit` or end of input.
pub async fn run(mgr: &mut SolutionManager) -> Result<()> {
    let mut shell = Shell::new(mgr, table::terminal_width());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    show("type `help` for commands");
    if let Some(progress) = mgr.progress() {
        show(progress);
    }
    prompt_marker();

    loop {
        let input = tokio::select! {
            event = mgr.next_event() => Input::Event(event),
            line = lines.next_line() => Input::Line(line?),
        };
        match input {
            Input::Event(event) => {
                println!();
                show(&shell.on_event(mgr, event));
            }
            Input::Line(None) => break,
            Input::Line(Some(line)) => match shell.on_line(mgr, &line) {
                Step::Quit => break,
                Step::Print(text) => show(&text),
            },
        }
        prompt_marker();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use solman_core::{InMemoryDataService, Settings};

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command(" LIST "), Ok(ShellCommand::List));
        assert_eq!(parse_command("t 1 3"), Ok(ShellCommand::Toggle(vec![1, 3])));
        assert!(parse_command("toggle").is_err());
        assert!(parse_command("toggle 0").is_err());
        assert_eq!(
            parse_command("sort version desc"),
            Ok(ShellCommand::Sort {
                key: SortKey::Version,
                descending: true
            })
        );
        assert!(parse_command("sort size").is_err());
        assert_eq!(
            parse_command("filter core  sales"),
            Ok(ShellCommand::Filter(Some("core sales".into())))
        );
        assert_eq!(parse_command("filter"), Ok(ShellCommand::Filter(None)));
        assert_eq!(parse_command("q"), Ok(ShellCommand::Quit));
        assert!(parse_command("").is_err());
        assert!(parse_command("launch").is_err());
    }

    async fn loaded(svc: &Arc<InMemoryDataService>) -> (SolutionManager, Shell) {
        let mut mgr = SolutionManager::new(Settings::default());
        mgr.connect(svc.clone(), "https://contoso.crm.dynamics.com")
            .unwrap();
        let mut shell = Shell::new(&mgr, 120);
        let event = mgr.next_event().await;
        shell.on_event(&mgr, event);
        (mgr, shell)
    }

    fn printed(step: Step) -> String {
        match step {
            Step::Print(text) => text,
            Step::Quit => panic!("unexpected quit"),
        }
    }

    #[tokio::test]
    async fn toggle_confirm_and_delete() {
        let svc = Arc::new(InMemoryDataService::new());
        svc.add_solution("sol1", "Alpha", false);
        let beta = svc.add_solution("sol2", "Beta", false);
        let (mut mgr, mut shell) = loaded(&svc).await;

        let out = printed(shell.on_line(&mut mgr, "toggle 2"));
        assert!(out.contains("2 [x] Beta"));
        assert!(mgr.selection().is_selected(&beta));

        let ask = printed(shell.on_line(&mut mgr, "delete"));
        assert_eq!(ask, "Are you sure you want to delete 1 solution? [y/N]");
        let started = printed(shell.on_line(&mut mgr, "y"));
        assert_eq!(started, "Deleting solutions...");

        let event = mgr.next_event().await;
        let out = shell.on_event(&mgr, event);
        assert!(out.starts_with("1 deleted, 0 failed"));
        let event = mgr.next_event().await;
        shell.on_event(&mgr, event);

        assert!(!svc.contains(&beta));
        assert_eq!(mgr.snapshot().len(), 1);
        assert_eq!(svc.delete_calls().len(), 1);
    }

    #[tokio::test]
    async fn declined_confirmation_keeps_selection() {
        let svc = Arc::new(InMemoryDataService::new());
        let a = svc.add_solution("sol1", "Alpha", false);
        let (mut mgr, mut shell) = loaded(&svc).await;

        assert_eq!(
            printed(shell.on_line(&mut mgr, "delete")),
            NOTHING_SELECTED_MESSAGE
        );
        shell.on_line(&mut mgr, "all");
        printed(shell.on_line(&mut mgr, "delete"));
        assert_eq!(printed(shell.on_line(&mut mgr, "n")), "cancelled");
        assert!(!mgr.is_busy());
        assert!(mgr.selection().is_selected(&a));
        assert!(svc.delete_calls().is_empty());
    }

    #[tokio::test]
    async fn sort_persists_and_busy_blocks_selection() {
        let svc = Arc::new(InMemoryDataService::new());
        svc.add_solution("sol1", "Alpha", false);
        svc.add_solution("sol2", "Beta", false);
        let (mut mgr, mut shell) = loaded(&svc).await;

        let out = printed(shell.on_line(&mut mgr, "sort unique-name desc"));
        let first_row = out.lines().nth(1).unwrap_or_default();
        assert!(first_row.contains("sol2"));
        assert_eq!(mgr.settings().default_sort, SortKey::UniqueName);
        assert!(mgr.settings().descending);

        printed(shell.on_line(&mut mgr, "reload"));
        assert_eq!(
            printed(shell.on_line(&mut mgr, "all")),
            "busy: Loading solutions..."
        );
        assert_eq!(shell.on_line(&mut mgr, "quit"), Step::Quit);
    }
}
